// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_exchange_domain::{DeclaredPhase, Phase, PhaseConfig};
use shift_exchange_persistence::Persistence;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{ExchangeEvent, can_submit, configure_phase, current_phase, get_phase_config};

use super::helpers::{NOW, World, create_test_persistence, submission_phase, tenant};

#[test]
fn test_missing_configuration_is_open_for_submission() {
    let mut persistence: Persistence = create_test_persistence();

    assert_eq!(
        current_phase(&mut persistence, &tenant(), NOW).unwrap(),
        Phase::Submission
    );
    assert!(can_submit(&mut persistence, &tenant(), NOW).unwrap());
    assert_eq!(get_phase_config(&mut persistence, &tenant()).unwrap(), None);
}

#[test]
fn test_submission_closes_at_the_deadline() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let deadline: OffsetDateTime = datetime!(2025-05-15 12:00 UTC);

    let phase: Phase = configure_phase(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        &submission_phase(deadline),
        NOW,
    )
    .unwrap();
    assert_eq!(phase, Phase::Submission);

    assert!(can_submit(&mut persistence, &tenant(), NOW).unwrap());
    assert_eq!(
        current_phase(&mut persistence, &tenant(), deadline).unwrap(),
        Phase::Matching
    );
    assert!(!can_submit(&mut persistence, &tenant(), deadline).unwrap());
}

#[test]
fn test_reconfiguring_replaces_the_stored_config_and_notifies() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let first: PhaseConfig = submission_phase(datetime!(2025-05-15 12:00 UTC));
    let second: PhaseConfig = PhaseConfig {
        phase: DeclaredPhase::Completed,
        ..first.clone()
    };

    configure_phase(&mut persistence, &world.ctx(), &tenant(), &first, NOW).unwrap();
    let phase: Phase =
        configure_phase(&mut persistence, &world.ctx(), &tenant(), &second, NOW).unwrap();

    assert_eq!(phase, Phase::Completed);
    assert_eq!(
        get_phase_config(&mut persistence, &tenant()).unwrap(),
        Some(second)
    );
    assert_eq!(
        world.notifier.events(),
        vec![
            ExchangeEvent::PhaseChanged { tenant: tenant() },
            ExchangeEvent::PhaseChanged { tenant: tenant() },
        ]
    );
}

#[test]
fn test_unconfigured_flag_keeps_submission_open() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let config: PhaseConfig = PhaseConfig {
        phase: DeclaredPhase::Completed,
        is_configured: false,
        ..submission_phase(datetime!(2025-05-01 00:00 UTC))
    };

    let phase: Phase =
        configure_phase(&mut persistence, &world.ctx(), &tenant(), &config, NOW).unwrap();

    assert_eq!(phase, Phase::Submission);
    assert!(can_submit(&mut persistence, &tenant(), NOW).unwrap());
}

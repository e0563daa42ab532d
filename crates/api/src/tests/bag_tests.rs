// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_exchange_domain::{
    BagOffer, BagOfferStatus, ExchangeType, OfferFilter, OfferPayload, OperationType, Period,
    PhaseConfig,
};
use shift_exchange_history::HistoryEntry;
use shift_exchange_persistence::Persistence;
use time::macros::datetime;

use crate::{
    ApiError, ConflictKind, ExchangeEvent, add_interest, cancel_bag_offer, configure_phase,
    create_bag_offer, get_bag_offer, list_bag_offers, query_history, record_match,
    reject_bag_offer, reject_match, remove_interest, validate_match,
};

use super::helpers::{
    NOW, SLOT_DATE, UnreachablePlanning, World, create_test_payload, create_test_persistence,
    matching_phase, submission_phase, tenant,
};

fn create_offer(persistence: &mut Persistence, world: &World) -> BagOffer {
    create_bag_offer(persistence, &world.ctx(), &tenant(), &create_test_payload("U1"), NOW)
        .expect("Failed to create bag offer")
}

/// Creates U1's offer, registers U2's interest and closes submissions.
fn offer_in_matching(persistence: &mut Persistence, world: &World) -> BagOffer {
    let offer: BagOffer = create_offer(persistence, world);
    add_interest(persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW).unwrap();
    configure_phase(persistence, &world.ctx(), &tenant(), &matching_phase(), NOW).unwrap();
    offer
}

#[test]
fn test_create_offer_normalizes_and_persists_pending() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();

    let offer: BagOffer = create_offer(&mut persistence, &world);

    assert_eq!(offer.status, BagOfferStatus::Pending);
    assert_eq!(offer.owner_user_id, "U1");
    assert_eq!(offer.slot.date, SLOT_DATE);
    assert_eq!(offer.slot.period, Period::Evening);
    assert!(offer.interested_users.is_empty());
    assert!(offer.operation_types.contains(OperationType::Exchange));
    assert_eq!(
        world.notifier.events(),
        vec![ExchangeEvent::OffersChanged {
            tenant: tenant(),
            exchange_type: ExchangeType::Bag,
        }]
    );
}

#[test]
fn test_create_offer_reports_missing_fields() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let payload: OfferPayload = OfferPayload {
        shift_type: None,
        time_slot: Some(String::from("  ")),
        ..create_test_payload("U1")
    };

    let result: Result<BagOffer, ApiError> =
        create_bag_offer(&mut persistence, &world.ctx(), &tenant(), &payload, NOW);

    match result {
        Err(ApiError::Validation { fields }) => {
            assert_eq!(fields, vec![String::from("shiftType"), String::from("timeSlot")]);
        }
        other => panic!("Expected Validation error, got: {other:?}"),
    }
    assert!(world.notifier.events().is_empty());
}

#[test]
fn test_create_offer_rejects_unparseable_period() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let payload: OfferPayload = OfferPayload {
        period: Some(String::from("night")),
        ..create_test_payload("U1")
    };

    let result: Result<BagOffer, ApiError> =
        create_bag_offer(&mut persistence, &world.ctx(), &tenant(), &payload, NOW);

    assert!(matches!(result, Err(ApiError::Validation { fields }) if fields == ["period"]));
}

#[test]
fn test_create_offer_requires_owner_to_hold_the_shift() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let payload: OfferPayload = OfferPayload {
        shift_type: Some(String::from("JR")),
        ..create_test_payload("U1")
    };

    let result: Result<BagOffer, ApiError> =
        create_bag_offer(&mut persistence, &world.ctx(), &tenant(), &payload, NOW);

    assert_eq!(
        result,
        Err(ApiError::Conflict {
            kind: ConflictKind::ShiftNotHeld {
                user_id: String::from("U1"),
            },
        })
    );
}

#[test]
fn test_create_offer_outside_submission_is_phase_violation() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let closed: PhaseConfig = submission_phase(datetime!(2025-05-09 00:00 UTC));
    configure_phase(&mut persistence, &world.ctx(), &tenant(), &closed, NOW).unwrap();

    let result: Result<BagOffer, ApiError> = create_bag_offer(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        &create_test_payload("U1"),
        NOW,
    );

    assert!(matches!(result, Err(ApiError::PhaseViolation { .. })));
}

#[test]
fn test_second_active_offer_for_same_slot_is_rejected() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    create_offer(&mut persistence, &world);

    let result: Result<BagOffer, ApiError> = create_bag_offer(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        &create_test_payload("U1"),
        NOW,
    );

    assert_eq!(
        result,
        Err(ApiError::Conflict {
            kind: ConflictKind::DuplicateOffer {
                marketplace: ExchangeType::Bag,
            },
        })
    );
}

#[test]
fn test_unreachable_planning_is_dependency_failure_without_writes() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World<UnreachablePlanning> = World::with_planning(UnreachablePlanning);

    let result: Result<BagOffer, ApiError> = create_bag_offer(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        &create_test_payload("U1"),
        NOW,
    );
    assert!(matches!(result, Err(ApiError::Dependency(_))));

    let listed: Vec<BagOffer> = list_bag_offers(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        &OfferFilter::default(),
        None,
    )
    .unwrap();
    assert!(listed.is_empty());
}

#[test]
fn test_interest_is_idempotent() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = create_offer(&mut persistence, &world);

    let once: BagOffer =
        add_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW).unwrap();
    let twice: BagOffer =
        add_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW).unwrap();

    assert_eq!(once.interested_users, twice.interested_users);
    assert_eq!(once.version, twice.version);
    assert!(twice.interested_users.contains("U2"));
}

#[test]
fn test_removing_absent_interest_is_a_no_op() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = create_offer(&mut persistence, &world);

    let after: BagOffer =
        remove_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U9", NOW)
            .unwrap();

    assert_eq!(after, offer);
    assert_eq!(world.notifier.events().len(), 1);
}

#[test]
fn test_owner_cannot_express_interest() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = create_offer(&mut persistence, &world);

    let result: Result<BagOffer, ApiError> =
        add_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U1", NOW);

    assert_eq!(
        result,
        Err(ApiError::Conflict {
            kind: ConflictKind::SelfInterest {
                offer_id: offer.offer_id,
            },
        })
    );
}

#[test]
fn test_member_busy_at_the_slot_cannot_express_interest() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = create_offer(&mut persistence, &world);

    let result: Result<BagOffer, ApiError> =
        add_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U4", NOW);

    assert_eq!(
        result,
        Err(ApiError::Conflict {
            kind: ConflictKind::OwnSlotOccupied {
                user_id: String::from("U4"),
            },
        })
    );
}

#[test]
fn test_interest_on_missing_offer_is_not_found() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();

    let result: Result<BagOffer, ApiError> =
        add_interest(&mut persistence, &world.ctx(), &tenant(), 42, "U2", NOW);

    assert!(matches!(result, Err(ApiError::NotFound { .. })));
}

#[test]
fn test_rejecting_match_returns_offer_to_pool_without_history() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = offer_in_matching(&mut persistence, &world);

    let matched: BagOffer = record_match(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        offer.offer_id,
        "U2",
        None,
        NOW,
    )
    .unwrap();
    assert_eq!(matched.status, BagOfferStatus::Matched);
    assert_eq!(matched.matched_user_id.as_deref(), Some("U2"));

    let rejected: BagOffer =
        reject_match(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, NOW).unwrap();

    assert_eq!(rejected.status, BagOfferStatus::Pending);
    assert_eq!(rejected.matched_user_id, None);
    assert_eq!(rejected.matched_shift_type, None);
    assert_eq!(rejected.matched_at, None);
    assert!(
        query_history(&mut persistence, &tenant(), None, None)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_cancel_during_matching_is_phase_violation() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = offer_in_matching(&mut persistence, &world);
    let before: BagOffer = get_bag_offer(&mut persistence, &tenant(), offer.offer_id).unwrap();

    let result: Result<BagOffer, ApiError> =
        cancel_bag_offer(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, NOW);

    assert!(matches!(result, Err(ApiError::PhaseViolation { .. })));
    let after: BagOffer = get_bag_offer(&mut persistence, &tenant(), offer.offer_id).unwrap();
    assert_eq!(after, before);
}

#[test]
fn test_cancel_during_submission_frees_the_slot() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = create_offer(&mut persistence, &world);

    let cancelled: BagOffer =
        cancel_bag_offer(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, NOW).unwrap();
    assert_eq!(cancelled.status, BagOfferStatus::Cancelled);

    let again: BagOffer = create_offer(&mut persistence, &world);
    assert_ne!(again.offer_id, offer.offer_id);
}

#[test]
fn test_validating_match_appends_exactly_one_history_entry() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = offer_in_matching(&mut persistence, &world);
    record_match(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        offer.offer_id,
        "U2",
        Some("JR"),
        NOW,
    )
    .unwrap();

    let (validated, entry): (BagOffer, HistoryEntry) =
        validate_match(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW)
            .unwrap();
    assert_eq!(validated.status, BagOfferStatus::Validated);
    assert_eq!(entry.original_user_id, "U1");
    assert_eq!(entry.new_user_id, "U2");
    assert!(entry.context.is_permutation());
    assert!(entry.history_id.is_some());

    let second: Result<(BagOffer, HistoryEntry), ApiError> =
        validate_match(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW);
    assert!(matches!(second, Err(ApiError::InvalidState { .. })));

    let history: Vec<HistoryEntry> =
        query_history(&mut persistence, &tenant(), None, None).unwrap();
    assert_eq!(history, vec![entry]);
    assert!(
        world
            .notifier
            .events()
            .contains(&ExchangeEvent::HistoryAppended { tenant: tenant() })
    );
}

/// Records and validates U2's match on U1's offer.
fn validated_offer(persistence: &mut Persistence, world: &World) -> BagOffer {
    let offer: BagOffer = offer_in_matching(persistence, world);
    record_match(persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", None, NOW).unwrap();
    let (validated, _entry): (BagOffer, HistoryEntry) =
        validate_match(persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW).unwrap();
    validated
}

#[test]
fn test_late_cancel_of_validated_offer_is_invalid_state() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = validated_offer(&mut persistence, &world);

    let result: Result<BagOffer, ApiError> =
        cancel_bag_offer(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, NOW);

    assert!(matches!(result, Err(ApiError::InvalidState { .. })));
    let after: BagOffer = get_bag_offer(&mut persistence, &tenant(), offer.offer_id).unwrap();
    assert_eq!(after.status, BagOfferStatus::Validated);
}

#[test]
fn test_matched_member_cannot_withdraw_interest() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = offer_in_matching(&mut persistence, &world);
    record_match(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        offer.offer_id,
        "U2",
        None,
        NOW,
    )
    .unwrap();

    let result: Result<BagOffer, ApiError> =
        remove_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW);
    assert!(matches!(result, Err(ApiError::InvalidState { .. })));

    let after: BagOffer = get_bag_offer(&mut persistence, &tenant(), offer.offer_id).unwrap();
    assert_eq!(after.status, BagOfferStatus::Matched);
    assert!(after.interested_users.contains("U2"));

    // Once the match is rejected the member may leave.
    reject_match(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, NOW).unwrap();
    let released: BagOffer =
        remove_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW)
            .unwrap();
    assert!(released.interested_users.is_empty());
}

#[test]
fn test_interest_on_validated_offer_is_frozen() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = validated_offer(&mut persistence, &world);

    let result: Result<BagOffer, ApiError> =
        remove_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW);

    assert!(matches!(result, Err(ApiError::InvalidState { .. })));
    let after: BagOffer = get_bag_offer(&mut persistence, &tenant(), offer.offer_id).unwrap();
    assert_eq!(after, offer);
}

#[test]
fn test_validated_slot_cannot_be_offered_again() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    validated_offer(&mut persistence, &world);
    let reopened: PhaseConfig = submission_phase(datetime!(2025-06-01 00:00 UTC));
    configure_phase(&mut persistence, &world.ctx(), &tenant(), &reopened, NOW).unwrap();

    let result: Result<BagOffer, ApiError> = create_bag_offer(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        &create_test_payload("U1"),
        NOW,
    );

    assert_eq!(
        result,
        Err(ApiError::Conflict {
            kind: ConflictKind::DuplicateOffer {
                marketplace: ExchangeType::Bag,
            },
        })
    );
}

#[test]
fn test_validating_for_another_member_is_invalid_state() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = offer_in_matching(&mut persistence, &world);
    record_match(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        offer.offer_id,
        "U2",
        None,
        NOW,
    )
    .unwrap();

    let result: Result<(BagOffer, HistoryEntry), ApiError> =
        validate_match(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U3", NOW);

    assert!(matches!(result, Err(ApiError::InvalidState { .. })));
}

#[test]
fn test_matching_a_member_without_interest_is_rejected() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = offer_in_matching(&mut persistence, &world);

    let result: Result<BagOffer, ApiError> = record_match(
        &mut persistence,
        &world.ctx(),
        &tenant(),
        offer.offer_id,
        "U3",
        None,
        NOW,
    );

    assert!(
        matches!(result, Err(ApiError::InvalidInput { field, .. }) if field == "matchedUserId")
    );
}

#[test]
fn test_administrator_rejection_is_terminal() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = create_offer(&mut persistence, &world);

    let rejected: BagOffer =
        reject_bag_offer(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, NOW).unwrap();
    assert_eq!(rejected.status, BagOfferStatus::Rejected);

    let again: Result<BagOffer, ApiError> =
        reject_bag_offer(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, NOW);
    assert!(matches!(again, Err(ApiError::InvalidState { .. })));
}

#[test]
fn test_replacement_only_offers_are_hidden_from_regular_members() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let payload: OfferPayload = OfferPayload {
        operation_type: Some(OperationType::Replacement),
        ..create_test_payload("U1")
    };
    create_bag_offer(&mut persistence, &world.ctx(), &tenant(), &payload, NOW).unwrap();

    let visible_to = |persistence: &mut Persistence, viewer: Option<&str>| -> usize {
        list_bag_offers(persistence, &world.ctx(), &tenant(), &OfferFilter::default(), viewer)
            .unwrap()
            .len()
    };

    assert_eq!(visible_to(&mut persistence, Some("U2")), 0);
    assert_eq!(visible_to(&mut persistence, Some("U3")), 0);
    assert_eq!(visible_to(&mut persistence, Some("U1")), 1);
    assert_eq!(visible_to(&mut persistence, Some("R1")), 1);
    assert_eq!(visible_to(&mut persistence, None), 1);
}

#[test]
fn test_listing_filters_by_status_and_interest() {
    let mut persistence: Persistence = create_test_persistence();
    let world: World = World::new();
    let offer: BagOffer = create_offer(&mut persistence, &world);
    add_interest(&mut persistence, &world.ctx(), &tenant(), offer.offer_id, "U2", NOW).unwrap();

    let by_interest: OfferFilter = OfferFilter {
        interested_user_id: Some(String::from("U2")),
        ..OfferFilter::default()
    };
    let listed: Vec<BagOffer> =
        list_bag_offers(&mut persistence, &world.ctx(), &tenant(), &by_interest, None).unwrap();
    assert_eq!(listed.len(), 1);

    let cancelled_only: OfferFilter = OfferFilter {
        statuses: vec![String::from("cancelled")],
        ..OfferFilter::default()
    };
    let listed: Vec<BagOffer> =
        list_bag_offers(&mut persistence, &world.ctx(), &tenant(), &cancelled_only, None).unwrap();
    assert!(listed.is_empty());

    let unknown: OfferFilter = OfferFilter {
        statuses: vec![String::from("archived")],
        ..OfferFilter::default()
    };
    let result: Result<Vec<BagOffer>, ApiError> =
        list_bag_offers(&mut persistence, &world.ctx(), &tenant(), &unknown, None);
    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
}

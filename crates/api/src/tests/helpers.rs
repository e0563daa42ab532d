// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use shift_exchange_domain::{
    DeclaredPhase, OfferPayload, Period, PhaseConfig, ProposalPayload, TenantId,
};
use shift_exchange_persistence::Persistence;
use std::sync::Mutex;
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};

use crate::{
    ChangeNotifier, DayAssignments, DirectoryUser, ExchangeContext, ExchangeEvent, GatewayError,
    PlanningRecord, ShiftAssignmentGateway, StaticDirectory, StaticPlanning, UserDirectory,
};

pub const NOW: OffsetDateTime = datetime!(2025-05-10 09:30 UTC);
pub const SLOT_DATE: Date = date!(2025 - 05 - 19);

pub fn tenant() -> TenantId {
    TenantId::new("assoc-1")
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory persistence")
}

/// Collects every published event.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ExchangeEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<ExchangeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, event: ExchangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A planning that confirms every shift and reports every member free.
pub struct PermissivePlanning;

impl ShiftAssignmentGateway for PermissivePlanning {
    fn shift_exists(
        &self,
        _tenant: &TenantId,
        _user_id: &str,
        _date: Date,
        _period: Period,
        _shift_type: &str,
    ) -> Result<bool, GatewayError> {
        Ok(true)
    }

    fn has_shift_at(
        &self,
        _tenant: &TenantId,
        _user_id: &str,
        _date: Date,
        _period: Period,
    ) -> Result<bool, GatewayError> {
        Ok(false)
    }

    fn assignments_for_date(
        &self,
        _tenant: &TenantId,
        _date: Date,
    ) -> Result<DayAssignments, GatewayError> {
        Ok(DayAssignments::new())
    }
}

/// A planning that cannot be reached.
pub struct UnreachablePlanning;

impl ShiftAssignmentGateway for UnreachablePlanning {
    fn shift_exists(
        &self,
        _tenant: &TenantId,
        _user_id: &str,
        _date: Date,
        _period: Period,
        _shift_type: &str,
    ) -> Result<bool, GatewayError> {
        Err(unreachable())
    }

    fn has_shift_at(
        &self,
        _tenant: &TenantId,
        _user_id: &str,
        _date: Date,
        _period: Period,
    ) -> Result<bool, GatewayError> {
        Err(unreachable())
    }

    fn assignments_for_date(
        &self,
        _tenant: &TenantId,
        _date: Date,
    ) -> Result<DayAssignments, GatewayError> {
        Err(unreachable())
    }
}

fn unreachable() -> GatewayError {
    GatewayError::Unavailable {
        collaborator: "planning",
        message: String::from("connection refused"),
    }
}

pub fn planning_record(
    user_id: &str,
    date: Date,
    period: Period,
    shift_type: &str,
) -> PlanningRecord {
    PlanningRecord {
        tenant: tenant(),
        user_id: user_id.to_string(),
        date,
        period,
        shift_type: shift_type.to_string(),
        time_slot: String::from("19:00-07:00"),
    }
}

/// The default planning: U1 works the evening of the 19th as `CA`, U4 works
/// the same evening as `JR`, U5 works the 20th morning.
pub fn create_test_planning() -> StaticPlanning {
    StaticPlanning::from_records([
        planning_record("U1", SLOT_DATE, Period::Evening, "CA"),
        planning_record("U4", SLOT_DATE, Period::Evening, "JR"),
        planning_record("U5", date!(2025 - 05 - 20), Period::Morning, "CA"),
    ])
}

pub fn create_test_directory() -> StaticDirectory {
    let mut directory: StaticDirectory = StaticDirectory::new();
    directory.insert(
        tenant(),
        DirectoryUser {
            id: String::from("R1"),
            roles: [String::from("replacement")].into_iter().collect(),
        },
    );
    directory.insert(
        tenant(),
        DirectoryUser {
            id: String::from("U2"),
            roles: std::collections::BTreeSet::new(),
        },
    );
    directory
}

/// Collaborators shared by one test.
pub struct World<G: ShiftAssignmentGateway = StaticPlanning> {
    pub planning: G,
    pub directory: StaticDirectory,
    pub notifier: RecordingNotifier,
}

impl World {
    pub fn new() -> Self {
        Self::with_planning(create_test_planning())
    }
}

impl<G: ShiftAssignmentGateway> World<G> {
    pub fn with_planning(planning: G) -> Self {
        Self {
            planning,
            directory: create_test_directory(),
            notifier: RecordingNotifier::default(),
        }
    }

    pub fn ctx(&self) -> ExchangeContext<'_> {
        let directory: &dyn UserDirectory = &self.directory;
        ExchangeContext::new(&self.planning, directory, &self.notifier)
    }
}

/// U1's evening `CA` shift on the 19th, with the date and period in raw form.
pub fn create_test_payload(owner: &str) -> OfferPayload {
    OfferPayload {
        owner_user_id: Some(owner.to_string()),
        date: Some(String::from("19/05/2025")),
        period: Some(String::from("soir")),
        shift_type: Some(String::from("CA")),
        time_slot: Some(String::from("19:00-07:00")),
        comment: None,
        operation_types: Vec::new(),
        operation_type: None,
    }
}

pub fn create_test_proposal(offer_id: i64, proposer: &str) -> ProposalPayload {
    ProposalPayload {
        target_offer_id: offer_id,
        proposing_user_id: Some(proposer.to_string()),
        counter_shift: None,
        comment: None,
    }
}

pub fn matching_phase() -> PhaseConfig {
    PhaseConfig {
        phase: DeclaredPhase::Distribution,
        submission_deadline: datetime!(2025-05-01 00:00 UTC),
        is_configured: true,
        is_validated: false,
        validated_at: None,
        next_planning_start_date: Some(date!(2025 - 06 - 01)),
    }
}

pub fn submission_phase(deadline: OffsetDateTime) -> PhaseConfig {
    PhaseConfig {
        phase: DeclaredPhase::Submission,
        submission_deadline: deadline,
        is_configured: true,
        is_validated: false,
        validated_at: None,
        next_planning_start_date: None,
    }
}

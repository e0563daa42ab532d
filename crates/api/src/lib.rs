// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

//! Exchange engines and the API boundary of the shift exchange.
//!
//! Operations are plain functions taking the store, the collaborators and
//! the tenant explicitly. Each mutation:
//!
//! 1. validates and normalizes its input,
//! 2. consults the planning where ownership matters,
//! 3. applies a pure transition inside one immediate transaction, retrying
//!    on contention up to [`MAX_TRANSACTION_ATTEMPTS`] times,
//! 4. publishes an [`ExchangeEvent`] once the transaction committed.

mod bag;
mod conflict;
mod direct;
mod error;
mod gateway;
mod history;
mod listing;
mod notify;
mod phase;
mod planning;
mod retry;

#[cfg(test)]
mod tests;

pub use bag::{
    add_interest, cancel_bag_offer, create_bag_offer, get_bag_offer, list_bag_offers,
    record_match, reject_bag_offer, reject_match, remove_interest, validate_match,
};
pub use conflict::{BLOCKING_STATUSES, ConflictCheck, detect_conflict};
pub use direct::{
    Acceptance, accept_proposal, cancel_direct_offer, create_direct_offer, create_proposal,
    get_direct_offer, list_direct_offers, list_proposals_by_user, list_proposals_for_offer,
    reject_proposal, withdraw_proposal,
};
pub use error::{ApiError, ConflictKind, GatewayError};
pub use gateway::{
    Assignment, DayAssignments, DirectoryRecord, DirectoryUser, PlanningRecord, REPLACEMENT_ROLE,
    ShiftAssignmentGateway, StaticDirectory, StaticPlanning, UserDirectory,
};
pub use history::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT, query_history, revert_transfer};
pub use notify::{ChangeNotifier, ExchangeEvent, NoopNotifier};
pub use phase::{can_submit, configure_phase, current_phase, get_phase_config};
pub use planning::assignments_for_date;
pub use retry::MAX_TRANSACTION_ATTEMPTS;

/// The collaborators an operation may consult or notify.
#[derive(Clone, Copy)]
pub struct ExchangeContext<'a> {
    pub gateway: &'a dyn ShiftAssignmentGateway,
    pub directory: &'a dyn UserDirectory,
    pub notifier: &'a dyn ChangeNotifier,
}

impl<'a> ExchangeContext<'a> {
    #[must_use]
    pub const fn new(
        gateway: &'a dyn ShiftAssignmentGateway,
        directory: &'a dyn UserDirectory,
        notifier: &'a dyn ChangeNotifier,
    ) -> Self {
        Self {
            gateway,
            directory,
            notifier,
        }
    }
}

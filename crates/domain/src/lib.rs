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

mod error;
mod normalize;
mod period;
mod phase;
mod status;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use normalize::{
    format_date, iso_date, normalize_date, normalize_date_string, normalize_period,
    parse_canonical_date, slot_key,
};
pub use period::{ExchangeType, OperationType, OperationTypes, Period};
pub use phase::{DeclaredPhase, Phase, PhaseConfig, current_phase};
pub use status::{BagOfferStatus, DirectOfferStatus, ProposalStatus};
pub use types::{
    BagOffer, CounterShiftPayload, DirectOffer, OfferDraft, OfferFilter, OfferPayload, Proposal,
    ProposalPayload, ShiftSlot, TenantId,
};
pub use validation::{ProposalDraft, validate_offer_payload, validate_proposal_payload};

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_exchange_domain::{DomainError, Phase};

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The operation is not allowed in the current bag phase.
    PhaseViolation {
        operation: &'static str,
        phase: Phase,
    },
    /// The entity is not in the status the operation requires.
    InvalidState {
        entity: &'static str,
        id: i64,
        status: String,
        operation: &'static str,
    },
    /// The offer no longer accepts interest or proposals.
    OfferUnavailable { offer_id: i64, status: String },
    /// A member tried to answer their own offer.
    SelfInterest { offer_id: i64, user_id: String },
    /// A match was requested for a member who never expressed interest.
    NotInterested { offer_id: i64, user_id: String },
    /// The member named at validation differs from the recorded match.
    MatchMismatch {
        offer_id: i64,
        expected: Option<String>,
        actual: String,
    },
    /// The proposal does not exist or does not target this offer.
    ProposalNotFound { offer_id: i64, proposal_id: i64 },
    /// The member already has a pending proposal on this offer.
    DuplicateProposal { offer_id: i64, user_id: String },
    /// Only the proposer may withdraw a proposal.
    NotProposer { proposal_id: i64, user_id: String },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::PhaseViolation { operation, phase } => {
                write!(f, "Operation '{operation}' is not allowed during the {phase} phase")
            }
            Self::InvalidState {
                entity,
                id,
                status,
                operation,
            } => write!(
                f,
                "Cannot {operation} {entity} {id}: current status is '{status}'"
            ),
            Self::OfferUnavailable { offer_id, status } => {
                write!(f, "Offer {offer_id} is no longer available (status '{status}')")
            }
            Self::SelfInterest { offer_id, user_id } => {
                write!(f, "User '{user_id}' owns offer {offer_id}")
            }
            Self::NotInterested { offer_id, user_id } => {
                write!(f, "User '{user_id}' has not expressed interest in offer {offer_id}")
            }
            Self::MatchMismatch {
                offer_id,
                expected,
                actual,
            } => write!(
                f,
                "Offer {offer_id} is matched with {}, not '{actual}'",
                expected.as_deref().unwrap_or("nobody")
            ),
            Self::ProposalNotFound {
                offer_id,
                proposal_id,
            } => write!(f, "Proposal {proposal_id} not found for offer {offer_id}"),
            Self::DuplicateProposal { offer_id, user_id } => write!(
                f,
                "User '{user_id}' already has a pending proposal on offer {offer_id}"
            ),
            Self::NotProposer {
                proposal_id,
                user_id,
            } => write!(f, "User '{user_id}' did not submit proposal {proposal_id}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

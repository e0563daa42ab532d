// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.
//!
//! Lower-layer errors are translated explicitly so domain, core and storage
//! errors never leak through the API contract unchanged.

use shift_exchange::CoreError;
use shift_exchange_domain::{DomainError, ExchangeType, Phase};
use shift_exchange_persistence::PersistenceError;

/// Failures reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The collaborator could not be reached or refused to answer.
    #[error("{collaborator} unavailable: {message}")]
    Unavailable {
        collaborator: &'static str,
        message: String,
    },
    /// A fixture file backing a static collaborator could not be loaded.
    #[error("Invalid fixture '{path}': {message}")]
    InvalidFixture { path: String, message: String },
}

/// Why an offer, interest or proposal conflicts with existing commitments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// The slot is already committed in the other marketplace.
    OtherMarketplace { marketplace: ExchangeType },
    /// The owner already has an active offer for the slot in this marketplace.
    DuplicateOffer { marketplace: ExchangeType },
    /// A member answered their own offer.
    SelfInterest { offer_id: i64 },
    /// The member already holds a shift at the offer's slot.
    OwnSlotOccupied { user_id: String },
    /// The planning does not show the member holding the shift they offered.
    ShiftNotHeld { user_id: String },
    /// The member already has a pending proposal on the offer.
    DuplicateProposal { offer_id: i64 },
}

impl ConflictKind {
    /// The conflicting marketplace, when the conflict is a cross-marketplace one.
    #[must_use]
    pub const fn conflicting_marketplace(&self) -> Option<ExchangeType> {
        match self {
            Self::OtherMarketplace { marketplace } => Some(*marketplace),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OtherMarketplace { marketplace } => {
                write!(f, "slot is already offered in the {marketplace} marketplace")
            }
            Self::DuplicateOffer { marketplace } => {
                write!(f, "slot already has an active offer in the {marketplace} marketplace")
            }
            Self::SelfInterest { offer_id } => {
                write!(f, "cannot answer your own offer {offer_id}")
            }
            Self::OwnSlotOccupied { user_id } => {
                write!(f, "user '{user_id}' already holds a shift at this slot")
            }
            Self::ShiftNotHeld { user_id } => {
                write!(f, "user '{user_id}' does not hold the offered shift")
            }
            Self::DuplicateProposal { offer_id } => {
                write!(f, "a pending proposal on offer {offer_id} already exists")
            }
        }
    }
}

/// API-level errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Required fields are missing or blank.
    #[error("Missing required fields: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },
    /// A field is present but malformed.
    #[error("Invalid input for field '{field}': {message}")]
    InvalidInput { field: String, message: String },
    /// The pooled marketplace's phase forbids the operation.
    #[error("'{operation}' is not allowed during the {phase} phase")]
    PhaseViolation { operation: String, phase: Phase },
    /// The request collides with an existing commitment.
    #[error("Conflict: {kind}")]
    Conflict { kind: ConflictKind },
    /// An identifier does not resolve.
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },
    /// The entity is not in the status the operation requires.
    #[error("Cannot {operation} {entity} {id}: current status is '{status}'")]
    InvalidState {
        entity: String,
        id: i64,
        status: String,
        operation: String,
    },
    /// The offer no longer accepts interest, proposals or acceptance.
    #[error("Offer {offer_id} is no longer available (status '{status}')")]
    OfferUnavailable { offer_id: i64, status: String },
    /// Retries were exhausted while other writers kept winning.
    #[error("Gave up after {attempts} attempt(s) because of concurrent modification")]
    Contention { attempts: u32 },
    /// An external collaborator failed.
    #[error("Dependency failure: {0}")]
    Dependency(#[from] GatewayError),
    /// The store failed for a reason other than contention.
    #[error("Storage failure: {message}")]
    Storage { message: String },
}

impl ApiError {
    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::InvalidInput { .. } => "invalid_input",
            Self::PhaseViolation { .. } => "phase_violation",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::OfferUnavailable { .. } => "offer_unavailable",
            Self::Contention { .. } => "contention",
            Self::Dependency(_) => "dependency",
            Self::Storage { .. } => "storage",
        }
    }

    pub(crate) fn not_found(resource: &str, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn conflict(kind: ConflictKind) -> Self {
        Self::Conflict { kind }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::MissingFields { fields } | DomainError::IllegalFields { fields } => {
                Self::Validation { fields }
            }
            DomainError::InvalidDate { .. } => Self::InvalidInput {
                field: String::from("date"),
                message: err.to_string(),
            },
            DomainError::InvalidPeriod { .. } => Self::InvalidInput {
                field: String::from("period"),
                message: err.to_string(),
            },
            DomainError::InvalidExchangeType(_) => Self::InvalidInput {
                field: String::from("exchangeType"),
                message: err.to_string(),
            },
            DomainError::InvalidOperationType(_) => Self::InvalidInput {
                field: String::from("operationTypes"),
                message: err.to_string(),
            },
            DomainError::InvalidTenant(_) => Self::InvalidInput {
                field: String::from("tenant"),
                message: err.to_string(),
            },
            DomainError::InvalidStatus { .. } | DomainError::InvalidStatusTransition { .. } => {
                Self::InvalidInput {
                    field: String::from("status"),
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DomainViolation(domain_err) => Self::from(domain_err),
            CoreError::PhaseViolation { operation, phase } => Self::PhaseViolation {
                operation: operation.to_string(),
                phase,
            },
            CoreError::InvalidState {
                entity,
                id,
                status,
                operation,
            } => Self::InvalidState {
                entity: entity.to_string(),
                id,
                status,
                operation: operation.to_string(),
            },
            CoreError::MatchMismatch { offer_id, .. } => Self::InvalidState {
                entity: String::from("bag offer"),
                id: offer_id,
                status: String::from("matched"),
                operation: String::from("validate_match for another member"),
            },
            CoreError::OfferUnavailable { offer_id, status } => {
                Self::OfferUnavailable { offer_id, status }
            }
            CoreError::SelfInterest { offer_id, .. } => {
                Self::conflict(ConflictKind::SelfInterest { offer_id })
            }
            CoreError::DuplicateProposal { offer_id, .. } => {
                Self::conflict(ConflictKind::DuplicateProposal { offer_id })
            }
            CoreError::ProposalNotFound { proposal_id, .. } => {
                Self::not_found("Proposal", proposal_id)
            }
            CoreError::NotInterested { offer_id, user_id } => Self::InvalidInput {
                field: String::from("matchedUserId"),
                message: format!("User '{user_id}' has not expressed interest in offer {offer_id}"),
            },
            CoreError::NotProposer {
                proposal_id,
                user_id,
            } => Self::InvalidInput {
                field: String::from("userId"),
                message: format!("User '{user_id}' did not make proposal {proposal_id}"),
            },
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            // A unique violation here means a concurrent writer completed the
            // same offer first; a retry will observe the terminal status.
            PersistenceError::Contention(_) | PersistenceError::UniqueViolation(_) => {
                Self::Contention { attempts: 1 }
            }
            PersistenceError::NotFound(what) => Self::not_found("Record", what),
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}

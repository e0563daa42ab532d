// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Offer and proposal status states and their permitted transitions.
//!
//! Offers are never deleted; they move to a terminal status instead.
//! Every mutation goes through `validate_transition` so the lifecycle is
//! enforced in one place.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

fn transition_error(from: &str, to: &str, reason: &str) -> DomainError {
    DomainError::InvalidStatusTransition {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    }
}

/// Status of an offer in the pooled (bag) marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagOfferStatus {
    /// Listed and open to interest.
    Pending,
    /// The system paired the offer with an interested member.
    Matched,
    /// An administrator confirmed the match; the transfer is complete.
    Validated,
    /// Dismissed by an administrator during conflict review.
    Rejected,
    /// Withdrawn by its owner.
    Cancelled,
}

impl BagOfferStatus {
    /// Statuses that hold the owner's slot.
    pub const ACTIVE: [Self; 2] = [Self::Pending, Self::Matched];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "matched" => Ok(Self::Matched),
            "validated" => Ok(Self::Validated),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidStatus {
                entity: "bag offer",
                status: s.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Validated | Self::Rejected | Self::Cancelled)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Matched)
    }

    /// Validates a lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` if the move is not permitted.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(transition_error(
                self.as_str(),
                new_status.as_str(),
                "cannot transition from terminal state",
            ));
        }

        let valid: bool = match self {
            Self::Pending => matches!(
                new_status,
                Self::Matched | Self::Cancelled | Self::Rejected
            ),
            Self::Matched => matches!(
                new_status,
                Self::Validated | Self::Pending | Self::Rejected
            ),
            Self::Validated | Self::Rejected | Self::Cancelled => false,
        };

        if valid {
            Ok(())
        } else {
            Err(transition_error(
                self.as_str(),
                new_status.as_str(),
                "transition not permitted by bag offer lifecycle",
            ))
        }
    }
}

impl FromStr for BagOfferStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// Status of an offer in the direct marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectOfferStatus {
    /// Listed and open to proposals.
    Pending,
    /// A proposal was accepted.
    Validated,
    /// Withdrawn by its owner.
    Cancelled,
}

impl DirectOfferStatus {
    pub const ACTIVE: [Self; 1] = [Self::Pending];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Cancelled => "cancelled",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "validated" => Ok(Self::Validated),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidStatus {
                entity: "direct offer",
                status: s.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Validated | Self::Cancelled)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Validates a lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` if the move is not permitted.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        match (self, new_status) {
            (Self::Pending, Self::Validated | Self::Cancelled) => Ok(()),
            _ if self.is_terminal() => Err(transition_error(
                self.as_str(),
                new_status.as_str(),
                "cannot transition from terminal state",
            )),
            _ => Err(transition_error(
                self.as_str(),
                new_status.as_str(),
                "transition not permitted by direct offer lifecycle",
            )),
        }
    }
}

impl FromStr for DirectOfferStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// Status of a proposal answering a direct offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidStatus {
                entity: "proposal",
                status: s.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Validates a lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` if the proposal is no longer pending.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if *self == Self::Pending && new_status != Self::Pending {
            Ok(())
        } else {
            Err(transition_error(
                self.as_str(),
                new_status.as_str(),
                "only pending proposals can be resolved",
            ))
        }
    }
}

impl FromStr for ProposalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_status_string_round_trip() {
        for status in [
            BagOfferStatus::Pending,
            BagOfferStatus::Matched,
            BagOfferStatus::Validated,
            BagOfferStatus::Rejected,
            BagOfferStatus::Cancelled,
        ] {
            match BagOfferStatus::parse_str(status.as_str()) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse {}: {e}", status.as_str()),
            }
        }
    }

    #[test]
    fn test_unknown_statuses_are_rejected() {
        assert!(BagOfferStatus::parse_str("accepted").is_err());
        assert!(DirectOfferStatus::parse_str("matched").is_err());
        assert!(ProposalStatus::parse_str("validated").is_err());
    }

    #[test]
    fn test_bag_lifecycle() {
        let pending = BagOfferStatus::Pending;
        assert!(pending.validate_transition(BagOfferStatus::Matched).is_ok());
        assert!(pending.validate_transition(BagOfferStatus::Cancelled).is_ok());
        assert!(pending.validate_transition(BagOfferStatus::Validated).is_err());

        let matched = BagOfferStatus::Matched;
        assert!(matched.validate_transition(BagOfferStatus::Validated).is_ok());
        assert!(matched.validate_transition(BagOfferStatus::Pending).is_ok());
        assert!(matched.validate_transition(BagOfferStatus::Cancelled).is_err());

        for terminal in [
            BagOfferStatus::Validated,
            BagOfferStatus::Rejected,
            BagOfferStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.is_active());
            assert!(terminal.validate_transition(BagOfferStatus::Pending).is_err());
        }
    }

    #[test]
    fn test_direct_lifecycle() {
        let pending = DirectOfferStatus::Pending;
        assert!(pending.validate_transition(DirectOfferStatus::Validated).is_ok());
        assert!(pending.validate_transition(DirectOfferStatus::Cancelled).is_ok());
        assert!(
            DirectOfferStatus::Validated
                .validate_transition(DirectOfferStatus::Cancelled)
                .is_err()
        );
        assert!(
            DirectOfferStatus::Cancelled
                .validate_transition(DirectOfferStatus::Validated)
                .is_err()
        );
    }

    #[test]
    fn test_proposal_lifecycle() {
        assert!(
            ProposalStatus::Pending
                .validate_transition(ProposalStatus::Accepted)
                .is_ok()
        );
        assert!(
            ProposalStatus::Accepted
                .validate_transition(ProposalStatus::Rejected)
                .is_err()
        );
        assert!(
            ProposalStatus::Rejected
                .validate_transition(ProposalStatus::Accepted)
                .is_err()
        );
    }
}

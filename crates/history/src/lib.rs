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

use serde::{Deserialize, Serialize};
use shift_exchange_domain::{DomainError, ExchangeType, Period, ShiftSlot, TenantId, iso_date};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

#[cfg(test)]
mod tests;

/// Whether a recorded transfer still stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    /// The transfer took effect.
    Completed,
    /// An administrator reverted the transfer after the fact.
    Reverted,
}

impl HistoryStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Reverted => "reverted",
        }
    }

    /// Entries only ever move from completed to reverted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` for any other move.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if *self == Self::Completed && new_status == Self::Reverted {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: String::from("history entries can only be reverted once"),
            })
        }
    }
}

impl FromStr for HistoryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "reverted" => Ok(Self::Reverted),
            _ => Err(DomainError::InvalidStatus {
                entity: "history entry",
                status: s.to_string(),
            }),
        }
    }
}

/// Marketplace-specific facts about how a transfer came about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "exchangeType", rename_all = "snake_case")]
pub enum TransferContext {
    /// Completed by validating a pooled-marketplace match.
    #[serde(rename_all = "camelCase")]
    Bag {
        offer_id: i64,
        is_permutation: bool,
        matched_shift_type: Option<String>,
    },
    /// Completed by accepting a direct proposal.
    #[serde(rename_all = "camelCase")]
    Direct {
        offer_id: i64,
        proposal_id: i64,
        is_permutation: bool,
    },
}

impl TransferContext {
    #[must_use]
    pub const fn offer_id(&self) -> i64 {
        match self {
            Self::Bag { offer_id, .. } | Self::Direct { offer_id, .. } => *offer_id,
        }
    }

    #[must_use]
    pub const fn exchange_type(&self) -> ExchangeType {
        match self {
            Self::Bag { .. } => ExchangeType::Bag,
            Self::Direct { .. } => ExchangeType::Direct,
        }
    }

    #[must_use]
    pub const fn is_permutation(&self) -> bool {
        match self {
            Self::Bag { is_permutation, .. } | Self::Direct { is_permutation, .. } => {
                *is_permutation
            }
        }
    }
}

/// An immutable record of a completed transfer.
///
/// Exactly one entry is produced per completing transition. Entries are
/// never deleted; the only permitted change is marking one as reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Assigned by persistence; `None` until stored.
    pub history_id: Option<i64>,
    pub tenant: TenantId,
    pub original_user_id: String,
    pub new_user_id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub period: Period,
    pub shift_type: String,
    pub time_slot: String,
    #[serde(with = "time::serde::rfc3339")]
    pub exchanged_at: OffsetDateTime,
    pub status: HistoryStatus,
    pub context: TransferContext,
}

impl HistoryEntry {
    /// Creates a completed, not-yet-stored entry for a transferred slot.
    #[must_use]
    pub fn completed(
        tenant: TenantId,
        original_user_id: &str,
        new_user_id: &str,
        slot: &ShiftSlot,
        exchanged_at: OffsetDateTime,
        context: TransferContext,
    ) -> Self {
        Self {
            history_id: None,
            tenant,
            original_user_id: original_user_id.to_string(),
            new_user_id: new_user_id.to_string(),
            date: slot.date,
            period: slot.period,
            shift_type: slot.shift_type.clone(),
            time_slot: slot.time_slot.clone(),
            exchanged_at,
            status: HistoryStatus::Completed,
            context,
        }
    }

    /// Returns a copy carrying the identifier assigned by persistence.
    #[must_use]
    pub fn with_history_id(&self, history_id: i64) -> Self {
        let mut entry: Self = self.clone();
        entry.history_id = Some(history_id);
        entry
    }

    /// True if the given member gave up or received the slot.
    #[must_use]
    pub fn involves(&self, user_id: &str) -> bool {
        self.original_user_id == user_id || self.new_user_id == user_id
    }
}

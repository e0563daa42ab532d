// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::normalize::iso_date;
use crate::period::{ExchangeType, OperationType, OperationTypes, Period};
use crate::status::{BagOfferStatus, DirectOfferStatus, ProposalStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::{Date, OffsetDateTime};

/// Identifies the association whose scheduling pool an entity belongs to.
///
/// Every stored record is namespaced by tenant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a tenant identifier without validation.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Creates a tenant identifier, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTenant` if the value is empty after trimming.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed: &str = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidTenant(String::from(
                "tenant identifier cannot be empty",
            )));
        }
        Ok(Self::new(trimmed))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shift occupying one period of one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSlot {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub period: Period,
    pub shift_type: String,
    pub time_slot: String,
}

impl ShiftSlot {
    /// True if both slots cover the same date and period.
    #[must_use]
    pub fn same_time_as(&self, date: Date, period: Period) -> bool {
        self.date == date && self.period == period
    }
}

/// Raw offer input as received from a caller.
///
/// Nothing here is trusted: required fields may be absent and the temporal
/// key may be in any accepted form. `operation_type` is the legacy singular
/// field, folded into `operation_types` when the payload is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfferPayload {
    pub owner_user_id: Option<String>,
    pub date: Option<String>,
    pub period: Option<String>,
    pub shift_type: Option<String>,
    pub time_slot: Option<String>,
    pub comment: Option<String>,
    pub operation_types: Vec<OperationType>,
    pub operation_type: Option<OperationType>,
}

/// A validated, normalized offer ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferDraft {
    pub owner_user_id: String,
    pub slot: ShiftSlot,
    pub comment: Option<String>,
    pub operation_types: OperationTypes,
}

/// An offer in the pooled marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagOffer {
    pub offer_id: i64,
    pub tenant: TenantId,
    pub owner_user_id: String,
    #[serde(flatten)]
    pub slot: ShiftSlot,
    pub comment: Option<String>,
    pub operation_types: OperationTypes,
    pub status: BagOfferStatus,
    pub interested_users: BTreeSet<String>,
    pub matched_user_id: Option<String>,
    pub matched_shift_type: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub matched_at: Option<OffsetDateTime>,
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

impl BagOffer {
    #[must_use]
    pub const fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Bag
    }

    /// Clears every match field.
    pub fn clear_match(&mut self) {
        self.matched_user_id = None;
        self.matched_shift_type = None;
        self.matched_at = None;
    }
}

/// An offer in the direct marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectOffer {
    pub offer_id: i64,
    pub tenant: TenantId,
    pub owner_user_id: String,
    #[serde(flatten)]
    pub slot: ShiftSlot,
    pub comment: Option<String>,
    pub operation_types: OperationTypes,
    pub status: DirectOfferStatus,
    pub has_proposals: bool,
    pub accepted_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub accepted_at: Option<OffsetDateTime>,
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

impl DirectOffer {
    #[must_use]
    pub const fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Direct
    }
}

/// A member's request to take over a direct offer.
///
/// A proposal carrying a `counter_shift` turns the transfer into a permutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub proposal_id: i64,
    pub tenant: TenantId,
    pub target_offer_id: i64,
    pub proposing_user_id: String,
    pub counter_shift: Option<ShiftSlot>,
    pub comment: Option<String>,
    pub status: ProposalStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

impl Proposal {
    #[must_use]
    pub const fn is_permutation(&self) -> bool {
        self.counter_shift.is_some()
    }
}

/// Raw counter-shift input carried by a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CounterShiftPayload {
    pub date: Option<String>,
    pub period: Option<String>,
    pub shift_type: Option<String>,
    pub time_slot: Option<String>,
}

/// Raw proposal input as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalPayload {
    pub target_offer_id: i64,
    pub proposing_user_id: Option<String>,
    pub counter_shift: Option<CounterShiftPayload>,
    pub comment: Option<String>,
}

/// Listing options shared by both marketplaces.
///
/// An empty `statuses` list means "active offers only".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfferFilter {
    pub owner_user_id: Option<String>,
    pub interested_user_id: Option<String>,
    pub statuses: Vec<String>,
    pub period: Option<Period>,
    #[serde(with = "iso_date::option")]
    pub date_from: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub date_to: Option<Date>,
}

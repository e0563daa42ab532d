// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row shapes for the exchange tables and their conversion to domain types.
//!
//! Rows hold only text, integers and booleans. Parsing back into domain
//! types happens here so queries never see raw strings.

use crate::diesel_schema::{history_entries, offer_interests, offers, phase_configs, proposals};
use crate::error::PersistenceError;
use diesel::prelude::*;
use shift_exchange_domain::{
    BagOffer, BagOfferStatus, DeclaredPhase, DirectOffer, DirectOfferStatus, ExchangeType,
    OperationTypes, Period, PhaseConfig, Proposal, ProposalStatus, ShiftSlot, TenantId,
    format_date, parse_canonical_date,
};
use shift_exchange_history::{HistoryEntry, HistoryStatus, TransferContext};
use std::collections::BTreeSet;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// Formats an instant as UTC RFC 3339 so stored values sort chronologically.
///
/// # Errors
///
/// Returns an error if the instant cannot be represented in RFC 3339.
pub fn format_instant(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    instant
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn format_optional_instant(
    instant: Option<OffsetDateTime>,
) -> Result<Option<String>, PersistenceError> {
    instant.map(format_instant).transpose()
}

/// Parses a stored RFC 3339 instant.
///
/// # Errors
///
/// Returns an error if the stored value is malformed.
pub fn parse_instant(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(format!("instant '{value}': {e}")))
}

fn parse_optional_instant(value: Option<&str>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(parse_instant).transpose()
}

fn parse_slot(
    date: &str,
    period: &str,
    shift_type: String,
    time_slot: String,
) -> Result<ShiftSlot, PersistenceError> {
    Ok(ShiftSlot {
        date: parse_canonical_date(date)?,
        period: Period::from_code(period)?,
        shift_type,
        time_slot,
    })
}

/// A stored offer from either marketplace.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = offers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OfferRow {
    pub offer_id: i64,
    pub tenant_id: String,
    pub exchange_type: String,
    pub owner_user_id: String,
    pub date: String,
    pub period: String,
    pub shift_type: String,
    pub time_slot: String,
    pub comment: Option<String>,
    pub operation_types: String,
    pub status: String,
    pub matched_user_id: Option<String>,
    pub matched_shift_type: Option<String>,
    pub matched_at: Option<String>,
    pub has_proposals: bool,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub last_modified: String,
}

impl OfferRow {
    fn expect_exchange_type(&self, expected: ExchangeType) -> Result<(), PersistenceError> {
        let actual: ExchangeType = ExchangeType::from_str(&self.exchange_type)?;
        if actual == expected {
            Ok(())
        } else {
            Err(PersistenceError::WrongMarketplace {
                offer_id: self.offer_id,
                expected: expected.as_str().to_string(),
                actual: actual.as_str().to_string(),
            })
        }
    }

    /// Converts the row to a bag offer with the given interest set.
    ///
    /// # Errors
    ///
    /// Returns an error if the row belongs to the direct marketplace or a
    /// stored value cannot be parsed.
    pub fn into_bag_offer(
        self,
        interested_users: BTreeSet<String>,
    ) -> Result<BagOffer, PersistenceError> {
        self.expect_exchange_type(ExchangeType::Bag)?;
        Ok(BagOffer {
            offer_id: self.offer_id,
            tenant: TenantId::new(&self.tenant_id),
            slot: parse_slot(&self.date, &self.period, self.shift_type, self.time_slot)?,
            owner_user_id: self.owner_user_id,
            comment: self.comment,
            operation_types: serde_json::from_str::<OperationTypes>(&self.operation_types)?,
            status: BagOfferStatus::from_str(&self.status)?,
            interested_users,
            matched_user_id: self.matched_user_id,
            matched_shift_type: self.matched_shift_type,
            matched_at: parse_optional_instant(self.matched_at.as_deref())?,
            version: self.version,
            created_at: parse_instant(&self.created_at)?,
            last_modified: parse_instant(&self.last_modified)?,
        })
    }

    /// Converts the row to a direct offer.
    ///
    /// # Errors
    ///
    /// Returns an error if the row belongs to the bag marketplace or a
    /// stored value cannot be parsed.
    pub fn into_direct_offer(self) -> Result<DirectOffer, PersistenceError> {
        self.expect_exchange_type(ExchangeType::Direct)?;
        Ok(DirectOffer {
            offer_id: self.offer_id,
            tenant: TenantId::new(&self.tenant_id),
            slot: parse_slot(&self.date, &self.period, self.shift_type, self.time_slot)?,
            owner_user_id: self.owner_user_id,
            comment: self.comment,
            operation_types: serde_json::from_str::<OperationTypes>(&self.operation_types)?,
            status: DirectOfferStatus::from_str(&self.status)?,
            has_proposals: self.has_proposals,
            accepted_by: self.accepted_by,
            accepted_at: parse_optional_instant(self.accepted_at.as_deref())?,
            version: self.version,
            created_at: parse_instant(&self.created_at)?,
            last_modified: parse_instant(&self.last_modified)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = offers)]
pub struct NewOfferRow {
    pub tenant_id: String,
    pub exchange_type: String,
    pub owner_user_id: String,
    pub date: String,
    pub period: String,
    pub shift_type: String,
    pub time_slot: String,
    pub comment: Option<String>,
    pub operation_types: String,
    pub status: String,
    pub has_proposals: bool,
    pub version: i64,
    pub created_at: String,
    pub last_modified: String,
}

/// Mutable columns of an offer, written by a versioned update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = offers)]
#[diesel(treat_none_as_null = true)]
pub struct OfferChanges {
    pub status: String,
    pub matched_user_id: Option<String>,
    pub matched_shift_type: Option<String>,
    pub matched_at: Option<String>,
    pub has_proposals: bool,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<String>,
    pub last_modified: String,
}

impl OfferChanges {
    /// # Errors
    ///
    /// Returns an error if an instant cannot be formatted.
    pub fn from_bag(offer: &BagOffer) -> Result<Self, PersistenceError> {
        Ok(Self {
            status: offer.status.as_str().to_string(),
            matched_user_id: offer.matched_user_id.clone(),
            matched_shift_type: offer.matched_shift_type.clone(),
            matched_at: format_optional_instant(offer.matched_at)?,
            has_proposals: false,
            accepted_by: None,
            accepted_at: None,
            last_modified: format_instant(offer.last_modified)?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if an instant cannot be formatted.
    pub fn from_direct(offer: &DirectOffer) -> Result<Self, PersistenceError> {
        Ok(Self {
            status: offer.status.as_str().to_string(),
            matched_user_id: None,
            matched_shift_type: None,
            matched_at: None,
            has_proposals: offer.has_proposals,
            accepted_by: offer.accepted_by.clone(),
            accepted_at: format_optional_instant(offer.accepted_at)?,
            last_modified: format_instant(offer.last_modified)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = offer_interests)]
pub struct NewInterestRow {
    pub offer_id: i64,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = proposals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProposalRow {
    pub proposal_id: i64,
    pub tenant_id: String,
    pub offer_id: i64,
    pub proposing_user_id: String,
    pub counter_date: Option<String>,
    pub counter_period: Option<String>,
    pub counter_shift_type: Option<String>,
    pub counter_time_slot: Option<String>,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: String,
    pub last_modified: String,
}

impl TryFrom<ProposalRow> for Proposal {
    type Error = PersistenceError;

    fn try_from(row: ProposalRow) -> Result<Self, Self::Error> {
        let counter_shift: Option<ShiftSlot> = match (
            row.counter_date,
            row.counter_period,
            row.counter_shift_type,
            row.counter_time_slot,
        ) {
            (Some(date), Some(period), Some(shift_type), Some(time_slot)) => {
                Some(parse_slot(&date, &period, shift_type, time_slot)?)
            }
            (None, None, None, None) => None,
            _ => {
                return Err(PersistenceError::SerializationError(format!(
                    "proposal {} has a partial counter shift",
                    row.proposal_id
                )));
            }
        };

        Ok(Self {
            proposal_id: row.proposal_id,
            tenant: TenantId::new(&row.tenant_id),
            target_offer_id: row.offer_id,
            proposing_user_id: row.proposing_user_id,
            counter_shift,
            comment: row.comment,
            status: ProposalStatus::from_str(&row.status)?,
            created_at: parse_instant(&row.created_at)?,
            last_modified: parse_instant(&row.last_modified)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = proposals)]
pub struct NewProposalRow {
    pub tenant_id: String,
    pub offer_id: i64,
    pub proposing_user_id: String,
    pub counter_date: Option<String>,
    pub counter_period: Option<String>,
    pub counter_shift_type: Option<String>,
    pub counter_time_slot: Option<String>,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: String,
    pub last_modified: String,
}

impl NewProposalRow {
    /// # Errors
    ///
    /// Returns an error if the creation instant cannot be formatted.
    pub fn new(
        tenant: &TenantId,
        offer_id: i64,
        proposing_user_id: &str,
        counter_shift: Option<&ShiftSlot>,
        comment: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Self, PersistenceError> {
        let stamp: String = format_instant(now)?;
        Ok(Self {
            tenant_id: tenant.as_str().to_string(),
            offer_id,
            proposing_user_id: proposing_user_id.to_string(),
            counter_date: counter_shift.map(|s| format_date(s.date)),
            counter_period: counter_shift.map(|s| s.period.code().to_string()),
            counter_shift_type: counter_shift.map(|s| s.shift_type.clone()),
            counter_time_slot: counter_shift.map(|s| s.time_slot.clone()),
            comment: comment.map(ToString::to_string),
            status: ProposalStatus::Pending.as_str().to_string(),
            created_at: stamp.clone(),
            last_modified: stamp,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = history_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HistoryRow {
    pub history_id: i64,
    pub tenant_id: String,
    pub offer_id: i64,
    pub exchange_type: String,
    pub proposal_id: Option<i64>,
    pub original_user_id: String,
    pub new_user_id: String,
    pub date: String,
    pub period: String,
    pub shift_type: String,
    pub time_slot: String,
    pub exchanged_at: String,
    pub status: String,
    pub is_permutation: bool,
    pub matched_shift_type: Option<String>,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = PersistenceError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let context: TransferContext = match ExchangeType::from_str(&row.exchange_type)? {
            ExchangeType::Bag => TransferContext::Bag {
                offer_id: row.offer_id,
                is_permutation: row.is_permutation,
                matched_shift_type: row.matched_shift_type,
            },
            ExchangeType::Direct => TransferContext::Direct {
                offer_id: row.offer_id,
                proposal_id: row.proposal_id.ok_or_else(|| {
                    PersistenceError::SerializationError(format!(
                        "direct history entry {} has no proposal",
                        row.history_id
                    ))
                })?,
                is_permutation: row.is_permutation,
            },
        };

        Ok(Self {
            history_id: Some(row.history_id),
            tenant: TenantId::new(&row.tenant_id),
            original_user_id: row.original_user_id,
            new_user_id: row.new_user_id,
            date: parse_canonical_date(&row.date)?,
            period: Period::from_code(&row.period)?,
            shift_type: row.shift_type,
            time_slot: row.time_slot,
            exchanged_at: parse_instant(&row.exchanged_at)?,
            status: HistoryStatus::from_str(&row.status)?,
            context,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = history_entries)]
pub struct NewHistoryRow {
    pub tenant_id: String,
    pub offer_id: i64,
    pub exchange_type: String,
    pub proposal_id: Option<i64>,
    pub original_user_id: String,
    pub new_user_id: String,
    pub date: String,
    pub period: String,
    pub shift_type: String,
    pub time_slot: String,
    pub exchanged_at: String,
    pub status: String,
    pub is_permutation: bool,
    pub matched_shift_type: Option<String>,
}

impl NewHistoryRow {
    /// # Errors
    ///
    /// Returns an error if the exchange instant cannot be formatted.
    pub fn from_entry(entry: &HistoryEntry) -> Result<Self, PersistenceError> {
        let (proposal_id, matched_shift_type): (Option<i64>, Option<String>) = match &entry.context
        {
            TransferContext::Bag {
                matched_shift_type, ..
            } => (None, matched_shift_type.clone()),
            TransferContext::Direct { proposal_id, .. } => (Some(*proposal_id), None),
        };

        Ok(Self {
            tenant_id: entry.tenant.as_str().to_string(),
            offer_id: entry.context.offer_id(),
            exchange_type: entry.context.exchange_type().as_str().to_string(),
            proposal_id,
            original_user_id: entry.original_user_id.clone(),
            new_user_id: entry.new_user_id.clone(),
            date: format_date(entry.date),
            period: entry.period.code().to_string(),
            shift_type: entry.shift_type.clone(),
            time_slot: entry.time_slot.clone(),
            exchanged_at: format_instant(entry.exchanged_at)?,
            status: entry.status.as_str().to_string(),
            is_permutation: entry.context.is_permutation(),
            matched_shift_type,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = phase_configs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct PhaseConfigRow {
    pub tenant_id: String,
    pub phase: String,
    pub submission_deadline: String,
    pub is_configured: bool,
    pub is_validated: bool,
    pub validated_at: Option<String>,
    pub next_planning_start_date: Option<String>,
    pub updated_at: String,
}

impl PhaseConfigRow {
    /// # Errors
    ///
    /// Returns an error if an instant cannot be formatted.
    pub fn new(
        tenant: &TenantId,
        config: &PhaseConfig,
        now: OffsetDateTime,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            tenant_id: tenant.as_str().to_string(),
            phase: config.phase.as_str().to_string(),
            submission_deadline: format_instant(config.submission_deadline)?,
            is_configured: config.is_configured,
            is_validated: config.is_validated,
            validated_at: format_optional_instant(config.validated_at)?,
            next_planning_start_date: config.next_planning_start_date.map(format_date),
            updated_at: format_instant(now)?,
        })
    }
}

impl TryFrom<PhaseConfigRow> for PhaseConfig {
    type Error = PersistenceError;

    fn try_from(row: PhaseConfigRow) -> Result<Self, Self::Error> {
        Ok(Self {
            phase: DeclaredPhase::from(row.phase),
            submission_deadline: parse_instant(&row.submission_deadline)?,
            is_configured: row.is_configured,
            is_validated: row.is_validated,
            validated_at: parse_optional_instant(row.validated_at.as_deref())?,
            next_planning_start_date: row
                .next_planning_start_date
                .as_deref()
                .map(parse_canonical_date)
                .transpose()?,
        })
    }
}

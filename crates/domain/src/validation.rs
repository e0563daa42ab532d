// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::normalize::{normalize_date, normalize_period};
use crate::period::OperationTypes;
use crate::types::{CounterShiftPayload, OfferDraft, OfferPayload, ProposalPayload, ShiftSlot};

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn required(value: Option<&String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Validates an offer payload.
///
/// Checks that owner, date, period, shift type and time slot are present
/// and non-blank, then confirms the period maps to one of the three legal
/// codes even when the caller claims to have normalized it already.
///
/// # Errors
///
/// Returns `DomainError::MissingFields` listing every absent field, or
/// `DomainError::IllegalFields` naming `period` if it is not a legal value.
pub fn validate_offer_payload(payload: &OfferPayload) -> Result<(), DomainError> {
    let mut missing: Vec<String> = Vec::new();

    for (name, value) in [
        ("ownerUserId", payload.owner_user_id.as_ref()),
        ("date", payload.date.as_ref()),
        ("period", payload.period.as_ref()),
        ("shiftType", payload.shift_type.as_ref()),
        ("timeSlot", payload.time_slot.as_ref()),
    ] {
        if is_blank(value) {
            missing.push(name.to_string());
        }
    }

    if !missing.is_empty() {
        return Err(DomainError::MissingFields { fields: missing });
    }

    if normalize_period(&required(payload.period.as_ref())).is_err() {
        return Err(DomainError::IllegalFields {
            fields: vec![String::from("period")],
        });
    }
    Ok(())
}

impl OfferDraft {
    /// Validates and normalizes a raw payload.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing fields or an illegal period,
    /// or an invalid-input error if the date cannot be normalized.
    pub fn from_payload(payload: &OfferPayload) -> Result<Self, DomainError> {
        validate_offer_payload(payload)?;

        let slot: ShiftSlot = ShiftSlot {
            date: normalize_date(&required(payload.date.as_ref()))?,
            period: normalize_period(&required(payload.period.as_ref()))?,
            shift_type: required(payload.shift_type.as_ref()),
            time_slot: required(payload.time_slot.as_ref()),
        };

        Ok(Self {
            owner_user_id: required(payload.owner_user_id.as_ref()),
            slot,
            comment: payload
                .comment
                .as_ref()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            operation_types: OperationTypes::from_legacy(
                &payload.operation_types,
                payload.operation_type,
            ),
        })
    }
}

fn validate_counter_shift(payload: &CounterShiftPayload) -> Result<ShiftSlot, DomainError> {
    let mut missing: Vec<String> = Vec::new();
    for (name, value) in [
        ("counterShift.date", payload.date.as_ref()),
        ("counterShift.period", payload.period.as_ref()),
        ("counterShift.shiftType", payload.shift_type.as_ref()),
        ("counterShift.timeSlot", payload.time_slot.as_ref()),
    ] {
        if is_blank(value) {
            missing.push(name.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(DomainError::MissingFields { fields: missing });
    }

    Ok(ShiftSlot {
        date: normalize_date(&required(payload.date.as_ref()))?,
        period: normalize_period(&required(payload.period.as_ref()))?,
        shift_type: required(payload.shift_type.as_ref()),
        time_slot: required(payload.time_slot.as_ref()),
    })
}

/// A validated proposal: who is proposing and what, if anything, they give back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub target_offer_id: i64,
    pub proposing_user_id: String,
    pub counter_shift: Option<ShiftSlot>,
    pub comment: Option<String>,
}

/// Validates and normalizes a proposal payload.
///
/// # Errors
///
/// Returns `DomainError::MissingFields` if the proposer or any counter-shift
/// field is missing, or a normalization error for the counter-shift key.
pub fn validate_proposal_payload(payload: &ProposalPayload) -> Result<ProposalDraft, DomainError> {
    if is_blank(payload.proposing_user_id.as_ref()) {
        return Err(DomainError::MissingFields {
            fields: vec![String::from("proposingUserId")],
        });
    }

    let counter_shift: Option<ShiftSlot> = payload
        .counter_shift
        .as_ref()
        .map(validate_counter_shift)
        .transpose()?;

    Ok(ProposalDraft {
        target_offer_id: payload.target_offer_id,
        proposing_user_id: required(payload.proposing_user_id.as_ref()),
        counter_shift,
        comment: payload
            .comment
            .as_ref()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    })
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cross-marketplace conflict detection.
//!
//! A member's slot may be committed in at most one marketplace. The check
//! runs inside the creating transaction, so with a single writer at a time
//! it cannot be raced by another creation.

use serde::{Deserialize, Serialize};
use shift_exchange_domain::{ExchangeType, Period, TenantId, normalize_date, normalize_period};
use shift_exchange_persistence::{ExchangeTx, Persistence};
use time::Date;
use tracing::debug;

use crate::error::ApiError;

/// Offer statuses that hold a slot for conflict purposes.
pub const BLOCKING_STATUSES: [&str; 3] = ["pending", "matched", "validated"];

/// Outcome of a conflict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheck {
    pub conflict: bool,
    pub conflicting_marketplace: Option<ExchangeType>,
}

impl ConflictCheck {
    const fn from_marketplace(marketplace: Option<ExchangeType>) -> Self {
        Self {
            conflict: marketplace.is_some(),
            conflicting_marketplace: marketplace,
        }
    }
}

/// Returns the first marketplace, other than `exclude`, holding a blocking
/// offer of the member at the slot. Marketplaces are checked bag first.
pub(crate) fn find_conflict(
    tx: &mut ExchangeTx<'_>,
    tenant: &TenantId,
    owner_user_id: &str,
    date: Date,
    period: Period,
    exclude: Option<ExchangeType>,
) -> Result<Option<ExchangeType>, ApiError> {
    for marketplace in ExchangeType::CHECK_ORDER {
        if Some(marketplace) == exclude {
            continue;
        }
        if let Some(offer_id) = tx.find_blocking_offer(
            tenant,
            marketplace,
            owner_user_id,
            date,
            period,
            &BLOCKING_STATUSES,
        )? {
            debug!(
                tenant = %tenant,
                owner_user_id,
                %marketplace,
                offer_id,
                "Slot already committed"
            );
            return Ok(Some(marketplace));
        }
    }
    Ok(None)
}

/// Checks whether a member's slot is already committed in a marketplace
/// other than `exclude`.
///
/// `date` and `period` may be in any accepted raw form.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` if the date or period cannot be
/// normalized, or a storage error if the lookup fails.
pub fn detect_conflict(
    persistence: &mut Persistence,
    tenant: &TenantId,
    owner_user_id: &str,
    date: &str,
    period: &str,
    exclude: Option<ExchangeType>,
) -> Result<ConflictCheck, ApiError> {
    let date: Date = normalize_date(date)?;
    let period: Period = normalize_period(period)?;

    let marketplace: Option<ExchangeType> = persistence
        .read(|tx| find_conflict(tx, tenant, owner_user_id, date, period, exclude))?;

    Ok(ConflictCheck::from_marketplace(marketplace))
}

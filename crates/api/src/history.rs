// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read and correction access to the transfer history.
//!
//! Entries are appended only by the engines, in the transaction that
//! completes a transfer. They are never deleted; an administrator may mark
//! one reverted.

use shift_exchange_domain::TenantId;
use shift_exchange_history::{HistoryEntry, HistoryStatus};
use shift_exchange_persistence::Persistence;
use tracing::info;

use crate::ExchangeContext;
use crate::error::ApiError;
use crate::notify::ExchangeEvent;
use crate::retry::with_retry;

/// Entries returned when the caller gives no limit.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Upper bound on entries returned by one query.
pub const MAX_HISTORY_LIMIT: u32 = 500;

/// Returns history entries newest first.
///
/// When `user_id` is given only transfers where that member gave up the
/// slot are returned. `limit` defaults to [`DEFAULT_HISTORY_LIMIT`] and is
/// clamped to `1..=MAX_HISTORY_LIMIT`.
///
/// # Errors
///
/// Returns a storage error if the query fails.
pub fn query_history(
    persistence: &mut Persistence,
    tenant: &TenantId,
    user_id: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<HistoryEntry>, ApiError> {
    let limit: u32 = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    persistence.read(|tx| Ok(tx.query_history(tenant, user_id, i64::from(limit))?))
}

/// Marks a completed transfer as reverted.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the entry does not exist, or
/// `ApiError::InvalidState` if it was already reverted.
pub fn revert_transfer(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    history_id: i64,
) -> Result<HistoryEntry, ApiError> {
    let entry: HistoryEntry = with_retry("revert_transfer", || {
        persistence.atomic::<_, ApiError, _>(|tx| {
            let mut entry: HistoryEntry = tx
                .get_history_entry(tenant, history_id)?
                .ok_or_else(|| ApiError::not_found("History entry", history_id))?;

            entry
                .status
                .validate_transition(HistoryStatus::Reverted)
                .map_err(|_| ApiError::InvalidState {
                    entity: String::from("history entry"),
                    id: history_id,
                    status: entry.status.as_str().to_string(),
                    operation: String::from("revert"),
                })?;

            tx.set_history_status(tenant, history_id, HistoryStatus::Reverted)?;
            entry.status = HistoryStatus::Reverted;
            Ok(entry)
        })
    })?;

    info!(
        tenant = %tenant,
        history_id,
        offer_id = entry.context.offer_id(),
        "Transfer reverted"
    );
    ctx.notifier.publish(ExchangeEvent::HistoryReverted {
        tenant: tenant.clone(),
        history_id,
    });
    Ok(entry)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! History writes.
//!
//! Entries are append-only. The only update is the status column, and the
//! `offer_id` uniqueness constraint keeps a second completion of the same
//! offer from appending a duplicate.

use diesel::SqliteConnection;
use diesel::prelude::*;
use shift_exchange_domain::TenantId;
use shift_exchange_history::{HistoryEntry, HistoryStatus};
use tracing::debug;

use crate::data_models::NewHistoryRow;
use crate::diesel_schema::history_entries;
use crate::error::PersistenceError;

/// Appends a history entry.
///
/// # Returns
///
/// The identifier assigned by the database.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the offer already has an
/// entry, or another error if the insert fails.
pub fn insert_history_entry(
    conn: &mut SqliteConnection,
    entry: &HistoryEntry,
) -> Result<i64, PersistenceError> {
    let row: NewHistoryRow = NewHistoryRow::from_entry(entry)?;

    let history_id: i64 = diesel::insert_into(history_entries::table)
        .values(&row)
        .returning(history_entries::history_id)
        .get_result::<i64>(conn)?;

    debug!(history_id, offer_id = row.offer_id, "Appended history entry");
    Ok(history_id)
}

/// Sets the status of a history entry.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the entry does not exist, or
/// another error if the write fails.
pub fn set_history_status(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    history_id: i64,
    status: HistoryStatus,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(
        history_entries::table
            .filter(history_entries::history_id.eq(history_id))
            .filter(history_entries::tenant_id.eq(tenant.as_str())),
    )
    .set(history_entries::status.eq(status.as_str()))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "history entry {history_id}"
        )));
    }
    Ok(())
}

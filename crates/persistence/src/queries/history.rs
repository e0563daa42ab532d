// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use shift_exchange_domain::TenantId;
use shift_exchange_history::HistoryEntry;

use crate::data_models::HistoryRow;
use crate::diesel_schema::history_entries;
use crate::error::PersistenceError;

/// Retrieves a single history entry.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_history_entry(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    history_id: i64,
) -> Result<Option<HistoryEntry>, PersistenceError> {
    history_entries::table
        .filter(history_entries::history_id.eq(history_id))
        .filter(history_entries::tenant_id.eq(tenant.as_str()))
        .select(HistoryRow::as_select())
        .first::<HistoryRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_history_entry: {e}")))?
        .map(HistoryEntry::try_from)
        .transpose()
}

/// Queries the history, most recent first.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `tenant` - The tenant whose history is read
/// * `user_id` - When present, only entries where the member gave up the slot
/// * `limit` - Maximum number of entries returned
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn query_history(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    user_id: Option<&str>,
    limit: i64,
) -> Result<Vec<HistoryEntry>, PersistenceError> {
    let mut query: history_entries::BoxedQuery<'_, Sqlite> = history_entries::table
        .filter(history_entries::tenant_id.eq(tenant.as_str().to_string()))
        .into_boxed();

    if let Some(user) = user_id {
        query = query.filter(history_entries::original_user_id.eq(user.to_string()));
    }

    query
        .order((
            history_entries::exchanged_at.desc(),
            history_entries::history_id.desc(),
        ))
        .limit(limit)
        .select(HistoryRow::as_select())
        .load::<HistoryRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("query_history: {e}")))?
        .into_iter()
        .map(HistoryEntry::try_from)
        .collect()
}

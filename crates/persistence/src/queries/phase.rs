// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use shift_exchange_domain::{PhaseConfig, TenantId};

use crate::data_models::PhaseConfigRow;
use crate::diesel_schema::phase_configs;
use crate::error::PersistenceError;

/// Retrieves the tenant's pooled-marketplace configuration, if one was stored.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_phase_config(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
) -> Result<Option<PhaseConfig>, PersistenceError> {
    phase_configs::table
        .filter(phase_configs::tenant_id.eq(tenant.as_str()))
        .select(PhaseConfigRow::as_select())
        .first::<PhaseConfigRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_phase_config: {e}")))?
        .map(PhaseConfig::try_from)
        .transpose()
}

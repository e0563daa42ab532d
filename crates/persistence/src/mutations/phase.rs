// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use shift_exchange_domain::{PhaseConfig, TenantId};
use time::OffsetDateTime;

use crate::data_models::PhaseConfigRow;
use crate::diesel_schema::phase_configs;
use crate::error::PersistenceError;

/// Creates or replaces the tenant's pooled-marketplace configuration.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn upsert_phase_config(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    config: &PhaseConfig,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    let row: PhaseConfigRow = PhaseConfigRow::new(tenant, config, now)?;

    diesel::insert_into(phase_configs::table)
        .values(&row)
        .on_conflict(phase_configs::tenant_id)
        .do_update()
        .set(&row)
        .execute(conn)?;
    Ok(())
}

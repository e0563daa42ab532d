// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Phase operations for the pooled marketplace.

use shift_exchange_domain::{Phase, PhaseConfig, TenantId, current_phase as phase_at};
use shift_exchange_persistence::{ExchangeTx, Persistence};
use time::OffsetDateTime;
use tracing::info;

use crate::ExchangeContext;
use crate::error::ApiError;
use crate::notify::ExchangeEvent;

/// The phase in effect for `tenant`, read through an open transaction.
pub(crate) fn phase_in(
    tx: &mut ExchangeTx<'_>,
    tenant: &TenantId,
    now: OffsetDateTime,
) -> Result<Phase, ApiError> {
    let config: Option<PhaseConfig> = tx.get_phase_config(tenant)?;
    Ok(phase_at(config.as_ref(), now))
}

/// Returns the phase in effect for `tenant` at `now`.
///
/// # Errors
///
/// Returns a storage error if the configuration cannot be read.
pub fn current_phase(
    persistence: &mut Persistence,
    tenant: &TenantId,
    now: OffsetDateTime,
) -> Result<Phase, ApiError> {
    persistence.read(|tx| phase_in(tx, tenant, now))
}

/// True while members may submit bag offers.
///
/// # Errors
///
/// Returns a storage error if the configuration cannot be read.
pub fn can_submit(
    persistence: &mut Persistence,
    tenant: &TenantId,
    now: OffsetDateTime,
) -> Result<bool, ApiError> {
    Ok(current_phase(persistence, tenant, now)? == Phase::Submission)
}

/// Returns the stored configuration, if any.
///
/// # Errors
///
/// Returns a storage error if the configuration cannot be read.
pub fn get_phase_config(
    persistence: &mut Persistence,
    tenant: &TenantId,
) -> Result<Option<PhaseConfig>, ApiError> {
    persistence.read(|tx| Ok(tx.get_phase_config(tenant)?))
}

/// Replaces the tenant's configuration and returns the phase it yields.
///
/// # Errors
///
/// Returns a storage error if the configuration cannot be written.
pub fn configure_phase(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    config: &PhaseConfig,
    now: OffsetDateTime,
) -> Result<Phase, ApiError> {
    persistence
        .atomic::<_, ApiError, _>(|tx| Ok(tx.upsert_phase_config(tenant, config, now)?))?;

    let phase: Phase = phase_at(Some(config), now);
    info!(
        tenant = %tenant,
        declared = config.phase.as_str(),
        %phase,
        "Phase configuration updated"
    );
    ctx.notifier.publish(ExchangeEvent::PhaseChanged {
        tenant: tenant.clone(),
    });
    Ok(phase)
}

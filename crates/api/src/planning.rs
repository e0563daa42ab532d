// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_exchange_domain::{TenantId, normalize_date};
use time::Date;

use crate::ExchangeContext;
use crate::error::ApiError;
use crate::gateway::DayAssignments;

/// Returns who holds what on a date, for display.
///
/// `date` may be in any accepted raw form.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for an unparseable date, or
/// `ApiError::Dependency` if the planning cannot be consulted.
pub fn assignments_for_date(
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    date: &str,
) -> Result<DayAssignments, ApiError> {
    let date: Date = normalize_date(date)?;
    Ok(ctx.gateway.assignments_for_date(tenant, date)?)
}

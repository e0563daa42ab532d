// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use shift_exchange_domain::{Proposal, TenantId};

use crate::data_models::ProposalRow;
use crate::diesel_schema::proposals;
use crate::error::PersistenceError;

/// Retrieves a proposal by identifier within a tenant.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_proposal(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    proposal_id: i64,
) -> Result<Option<Proposal>, PersistenceError> {
    proposals::table
        .filter(proposals::proposal_id.eq(proposal_id))
        .filter(proposals::tenant_id.eq(tenant.as_str()))
        .select(ProposalRow::as_select())
        .first::<ProposalRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_proposal: {e}")))?
        .map(Proposal::try_from)
        .transpose()
}

/// Lists every proposal targeting an offer, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_proposals_for_offer(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<Vec<Proposal>, PersistenceError> {
    proposals::table
        .filter(proposals::offer_id.eq(offer_id))
        .filter(proposals::tenant_id.eq(tenant.as_str()))
        .order(proposals::proposal_id.asc())
        .select(ProposalRow::as_select())
        .load::<ProposalRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_proposals_for_offer: {e}")))?
        .into_iter()
        .map(Proposal::try_from)
        .collect()
}

/// Lists the proposals a member has made, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_proposals_by_user(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    proposing_user_id: &str,
) -> Result<Vec<Proposal>, PersistenceError> {
    proposals::table
        .filter(proposals::tenant_id.eq(tenant.as_str()))
        .filter(proposals::proposing_user_id.eq(proposing_user_id))
        .order(proposals::proposal_id.desc())
        .select(ProposalRow::as_select())
        .load::<ProposalRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_proposals_by_user: {e}")))?
        .into_iter()
        .map(Proposal::try_from)
        .collect()
}

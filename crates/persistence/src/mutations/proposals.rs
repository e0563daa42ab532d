// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use shift_exchange_domain::{Proposal, ProposalDraft, TenantId};
use time::OffsetDateTime;
use tracing::debug;

use crate::data_models::{NewProposalRow, format_instant};
use crate::diesel_schema::proposals;
use crate::error::PersistenceError;

/// Inserts a new pending proposal.
///
/// # Returns
///
/// The identifier assigned by the database.
///
/// # Errors
///
/// Returns an error if the insert fails, including when the target offer
/// does not exist.
pub fn insert_proposal(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    draft: &ProposalDraft,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let row: NewProposalRow = NewProposalRow::new(
        tenant,
        draft.target_offer_id,
        &draft.proposing_user_id,
        draft.counter_shift.as_ref(),
        draft.comment.as_deref(),
        now,
    )?;

    let proposal_id: i64 = diesel::insert_into(proposals::table)
        .values(&row)
        .returning(proposals::proposal_id)
        .get_result::<i64>(conn)?;

    debug!(
        proposal_id,
        offer_id = draft.target_offer_id,
        "Inserted proposal"
    );
    Ok(proposal_id)
}

/// Writes a proposal's status.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the proposal does not exist, or
/// another error if the write fails.
pub fn save_proposal(
    conn: &mut SqliteConnection,
    proposal: &Proposal,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(
        proposals::table
            .filter(proposals::proposal_id.eq(proposal.proposal_id))
            .filter(proposals::tenant_id.eq(proposal.tenant.as_str())),
    )
    .set((
        proposals::status.eq(proposal.status.as_str()),
        proposals::last_modified.eq(format_instant(proposal.last_modified)?),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "proposal {}",
            proposal.proposal_id
        )));
    }
    Ok(())
}

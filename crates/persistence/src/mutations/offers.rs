// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Offer writes.
//!
//! Updates are versioned: a write succeeds only if the row still carries the
//! version that was read. Zero affected rows means another writer got there
//! first and is reported as contention.

use diesel::SqliteConnection;
use diesel::prelude::*;
use shift_exchange_domain::{
    BagOffer, DirectOffer, ExchangeType, OfferDraft, TenantId, format_date,
};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use tracing::debug;

use crate::data_models::{NewInterestRow, NewOfferRow, OfferChanges, format_instant};
use crate::diesel_schema::{offer_interests, offers};
use crate::error::PersistenceError;
use crate::queries::offers::load_interests;

/// Inserts a new pending offer.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `tenant` - The owning tenant
/// * `exchange_type` - Which marketplace the offer is listed in
/// * `draft` - The validated, normalized offer
/// * `now` - Creation instant
///
/// # Returns
///
/// The identifier assigned by the database.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn insert_offer(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    exchange_type: ExchangeType,
    draft: &OfferDraft,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let stamp: String = format_instant(now)?;
    let row: NewOfferRow = NewOfferRow {
        tenant_id: tenant.as_str().to_string(),
        exchange_type: exchange_type.as_str().to_string(),
        owner_user_id: draft.owner_user_id.clone(),
        date: format_date(draft.slot.date),
        period: draft.slot.period.code().to_string(),
        shift_type: draft.slot.shift_type.clone(),
        time_slot: draft.slot.time_slot.clone(),
        comment: draft.comment.clone(),
        operation_types: serde_json::to_string(&draft.operation_types)?,
        status: String::from("pending"),
        has_proposals: false,
        version: 0,
        created_at: stamp.clone(),
        last_modified: stamp,
    };

    let offer_id: i64 = diesel::insert_into(offers::table)
        .values(&row)
        .returning(offers::offer_id)
        .get_result::<i64>(conn)?;

    debug!(offer_id, exchange_type = exchange_type.as_str(), "Inserted offer");
    Ok(offer_id)
}

fn versioned_update(
    conn: &mut SqliteConnection,
    offer_id: i64,
    version: i64,
    changes: &OfferChanges,
) -> Result<i64, PersistenceError> {
    let next_version: i64 = version + 1;
    let updated: usize = diesel::update(
        offers::table
            .filter(offers::offer_id.eq(offer_id))
            .filter(offers::version.eq(version)),
    )
    .set((changes, offers::version.eq(next_version)))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::Contention(format!(
            "offer {offer_id} changed since version {version} was read"
        )));
    }
    Ok(next_version)
}

/// Writes a bag offer and reconciles its interest set.
///
/// # Returns
///
/// The offer as stored, carrying its new version.
///
/// # Errors
///
/// Returns `PersistenceError::Contention` if the stored version no longer
/// matches `offer.version`, or another error if a write fails.
pub fn save_bag_offer(
    conn: &mut SqliteConnection,
    offer: &BagOffer,
) -> Result<BagOffer, PersistenceError> {
    let changes: OfferChanges = OfferChanges::from_bag(offer)?;
    let version: i64 = versioned_update(conn, offer.offer_id, offer.version, &changes)?;

    let stored: BTreeSet<String> = load_interests(conn, offer.offer_id)?;
    let added: Vec<NewInterestRow> = offer
        .interested_users
        .difference(&stored)
        .map(|user_id| -> Result<NewInterestRow, PersistenceError> {
            Ok(NewInterestRow {
                offer_id: offer.offer_id,
                user_id: user_id.clone(),
                created_at: format_instant(offer.last_modified)?,
            })
        })
        .collect::<Result<_, _>>()?;
    let removed: Vec<String> = stored
        .difference(&offer.interested_users)
        .cloned()
        .collect();

    if !added.is_empty() {
        diesel::insert_or_ignore_into(offer_interests::table)
            .values(&added)
            .execute(conn)?;
    }
    if !removed.is_empty() {
        diesel::delete(
            offer_interests::table
                .filter(offer_interests::offer_id.eq(offer.offer_id))
                .filter(offer_interests::user_id.eq_any(removed)),
        )
        .execute(conn)?;
    }

    let mut saved: BagOffer = offer.clone();
    saved.version = version;
    Ok(saved)
}

/// Writes a direct offer.
///
/// # Returns
///
/// The offer as stored, carrying its new version.
///
/// # Errors
///
/// Returns `PersistenceError::Contention` if the stored version no longer
/// matches `offer.version`, or another error if the write fails.
pub fn save_direct_offer(
    conn: &mut SqliteConnection,
    offer: &DirectOffer,
) -> Result<DirectOffer, PersistenceError> {
    let changes: OfferChanges = OfferChanges::from_direct(offer)?;
    let version: i64 = versioned_update(conn, offer.offer_id, offer.version, &changes)?;

    let mut saved: DirectOffer = offer.clone();
    saved.version = version;
    Ok(saved)
}

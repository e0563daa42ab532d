// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Offer lookups for both marketplaces.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use shift_exchange_domain::{
    BagOffer, DirectOffer, ExchangeType, OfferFilter, Period, TenantId, format_date,
};
use std::collections::{BTreeMap, BTreeSet};
use time::Date;

use crate::data_models::OfferRow;
use crate::diesel_schema::{offer_interests, offers};
use crate::error::PersistenceError;

fn get_offer_row(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    exchange_type: ExchangeType,
    offer_id: i64,
) -> Result<Option<OfferRow>, PersistenceError> {
    offers::table
        .filter(offers::offer_id.eq(offer_id))
        .filter(offers::tenant_id.eq(tenant.as_str()))
        .filter(offers::exchange_type.eq(exchange_type.as_str()))
        .select(OfferRow::as_select())
        .first::<OfferRow>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("get_offer_row: {e}")))
}

/// Loads the members interested in an offer.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_interests(
    conn: &mut SqliteConnection,
    offer_id: i64,
) -> Result<BTreeSet<String>, PersistenceError> {
    let users: Vec<String> = offer_interests::table
        .filter(offer_interests::offer_id.eq(offer_id))
        .select(offer_interests::user_id)
        .load::<String>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("load_interests: {e}")))?;
    Ok(users.into_iter().collect())
}

/// Retrieves a bag offer with its interest set.
///
/// Offers from another tenant or the direct marketplace are not visible.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_bag_offer(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<Option<BagOffer>, PersistenceError> {
    let Some(row) = get_offer_row(conn, tenant, ExchangeType::Bag, offer_id)? else {
        return Ok(None);
    };
    let interests: BTreeSet<String> = load_interests(conn, offer_id)?;
    row.into_bag_offer(interests).map(Some)
}

/// Retrieves a direct offer.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_direct_offer(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<Option<DirectOffer>, PersistenceError> {
    get_offer_row(conn, tenant, ExchangeType::Direct, offer_id)?
        .map(OfferRow::into_direct_offer)
        .transpose()
}

/// Finds an offer that occupies the member's slot in one marketplace.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `tenant` - The tenant whose offers are searched
/// * `exchange_type` - The marketplace to search
/// * `owner_user_id` - The offering member
/// * `date` - Canonical date of the slot
/// * `period` - Canonical period of the slot
/// * `statuses` - Status values that count as occupying the slot
///
/// # Returns
///
/// The identifier of the first matching offer, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_blocking_offer(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    exchange_type: ExchangeType,
    owner_user_id: &str,
    date: Date,
    period: Period,
    statuses: &[&str],
) -> Result<Option<i64>, PersistenceError> {
    let status_values: Vec<String> = statuses.iter().map(ToString::to_string).collect();
    offers::table
        .filter(offers::tenant_id.eq(tenant.as_str()))
        .filter(offers::exchange_type.eq(exchange_type.as_str()))
        .filter(offers::owner_user_id.eq(owner_user_id))
        .filter(offers::date.eq(format_date(date)))
        .filter(offers::period.eq(period.code()))
        .filter(offers::status.eq_any(status_values))
        .order(offers::offer_id.asc())
        .select(offers::offer_id)
        .first::<i64>(conn)
        .optional()
        .map_err(|e| PersistenceError::QueryFailed(format!("find_blocking_offer: {e}")))
}

fn list_offer_rows(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    exchange_type: ExchangeType,
    filter: &OfferFilter,
    statuses: &[&str],
) -> Result<Vec<OfferRow>, PersistenceError> {
    let status_values: Vec<String> = statuses.iter().map(ToString::to_string).collect();
    let mut query: offers::BoxedQuery<'_, Sqlite> = offers::table
        .filter(offers::tenant_id.eq(tenant.as_str().to_string()))
        .filter(offers::exchange_type.eq(exchange_type.as_str()))
        .filter(offers::status.eq_any(status_values))
        .into_boxed();

    if let Some(owner) = &filter.owner_user_id {
        query = query.filter(offers::owner_user_id.eq(owner.clone()));
    }
    if let Some(user) = &filter.interested_user_id {
        let interested: Vec<i64> = offer_interests::table
            .filter(offer_interests::user_id.eq(user))
            .select(offer_interests::offer_id)
            .load::<i64>(conn)
            .map_err(|e| PersistenceError::QueryFailed(format!("list_offer_rows: {e}")))?;
        query = query.filter(offers::offer_id.eq_any(interested));
    }
    if let Some(period) = filter.period {
        query = query.filter(offers::period.eq(period.code()));
    }
    if let Some(from) = filter.date_from {
        query = query.filter(offers::date.ge(format_date(from)));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(offers::date.le(format_date(to)));
    }

    query
        .order((offers::date.asc(), offers::offer_id.asc()))
        .select(OfferRow::as_select())
        .load::<OfferRow>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_offer_rows: {e}")))
}

/// Lists bag offers matching a filter, with their interest sets.
///
/// `statuses` is the already-resolved status set; callers decide the
/// default when the filter names none.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_bag_offers(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    filter: &OfferFilter,
    statuses: &[&str],
) -> Result<Vec<BagOffer>, PersistenceError> {
    let rows: Vec<OfferRow> = list_offer_rows(conn, tenant, ExchangeType::Bag, filter, statuses)?;
    let ids: Vec<i64> = rows.iter().map(|r| r.offer_id).collect();

    let pairs: Vec<(i64, String)> = offer_interests::table
        .filter(offer_interests::offer_id.eq_any(ids))
        .select((offer_interests::offer_id, offer_interests::user_id))
        .load::<(i64, String)>(conn)
        .map_err(|e| PersistenceError::QueryFailed(format!("list_bag_offers: {e}")))?;

    let mut interests: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
    for (offer_id, user_id) in pairs {
        interests.entry(offer_id).or_default().insert(user_id);
    }

    rows.into_iter()
        .map(|row| {
            let users: BTreeSet<String> = interests.remove(&row.offer_id).unwrap_or_default();
            row.into_bag_offer(users)
        })
        .collect()
}

/// Lists direct offers matching a filter.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_direct_offers(
    conn: &mut SqliteConnection,
    tenant: &TenantId,
    filter: &OfferFilter,
    statuses: &[&str],
) -> Result<Vec<DirectOffer>, PersistenceError> {
    list_offer_rows(conn, tenant, ExchangeType::Direct, filter, statuses)?
        .into_iter()
        .map(OfferRow::into_direct_offer)
        .collect()
}

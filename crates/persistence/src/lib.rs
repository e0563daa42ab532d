// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the shift exchange.
//!
//! Offers from both marketplaces, interests, proposals, history entries and
//! phase configurations are stored in `SQLite` through Diesel.
//!
//! ## Units of Work
//!
//! Every mutating operation runs inside [`Persistence::atomic`], which opens
//! an immediate (write-locking) transaction and hands the closure an
//! [`ExchangeTx`]. Reads, the conflict check and the writes inside one
//! closure either all commit or all roll back.
//!
//! Offer updates are versioned. If the stored version moved since the offer
//! was read, or the database stayed locked past the busy timeout, the
//! closure fails with [`PersistenceError::Contention`] and the caller may
//! retry the whole unit.
//!
//! ## Testing Philosophy
//!
//! - Tests use isolated in-memory databases via [`Persistence::new_in_memory`]
//! - Cross-connection behavior is tested against temporary files

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::{Connection, SqliteConnection};
use shift_exchange_domain::{
    BagOffer, DirectOffer, ExchangeType, OfferDraft, OfferFilter, Period, PhaseConfig, Proposal,
    ProposalDraft, TenantId,
};
use shift_exchange_history::{HistoryEntry, HistoryStatus};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{Date, OffsetDateTime};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use backend::sqlite::BUSY_TIMEOUT_MS;
pub use error::PersistenceError;

/// Persistence adapter for the exchange tables.
pub struct Persistence {
    conn: SqliteConnection,
}

/// Carries either a database failure raised by the transaction itself or
/// the closure's own error through Diesel's transaction API.
enum TxError<E> {
    Database(diesel::result::Error),
    Operation(E),
}

impl<E> From<diesel::result::Error> for TxError<E> {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(err)
    }
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String =
            format!("file:memdb_exchange_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// Several adapters may open the same file; writers serialize on the
    /// database lock and see each other's committed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    /// Runs a unit of work inside an immediate transaction.
    ///
    /// The closure's reads and writes commit together when it returns `Ok`
    /// and roll back when it returns `Err`.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a converted `PersistenceError` if
    /// the transaction could not begin or commit.
    pub fn atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ExchangeTx<'_>) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let outcome: Result<T, TxError<E>> = self.conn.immediate_transaction(|conn| {
            let mut tx: ExchangeTx<'_> = ExchangeTx { conn };
            f(&mut tx).map_err(TxError::Operation)
        });

        outcome.map_err(|err| match err {
            TxError::Database(db) => E::from(PersistenceError::from(db)),
            TxError::Operation(op) => op,
        })
    }

    /// Runs read-only work against one consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a converted `PersistenceError` if
    /// the transaction could not begin.
    pub fn read<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ExchangeTx<'_>) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let outcome: Result<T, TxError<E>> = self.conn.transaction(|conn| {
            let mut tx: ExchangeTx<'_> = ExchangeTx { conn };
            f(&mut tx).map_err(TxError::Operation)
        });

        outcome.map_err(|err| match err {
            TxError::Database(db) => E::from(PersistenceError::from(db)),
            TxError::Operation(op) => op,
        })
    }
}

/// Access to the exchange tables from inside a transaction.
pub struct ExchangeTx<'c> {
    conn: &'c mut SqliteConnection,
}

impl ExchangeTx<'_> {
    // ========================================================================
    // Offers
    // ========================================================================

    /// Inserts a pending offer and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_offer(
        &mut self,
        tenant: &TenantId,
        exchange_type: ExchangeType,
        draft: &OfferDraft,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::offers::insert_offer(self.conn, tenant, exchange_type, draft, now)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_bag_offer(
        &mut self,
        tenant: &TenantId,
        offer_id: i64,
    ) -> Result<Option<BagOffer>, PersistenceError> {
        queries::offers::get_bag_offer(self.conn, tenant, offer_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_direct_offer(
        &mut self,
        tenant: &TenantId,
        offer_id: i64,
    ) -> Result<Option<DirectOffer>, PersistenceError> {
        queries::offers::get_direct_offer(self.conn, tenant, offer_id)
    }

    /// Writes a bag offer if its version is still current.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Contention` on a stale version.
    pub fn save_bag_offer(&mut self, offer: &BagOffer) -> Result<BagOffer, PersistenceError> {
        mutations::offers::save_bag_offer(self.conn, offer)
    }

    /// Writes a direct offer if its version is still current.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Contention` on a stale version.
    pub fn save_direct_offer(
        &mut self,
        offer: &DirectOffer,
    ) -> Result<DirectOffer, PersistenceError> {
        mutations::offers::save_direct_offer(self.conn, offer)
    }

    /// Finds an offer of `owner_user_id` at the slot whose status is one of
    /// `statuses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_blocking_offer(
        &mut self,
        tenant: &TenantId,
        exchange_type: ExchangeType,
        owner_user_id: &str,
        date: Date,
        period: Period,
        statuses: &[&str],
    ) -> Result<Option<i64>, PersistenceError> {
        queries::offers::find_blocking_offer(
            self.conn,
            tenant,
            exchange_type,
            owner_user_id,
            date,
            period,
            statuses,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn list_bag_offers(
        &mut self,
        tenant: &TenantId,
        filter: &OfferFilter,
        statuses: &[&str],
    ) -> Result<Vec<BagOffer>, PersistenceError> {
        queries::offers::list_bag_offers(self.conn, tenant, filter, statuses)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn list_direct_offers(
        &mut self,
        tenant: &TenantId,
        filter: &OfferFilter,
        statuses: &[&str],
    ) -> Result<Vec<DirectOffer>, PersistenceError> {
        queries::offers::list_direct_offers(self.conn, tenant, filter, statuses)
    }

    // ========================================================================
    // Proposals
    // ========================================================================

    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_proposal(
        &mut self,
        tenant: &TenantId,
        draft: &ProposalDraft,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::proposals::insert_proposal(self.conn, tenant, draft, now)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_proposal(
        &mut self,
        tenant: &TenantId,
        proposal_id: i64,
    ) -> Result<Option<Proposal>, PersistenceError> {
        queries::proposals::get_proposal(self.conn, tenant, proposal_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn list_proposals_for_offer(
        &mut self,
        tenant: &TenantId,
        offer_id: i64,
    ) -> Result<Vec<Proposal>, PersistenceError> {
        queries::proposals::list_proposals_for_offer(self.conn, tenant, offer_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn list_proposals_by_user(
        &mut self,
        tenant: &TenantId,
        proposing_user_id: &str,
    ) -> Result<Vec<Proposal>, PersistenceError> {
        queries::proposals::list_proposals_by_user(self.conn, tenant, proposing_user_id)
    }

    /// # Errors
    ///
    /// Returns an error if the proposal is missing or the write fails.
    pub fn save_proposal(&mut self, proposal: &Proposal) -> Result<(), PersistenceError> {
        mutations::proposals::save_proposal(self.conn, proposal)
    }

    // ========================================================================
    // History
    // ========================================================================

    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the offer already has
    /// an entry.
    pub fn insert_history_entry(&mut self, entry: &HistoryEntry) -> Result<i64, PersistenceError> {
        mutations::history::insert_history_entry(self.conn, entry)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_history_entry(
        &mut self,
        tenant: &TenantId,
        history_id: i64,
    ) -> Result<Option<HistoryEntry>, PersistenceError> {
        queries::history::get_history_entry(self.conn, tenant, history_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn query_history(
        &mut self,
        tenant: &TenantId,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, PersistenceError> {
        queries::history::query_history(self.conn, tenant, user_id, limit)
    }

    /// # Errors
    ///
    /// Returns an error if the entry is missing or the write fails.
    pub fn set_history_status(
        &mut self,
        tenant: &TenantId,
        history_id: i64,
        status: HistoryStatus,
    ) -> Result<(), PersistenceError> {
        mutations::history::set_history_status(self.conn, tenant, history_id, status)
    }

    // ========================================================================
    // Phase
    // ========================================================================

    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_phase_config(
        &mut self,
        tenant: &TenantId,
    ) -> Result<Option<PhaseConfig>, PersistenceError> {
        queries::phase::get_phase_config(self.conn, tenant)
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert_phase_config(
        &mut self,
        tenant: &TenantId,
        config: &PhaseConfig,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::phase::upsert_phase_config(self.conn, tenant, config, now)
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;
use shift_exchange_domain::DomainError;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// Another writer touched the same rows first, or the database was busy.
    ///
    /// The whole unit of work may be retried.
    Contention(String),
    /// A uniqueness constraint rejected the write.
    UniqueViolation(String),
    /// A stored row belongs to the other marketplace.
    WrongMarketplace {
        offer_id: i64,
        expected: String,
        actual: String,
    },
    /// Serialization/deserialization error.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested resource was not found.
    NotFound(String),
}

impl PersistenceError {
    /// True when retrying the whole transaction may succeed.
    #[must_use]
    pub const fn is_contention(&self) -> bool {
        matches!(self, Self::Contention(_))
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::Contention(msg) => write!(f, "Concurrent modification: {msg}"),
            Self::UniqueViolation(msg) => write!(f, "Unique constraint violated: {msg}"),
            Self::WrongMarketplace {
                offer_id,
                expected,
                actual,
            } => write!(
                f,
                "Offer {offer_id} belongs to the {actual} marketplace, not {expected}"
            ),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

fn is_busy(message: &str) -> bool {
    let message: String = message.to_ascii_lowercase();
    message.contains("database is locked") || message.contains("database is busy")
}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
                Self::Contention(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(_, ref info) if is_busy(info.message()) => {
                Self::Contention(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<DomainError> for PersistenceError {
    fn from(err: DomainError) -> Self {
        Self::SerializationError(err.to_string())
    }
}

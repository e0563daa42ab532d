// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more required offer fields are absent or blank.
    MissingFields {
        /// The camelCase names of the missing fields, in declaration order.
        fields: Vec<String>,
    },
    /// Required fields are present but hold values outside their domain.
    IllegalFields {
        /// The camelCase names of the offending fields.
        fields: Vec<String>,
    },
    /// A date string could not be parsed in any accepted form.
    InvalidDate {
        /// The raw value as supplied by the caller.
        raw: String,
    },
    /// A period string does not map to one of the three day segments.
    InvalidPeriod {
        /// The raw value as supplied by the caller.
        raw: String,
    },
    /// An unknown marketplace discriminator.
    InvalidExchangeType(String),
    /// An unknown operation type.
    InvalidOperationType(String),
    /// Tenant identifier is empty.
    InvalidTenant(String),
    /// A persisted or supplied status string is not recognized.
    InvalidStatus {
        /// Which entity the status belongs to.
        entity: &'static str,
        /// The unrecognized value.
        status: String,
    },
    /// A lifecycle transition is not permitted.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was refused.
        reason: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields { fields } => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::IllegalFields { fields } => {
                write!(f, "Illegal values for fields: {}", fields.join(", "))
            }
            Self::InvalidDate { raw } => write!(f, "Invalid date: '{raw}'"),
            Self::InvalidPeriod { raw } => {
                write!(f, "Invalid period: '{raw}' (expected M, AM or S)")
            }
            Self::InvalidExchangeType(value) => write!(f, "Invalid exchange type: '{value}'"),
            Self::InvalidOperationType(value) => write!(f, "Invalid operation type: '{value}'"),
            Self::InvalidTenant(msg) => write!(f, "Invalid tenant: {msg}"),
            Self::InvalidStatus { entity, status } => {
                write!(f, "Invalid {entity} status: '{status}'")
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Invalid status transition from {from} to {to}: {reason}")
            }
        }
    }
}

impl std::error::Error for DomainError {}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Phase computation for the pooled marketplace.
//!
//! The phase is never stored directly. It is derived from the tenant's
//! declared configuration and the current instant, so it advances from
//! submission to matching on its own once the deadline passes.

use crate::normalize::iso_date;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// The effective phase of the pooled marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Members may submit and cancel offers.
    Submission,
    /// Submissions are closed; administrators match and validate.
    Matching,
    /// The cycle is over.
    Completed,
}

impl Phase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "SUBMISSION",
            Self::Matching => "MATCHING",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The phase an administrator declared in the configuration.
///
/// Values outside the known set are kept verbatim so they can be stored and
/// shown back, but they are treated as submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeclaredPhase {
    Submission,
    Distribution,
    Completed,
    Unrecognized(String),
}

impl DeclaredPhase {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Submission => "submission",
            Self::Distribution => "distribution",
            Self::Completed => "completed",
            Self::Unrecognized(value) => value,
        }
    }
}

impl From<String> for DeclaredPhase {
    fn from(value: String) -> Self {
        match value.as_str() {
            "submission" => Self::Submission,
            "distribution" => Self::Distribution,
            "completed" => Self::Completed,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<&str> for DeclaredPhase {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DeclaredPhase> for String {
    fn from(phase: DeclaredPhase) -> Self {
        phase.as_str().to_string()
    }
}

/// Per-tenant configuration of the pooled marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseConfig {
    pub phase: DeclaredPhase,
    #[serde(with = "time::serde::rfc3339")]
    pub submission_deadline: OffsetDateTime,
    pub is_configured: bool,
    pub is_validated: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub validated_at: Option<OffsetDateTime>,
    #[serde(default, with = "iso_date::option")]
    pub next_planning_start_date: Option<Date>,
}

/// Derives the current phase from a configuration and an instant.
///
/// A missing or unconfigured marketplace is open for submission.
#[must_use]
pub fn current_phase(config: Option<&PhaseConfig>, now: OffsetDateTime) -> Phase {
    let Some(config) = config.filter(|c| c.is_configured) else {
        return Phase::Submission;
    };

    match config.phase {
        DeclaredPhase::Submission => {
            if now < config.submission_deadline {
                Phase::Submission
            } else {
                Phase::Matching
            }
        }
        DeclaredPhase::Distribution => Phase::Matching,
        DeclaredPhase::Completed => Phase::Completed,
        DeclaredPhase::Unrecognized(_) => Phase::Submission,
    }
}

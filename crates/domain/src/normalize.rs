// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Canonical forms for the temporal key of an offer.
//!
//! Dates are canonically `YYYY-MM-DD`; periods are one of `M`, `AM`, `S`.
//! Every normalizer is idempotent: feeding canonical output back in returns
//! it unchanged.

use crate::error::DomainError;
use crate::period::Period;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Normalizes a caller-supplied date into a calendar date.
///
/// Accepted forms, after trimming surrounding whitespace:
/// - `YYYY-MM-DD`
/// - an RFC 3339 timestamp (the date component is taken as written)
/// - `DD/MM/YYYY`
///
/// # Errors
///
/// Returns `DomainError::InvalidDate` if no form matches.
pub fn normalize_date(raw: &str) -> Result<Date, DomainError> {
    let trimmed: &str = raw.trim();

    if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }
    if let Ok(instant) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(instant.date());
    }
    if let Ok(date) = Date::parse(trimmed, format_description!("[day]/[month]/[year]")) {
        return Ok(date);
    }

    Err(DomainError::InvalidDate {
        raw: raw.to_string(),
    })
}

/// Normalizes a date string to its canonical `YYYY-MM-DD` text.
///
/// # Errors
///
/// Returns `DomainError::InvalidDate` if the input cannot be parsed.
pub fn normalize_date_string(raw: &str) -> Result<String, DomainError> {
    normalize_date(raw).map(format_date)
}

/// Normalizes a period code or long-form alias.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Errors
///
/// Returns `DomainError::InvalidPeriod` if the value is not a known code or alias.
pub fn normalize_period(raw: &str) -> Result<Period, DomainError> {
    let folded: String = raw.trim().to_lowercase();

    match folded.as_str() {
        "m" | "matin" | "morning" => Ok(Period::Morning),
        "am" | "afternoon" | "apres-midi" | "après-midi" | "apres midi" | "après midi" => {
            Ok(Period::Afternoon)
        }
        "s" | "soir" | "evening" => Ok(Period::Evening),
        _ => Err(DomainError::InvalidPeriod {
            raw: raw.to_string(),
        }),
    }
}

/// Formats a date in canonical `YYYY-MM-DD` form.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses a value already stored in canonical form.
///
/// # Errors
///
/// Returns `DomainError::InvalidDate` if the value is not exactly `YYYY-MM-DD`.
pub fn parse_canonical_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|_| {
        DomainError::InvalidDate {
            raw: value.to_string(),
        }
    })
}

/// Builds the planning slot key (`date-period`) for a temporal key.
#[must_use]
pub fn slot_key(date: Date, period: Period) -> String {
    format!("{}-{}", format_date(date), period.code())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_date_forms() {
        assert_eq!(normalize_date("2025-05-19").unwrap(), date!(2025 - 05 - 19));
        assert_eq!(
            normalize_date("2025-05-19T22:30:00+02:00").unwrap(),
            date!(2025 - 05 - 19)
        );
        assert_eq!(normalize_date("19/05/2025").unwrap(), date!(2025 - 05 - 19));
        assert_eq!(normalize_date("  2025-05-19 ").unwrap(), date!(2025 - 05 - 19));
    }

    #[test]
    fn test_invalid_dates() {
        for raw in ["", "tomorrow", "2025-13-01", "31/02/2025", "2025/05/19"] {
            assert!(
                matches!(normalize_date(raw), Err(DomainError::InvalidDate { .. })),
                "{raw} should not parse"
            );
        }
    }

    #[test]
    fn test_period_aliases() {
        assert_eq!(normalize_period("M").unwrap(), Period::Morning);
        assert_eq!(normalize_period("matin").unwrap(), Period::Morning);
        assert_eq!(normalize_period("AM").unwrap(), Period::Afternoon);
        assert_eq!(normalize_period("Après-midi").unwrap(), Period::Afternoon);
        assert_eq!(normalize_period(" soir ").unwrap(), Period::Evening);
        assert_eq!(normalize_period("EVENING").unwrap(), Period::Evening);
        assert!(normalize_period("night").is_err());
        assert!(normalize_period("").is_err());
    }

    #[test]
    fn test_slot_key() {
        assert_eq!(slot_key(date!(2025 - 05 - 19), Period::Evening), "2025-05-19-S");
    }

    #[test]
    fn test_canonical_parse_is_strict() {
        assert!(parse_canonical_date("2025-05-19").is_ok());
        assert!(parse_canonical_date("19/05/2025").is_err());
    }
}

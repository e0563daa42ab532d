// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Fixed value sets shared by every offer: day periods, marketplaces
//! and operation types.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One of the three fixed day segments a shift occupies.
///
/// Serialized in canonical code form (`M`, `AM`, `S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Morning segment.
    #[serde(rename = "M")]
    Morning,
    /// Afternoon segment.
    #[serde(rename = "AM")]
    Afternoon,
    /// Evening segment.
    #[serde(rename = "S")]
    Evening,
}

impl Period {
    /// All periods in day order.
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    /// Returns the canonical code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Morning => "M",
            Self::Afternoon => "AM",
            Self::Evening => "S",
        }
    }

    /// Parses a canonical code exactly (no aliases, no case folding).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` for anything other than `M`, `AM` or `S`.
    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        match code {
            "M" => Ok(Self::Morning),
            "AM" => Ok(Self::Afternoon),
            "S" => Ok(Self::Evening),
            _ => Err(DomainError::InvalidPeriod {
                raw: code.to_string(),
            }),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Marketplace discriminator. Fixed at offer creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeType {
    /// Pooled, phase-gated marketplace.
    Bag,
    /// Peer-to-peer marketplace.
    Direct,
}

impl ExchangeType {
    /// Marketplaces in the fixed order used by conflict detection.
    pub const CHECK_ORDER: [Self; 2] = [Self::Bag, Self::Direct];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bag => "bag",
            Self::Direct => "direct",
        }
    }
}

impl FromStr for ExchangeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bag" => Ok(Self::Bag),
            "direct" => Ok(Self::Direct),
            _ => Err(DomainError::InvalidExchangeType(s.to_string())),
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the owner is asking for in exchange for the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Swap for another shift.
    Exchange,
    /// Give the shift away.
    Give,
    /// Ask for a replacement.
    Replacement,
}

impl OperationType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exchange => "exchange",
            Self::Give => "give",
            Self::Replacement => "replacement",
        }
    }
}

impl FromStr for OperationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exchange" => Ok(Self::Exchange),
            "give" => Ok(Self::Give),
            "replacement" => Ok(Self::Replacement),
            _ => Err(DomainError::InvalidOperationType(s.to_string())),
        }
    }
}

/// Canonical, non-empty set of operation types carried by an offer.
///
/// Serialized as a sorted JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<OperationType>", into = "Vec<OperationType>")]
pub struct OperationTypes(BTreeSet<OperationType>);

impl OperationTypes {
    /// Builds a set; an empty input defaults to `{exchange}`.
    #[must_use]
    pub fn new<I: IntoIterator<Item = OperationType>>(types: I) -> Self {
        let mut set: BTreeSet<OperationType> = types.into_iter().collect();
        if set.is_empty() {
            set.insert(OperationType::Exchange);
        }
        Self(set)
    }

    /// Folds the legacy singular `operationType` field into the list form.
    #[must_use]
    pub fn from_legacy(list: &[OperationType], singular: Option<OperationType>) -> Self {
        Self::new(list.iter().copied().chain(singular))
    }

    #[must_use]
    pub fn contains(&self, operation: OperationType) -> bool {
        self.0.contains(&operation)
    }

    /// True when replacement is the only thing being asked for.
    #[must_use]
    pub fn is_replacement_only(&self) -> bool {
        self.0.len() == 1 && self.contains(OperationType::Replacement)
    }

    pub fn iter(&self) -> impl Iterator<Item = OperationType> + '_ {
        self.0.iter().copied()
    }
}

impl Default for OperationTypes {
    fn default() -> Self {
        Self::new([])
    }
}

impl From<Vec<OperationType>> for OperationTypes {
    fn from(types: Vec<OperationType>) -> Self {
        Self::new(types)
    }
}

impl From<OperationTypes> for Vec<OperationType> {
    fn from(types: OperationTypes) -> Self {
        types.0.into_iter().collect()
    }
}

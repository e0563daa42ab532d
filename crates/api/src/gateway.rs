// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Contracts for the external collaborators the engines consume.
//!
//! The planning (who holds which shift) and the user directory live outside
//! this system. The engines only ask them questions through the traits
//! below. `StaticPlanning` and `StaticDirectory` answer from fixed data and
//! back the server when no live collaborator is wired in.

use serde::{Deserialize, Serialize};
use shift_exchange_domain::{Period, ShiftSlot, TenantId, iso_date, slot_key};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use time::Date;

use crate::error::{ApiError, ConflictKind, GatewayError};

/// Directory role that grants visibility of replacement-only offers.
pub const REPLACEMENT_ROLE: &str = "replacement";

/// What a member holds at one slot of the planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub shift_type: String,
    pub time_slot: String,
}

/// Assignments on one date: member, then slot key (`YYYY-MM-DD-P`).
pub type DayAssignments = BTreeMap<String, BTreeMap<String, Assignment>>;

/// Read access to the planning.
pub trait ShiftAssignmentGateway: Send + Sync {
    /// True only if the member's recorded shift at the slot has exactly
    /// this shift type.
    ///
    /// # Errors
    ///
    /// Returns an error if the planning cannot be consulted.
    fn shift_exists(
        &self,
        tenant: &TenantId,
        user_id: &str,
        date: Date,
        period: Period,
        shift_type: &str,
    ) -> Result<bool, GatewayError>;

    /// True if the member holds any shift at the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the planning cannot be consulted.
    fn has_shift_at(
        &self,
        tenant: &TenantId,
        user_id: &str,
        date: Date,
        period: Period,
    ) -> Result<bool, GatewayError>;

    /// Every assignment on a date.
    ///
    /// # Errors
    ///
    /// Returns an error if the planning cannot be consulted.
    fn assignments_for_date(
        &self,
        tenant: &TenantId,
        date: Date,
    ) -> Result<DayAssignments, GatewayError>;
}

/// A member as known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl DirectoryUser {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Read access to member records.
pub trait UserDirectory: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the directory cannot be consulted.
    fn get_by_id(
        &self,
        tenant: &TenantId,
        user_id: &str,
    ) -> Result<Option<DirectoryUser>, GatewayError>;
}

/// Fails unless the planning shows `user_id` holding exactly `slot`.
pub(crate) fn ensure_shift_held(
    gateway: &dyn ShiftAssignmentGateway,
    tenant: &TenantId,
    user_id: &str,
    slot: &ShiftSlot,
) -> Result<(), ApiError> {
    if gateway.shift_exists(tenant, user_id, slot.date, slot.period, &slot.shift_type)? {
        Ok(())
    } else {
        Err(ApiError::conflict(ConflictKind::ShiftNotHeld {
            user_id: user_id.to_string(),
        }))
    }
}

/// One row of a planning fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRecord {
    pub tenant: TenantId,
    pub user_id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub period: Period,
    pub shift_type: String,
    pub time_slot: String,
}

fn read_fixture<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, GatewayError> {
    let invalid = |message: String| GatewayError::InvalidFixture {
        path: path.display().to_string(),
        message,
    };
    let raw: String = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))
}

/// A planning held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticPlanning {
    /// tenant -> date -> member -> slot key -> assignment
    by_date: BTreeMap<TenantId, BTreeMap<Date, DayAssignments>>,
}

impl StaticPlanning {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a planning from records. A later record for the same slot
    /// replaces an earlier one.
    #[must_use]
    pub fn from_records<I: IntoIterator<Item = PlanningRecord>>(records: I) -> Self {
        let mut planning: Self = Self::new();
        for record in records {
            planning.insert(record);
        }
        planning
    }

    /// Loads a JSON array of planning records.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidFixture` if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, GatewayError> {
        let records: Vec<PlanningRecord> = read_fixture(path)?;
        Ok(Self::from_records(records))
    }

    pub fn insert(&mut self, record: PlanningRecord) {
        self.by_date
            .entry(record.tenant)
            .or_default()
            .entry(record.date)
            .or_default()
            .entry(record.user_id)
            .or_default()
            .insert(
                slot_key(record.date, record.period),
                Assignment {
                    shift_type: record.shift_type,
                    time_slot: record.time_slot,
                },
            );
    }

    fn lookup(
        &self,
        tenant: &TenantId,
        user_id: &str,
        date: Date,
        period: Period,
    ) -> Option<&Assignment> {
        self.by_date
            .get(tenant)?
            .get(&date)?
            .get(user_id)?
            .get(&slot_key(date, period))
    }
}

impl ShiftAssignmentGateway for StaticPlanning {
    fn shift_exists(
        &self,
        tenant: &TenantId,
        user_id: &str,
        date: Date,
        period: Period,
        shift_type: &str,
    ) -> Result<bool, GatewayError> {
        Ok(self
            .lookup(tenant, user_id, date, period)
            .is_some_and(|a| a.shift_type == shift_type))
    }

    fn has_shift_at(
        &self,
        tenant: &TenantId,
        user_id: &str,
        date: Date,
        period: Period,
    ) -> Result<bool, GatewayError> {
        Ok(self.lookup(tenant, user_id, date, period).is_some())
    }

    fn assignments_for_date(
        &self,
        tenant: &TenantId,
        date: Date,
    ) -> Result<DayAssignments, GatewayError> {
        Ok(self
            .by_date
            .get(tenant)
            .and_then(|days| days.get(&date))
            .cloned()
            .unwrap_or_default())
    }
}

/// One row of a directory fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub tenant: TenantId,
    #[serde(flatten)]
    pub user: DirectoryUser,
}

/// A user directory held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: BTreeMap<(TenantId, String), DirectoryUser>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records<I: IntoIterator<Item = DirectoryRecord>>(records: I) -> Self {
        let mut directory: Self = Self::new();
        for record in records {
            directory.insert(record.tenant, record.user);
        }
        directory
    }

    /// Loads a JSON array of directory records.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidFixture` if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, GatewayError> {
        let records: Vec<DirectoryRecord> = read_fixture(path)?;
        Ok(Self::from_records(records))
    }

    pub fn insert(&mut self, tenant: TenantId, user: DirectoryUser) {
        self.users.insert((tenant, user.id.clone()), user);
    }
}

impl UserDirectory for StaticDirectory {
    fn get_by_id(
        &self,
        tenant: &TenantId,
        user_id: &str,
    ) -> Result<Option<DirectoryUser>, GatewayError> {
        Ok(self
            .users
            .get(&(tenant.clone(), user_id.to_string()))
            .cloned())
    }
}

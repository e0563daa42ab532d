// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change events published after a mutation commits.
//!
//! Engines only publish. Fan-out to subscribers belongs to whoever
//! implements [`ChangeNotifier`] (the server feeds a snapshot broadcaster).

use serde::{Deserialize, Serialize};
use shift_exchange_domain::{ExchangeType, TenantId};

/// Something in a tenant's persisted state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExchangeEvent {
    /// Offers of one marketplace were created or changed status.
    OffersChanged {
        tenant: TenantId,
        exchange_type: ExchangeType,
    },
    /// The proposal set of a direct offer changed.
    ProposalsChanged { tenant: TenantId, offer_id: i64 },
    /// The pooled marketplace's phase configuration changed.
    PhaseChanged { tenant: TenantId },
    /// A transfer was appended to the history.
    HistoryAppended { tenant: TenantId },
    /// A transfer was marked reverted.
    HistoryReverted { tenant: TenantId, history_id: i64 },
}

impl ExchangeEvent {
    #[must_use]
    pub const fn tenant(&self) -> &TenantId {
        match self {
            Self::OffersChanged { tenant, .. }
            | Self::ProposalsChanged { tenant, .. }
            | Self::PhaseChanged { tenant }
            | Self::HistoryAppended { tenant }
            | Self::HistoryReverted { tenant, .. } => tenant,
        }
    }
}

/// Receives events once the change they describe is durable.
pub trait ChangeNotifier: Send + Sync {
    fn publish(&self, event: ExchangeEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn publish(&self, _event: ExchangeEvent) {}
}

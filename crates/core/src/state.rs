// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_exchange_domain::{BagOffer, DirectOffer, Proposal};
use shift_exchange_history::HistoryEntry;

/// The result of applying a command to a bag offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagTransition {
    /// The offer after the command.
    pub offer: BagOffer,
    /// Present only for the transition that completes the transfer.
    pub history_entry: Option<HistoryEntry>,
    /// False when the command was an idempotent no-op.
    pub changed: bool,
}

/// The result of applying a command to a direct offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectTransition {
    /// The offer after the command.
    pub offer: DirectOffer,
    /// Proposals whose status changed.
    pub updated_proposals: Vec<Proposal>,
    /// Present only when a proposal was accepted.
    pub history_entry: Option<HistoryEntry>,
}

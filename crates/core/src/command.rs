// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// A requested change to a bag offer, expressed as data only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BagCommand {
    /// Add a member to the interest set. Adding twice is a no-op.
    AddInterest { user_id: String },
    /// Remove a member from the interest set. Removing a non-member is a no-op.
    RemoveInterest { user_id: String },
    /// Pair the offer with one of the interested members.
    RecordMatch {
        matched_user_id: String,
        /// Present when the match is a permutation.
        matched_shift_type: Option<String>,
    },
    /// Confirm the recorded match and complete the transfer.
    ValidateMatch { matched_user_id: String },
    /// Undo the recorded match and return the offer to the pool.
    RejectMatch,
    /// Owner withdraws the offer.
    Cancel,
    /// Administrator dismisses the offer after conflict review.
    Reject,
}

impl BagCommand {
    /// Short operation name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddInterest { .. } => "add_interest",
            Self::RemoveInterest { .. } => "remove_interest",
            Self::RecordMatch { .. } => "record_match",
            Self::ValidateMatch { .. } => "validate_match",
            Self::RejectMatch => "reject_match",
            Self::Cancel => "cancel",
            Self::Reject => "reject",
        }
    }
}

/// A requested change to a direct offer or one of its proposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectCommand {
    /// Register a new proposal from a member.
    AddProposal { proposing_user_id: String },
    /// Owner accepts one proposal; all pending siblings are rejected.
    AcceptProposal { proposal_id: i64 },
    /// Owner turns down one proposal.
    RejectProposal { proposal_id: i64 },
    /// Proposer takes back their own proposal.
    WithdrawProposal { proposal_id: i64, user_id: String },
    /// Owner withdraws the offer. Outstanding proposals are left untouched.
    Cancel,
}

impl DirectCommand {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddProposal { .. } => "add_proposal",
            Self::AcceptProposal { .. } => "accept_proposal",
            Self::RejectProposal { .. } => "reject_proposal",
            Self::WithdrawProposal { .. } => "withdraw_proposal",
            Self::Cancel => "cancel",
        }
    }
}

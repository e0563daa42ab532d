// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{BagCommand, DirectCommand};
use crate::error::CoreError;
use crate::state::{BagTransition, DirectTransition};
use shift_exchange_domain::{
    BagOffer, BagOfferStatus, DirectOffer, DirectOfferStatus, Phase, Proposal, ProposalStatus,
};
use shift_exchange_history::{HistoryEntry, TransferContext};
use time::OffsetDateTime;

fn move_bag(
    offer: &mut BagOffer,
    to: BagOfferStatus,
    operation: &'static str,
) -> Result<(), CoreError> {
    offer
        .status
        .validate_transition(to)
        .map_err(|_| CoreError::InvalidState {
            entity: "bag offer",
            id: offer.offer_id,
            status: offer.status.as_str().to_string(),
            operation,
        })?;
    offer.status = to;
    Ok(())
}

fn bag_invalid_state(offer: &BagOffer, operation: &'static str) -> CoreError {
    CoreError::InvalidState {
        entity: "bag offer",
        id: offer.offer_id,
        status: offer.status.as_str().to_string(),
        operation,
    }
}

fn move_direct(
    offer: &mut DirectOffer,
    to: DirectOfferStatus,
    operation: &'static str,
) -> Result<(), CoreError> {
    offer
        .status
        .validate_transition(to)
        .map_err(|_| CoreError::InvalidState {
            entity: "direct offer",
            id: offer.offer_id,
            status: offer.status.as_str().to_string(),
            operation,
        })?;
    offer.status = to;
    Ok(())
}

fn move_proposal(
    proposal: &mut Proposal,
    to: ProposalStatus,
    operation: &'static str,
    now: OffsetDateTime,
) -> Result<(), CoreError> {
    proposal
        .status
        .validate_transition(to)
        .map_err(|_| CoreError::InvalidState {
            entity: "proposal",
            id: proposal.proposal_id,
            status: proposal.status.as_str().to_string(),
            operation,
        })?;
    proposal.status = to;
    proposal.last_modified = now;
    Ok(())
}

/// Applies a command to a bag offer.
///
/// The offer passed in is the state read inside the caller's transaction;
/// it is never mutated. The returned transition carries the new offer and,
/// for match validation only, the history entry to append.
///
/// # Errors
///
/// Returns an error if:
/// - The offer is not in the status the operation requires; a terminal
///   offer reports this before any phase check
/// - The current phase forbids the operation (cancel outside submission,
///   match outside matching)
/// - Interest is withdrawn by the member the offer is matched to
/// - The owner expresses interest in their own offer
/// - The matched member is not interested, or differs at validation
pub fn apply_bag(
    offer: &BagOffer,
    command: BagCommand,
    phase: Phase,
    now: OffsetDateTime,
) -> Result<BagTransition, CoreError> {
    let operation: &'static str = command.name();
    let mut next: BagOffer = offer.clone();
    let mut history_entry: Option<HistoryEntry> = None;

    let changed: bool = match command {
        BagCommand::AddInterest { user_id } => {
            if user_id == offer.owner_user_id {
                return Err(CoreError::SelfInterest {
                    offer_id: offer.offer_id,
                    user_id,
                });
            }
            if offer.status != BagOfferStatus::Pending {
                return Err(CoreError::OfferUnavailable {
                    offer_id: offer.offer_id,
                    status: offer.status.as_str().to_string(),
                });
            }
            next.interested_users.insert(user_id)
        }
        BagCommand::RemoveInterest { user_id } => {
            if offer.status.is_terminal() {
                return Err(bag_invalid_state(offer, operation));
            }
            // The matched member must be released through reject_match first.
            if offer.status == BagOfferStatus::Matched
                && offer.matched_user_id.as_deref() == Some(user_id.as_str())
            {
                return Err(bag_invalid_state(offer, operation));
            }
            next.interested_users.remove(&user_id)
        }
        BagCommand::RecordMatch {
            matched_user_id,
            matched_shift_type,
        } => {
            if phase != Phase::Matching {
                return Err(CoreError::PhaseViolation { operation, phase });
            }
            move_bag(&mut next, BagOfferStatus::Matched, operation)?;
            if !offer.interested_users.contains(&matched_user_id) {
                return Err(CoreError::NotInterested {
                    offer_id: offer.offer_id,
                    user_id: matched_user_id,
                });
            }
            next.matched_user_id = Some(matched_user_id);
            next.matched_shift_type = matched_shift_type;
            next.matched_at = Some(now);
            true
        }
        BagCommand::ValidateMatch { matched_user_id } => {
            if offer.status != BagOfferStatus::Matched {
                return Err(bag_invalid_state(offer, operation));
            }
            if offer.matched_user_id.as_deref() != Some(matched_user_id.as_str()) {
                return Err(CoreError::MatchMismatch {
                    offer_id: offer.offer_id,
                    expected: offer.matched_user_id.clone(),
                    actual: matched_user_id,
                });
            }
            move_bag(&mut next, BagOfferStatus::Validated, operation)?;

            history_entry = Some(HistoryEntry::completed(
                offer.tenant.clone(),
                &offer.owner_user_id,
                &matched_user_id,
                &offer.slot,
                now,
                TransferContext::Bag {
                    offer_id: offer.offer_id,
                    is_permutation: offer.matched_shift_type.is_some(),
                    matched_shift_type: offer.matched_shift_type.clone(),
                },
            ));
            true
        }
        BagCommand::RejectMatch => {
            if offer.status != BagOfferStatus::Matched {
                return Err(bag_invalid_state(offer, operation));
            }
            move_bag(&mut next, BagOfferStatus::Pending, operation)?;
            next.clear_match();
            true
        }
        BagCommand::Cancel => {
            if offer.status.is_terminal() {
                return Err(bag_invalid_state(offer, operation));
            }
            if phase != Phase::Submission {
                return Err(CoreError::PhaseViolation { operation, phase });
            }
            move_bag(&mut next, BagOfferStatus::Cancelled, operation)?;
            true
        }
        BagCommand::Reject => {
            move_bag(&mut next, BagOfferStatus::Rejected, operation)?;
            next.clear_match();
            true
        }
    };

    if changed {
        next.last_modified = now;
    }

    Ok(BagTransition {
        offer: next,
        history_entry,
        changed,
    })
}

fn find_proposal(
    offer: &DirectOffer,
    proposals: &[Proposal],
    proposal_id: i64,
) -> Result<Proposal, CoreError> {
    proposals
        .iter()
        .find(|p| p.proposal_id == proposal_id && p.target_offer_id == offer.offer_id)
        .cloned()
        .ok_or(CoreError::ProposalNotFound {
            offer_id: offer.offer_id,
            proposal_id,
        })
}

fn any_pending_besides(proposals: &[Proposal], proposal_id: i64) -> bool {
    proposals
        .iter()
        .any(|p| p.proposal_id != proposal_id && p.status == ProposalStatus::Pending)
}

/// Applies a command to a direct offer and its proposal set.
///
/// `proposals` must be every proposal targeting the offer, as read inside
/// the caller's transaction. Only proposals whose status changed are
/// returned.
///
/// # Errors
///
/// Returns an error if:
/// - The offer is not pending when a proposal is added or accepted
/// - The owner proposes on their own offer, or a member proposes twice
/// - The proposal does not exist, is not pending, or (for withdrawal)
///   belongs to someone else
/// - A cancel arrives after the offer reached a terminal status
#[allow(clippy::too_many_lines)]
pub fn apply_direct(
    offer: &DirectOffer,
    proposals: &[Proposal],
    command: DirectCommand,
    now: OffsetDateTime,
) -> Result<DirectTransition, CoreError> {
    let operation: &'static str = command.name();
    let mut next: DirectOffer = offer.clone();
    let mut updated_proposals: Vec<Proposal> = Vec::new();
    let mut history_entry: Option<HistoryEntry> = None;

    match command {
        DirectCommand::AddProposal { proposing_user_id } => {
            if offer.status != DirectOfferStatus::Pending {
                return Err(CoreError::OfferUnavailable {
                    offer_id: offer.offer_id,
                    status: offer.status.as_str().to_string(),
                });
            }
            if proposing_user_id == offer.owner_user_id {
                return Err(CoreError::SelfInterest {
                    offer_id: offer.offer_id,
                    user_id: proposing_user_id,
                });
            }
            if proposals.iter().any(|p| {
                p.proposing_user_id == proposing_user_id && p.status == ProposalStatus::Pending
            }) {
                return Err(CoreError::DuplicateProposal {
                    offer_id: offer.offer_id,
                    user_id: proposing_user_id,
                });
            }
            next.has_proposals = true;
        }
        DirectCommand::AcceptProposal { proposal_id } => {
            let mut accepted: Proposal = find_proposal(offer, proposals, proposal_id)?;
            if offer.status != DirectOfferStatus::Pending {
                return Err(CoreError::OfferUnavailable {
                    offer_id: offer.offer_id,
                    status: offer.status.as_str().to_string(),
                });
            }
            move_proposal(&mut accepted, ProposalStatus::Accepted, operation, now)?;

            for sibling in proposals.iter().filter(|p| {
                p.proposal_id != proposal_id && p.status == ProposalStatus::Pending
            }) {
                let mut rejected: Proposal = sibling.clone();
                move_proposal(&mut rejected, ProposalStatus::Rejected, operation, now)?;
                updated_proposals.push(rejected);
            }

            move_direct(&mut next, DirectOfferStatus::Validated, operation)?;
            next.accepted_by = Some(accepted.proposing_user_id.clone());
            next.accepted_at = Some(now);

            history_entry = Some(HistoryEntry::completed(
                offer.tenant.clone(),
                &offer.owner_user_id,
                &accepted.proposing_user_id,
                &offer.slot,
                now,
                TransferContext::Direct {
                    offer_id: offer.offer_id,
                    proposal_id,
                    is_permutation: accepted.is_permutation(),
                },
            ));
            updated_proposals.insert(0, accepted);
        }
        DirectCommand::RejectProposal { proposal_id } => {
            let mut rejected: Proposal = find_proposal(offer, proposals, proposal_id)?;
            move_proposal(&mut rejected, ProposalStatus::Rejected, operation, now)?;
            next.has_proposals = any_pending_besides(proposals, proposal_id);
            updated_proposals.push(rejected);
        }
        DirectCommand::WithdrawProposal {
            proposal_id,
            user_id,
        } => {
            let mut withdrawn: Proposal = find_proposal(offer, proposals, proposal_id)?;
            if withdrawn.proposing_user_id != user_id {
                return Err(CoreError::NotProposer {
                    proposal_id,
                    user_id,
                });
            }
            move_proposal(&mut withdrawn, ProposalStatus::Rejected, operation, now)?;
            next.has_proposals = any_pending_besides(proposals, proposal_id);
            updated_proposals.push(withdrawn);
        }
        DirectCommand::Cancel => {
            move_direct(&mut next, DirectOfferStatus::Cancelled, operation)?;
        }
    }

    next.last_modified = now;

    Ok(DirectTransition {
        offer: next,
        updated_proposals,
        history_entry,
    })
}

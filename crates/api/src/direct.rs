// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Direct (peer-to-peer) exchange engine.
//!
//! Members answer a direct offer with proposals; the owner accepts one.
//! Acceptance completes the transfer: the accepted proposal, every
//! rejected sibling, the offer and the history entry are written in one
//! transaction.

use serde::{Deserialize, Serialize};
use shift_exchange::{DirectCommand, DirectTransition, apply_direct};
use shift_exchange_domain::{
    DirectOffer, DirectOfferStatus, ExchangeType, OfferDraft, OfferFilter, OfferPayload, Period,
    Proposal, ProposalDraft, ProposalPayload, TenantId, validate_proposal_payload,
};
use shift_exchange_history::HistoryEntry;
use shift_exchange_persistence::{ExchangeTx, Persistence};
use time::{Date, OffsetDateTime};
use tracing::info;

use crate::ExchangeContext;
use crate::conflict::{BLOCKING_STATUSES, find_conflict};
use crate::error::{ApiError, ConflictKind};
use crate::gateway::ensure_shift_held;
use crate::listing::{Visibility, resolve_statuses};
use crate::notify::ExchangeEvent;
use crate::retry::with_retry;

/// Everything written when a proposal is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acceptance {
    pub offer: DirectOffer,
    pub accepted: Proposal,
    /// Pending siblings rejected by the acceptance.
    pub rejected: Vec<Proposal>,
    pub history_entry: HistoryEntry,
}

fn load_offer(
    tx: &mut ExchangeTx<'_>,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<DirectOffer, ApiError> {
    tx.get_direct_offer(tenant, offer_id)?
        .ok_or_else(|| ApiError::not_found("Direct offer", offer_id))
}

fn load_proposal(
    tx: &mut ExchangeTx<'_>,
    tenant: &TenantId,
    proposal_id: i64,
) -> Result<Proposal, ApiError> {
    tx.get_proposal(tenant, proposal_id)?
        .ok_or_else(|| ApiError::not_found("Proposal", proposal_id))
}

/// Publishes a direct offer.
///
/// Same validation, ownership and conflict pipeline as the bag
/// marketplace, without a phase gate.
///
/// # Errors
///
/// Returns an error if:
/// - Required fields are missing or malformed
/// - The owner does not hold the shift, or the slot is already offered
/// - The planning or the store fails
pub fn create_direct_offer(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    payload: &OfferPayload,
    now: OffsetDateTime,
) -> Result<DirectOffer, ApiError> {
    let draft: OfferDraft = OfferDraft::from_payload(payload)?;
    ensure_shift_held(ctx.gateway, tenant, &draft.owner_user_id, &draft.slot)?;

    let offer: DirectOffer = with_retry("create_direct_offer", || {
        persistence.atomic::<_, ApiError, _>(|tx| {
            let owner: &str = &draft.owner_user_id;
            let date: Date = draft.slot.date;
            let period: Period = draft.slot.period;

            if let Some(marketplace) =
                find_conflict(tx, tenant, owner, date, period, Some(ExchangeType::Direct))?
            {
                return Err(ApiError::conflict(ConflictKind::OtherMarketplace {
                    marketplace,
                }));
            }
            if tx
                .find_blocking_offer(
                    tenant,
                    ExchangeType::Direct,
                    owner,
                    date,
                    period,
                    &BLOCKING_STATUSES,
                )?
                .is_some()
            {
                return Err(ApiError::conflict(ConflictKind::DuplicateOffer {
                    marketplace: ExchangeType::Direct,
                }));
            }

            let offer_id: i64 = tx.insert_offer(tenant, ExchangeType::Direct, &draft, now)?;
            load_offer(tx, tenant, offer_id)
        })
    })?;

    info!(
        tenant = %tenant,
        offer_id = offer.offer_id,
        owner_user_id = %offer.owner_user_id,
        date = %offer.slot.date,
        period = %offer.slot.period,
        "Direct offer created"
    );
    ctx.notifier.publish(ExchangeEvent::OffersChanged {
        tenant: tenant.clone(),
        exchange_type: ExchangeType::Direct,
    });
    Ok(offer)
}

/// Lists direct offers matching `filter`, ordered by date.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for an unknown status name, or an
/// error if the directory or the store fails.
pub fn list_direct_offers(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    filter: &OfferFilter,
    viewer: Option<&str>,
) -> Result<Vec<DirectOffer>, ApiError> {
    let statuses: Vec<&'static str> = resolve_statuses(
        &filter.statuses,
        &DirectOfferStatus::ACTIVE,
        DirectOfferStatus::as_str,
    )?;
    let visibility: Visibility = Visibility::for_viewer(ctx.directory, tenant, viewer)?;

    let offers: Vec<DirectOffer> = persistence
        .read::<_, ApiError, _>(|tx| Ok(tx.list_direct_offers(tenant, filter, &statuses)?))?;

    Ok(offers
        .into_iter()
        .filter(|o| visibility.can_see(&o.owner_user_id, &o.operation_types))
        .collect())
}

/// Returns one direct offer.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the offer does not exist in the direct
/// marketplace of `tenant`.
pub fn get_direct_offer(
    persistence: &mut Persistence,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<DirectOffer, ApiError> {
    persistence.read(|tx| load_offer(tx, tenant, offer_id))
}

/// Registers a proposal on a pending direct offer.
///
/// A counter-shift makes the proposal a permutation; the planning must
/// show the proposer holding it. A proposer who already works at the
/// offer's slot may only propose by swapping that very shift.
///
/// # Errors
///
/// Returns an error if:
/// - Required fields are missing or malformed
/// - The offer does not exist or is no longer pending
/// - The proposer owns the offer or already has a pending proposal on it
/// - The proposer does not hold the counter-shift, or is busy at the slot
pub fn create_proposal(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    payload: &ProposalPayload,
    now: OffsetDateTime,
) -> Result<Proposal, ApiError> {
    let draft: ProposalDraft = validate_proposal_payload(payload)?;
    let offer_id: i64 = draft.target_offer_id;
    let proposer: &str = &draft.proposing_user_id;

    let offer: DirectOffer = get_direct_offer(persistence, tenant, offer_id)?;
    if offer.status != DirectOfferStatus::Pending {
        return Err(ApiError::OfferUnavailable {
            offer_id,
            status: offer.status.as_str().to_string(),
        });
    }
    if offer.owner_user_id == proposer {
        return Err(ApiError::conflict(ConflictKind::SelfInterest { offer_id }));
    }

    if let Some(counter_shift) = &draft.counter_shift {
        ensure_shift_held(ctx.gateway, tenant, proposer, counter_shift)?;
    }
    let swaps_same_slot: bool = draft
        .counter_shift
        .as_ref()
        .is_some_and(|cs| cs.same_time_as(offer.slot.date, offer.slot.period));
    if !swaps_same_slot
        && ctx
            .gateway
            .has_shift_at(tenant, proposer, offer.slot.date, offer.slot.period)?
    {
        return Err(ApiError::conflict(ConflictKind::OwnSlotOccupied {
            user_id: proposer.to_string(),
        }));
    }

    let proposal: Proposal = with_retry("create_proposal", || {
        persistence.atomic::<_, ApiError, _>(|tx| {
            let current: DirectOffer = load_offer(tx, tenant, offer_id)?;
            let proposals: Vec<Proposal> = tx.list_proposals_for_offer(tenant, offer_id)?;
            let command: DirectCommand = DirectCommand::AddProposal {
                proposing_user_id: proposer.to_string(),
            };
            let transition: DirectTransition = apply_direct(&current, &proposals, command, now)?;

            tx.save_direct_offer(&transition.offer)?;
            let proposal_id: i64 = tx.insert_proposal(tenant, &draft, now)?;
            load_proposal(tx, tenant, proposal_id)
        })
    })?;

    info!(
        tenant = %tenant,
        offer_id,
        proposal_id = proposal.proposal_id,
        proposing_user_id = proposer,
        permutation = proposal.is_permutation(),
        "Proposal created"
    );
    publish_offer_changes(ctx, tenant, offer_id);
    Ok(proposal)
}

/// Lists every proposal on an offer, oldest first.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the offer does not exist.
pub fn list_proposals_for_offer(
    persistence: &mut Persistence,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<Vec<Proposal>, ApiError> {
    persistence.read(|tx| {
        load_offer(tx, tenant, offer_id)?;
        Ok(tx.list_proposals_for_offer(tenant, offer_id)?)
    })
}

/// Lists every proposal made by a member, newest first.
///
/// # Errors
///
/// Returns a storage error if the query fails.
pub fn list_proposals_by_user(
    persistence: &mut Persistence,
    tenant: &TenantId,
    user_id: &str,
) -> Result<Vec<Proposal>, ApiError> {
    persistence.read(|tx| Ok(tx.list_proposals_by_user(tenant, user_id)?))
}

fn publish_offer_changes(ctx: &ExchangeContext<'_>, tenant: &TenantId, offer_id: i64) {
    ctx.notifier.publish(ExchangeEvent::ProposalsChanged {
        tenant: tenant.clone(),
        offer_id,
    });
    ctx.notifier.publish(ExchangeEvent::OffersChanged {
        tenant: tenant.clone(),
        exchange_type: ExchangeType::Direct,
    });
}

/// Applies `command` to the offer found by `locate`, writing the offer,
/// every changed proposal and any history entry in one retried unit.
fn run_command<L>(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    locate: L,
    command: &DirectCommand,
    now: OffsetDateTime,
) -> Result<DirectTransition, ApiError>
where
    L: Fn(&mut ExchangeTx<'_>) -> Result<i64, ApiError>,
{
    let operation: &'static str = command.name();

    let transition: DirectTransition = with_retry(operation, || {
        persistence.atomic::<_, ApiError, _>(|tx| {
            let offer_id: i64 = locate(&mut *tx)?;
            let current: DirectOffer = load_offer(tx, tenant, offer_id)?;
            let proposals: Vec<Proposal> = tx.list_proposals_for_offer(tenant, offer_id)?;
            let transition: DirectTransition =
                apply_direct(&current, &proposals, command.clone(), now)?;

            let offer: DirectOffer = tx.save_direct_offer(&transition.offer)?;
            for proposal in &transition.updated_proposals {
                tx.save_proposal(proposal)?;
            }
            let history_entry: Option<HistoryEntry> = match transition.history_entry {
                Some(entry) => {
                    let history_id: i64 = tx.insert_history_entry(&entry)?;
                    Some(entry.with_history_id(history_id))
                }
                None => None,
            };
            Ok(DirectTransition {
                offer,
                updated_proposals: transition.updated_proposals,
                history_entry,
            })
        })
    })?;

    info!(
        tenant = %tenant,
        offer_id = transition.offer.offer_id,
        operation,
        status = transition.offer.status.as_str(),
        proposals_changed = transition.updated_proposals.len(),
        "Direct offer updated"
    );
    publish_offer_changes(ctx, tenant, transition.offer.offer_id);
    if transition.history_entry.is_some() {
        ctx.notifier.publish(ExchangeEvent::HistoryAppended {
            tenant: tenant.clone(),
        });
    }
    Ok(transition)
}

/// Accepts a proposal, completing the transfer.
///
/// In one transaction the proposal becomes `accepted`, every other pending
/// proposal on the offer becomes `rejected`, the offer becomes `validated`
/// and one history entry is appended. A concurrent second acceptance sees
/// the validated offer and fails.
///
/// # Errors
///
/// Returns an error if:
/// - The proposal or offer does not exist, or the proposal targets
///   another offer
/// - The offer is no longer pending
/// - The proposal is no longer pending
pub fn accept_proposal(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    proposal_id: i64,
    offer_id: i64,
    now: OffsetDateTime,
) -> Result<Acceptance, ApiError> {
    let command: DirectCommand = DirectCommand::AcceptProposal { proposal_id };
    let transition: DirectTransition = run_command(
        persistence,
        ctx,
        tenant,
        |tx| {
            let proposal: Proposal = load_proposal(tx, tenant, proposal_id)?;
            if proposal.target_offer_id == offer_id {
                Ok(offer_id)
            } else {
                Err(ApiError::not_found("Proposal", proposal_id))
            }
        },
        &command,
        now,
    )?;

    let mut updated: std::vec::IntoIter<Proposal> = transition.updated_proposals.into_iter();
    match (updated.next(), transition.history_entry) {
        (Some(accepted), Some(history_entry)) => Ok(Acceptance {
            offer: transition.offer,
            accepted,
            rejected: updated.collect(),
            history_entry,
        }),
        _ => Err(ApiError::Storage {
            message: format!("acceptance of proposal {proposal_id} produced no transfer"),
        }),
    }
}

/// Locates the offer a proposal targets.
fn offer_of(
    tenant: &TenantId,
    proposal_id: i64,
) -> impl Fn(&mut ExchangeTx<'_>) -> Result<i64, ApiError> + '_ {
    move |tx| Ok(load_proposal(tx, tenant, proposal_id)?.target_offer_id)
}

/// Turns down one proposal. The offer and other proposals are unaffected.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the proposal does not exist, or
/// `ApiError::InvalidState` if it is no longer pending.
pub fn reject_proposal(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    proposal_id: i64,
    now: OffsetDateTime,
) -> Result<Proposal, ApiError> {
    let command: DirectCommand = DirectCommand::RejectProposal { proposal_id };
    let transition: DirectTransition =
        run_command(persistence, ctx, tenant, offer_of(tenant, proposal_id), &command, now)?;
    single_proposal(transition, proposal_id)
}

/// Withdraws a proposal on behalf of the member who made it.
///
/// # Errors
///
/// Returns an error if the proposal does not exist, is no longer pending,
/// or was made by someone other than `user_id`.
pub fn withdraw_proposal(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    proposal_id: i64,
    user_id: &str,
    now: OffsetDateTime,
) -> Result<Proposal, ApiError> {
    let command: DirectCommand = DirectCommand::WithdrawProposal {
        proposal_id,
        user_id: user_id.to_string(),
    };
    let transition: DirectTransition =
        run_command(persistence, ctx, tenant, offer_of(tenant, proposal_id), &command, now)?;
    single_proposal(transition, proposal_id)
}

fn single_proposal(transition: DirectTransition, proposal_id: i64) -> Result<Proposal, ApiError> {
    transition
        .updated_proposals
        .into_iter()
        .find(|p| p.proposal_id == proposal_id)
        .ok_or_else(|| ApiError::not_found("Proposal", proposal_id))
}

/// Withdraws a direct offer on behalf of its owner.
///
/// Outstanding proposals keep their status; they can no longer be
/// accepted because the offer is not pending.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the offer does not exist, or
/// `ApiError::InvalidState` if it already reached a terminal status.
pub fn cancel_direct_offer(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    now: OffsetDateTime,
) -> Result<DirectOffer, ApiError> {
    run_command(persistence, ctx, tenant, |_| Ok(offer_id), &DirectCommand::Cancel, now)
        .map(|t| t.offer)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bag (pooled) exchange engine.
//!
//! Offers are submitted while the tenant's phase is `SUBMISSION`, collect
//! interest, and are matched, validated or rejected by administrators once
//! the phase moves on.
//!
//! Every mutation runs as one unit of work: the offer is re-read inside an
//! immediate transaction, the command is applied to that snapshot, and the
//! result is written with a version check. Contention retries the unit.

use shift_exchange::{BagCommand, BagTransition, apply_bag};
use shift_exchange_domain::{
    BagOffer, BagOfferStatus, ExchangeType, OfferDraft, OfferFilter, OfferPayload, Period, Phase,
    TenantId,
};
use shift_exchange_history::HistoryEntry;
use shift_exchange_persistence::{ExchangeTx, Persistence};
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

use crate::ExchangeContext;
use crate::conflict::{BLOCKING_STATUSES, find_conflict};
use crate::error::{ApiError, ConflictKind};
use crate::gateway::ensure_shift_held;
use crate::listing::{Visibility, resolve_statuses};
use crate::notify::ExchangeEvent;
use crate::phase::phase_in;
use crate::retry::with_retry;

fn require_submission(phase: Phase, operation: &str) -> Result<(), ApiError> {
    if phase == Phase::Submission {
        Ok(())
    } else {
        Err(ApiError::PhaseViolation {
            operation: operation.to_string(),
            phase,
        })
    }
}

fn load_offer(
    tx: &mut ExchangeTx<'_>,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<BagOffer, ApiError> {
    tx.get_bag_offer(tenant, offer_id)?
        .ok_or_else(|| ApiError::not_found("Bag offer", offer_id))
}

/// Submits a new bag offer.
///
/// The payload is validated and normalized, the planning must show the
/// owner holding the offered shift, and the slot must not already be
/// committed in either marketplace.
///
/// # Errors
///
/// Returns an error if:
/// - The phase is not `SUBMISSION`
/// - Required fields are missing or malformed
/// - The owner does not hold the shift, or the slot is already offered
/// - The planning or the store fails
pub fn create_bag_offer(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    payload: &OfferPayload,
    now: OffsetDateTime,
) -> Result<BagOffer, ApiError> {
    let phase: Phase = persistence.read(|tx| phase_in(tx, tenant, now))?;
    require_submission(phase, "create_offer")?;

    let draft: OfferDraft = OfferDraft::from_payload(payload)?;
    ensure_shift_held(ctx.gateway, tenant, &draft.owner_user_id, &draft.slot)?;

    let offer: BagOffer = with_retry("create_bag_offer", || {
        persistence.atomic::<_, ApiError, _>(|tx| {
            // The deadline may have passed while the planning was consulted.
            require_submission(phase_in(tx, tenant, now)?, "create_offer")?;

            let owner: &str = &draft.owner_user_id;
            let date: Date = draft.slot.date;
            let period: Period = draft.slot.period;

            if let Some(marketplace) =
                find_conflict(tx, tenant, owner, date, period, Some(ExchangeType::Bag))?
            {
                return Err(ApiError::conflict(ConflictKind::OtherMarketplace {
                    marketplace,
                }));
            }
            if tx
                .find_blocking_offer(
                    tenant,
                    ExchangeType::Bag,
                    owner,
                    date,
                    period,
                    &BLOCKING_STATUSES,
                )?
                .is_some()
            {
                return Err(ApiError::conflict(ConflictKind::DuplicateOffer {
                    marketplace: ExchangeType::Bag,
                }));
            }

            let offer_id: i64 = tx.insert_offer(tenant, ExchangeType::Bag, &draft, now)?;
            load_offer(tx, tenant, offer_id)
        })
    })?;

    info!(
        tenant = %tenant,
        offer_id = offer.offer_id,
        owner_user_id = %offer.owner_user_id,
        date = %offer.slot.date,
        period = %offer.slot.period,
        "Bag offer created"
    );
    ctx.notifier.publish(ExchangeEvent::OffersChanged {
        tenant: tenant.clone(),
        exchange_type: ExchangeType::Bag,
    });
    Ok(offer)
}

/// Lists bag offers matching `filter`, ordered by date.
///
/// When `viewer` is given, replacement-only offers are hidden unless the
/// viewer owns them or holds the replacement role.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for an unknown status name, or an
/// error if the directory or the store fails.
pub fn list_bag_offers(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    filter: &OfferFilter,
    viewer: Option<&str>,
) -> Result<Vec<BagOffer>, ApiError> {
    let statuses: Vec<&'static str> =
        resolve_statuses(&filter.statuses, &BagOfferStatus::ACTIVE, BagOfferStatus::as_str)?;
    let visibility: Visibility = Visibility::for_viewer(ctx.directory, tenant, viewer)?;

    let offers: Vec<BagOffer> = persistence
        .read::<_, ApiError, _>(|tx| Ok(tx.list_bag_offers(tenant, filter, &statuses)?))?;

    Ok(offers
        .into_iter()
        .filter(|o| visibility.can_see(&o.owner_user_id, &o.operation_types))
        .collect())
}

/// Returns one bag offer.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the offer does not exist in the bag
/// marketplace of `tenant`.
pub fn get_bag_offer(
    persistence: &mut Persistence,
    tenant: &TenantId,
    offer_id: i64,
) -> Result<BagOffer, ApiError> {
    persistence.read(|tx| load_offer(tx, tenant, offer_id))
}

/// Applies `command` to the offer as one retried unit of work.
fn run_command(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    command: &BagCommand,
    now: OffsetDateTime,
) -> Result<BagTransition, ApiError> {
    let operation: &'static str = command.name();

    let transition: BagTransition = with_retry(operation, || {
        persistence.atomic::<_, ApiError, _>(|tx| {
            let current: BagOffer = load_offer(tx, tenant, offer_id)?;
            let phase: Phase = phase_in(tx, tenant, now)?;
            let transition: BagTransition = apply_bag(&current, command.clone(), phase, now)?;
            if !transition.changed {
                return Ok(transition);
            }

            let offer: BagOffer = tx.save_bag_offer(&transition.offer)?;
            let history_entry: Option<HistoryEntry> = match transition.history_entry {
                Some(entry) => {
                    let history_id: i64 = tx.insert_history_entry(&entry)?;
                    Some(entry.with_history_id(history_id))
                }
                None => None,
            };
            Ok(BagTransition {
                offer,
                history_entry,
                changed: true,
            })
        })
    })?;

    if !transition.changed {
        debug!(tenant = %tenant, offer_id, operation, "Bag command left offer unchanged");
        return Ok(transition);
    }

    info!(
        tenant = %tenant,
        offer_id,
        operation,
        status = transition.offer.status.as_str(),
        "Bag offer updated"
    );
    ctx.notifier.publish(ExchangeEvent::OffersChanged {
        tenant: tenant.clone(),
        exchange_type: ExchangeType::Bag,
    });
    if transition.history_entry.is_some() {
        ctx.notifier.publish(ExchangeEvent::HistoryAppended {
            tenant: tenant.clone(),
        });
    }
    Ok(transition)
}

/// Registers `user_id`'s interest in an offer. Registering twice is a no-op.
///
/// # Errors
///
/// Returns an error if:
/// - The offer does not exist or is no longer pending
/// - `user_id` owns the offer
/// - `user_id` already holds a shift at the offer's slot
pub fn add_interest(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    user_id: &str,
    now: OffsetDateTime,
) -> Result<BagOffer, ApiError> {
    let offer: BagOffer = get_bag_offer(persistence, tenant, offer_id)?;
    if offer.owner_user_id == user_id {
        return Err(ApiError::conflict(ConflictKind::SelfInterest { offer_id }));
    }
    if ctx
        .gateway
        .has_shift_at(tenant, user_id, offer.slot.date, offer.slot.period)?
    {
        return Err(ApiError::conflict(ConflictKind::OwnSlotOccupied {
            user_id: user_id.to_string(),
        }));
    }

    let command: BagCommand = BagCommand::AddInterest {
        user_id: user_id.to_string(),
    };
    run_command(persistence, ctx, tenant, offer_id, &command, now).map(|t| t.offer)
}

/// Withdraws `user_id`'s interest. Withdrawing absent interest is a no-op.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the offer does not exist.
pub fn remove_interest(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    user_id: &str,
    now: OffsetDateTime,
) -> Result<BagOffer, ApiError> {
    let command: BagCommand = BagCommand::RemoveInterest {
        user_id: user_id.to_string(),
    };
    run_command(persistence, ctx, tenant, offer_id, &command, now).map(|t| t.offer)
}

/// Pairs a pending offer with one of its interested members.
///
/// `matched_shift_type` is set when the match is a permutation.
///
/// # Errors
///
/// Returns an error if the phase is not `MATCHING`, the offer is not
/// pending, or the member has not expressed interest.
pub fn record_match(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    matched_user_id: &str,
    matched_shift_type: Option<&str>,
    now: OffsetDateTime,
) -> Result<BagOffer, ApiError> {
    let command: BagCommand = BagCommand::RecordMatch {
        matched_user_id: matched_user_id.to_string(),
        matched_shift_type: matched_shift_type.map(ToString::to_string),
    };
    run_command(persistence, ctx, tenant, offer_id, &command, now).map(|t| t.offer)
}

/// Confirms a recorded match, completing the transfer.
///
/// The offer moves to `validated` and exactly one history entry is
/// appended, in the same transaction.
///
/// # Errors
///
/// Returns `ApiError::InvalidState` unless the offer is matched to
/// `matched_user_id`.
pub fn validate_match(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    matched_user_id: &str,
    now: OffsetDateTime,
) -> Result<(BagOffer, HistoryEntry), ApiError> {
    let command: BagCommand = BagCommand::ValidateMatch {
        matched_user_id: matched_user_id.to_string(),
    };
    let transition: BagTransition =
        run_command(persistence, ctx, tenant, offer_id, &command, now)?;

    match transition.history_entry {
        Some(entry) => Ok((transition.offer, entry)),
        None => Err(ApiError::Storage {
            message: format!("validation of offer {offer_id} produced no history entry"),
        }),
    }
}

/// Undoes a recorded match and returns the offer to the pool.
///
/// # Errors
///
/// Returns `ApiError::InvalidState` unless the offer is matched.
pub fn reject_match(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    now: OffsetDateTime,
) -> Result<BagOffer, ApiError> {
    run_command(persistence, ctx, tenant, offer_id, &BagCommand::RejectMatch, now)
        .map(|t| t.offer)
}

/// Withdraws an offer on behalf of its owner.
///
/// # Errors
///
/// Returns `ApiError::PhaseViolation` outside `SUBMISSION`, or
/// `ApiError::InvalidState` if the offer is no longer pending.
pub fn cancel_bag_offer(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    now: OffsetDateTime,
) -> Result<BagOffer, ApiError> {
    run_command(persistence, ctx, tenant, offer_id, &BagCommand::Cancel, now).map(|t| t.offer)
}

/// Dismisses an offer during administrative conflict review.
///
/// # Errors
///
/// Returns `ApiError::InvalidState` if the offer is already terminal.
pub fn reject_bag_offer(
    persistence: &mut Persistence,
    ctx: &ExchangeContext<'_>,
    tenant: &TenantId,
    offer_id: i64,
    now: OffsetDateTime,
) -> Result<BagOffer, ApiError> {
    run_command(persistence, ctx, tenant, offer_id, &BagCommand::Reject, now).map(|t| t.offer)
}

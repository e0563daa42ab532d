// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Route handlers.
//!
//! Handlers parse the tenant and the request, lock the store, call the
//! matching api operation and shape the response. They hold no business
//! rules of their own.

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shift_exchange_api::{
    Acceptance, ConflictCheck, DayAssignments, accept_proposal, add_interest, assignments_for_date,
    can_submit, cancel_bag_offer, cancel_direct_offer, configure_phase, create_bag_offer,
    create_direct_offer, create_proposal, current_phase, detect_conflict, get_phase_config,
    list_bag_offers, list_direct_offers, list_proposals_by_user, list_proposals_for_offer,
    query_history, record_match, reject_bag_offer, reject_match, reject_proposal, remove_interest,
    revert_transfer, validate_match, withdraw_proposal,
};
use shift_exchange_domain::{
    BagOffer, DirectOffer, ExchangeType, OfferFilter, OfferPayload, Period, Phase, PhaseConfig,
    Proposal, ProposalPayload, TenantId, normalize_date, normalize_period,
};
use shift_exchange_history::HistoryEntry;
use shift_exchange_persistence::Persistence;
use time::{Date, OffsetDateTime};
use tokio::sync::MutexGuard;
use tracing::info;

use crate::AppState;
use crate::error::HttpError;

fn tenant_of(raw: &str) -> Result<TenantId, HttpError> {
    Ok(TenantId::parse(raw)?)
}

/// Query parameters shared by both offer listings.
///
/// `status` is a comma-separated list; `period`, `from` and `to` accept any
/// raw form the normalizer accepts.
#[derive(Debug, Default, Deserialize)]
pub struct OfferQuery {
    owner: Option<String>,
    interested: Option<String>,
    status: Option<String>,
    period: Option<String>,
    from: Option<String>,
    to: Option<String>,
    viewer: Option<String>,
}

impl OfferQuery {
    fn filter(&self) -> Result<OfferFilter, HttpError> {
        let statuses: Vec<String> = self
            .status
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let period: Option<Period> = self.period.as_deref().map(normalize_period).transpose()?;
        let date_from: Option<Date> = self.from.as_deref().map(normalize_date).transpose()?;
        let date_to: Option<Date> = self.to.as_deref().map(normalize_date).transpose()?;

        Ok(OfferFilter {
            owner_user_id: self.owner.clone(),
            interested_user_id: self.interested.clone(),
            statuses,
            period,
            date_from,
            date_to,
        })
    }
}

/// Body naming the member acting on an offer or proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub matched_user_id: String,
    #[serde(default)]
    pub matched_shift_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptRequest {
    pub offer_id: i64,
}

/// A validated bag match and the transfer it recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub offer: BagOffer,
    pub history_entry: HistoryEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResponse {
    pub phase: Phase,
    pub can_submit: bool,
    pub config: Option<PhaseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanSubmitResponse {
    pub can_submit: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProposalsQuery {
    user: String,
}

#[derive(Debug, Deserialize)]
pub struct ConflictQuery {
    user: String,
    date: String,
    period: String,
    exclude: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    user: Option<String>,
    limit: Option<u32>,
}

// ========================================================================
// Bag marketplace
// ========================================================================

/// Handler for POST `/tenants/{tenant}/bag/offers`.
pub async fn handle_create_bag_offer(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Json(payload): Json<OfferPayload>,
) -> Result<(StatusCode, Json<BagOffer>), HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, owner = ?payload.owner_user_id, "Handling create_bag_offer request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: BagOffer = create_bag_offer(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        &payload,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok((StatusCode::CREATED, Json(offer)))
}

/// Handler for GET `/tenants/{tenant}/bag/offers`.
pub async fn handle_list_bag_offers(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<BagOffer>>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    let filter: OfferFilter = query.filter()?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offers: Vec<BagOffer> = list_bag_offers(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        &filter,
        query.viewer.as_deref(),
    )?;
    drop(persistence);

    Ok(Json(offers))
}

/// Handler for POST `/tenants/{tenant}/bag/offers/{id}/cancel`.
pub async fn handle_cancel_bag_offer(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
) -> Result<Json<BagOffer>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, offer_id, "Handling cancel_bag_offer request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: BagOffer = cancel_bag_offer(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(offer))
}

/// Handler for POST `/tenants/{tenant}/bag/offers/{id}/reject`.
///
/// Administrative dismissal during conflict review.
pub async fn handle_reject_bag_offer(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
) -> Result<Json<BagOffer>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, offer_id, "Handling reject_bag_offer request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: BagOffer = reject_bag_offer(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(offer))
}

/// Handler for POST `/tenants/{tenant}/bag/offers/{id}/interest`.
pub async fn handle_add_interest(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<BagOffer>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, offer_id, user_id = %req.user_id, "Handling add_interest request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: BagOffer = add_interest(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        &req.user_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(offer))
}

/// Handler for DELETE `/tenants/{tenant}/bag/offers/{id}/interest`.
pub async fn handle_remove_interest(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<BagOffer>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, offer_id, user_id = %req.user_id, "Handling remove_interest request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: BagOffer = remove_interest(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        &req.user_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(offer))
}

/// Handler for POST `/tenants/{tenant}/bag/offers/{id}/match`.
pub async fn handle_record_match(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<BagOffer>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(
        tenant = %tenant,
        offer_id,
        matched_user_id = %req.matched_user_id,
        "Handling record_match request"
    );

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: BagOffer = record_match(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        &req.matched_user_id,
        req.matched_shift_type.as_deref(),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(offer))
}

/// Handler for POST `/tenants/{tenant}/bag/offers/{id}/match/validate`.
pub async fn handle_validate_match(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<ValidationResponse>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, offer_id, "Handling validate_match request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let (offer, history_entry): (BagOffer, HistoryEntry) = validate_match(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        &req.matched_user_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(ValidationResponse {
        offer,
        history_entry,
    }))
}

/// Handler for POST `/tenants/{tenant}/bag/offers/{id}/match/reject`.
pub async fn handle_reject_match(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
) -> Result<Json<BagOffer>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, offer_id, "Handling reject_match request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: BagOffer = reject_match(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(offer))
}

/// Handler for GET `/tenants/{tenant}/bag/phase`.
pub async fn handle_get_phase(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<PhaseResponse>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let phase: Phase = current_phase(&mut persistence, &tenant, OffsetDateTime::now_utc())?;
    let config: Option<PhaseConfig> = get_phase_config(&mut persistence, &tenant)?;
    drop(persistence);

    Ok(Json(PhaseResponse {
        phase,
        can_submit: phase == Phase::Submission,
        config,
    }))
}

/// Handler for PUT `/tenants/{tenant}/bag/phase`.
pub async fn handle_configure_phase(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Json(config): Json<PhaseConfig>,
) -> Result<Json<PhaseResponse>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, declared = config.phase.as_str(), "Handling configure_phase request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let phase: Phase = configure_phase(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        &config,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(PhaseResponse {
        phase,
        can_submit: phase == Phase::Submission,
        config: Some(config),
    }))
}

/// Handler for GET `/tenants/{tenant}/bag/can-submit`.
pub async fn handle_can_submit(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<CanSubmitResponse>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let allowed: bool = can_submit(&mut persistence, &tenant, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(CanSubmitResponse {
        can_submit: allowed,
    }))
}

// ========================================================================
// Direct marketplace
// ========================================================================

/// Handler for POST `/tenants/{tenant}/direct/offers`.
pub async fn handle_create_direct_offer(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Json(payload): Json<OfferPayload>,
) -> Result<(StatusCode, Json<DirectOffer>), HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, owner = ?payload.owner_user_id, "Handling create_direct_offer request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: DirectOffer = create_direct_offer(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        &payload,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok((StatusCode::CREATED, Json(offer)))
}

/// Handler for GET `/tenants/{tenant}/direct/offers`.
pub async fn handle_list_direct_offers(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<DirectOffer>>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    let filter: OfferFilter = query.filter()?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offers: Vec<DirectOffer> = list_direct_offers(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        &filter,
        query.viewer.as_deref(),
    )?;
    drop(persistence);

    Ok(Json(offers))
}

/// Handler for POST `/tenants/{tenant}/direct/offers/{id}/cancel`.
pub async fn handle_cancel_direct_offer(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
) -> Result<Json<DirectOffer>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, offer_id, "Handling cancel_direct_offer request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let offer: DirectOffer = cancel_direct_offer(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        offer_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(offer))
}

/// Handler for POST `/tenants/{tenant}/direct/offers/{id}/proposals`.
///
/// The target offer comes from the path; any `targetOfferId` in the body is
/// ignored.
pub async fn handle_create_proposal(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
    Json(body): Json<ProposalPayload>,
) -> Result<(StatusCode, Json<Proposal>), HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    let payload: ProposalPayload = ProposalPayload {
        target_offer_id: offer_id,
        ..body
    };
    info!(
        tenant = %tenant,
        offer_id,
        proposer = ?payload.proposing_user_id,
        "Handling create_proposal request"
    );

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let proposal: Proposal = create_proposal(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        &payload,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// Handler for GET `/tenants/{tenant}/direct/offers/{id}/proposals`.
pub async fn handle_list_offer_proposals(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, offer_id)): Path<(String, i64)>,
) -> Result<Json<Vec<Proposal>>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let proposals: Vec<Proposal> = list_proposals_for_offer(&mut persistence, &tenant, offer_id)?;
    drop(persistence);

    Ok(Json(proposals))
}

/// Handler for GET `/tenants/{tenant}/direct/proposals?user=`.
pub async fn handle_list_user_proposals(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<ProposalsQuery>,
) -> Result<Json<Vec<Proposal>>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let proposals: Vec<Proposal> = list_proposals_by_user(&mut persistence, &tenant, &query.user)?;
    drop(persistence);

    Ok(Json(proposals))
}

/// Handler for POST `/tenants/{tenant}/direct/proposals/{id}/accept`.
pub async fn handle_accept_proposal(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, proposal_id)): Path<(String, i64)>,
    Json(req): Json<AcceptRequest>,
) -> Result<Json<Acceptance>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(
        tenant = %tenant,
        proposal_id,
        offer_id = req.offer_id,
        "Handling accept_proposal request"
    );

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let acceptance: Acceptance = accept_proposal(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        proposal_id,
        req.offer_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(acceptance))
}

/// Handler for POST `/tenants/{tenant}/direct/proposals/{id}/reject`.
pub async fn handle_reject_proposal(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, proposal_id)): Path<(String, i64)>,
) -> Result<Json<Proposal>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, proposal_id, "Handling reject_proposal request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let proposal: Proposal = reject_proposal(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        proposal_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(proposal))
}

/// Handler for POST `/tenants/{tenant}/direct/proposals/{id}/withdraw`.
pub async fn handle_withdraw_proposal(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, proposal_id)): Path<(String, i64)>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<Proposal>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(
        tenant = %tenant,
        proposal_id,
        user_id = %req.user_id,
        "Handling withdraw_proposal request"
    );

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let proposal: Proposal = withdraw_proposal(
        &mut persistence,
        &app_state.ctx(),
        &tenant,
        proposal_id,
        &req.user_id,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(Json(proposal))
}

// ========================================================================
// Shared views
// ========================================================================

/// Handler for GET `/tenants/{tenant}/conflicts`.
pub async fn handle_detect_conflict(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<ConflictQuery>,
) -> Result<Json<ConflictCheck>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    let exclude: Option<ExchangeType> = query
        .exclude
        .as_deref()
        .map(str::parse::<ExchangeType>)
        .transpose()?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let check: ConflictCheck = detect_conflict(
        &mut persistence,
        &tenant,
        &query.user,
        &query.date,
        &query.period,
        exclude,
    )?;
    drop(persistence);

    Ok(Json(check))
}

/// Handler for GET `/tenants/{tenant}/history`.
pub async fn handle_query_history(
    AxumState(app_state): AxumState<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let entries: Vec<HistoryEntry> =
        query_history(&mut persistence, &tenant, query.user.as_deref(), query.limit)?;
    drop(persistence);

    Ok(Json(entries))
}

/// Handler for POST `/tenants/{tenant}/history/{id}/revert`.
pub async fn handle_revert_transfer(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, history_id)): Path<(String, i64)>,
) -> Result<Json<HistoryEntry>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    info!(tenant = %tenant, history_id, "Handling revert_transfer request");

    let mut persistence: MutexGuard<'_, Persistence> = app_state.persistence.lock().await;
    let entry: HistoryEntry =
        revert_transfer(&mut persistence, &app_state.ctx(), &tenant, history_id)?;
    drop(persistence);

    Ok(Json(entry))
}

/// Handler for GET `/tenants/{tenant}/planning/{date}`.
#[allow(clippy::unused_async)]
pub async fn handle_planning(
    AxumState(app_state): AxumState<AppState>,
    Path((tenant, date)): Path<(String, String)>,
) -> Result<Json<DayAssignments>, HttpError> {
    let tenant: TenantId = tenant_of(&tenant)?;
    let assignments: DayAssignments = assignments_for_date(&app_state.ctx(), &tenant, &date)?;
    Ok(Json(assignments))
}

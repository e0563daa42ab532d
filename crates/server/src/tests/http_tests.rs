// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::{Router, http::StatusCode};
use shift_exchange_api::{Acceptance, ConflictCheck, DayAssignments};
use shift_exchange_domain::{
    BagOffer, BagOfferStatus, DirectOffer, ExchangeType, Period, Phase, Proposal,
};
use shift_exchange_history::HistoryEntry;

use super::{create_test_app, offer_body, read_json, send_empty, send_json};
use crate::error::ErrorResponse;
use crate::handlers::{AcceptRequest, CanSubmitResponse, MemberRequest, PhaseResponse};

async fn create_bag(app: &Router, owner: &str) -> BagOffer {
    let response = send_json(app, "POST", "/tenants/assoc-1/bag/offers", &offer_body(owner)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn create_direct(app: &Router, owner: &str) -> DirectOffer {
    let response =
        send_json(app, "POST", "/tenants/assoc-1/direct/offers", &offer_body(owner)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn test_create_bag_offer_normalizes_and_lists() {
    let (_state, app) = create_test_app();

    let offer: BagOffer = create_bag(&app, "U1").await;
    assert_eq!(offer.status, BagOfferStatus::Pending);
    assert_eq!(offer.slot.period, Period::Evening);
    assert_eq!(offer.slot.date.to_string(), "2025-05-19");

    let response = send_empty(&app, "GET", "/tenants/assoc-1/bag/offers?owner=U1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let offers: Vec<BagOffer> = read_json(response).await;
    assert_eq!(offers, vec![offer]);
}

#[tokio::test]
async fn test_missing_fields_are_bad_request() {
    let (_state, app) = create_test_app();

    let response = send_json(
        &app,
        "POST",
        "/tenants/assoc-1/bag/offers",
        &serde_json::json!({ "ownerUserId": "U1", "date": "2025-05-19" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert!(error.error);
    assert_eq!(error.kind, "validation");
    assert!(error.message.contains("period"));
}

#[tokio::test]
async fn test_cross_marketplace_conflict_names_the_marketplace() {
    let (_state, app) = create_test_app();
    create_bag(&app, "U1").await;

    let response =
        send_json(&app, "POST", "/tenants/assoc-1/direct/offers", &offer_body("U1")).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.kind, "conflict");
    assert_eq!(error.conflicting_marketplace, Some(ExchangeType::Bag));
}

#[tokio::test]
async fn test_unknown_offer_is_not_found() {
    let (_state, app) = create_test_app();

    let response = send_empty(&app, "POST", "/tenants/assoc-1/bag/offers/999/cancel").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.kind, "not_found");
}

#[tokio::test]
async fn test_matching_phase_blocks_bag_submission() {
    let (_state, app) = create_test_app();

    let response = send_json(
        &app,
        "PUT",
        "/tenants/assoc-1/bag/phase",
        &serde_json::json!({
            "phase": "distribution",
            "submissionDeadline": "2025-05-01T00:00:00Z",
            "isConfigured": true,
            "isValidated": false,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let configured: PhaseResponse = read_json(response).await;
    assert_eq!(configured.phase, Phase::Matching);
    assert!(!configured.can_submit);

    let response = send_empty(&app, "GET", "/tenants/assoc-1/bag/can-submit").await;
    let can_submit: CanSubmitResponse = read_json(response).await;
    assert!(!can_submit.can_submit);

    let response = send_json(&app, "POST", "/tenants/assoc-1/bag/offers", &offer_body("U1")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.kind, "phase_violation");

    // The direct marketplace has no phase gate.
    create_direct(&app, "U1").await;
}

#[tokio::test]
async fn test_direct_acceptance_records_one_transfer() {
    let (_state, app) = create_test_app();
    let offer: DirectOffer = create_direct(&app, "U1").await;
    let proposals_uri: String = format!("/tenants/assoc-1/direct/offers/{}/proposals", offer.offer_id);

    let response = send_json(
        &app,
        "POST",
        &proposals_uri,
        &serde_json::json!({ "proposingUserId": "U2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let proposal: Proposal = read_json(response).await;
    assert_eq!(proposal.target_offer_id, offer.offer_id);

    let accept_uri: String = format!(
        "/tenants/assoc-1/direct/proposals/{}/accept",
        proposal.proposal_id
    );
    let request: AcceptRequest = AcceptRequest {
        offer_id: offer.offer_id,
    };
    let response = send_json(&app, "POST", &accept_uri, &request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let acceptance: Acceptance = read_json(response).await;
    assert_eq!(acceptance.offer.accepted_by.as_deref(), Some("U2"));
    assert_eq!(acceptance.history_entry.original_user_id, "U1");

    let response = send_json(&app, "POST", &accept_uri, &request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send_empty(&app, "GET", "/tenants/assoc-1/history?user=U1").await;
    let history: Vec<HistoryEntry> = read_json(response).await;
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_only_the_proposer_may_withdraw() {
    let (_state, app) = create_test_app();
    let offer: DirectOffer = create_direct(&app, "U1").await;
    let response = send_json(
        &app,
        "POST",
        &format!("/tenants/assoc-1/direct/offers/{}/proposals", offer.offer_id),
        &serde_json::json!({ "proposingUserId": "U2" }),
    )
    .await;
    let proposal: Proposal = read_json(response).await;
    let withdraw_uri: String = format!(
        "/tenants/assoc-1/direct/proposals/{}/withdraw",
        proposal.proposal_id
    );

    let stranger: MemberRequest = MemberRequest {
        user_id: String::from("U3"),
    };
    let response = send_json(&app, "POST", &withdraw_uri, &stranger).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let proposer: MemberRequest = MemberRequest {
        user_id: String::from("U2"),
    };
    let response = send_json(&app, "POST", &withdraw_uri, &proposer).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_empty(&app, "GET", "/tenants/assoc-1/direct/proposals?user=U2").await;
    let mine: Vec<Proposal> = read_json(response).await;
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn test_replacement_offers_follow_viewer_role() {
    let (_state, app) = create_test_app();
    let mut body: serde_json::Value = offer_body("U1");
    body["operationTypes"] = serde_json::json!(["replacement"]);
    let response = send_json(&app, "POST", "/tenants/assoc-1/bag/offers", &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let hidden: Vec<BagOffer> =
        read_json(send_empty(&app, "GET", "/tenants/assoc-1/bag/offers?viewer=U2").await).await;
    let shown: Vec<BagOffer> =
        read_json(send_empty(&app, "GET", "/tenants/assoc-1/bag/offers?viewer=R1").await).await;
    let own: Vec<BagOffer> =
        read_json(send_empty(&app, "GET", "/tenants/assoc-1/bag/offers?viewer=U1").await).await;

    assert!(hidden.is_empty());
    assert_eq!(shown.len(), 1);
    assert_eq!(own.len(), 1);
}

#[tokio::test]
async fn test_conflict_check_endpoint() {
    let (_state, app) = create_test_app();
    create_bag(&app, "U1").await;

    let response = send_empty(
        &app,
        "GET",
        "/tenants/assoc-1/conflicts?user=U1&date=2025-05-19&period=soir",
    )
    .await;
    let check: ConflictCheck = read_json(response).await;
    assert!(check.conflict);
    assert_eq!(check.conflicting_marketplace, Some(ExchangeType::Bag));

    let response = send_empty(
        &app,
        "GET",
        "/tenants/assoc-1/conflicts?user=U1&date=2025-05-19&period=S&exclude=pool",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_planning_snapshot() {
    let (_state, app) = create_test_app();

    let response = send_empty(&app, "GET", "/tenants/assoc-1/planning/2025-05-19").await;

    assert_eq!(response.status(), StatusCode::OK);
    let day: DayAssignments = read_json(response).await;
    assert_eq!(day["U1"]["2025-05-19-S"].shift_type, "CA");
    assert_eq!(day["U4"]["2025-05-19-S"].shift_type, "JR");
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test module for the server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod http_tests;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shift_exchange_api::{
    DirectoryUser, NoopNotifier, PlanningRecord, StaticDirectory, StaticPlanning,
};
use shift_exchange_domain::{Period, TenantId};
use shift_exchange_persistence::Persistence;
use time::macros::date;
use tower::ServiceExt;

use crate::{AppState, build_router};

pub const TENANT: &str = "assoc-1";

fn record(user_id: &str, period: Period, shift_type: &str) -> PlanningRecord {
    PlanningRecord {
        tenant: TenantId::new(TENANT),
        user_id: user_id.to_string(),
        date: date!(2025 - 05 - 19),
        period,
        shift_type: shift_type.to_string(),
        time_slot: String::from("19:00-07:00"),
    }
}

/// U1 and U4 work the evening of 2025-05-19; R1 holds the replacement role.
pub fn create_test_app_state() -> AppState {
    let persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create in-memory persistence");
    let planning: StaticPlanning = StaticPlanning::from_records([
        record("U1", Period::Evening, "CA"),
        record("U4", Period::Evening, "JR"),
    ]);
    let mut directory: StaticDirectory = StaticDirectory::new();
    directory.insert(
        TenantId::new(TENANT),
        DirectoryUser {
            id: String::from("R1"),
            roles: [String::from("replacement")].into_iter().collect(),
        },
    );
    AppState::new(
        persistence,
        Arc::new(planning),
        Arc::new(directory),
        Arc::new(NoopNotifier),
    )
}

pub fn create_test_app() -> (AppState, Router) {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    (app_state, app)
}

pub fn offer_body(owner: &str) -> serde_json::Value {
    serde_json::json!({
        "ownerUserId": owner,
        "date": "19/05/2025",
        "period": "soir",
        "shiftType": "CA",
        "timeSlot": "19:00-07:00",
    })
}

/// Sends a JSON request to a clone of the router.
pub async fn send_json<B: Serialize>(
    app: &Router,
    method: &str,
    uri: &str,
    body: &B,
) -> Response<Body> {
    let request: Request<Body> = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Sends a request without a body to a clone of the router.
pub async fn send_empty(app: &Router, method: &str, uri: &str) -> Response<Body> {
    let request: Request<Body> = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes: axum::body::Bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

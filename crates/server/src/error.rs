// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use shift_exchange_api::ApiError;
use shift_exchange_domain::{DomainError, ExchangeType};
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `true`.
    pub error: bool,
    /// Stable machine-readable error kind.
    pub kind: String,
    pub message: String,
    /// Set when the request collided with the other marketplace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_marketplace: Option<ExchangeType>,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    conflicting_marketplace: Option<ExchangeType>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            kind: self.kind.to_string(),
            message: self.message,
            conflicting_marketplace: self.conflicting_marketplace,
        });
        (self.status, body).into_response()
    }
}

const fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Validation { .. } | ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
        ApiError::Conflict { .. }
        | ApiError::InvalidState { .. }
        | ApiError::OfferUnavailable { .. } => StatusCode::CONFLICT,
        ApiError::PhaseViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::Contention { .. } | ApiError::Dependency(_) => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = status_for(&err);
        match &err {
            ApiError::Storage { .. } => error!(error = %err, "Storage failure"),
            ApiError::Contention { .. } | ApiError::Dependency(_) => {
                warn!(error = %err, "Transient failure");
            }
            _ => {}
        }

        let conflicting_marketplace: Option<ExchangeType> = match &err {
            ApiError::Conflict { kind } => kind.conflicting_marketplace(),
            _ => None,
        };

        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
            conflicting_marketplace,
        }
    }
}

impl From<DomainError> for HttpError {
    fn from(err: DomainError) -> Self {
        Self::from(ApiError::from(err))
    }
}

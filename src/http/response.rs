//! Response handling.
//!
//! # Responsibilities
//! - Map service errors to HTTP status codes and JSON bodies
//! - Define the health payload
//!
//! # Design Decisions
//! - Circuit-open is 503 with the breaker state and a `Retry-After` hint
//! - Exhausted transient failures are 500
//! - Not-found keeps the `{"detail": ...}` shape

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::http::request::InvalidRequest;
use crate::resilience::CircuitState;
use crate::store::StoreError;

/// Body of `GET /healthz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub cb_state: CircuitState,
}

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequest),

    #[error("User not found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::CircuitOpen(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(StoreError::WriteFailed { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match self {
            ApiError::Store(StoreError::CircuitOpen(e)) => {
                let mut response = (
                    status,
                    Json(json!({ "error": message, "cb_state": e.state })),
                )
                    .into_response();

                // Whole seconds, rounded up so clients never retry early
                let secs = e.retry_after.as_secs() + u64::from(e.retry_after.subsec_nanos() > 0);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            ApiError::NotFound => (status, Json(json!({ "detail": message }))).into_response(),
            _ => (status, Json(json!({ "error": message }))).into_response(),
        }
    }
}

//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::{CreateUserRequest, InvalidRequest};
use crate::http::response::{ApiError, HealthResponse};
use crate::http::server::AppState;
use crate::store::{NewUser, UserRecord};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// `POST /user`
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, ApiError> {
    let Json(request) = payload.map_err(|e| InvalidRequest::Malformed(e.body_text()))?;
    let new_user = NewUser::try_from(request)?;

    let record = state.service.create_user(&new_user).await?;
    Ok(Json(record))
}

/// `GET /user/{user_id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    state
        .service
        .get_user(&user_id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        cb_state: state.service.breaker_state(),
    })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

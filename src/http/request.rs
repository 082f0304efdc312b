//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Validate the create-user payload before it reaches the service
//!
//! # Design Decisions
//! - An incoming `x-request-id` is kept as-is
//! - Validation reports the first offending field only

use axum::http::{HeaderValue, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::store::NewUser;

/// Header carrying the request ID, both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

const MAX_USER_ID_LEN: usize = 128;

/// Makes a fresh UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Body of `POST /user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Payload rejected before any store interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("user_id must be at most {MAX_USER_ID_LEN} characters")]
    UserIdTooLong,

    #[error("email is not a valid address")]
    Email,

    #[error("malformed body: {0}")]
    Malformed(String),
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = InvalidRequest;

    fn try_from(request: CreateUserRequest) -> Result<Self, Self::Error> {
        // The key is stored exactly as sent; only blank ids are rejected
        if request.user_id.trim().is_empty() {
            return Err(InvalidRequest::Empty("user_id"));
        }
        if request.user_id.chars().count() > MAX_USER_ID_LEN {
            return Err(InvalidRequest::UserIdTooLong);
        }
        if request.name.trim().is_empty() {
            return Err(InvalidRequest::Empty("name"));
        }
        if request.phone.trim().is_empty() {
            return Err(InvalidRequest::Empty("phone"));
        }
        if !is_valid_email(&request.email) {
            return Err(InvalidRequest::Email);
        }

        Ok(NewUser {
            user_id: request.user_id,
            name: request.name,
            email: request.email,
            phone: request.phone,
        })
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Dotted domain with no empty labels
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, payload validation)
//!     → handlers.rs (UserService calls)
//!     → response.rs (error → status mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CreateUserRequest, InvalidRequest, UuidRequestId, X_REQUEST_ID};
pub use response::{ApiError, HealthResponse};
pub use server::{AppState, HttpServer};

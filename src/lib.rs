//! User metadata service library.
//!
//! A small HTTP service whose writes are protected by a circuit breaker,
//! an idempotent store with failure injection, and a bounded retry loop.

// Core
pub mod resilience;
pub mod store;
pub mod users;

// Transport
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use users::UserService;

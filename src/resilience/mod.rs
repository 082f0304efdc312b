//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical store write:
//!     → retries.rs (bounded attempts, retry only transient failures)
//!     → backoff.rs (exponential delay, clamped, plus jitter)
//!     → circuit_breaker.rs (admit before, signal after each attempt)
//! ```
//!
//! # Design Decisions
//! - Circuit open is never retried; it surfaces immediately
//! - The breaker is a plain state machine, its owner serialises access
//! - Random sources are injected so tests can pin them

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{CircuitBreaker, CircuitOpenError, CircuitState};
pub use retries::{execute_with_retry, RetryPolicy, Retryable};

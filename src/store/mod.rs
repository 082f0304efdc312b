//! User storage subsystem.
//!
//! # Data Flow
//! ```text
//! UserRecord
//!     → guarded.rs (breaker admit, idempotency, failure injection, persist)
//!     → DashMap<user_id, UserRecord> (volatile, process-local)
//! ```
//!
//! # Design Decisions
//! - Idempotency is enforced at the store boundary: first write wins
//! - Idempotent replays bypass failure injection
//! - Reads never consult the breaker

pub mod guarded;
pub mod injection;
pub mod record;

use thiserror::Error;

use crate::resilience::{CircuitOpenError, Retryable};

pub use guarded::GuardedStore;
pub use injection::FailureInjector;
pub use record::{NewUser, UserRecord};

/// Errors surfaced by store writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The breaker rejected the write. Never retried.
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    /// Transient write failure. Safe to retry.
    #[error("Store write failed for user '{user_id}'")]
    WriteFailed { user_id: String },
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::WriteFailed { .. })
    }
}

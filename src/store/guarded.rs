//! Idempotent, breaker-protected user store.
//!
//! # Write Path
//! ```text
//! write(record)
//!     → breaker.admit_call()          (reject: CircuitOpen, nothing else touched)
//!     → user_id already stored?       (yes: record_success, return stored copy)
//!     → injector.should_fail()?       (yes: record_failure, WriteFailed)
//!     → insert, record_success, return record
//! ```
//!
//! The breaker and injector live behind one mutex and every insertion happens
//! while it is held, so each write is a single critical section. Records sit
//! in a `DashMap`, which lets reads bypass that lock.

use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};

use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, CircuitState};
use crate::store::injection::FailureInjector;
use crate::store::record::UserRecord;
use crate::store::StoreError;

/// State mutated by writes.
#[derive(Debug)]
struct WritePath {
    breaker: CircuitBreaker,
    injector: FailureInjector,
}

/// Outcome label for a completed write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Persisted,
    Replayed,
    InjectedFailure,
    Rejected,
}

impl WriteOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Persisted => "persisted",
            Self::Replayed => "replayed",
            Self::InjectedFailure => "injected_failure",
            Self::Rejected => "rejected",
        }
    }
}

impl WritePath {
    fn write(
        &mut self,
        records: &DashMap<String, UserRecord>,
        record: UserRecord,
    ) -> (WriteOutcome, Result<UserRecord, StoreError>) {
        if let Err(e) = self.breaker.admit_call() {
            return (WriteOutcome::Rejected, Err(e.into()));
        }

        let existing = records.get(&record.user_id).map(|r| r.value().clone());
        if let Some(existing) = existing {
            self.breaker.record_success();
            return (WriteOutcome::Replayed, Ok(existing));
        }

        if self.injector.should_fail() {
            self.breaker.record_failure();
            let user_id = record.user_id;
            return (WriteOutcome::InjectedFailure, Err(StoreError::WriteFailed { user_id }));
        }

        records.insert(record.user_id.clone(), record.clone());
        self.breaker.record_success();
        (WriteOutcome::Persisted, Ok(record))
    }
}

/// In-memory user store guarded by a circuit breaker.
#[derive(Debug)]
pub struct GuardedStore {
    records: DashMap<String, UserRecord>,
    write_path: Mutex<WritePath>,
}

impl GuardedStore {
    /// Create an empty store that owns the given breaker and injector.
    pub fn new(breaker: CircuitBreaker, injector: FailureInjector) -> Self {
        metrics::record_breaker_state(breaker.state());
        Self {
            records: DashMap::new(),
            write_path: Mutex::new(WritePath { breaker, injector }),
        }
    }

    /// Idempotent write keyed by `record.user_id`. The first write wins.
    pub fn write(&self, record: UserRecord) -> Result<UserRecord, StoreError> {
        let user_id = record.user_id.clone();
        let mut path = self.lock();

        let before = path.breaker.state();
        let (outcome, result) = path.write(&self.records, record);
        let after = path.breaker.state();
        drop(path);

        metrics::record_store_write(outcome.as_str());
        if before != after {
            tracing::warn!(from = %before, to = %after, user_id = %user_id, "Circuit breaker state changed");
            metrics::record_breaker_transition(before, after);
            metrics::record_breaker_state(after);
        }
        tracing::debug!(user_id = %user_id, outcome = outcome.as_str(), "Store write");

        result
    }

    /// Read a record. Reads are not protected by the breaker.
    pub fn get(&self, user_id: &str) -> Option<UserRecord> {
        self.records.get(user_id).map(|r| r.value().clone())
    }

    /// Breaker state as last left by a write. Never triggers a transition.
    pub fn current_breaker_state(&self) -> CircuitState {
        self.lock().breaker.state()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, WritePath> {
        // Every mutation completes before anything can panic, so a poisoned
        // guard still holds consistent state
        self.write_path.lock().unwrap_or_else(|e| e.into_inner())
    }
}

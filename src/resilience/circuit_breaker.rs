//! Circuit breaker for store protection.
//!
//! # States
//! - Closed: normal operation, writes pass through
//! - Open: store assumed unhealthy, writes fail fast
//! - Half-Open: probing whether the store recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: recovery timeout elapsed, checked lazily by admit_call()
//! Half-Open → Closed: half_open_successes >= required successes
//! Half-Open → Open: any failure (counter reset, timer restarted)
//! ```
//!
//! # Design Decisions
//! - Pure state machine: no locking, no I/O, no logging. The owner serialises
//!   access and reports transitions.
//! - No background timer. A breaker without traffic stays Open past its
//!   timeout until the next admit_call().
//! - Time comes from `tokio::time::Instant` so tests can pause the clock.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Writes flow normally.
    Closed,
    /// Writes are rejected.
    Open,
    /// Writes are admitted to test recovery.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`CircuitBreaker::admit_call`] while the circuit is open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Circuit breaker is {state} (store writes blocked)")]
pub struct CircuitOpenError {
    /// State at the time of rejection.
    pub state: CircuitState,
    /// Time left before a trial call will be admitted.
    pub retry_after: Duration,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    recovery_timeout: Duration,
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_successes: u32,
}

impl CircuitBreaker {
    /// Create a closed circuit breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let recovery_timeout =
            Duration::try_from_secs_f64(config.recovery_timeout_secs).unwrap_or(Duration::ZERO);

        Self {
            config,
            recovery_timeout,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            half_open_successes: 0,
        }
    }

    /// Pre-call check.
    ///
    /// Open circuits whose recovery timeout has elapsed move to half-open here
    /// and the call is admitted in the same step.
    pub fn admit_call(&mut self) -> Result<(), CircuitOpenError> {
        if self.state != CircuitState::Open {
            return Ok(());
        }

        let elapsed = self
            .opened_at
            .map(|opened_at| opened_at.elapsed())
            .unwrap_or(Duration::MAX);

        if elapsed >= self.recovery_timeout {
            self.state = CircuitState::HalfOpen;
            self.half_open_successes = 0;
            Ok(())
        } else {
            Err(CircuitOpenError {
                state: self.state,
                retry_after: self.recovery_timeout - elapsed,
            })
        }
    }

    /// Report a successful call.
    pub fn record_success(&mut self) {
        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_successes += 1;
                if self.half_open_successes >= self.config.half_open_successes {
                    self.state = CircuitState::Closed;
                    self.consecutive_failures = 0;
                }
            }
            CircuitState::Closed | CircuitState::Open => {
                self.consecutive_failures = 0;
            }
        }
    }

    /// Report a failed call.
    pub fn record_failure(&mut self) {
        if self.state == CircuitState::HalfOpen {
            // A single failed trial call is decisive
            self.trip();
            self.consecutive_failures = 0;
            return;
        }

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.config.failure_threshold {
            self.trip();
        }
    }

    fn trip(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
    }

    /// Current state. Does not apply the lazy open → half-open transition.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn half_open_successes(&self) -> u32 {
        self.half_open_successes
    }

    /// When the circuit last opened.
    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, recovery_secs: f64, half_open_successes: u32) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout_secs: recovery_secs,
            half_open_successes,
        })
    }

    fn open(cb: &mut CircuitBreaker) {
        for _ in 0..cb.config().failure_threshold {
            cb.admit_call().unwrap();
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_initial_state() {
        let mut cb = breaker(3, 1.0, 1);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert!(cb.opened_at().is_none());
        assert!(cb.admit_call().is_ok());
    }

    #[test]
    fn test_opens_after_threshold() {
        let mut cb = breaker(3, 10.0, 1);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.opened_at().is_some());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let mut cb = breaker(3, 10.0, 1);

        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.consecutive_failures(), 0);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_until_recovery_timeout() {
        let mut cb = breaker(2, 1.0, 1);
        open(&mut cb);

        tokio::time::advance(Duration::from_millis(500)).await;
        let err = cb.admit_call().unwrap_err();
        assert_eq!(err.state, CircuitState::Open);
        assert_eq!(err.retry_after, Duration::from_millis(500));

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(cb.admit_call().is_err());
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cb.admit_call().is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.half_open_successes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_is_lazy() {
        let mut cb = breaker(1, 1.0, 1);
        open(&mut cb);

        tokio::time::advance(Duration::from_secs(60)).await;
        // Nothing has asked for admission yet
        assert_eq!(cb.state(), CircuitState::Open);

        cb.admit_call().unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let mut cb = breaker(3, 1.0, 2);
        open(&mut cb);
        let first_opened = cb.opened_at().unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        cb.admit_call().unwrap();
        cb.record_success();
        cb.admit_call().unwrap();
        cb.record_failure();

        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.consecutive_failures(), 0);
        assert!(cb.opened_at().unwrap() > first_opened);

        // Timer restarted from the failed trial call
        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(cb.admit_call().is_err());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cb.admit_call().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_closes_after_required_successes() {
        let mut cb = breaker(2, 1.0, 3);
        open(&mut cb);

        tokio::time::advance(Duration::from_secs(1)).await;
        for expected in 1..3 {
            cb.admit_call().unwrap();
            cb.record_success();
            assert_eq!(cb.state(), CircuitState::HalfOpen);
            assert_eq!(cb.half_open_successes(), expected);
        }

        cb.admit_call().unwrap();
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentering_half_open_resets_success_count() {
        let mut cb = breaker(1, 1.0, 2);
        open(&mut cb);

        tokio::time::advance(Duration::from_secs(1)).await;
        cb.admit_call().unwrap();
        cb.record_success();
        assert_eq!(cb.half_open_successes(), 1);
        cb.record_failure();

        tokio::time::advance(Duration::from_secs(1)).await;
        cb.admit_call().unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.half_open_successes(), 0);
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(serde_json::to_string(&CircuitState::HalfOpen).unwrap(), "\"HALF_OPEN\"");
        assert_eq!(CircuitState::Open.to_string(), "OPEN");
    }
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the breaker, failure injector, store and service from config
//! - Log the effective resilience settings
//!
//! # Design Decisions
//! - Fail fast: config is validated before anything here runs
//! - Nothing is global; the caller owns the returned service

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::resilience::{CircuitBreaker, RetryPolicy};
use crate::store::{FailureInjector, GuardedStore};
use crate::users::UserService;

/// Construct the service graph described by `config`.
pub fn build_service(config: &ServiceConfig) -> UserService {
    let breaker = CircuitBreaker::new(config.circuit_breaker.clone());
    let injector = FailureInjector::from_config(&config.store);
    let store = Arc::new(GuardedStore::new(breaker, injector));
    let retry = RetryPolicy::from(&config.retries);

    tracing::info!(
        failure_threshold = config.circuit_breaker.failure_threshold,
        recovery_timeout_secs = config.circuit_breaker.recovery_timeout_secs,
        half_open_successes = config.circuit_breaker.half_open_successes,
        fail_rate = config.store.fail_rate,
        seeded = config.store.fail_seed.is_some(),
        max_attempts = retry.max_attempts,
        "Resilience core initialised"
    );

    UserService::new(store, retry, config.retries.jitter_seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;
    use crate::store::NewUser;

    #[tokio::test]
    async fn test_build_service_from_defaults() {
        let service = build_service(&ServiceConfig::default());
        assert_eq!(service.breaker_state(), CircuitState::Closed);
        assert_eq!(service.retry_policy().max_attempts, 3);

        let new_user = NewUser {
            user_id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "555-0100".into(),
        };
        let created = service.create_user(&new_user).await.unwrap();
        assert_eq!(service.get_user("u1"), Some(created));
    }
}

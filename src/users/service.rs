//! User service: retried, breaker-protected writes and unprotected reads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

use crate::resilience::{execute_with_retry, CircuitState, RetryPolicy};
use crate::store::{GuardedStore, NewUser, StoreError, UserRecord};

/// Entry point for creating and reading users.
#[derive(Debug)]
pub struct UserService {
    store: Arc<GuardedStore>,
    retry: RetryPolicy,
    /// Seeds a private jitter RNG for each create call.
    jitter_seeds: Mutex<StdRng>,
}

impl UserService {
    pub fn new(store: Arc<GuardedStore>, retry: RetryPolicy, jitter_seed: Option<u64>) -> Self {
        let jitter_seeds = match jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            store,
            retry,
            jitter_seeds: Mutex::new(jitter_seeds),
        }
    }

    /// Create a user, retrying transient store failures.
    ///
    /// Returns the stored record, which is the first one written for this
    /// `user_id` when the call is a replay. A circuit-open rejection is returned
    /// immediately; a transient failure is returned once the attempt budget
    /// is spent.
    pub async fn create_user(&self, new_user: &NewUser) -> Result<UserRecord, StoreError> {
        let mut rng = self.request_rng();
        let store = self.store.as_ref();

        execute_with_retry(
            move || {
                let record = new_user.to_record();
                async move { store.write(record) }
            },
            self.retry.max_attempts,
            &self.retry.backoff,
            &mut rng,
        )
        .await
    }

    pub fn get_user(&self, user_id: &str) -> Option<UserRecord> {
        self.store.get(user_id)
    }

    pub fn breaker_state(&self) -> CircuitState {
        self.store.current_breaker_state()
    }

    pub fn store(&self) -> &Arc<GuardedStore> {
        &self.store
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn request_rng(&self) -> StdRng {
        let mut seeds = self.jitter_seeds.lock().unwrap_or_else(|e| e.into_inner());
        StdRng::seed_from_u64(seeds.gen())
    }
}

//! Simulated transient write failures.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::StoreConfig;

/// Decides whether a write attempt should fail.
///
/// Each decision draws a uniform value in `[0, 1)` from the injected random
/// source and fails when it falls below `fail_rate`. A rate of zero never draws.
pub struct FailureInjector {
    fail_rate: f64,
    rng: Box<dyn RngCore + Send>,
}

impl FailureInjector {
    pub fn new(fail_rate: f64, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            fail_rate,
            rng: Box::new(rng),
        }
    }

    /// An injector that never fails.
    pub fn disabled() -> Self {
        Self::new(0.0, StdRng::seed_from_u64(0))
    }

    /// Seeded from `fail_seed` when set, otherwise from OS entropy.
    pub fn from_config(config: &StoreConfig) -> Self {
        let rng = match config.fail_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config.fail_rate, rng)
    }

    pub fn should_fail(&mut self) -> bool {
        if self.fail_rate <= 0.0 {
            return false;
        }
        self.rng.gen::<f64>() < self.fail_rate
    }
}

impl std::fmt::Debug for FailureInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureInjector")
            .field("fail_rate", &self.fail_rate)
            .field("rng", &"<rng>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_disabled_never_fails() {
        let mut injector = FailureInjector::disabled();
        assert!((0..1000).all(|_| !injector.should_fail()));
    }

    #[test]
    fn test_always_fails_at_full_rate() {
        let mut injector = FailureInjector::new(1.0, StdRng::seed_from_u64(3));
        assert!((0..1000).all(|_| injector.should_fail()));
    }

    #[test]
    fn test_threshold_comparison() {
        // A zero draw is below any positive rate
        let mut low = FailureInjector::new(0.01, StepRng::new(0, 0));
        assert!(low.should_fail());

        // The largest draw is above any rate short of 1.0
        let mut high = FailureInjector::new(0.99, StepRng::new(u64::MAX, 0));
        assert!(!high.should_fail());
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let config = StoreConfig {
            fail_rate: 0.5,
            fail_seed: Some(42),
        };
        let mut a = FailureInjector::from_config(&config);
        let mut b = FailureInjector::from_config(&config);

        let first: Vec<bool> = (0..64).map(|_| a.should_fail()).collect();
        let second: Vec<bool> = (0..64).map(|_| b.should_fail()).collect();
        assert_eq!(first, second);
        assert!(first.contains(&true) && first.contains(&false));
    }
}

//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay schedule between retry attempts.
///
/// The delay after the attempt with zero-based index `n` is
/// `base * 2^n`, clamped to `[min_delay, max_delay]`, plus a uniform jitter
/// in `[0, jitter_max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub jitter_max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            jitter_max: Duration::from_millis(300),
        }
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            base: Duration::from_millis(config.base_delay_ms),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_max: Duration::from_millis(config.jitter_max_ms),
        }
    }
}

impl BackoffPolicy {
    /// Clamped exponential delay without jitter.
    pub fn base_delay(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt_index);
        self.base
            .saturating_mul(factor)
            .max(self.min_delay)
            .min(self.max_delay)
    }

    /// Full delay for an attempt: clamped exponential part plus jitter.
    pub fn delay<R: Rng + ?Sized>(&self, attempt_index: u32, rng: &mut R) -> Duration {
        self.base_delay(attempt_index).saturating_add(self.jitter(rng))
    }

    fn jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max_micros = u64::try_from(self.jitter_max.as_micros()).unwrap_or(u64::MAX);
        if max_micros == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rng.gen_range(0..=max_micros))
    }

    /// Upper bound on the total time spent sleeping across `max_attempts` attempts.
    pub fn max_total_delay(&self, max_attempts: u32) -> Duration {
        (0..max_attempts.saturating_sub(1))
            .map(|index| self.base_delay(index).saturating_add(self.jitter_max))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_backoff_calculation() {
        let policy = BackoffPolicy::default();

        assert_eq!(policy.base_delay(0), Duration::from_millis(200));
        assert_eq!(policy.base_delay(1), Duration::from_millis(400));
        assert_eq!(policy.base_delay(2), Duration::from_millis(800));
        assert_eq!(policy.base_delay(3), Duration::from_millis(1600));
        assert_eq!(policy.base_delay(4), Duration::from_secs(2));
        assert_eq!(policy.base_delay(40), Duration::from_secs(2));
    }

    #[test]
    fn test_min_delay_clamp() {
        let policy = BackoffPolicy {
            base: Duration::from_millis(10),
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(100),
            jitter_max: Duration::ZERO,
        };

        assert_eq!(policy.base_delay(0), Duration::from_millis(50));
        assert_eq!(policy.base_delay(2), Duration::from_millis(50));
        assert_eq!(policy.base_delay(3), Duration::from_millis(80));
        assert_eq!(policy.base_delay(4), Duration::from_millis(100));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = BackoffPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);

        for attempt in 0..5 {
            for _ in 0..200 {
                let delay = policy.delay(attempt, &mut rng);
                let base = policy.base_delay(attempt);
                assert!(delay >= base);
                assert!(delay <= base + policy.jitter_max);
            }
        }
    }

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let policy = BackoffPolicy::default();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);

        let first: Vec<_> = (0..3).map(|i| policy.delay(i, &mut a)).collect();
        let second: Vec<_> = (0..3).map(|i| policy.delay(i, &mut b)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_max_total_delay() {
        let policy = BackoffPolicy::default();

        // 0.2 + 0.3 and 0.4 + 0.3 for the two retries of a three-attempt budget
        assert_eq!(policy.max_total_delay(3), Duration::from_millis(1200));
        assert_eq!(policy.max_total_delay(1), Duration::ZERO);
        assert_eq!(policy.max_total_delay(0), Duration::ZERO);
    }

    #[test]
    fn test_huge_delays_saturate() {
        let policy = BackoffPolicy {
            base: Duration::MAX,
            min_delay: Duration::ZERO,
            max_delay: Duration::MAX,
            jitter_max: Duration::from_millis(300),
        };
        let mut rng = StdRng::seed_from_u64(5);

        assert_eq!(policy.delay(3, &mut rng), Duration::MAX);
        assert_eq!(policy.max_total_delay(3), Duration::MAX);
    }

    #[test]
    fn test_from_config() {
        let policy = BackoffPolicy::from(&RetryConfig::default());
        assert_eq!(policy, BackoffPolicy::default());
    }
}

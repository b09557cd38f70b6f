//! Property tests for retry pauses.
//!
//! Invariants tested:
//! - Exponential pauses never decrease and respect the cap
//! - Jitter stays inside `delay * (1 ± jitter)`

use proptest::prelude::*;
use std::time::Duration;
use tower_cluster_client::{ExponentialBackoffRetryStrategy, RetryStrategy};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: without jitter pauses grow monotonically up to the cap
    #[test]
    fn backoff_is_monotonic_and_capped(
        initial_ms in 1u64..1_000,
        multiplier in 1.0f64..4.0,
        cap_ms in 1u64..60_000,
        attempts in 1usize..12,
    ) {
        let cap = Duration::from_millis(cap_ms);
        let strategy = ExponentialBackoffRetryStrategy::new(attempts, Duration::from_millis(initial_ms))
            .multiplier(multiplier)
            .max_delay(cap);

        let mut previous = Duration::ZERO;
        for used in 1..=attempts {
            let delay = strategy.next_delay(used);
            prop_assert!(delay <= cap);
            prop_assert!(delay >= previous);
            previous = delay;
        }
    }

    /// Property: jittered pauses stay around the deterministic one
    #[test]
    fn jitter_stays_in_range(
        initial_ms in 1u64..1_000,
        jitter in 0.01f64..1.0,
        used in 1usize..6,
    ) {
        let plain = ExponentialBackoffRetryStrategy::new(10, Duration::from_millis(initial_ms));
        let jittered = plain.jitter(jitter);

        let base = plain.next_delay(used).as_secs_f64();
        let delay = jittered.next_delay(used).as_secs_f64();

        prop_assert!(delay >= base * (1.0 - jitter) - 1e-6);
        prop_assert!(delay <= base * (1.0 + jitter) + 1e-6);
    }
}

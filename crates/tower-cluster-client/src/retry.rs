//! Retry policies and strategies for whole-request retries.
//!
//! A [`RetryPolicy`] decides whether an exhausted request is worth repeating;
//! a [`RetryStrategy`] bounds the number of attempts and spaces them out.

use rand::Rng;
use std::fmt;
use std::time::Duration;
use tower_cluster_core::ReplicaResult;

/// Decides whether a request whose replicas were exhausted should be repeated.
pub trait RetryPolicy: Send + Sync {
    fn needs_retry(&self, results: &[ReplicaResult]) -> bool;
}

/// Always repeats exhausted requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetryPolicy;

impl RetryPolicy for AlwaysRetryPolicy {
    fn needs_retry(&self, _results: &[ReplicaResult]) -> bool {
        true
    }
}

/// Never repeats anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetryPolicy;

impl RetryPolicy for NeverRetryPolicy {
    fn needs_retry(&self, _results: &[ReplicaResult]) -> bool {
        false
    }
}

/// Closure-backed policy.
pub struct FnRetryPolicy<F> {
    f: F,
}

impl<F> FnRetryPolicy<F>
where
    F: Fn(&[ReplicaResult]) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> RetryPolicy for FnRetryPolicy<F>
where
    F: Fn(&[ReplicaResult]) -> bool + Send + Sync,
{
    fn needs_retry(&self, results: &[ReplicaResult]) -> bool {
        (self.f)(results)
    }
}

impl<F> fmt::Debug for FnRetryPolicy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRetryPolicy").finish_non_exhaustive()
    }
}

/// Number of attempts and the pause before each repetition.
pub trait RetryStrategy: Send + Sync {
    /// Total attempts including the first one.
    fn attempts_count(&self) -> usize;

    /// Pause after `attempts_used` attempts (1-based) have failed.
    fn next_delay(&self, attempts_used: usize) -> Duration;
}

/// Repeats without pausing.
#[derive(Debug, Clone, Copy)]
pub struct ImmediateRetryStrategy {
    attempts: usize,
}

impl ImmediateRetryStrategy {
    pub fn new(attempts: usize) -> Self {
        Self { attempts }
    }
}

impl RetryStrategy for ImmediateRetryStrategy {
    fn attempts_count(&self) -> usize {
        self.attempts
    }

    fn next_delay(&self, _attempts_used: usize) -> Duration {
        Duration::ZERO
    }
}

/// Same pause before every repetition.
#[derive(Debug, Clone, Copy)]
pub struct FixedRetryStrategy {
    attempts: usize,
    delay: Duration,
}

impl FixedRetryStrategy {
    pub fn new(attempts: usize, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl RetryStrategy for FixedRetryStrategy {
    fn attempts_count(&self) -> usize {
        self.attempts
    }

    fn next_delay(&self, _attempts_used: usize) -> Duration {
        self.delay
    }
}

/// Pause grows geometrically from `initial_delay`, optionally capped and
/// randomized.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoffRetryStrategy {
    attempts: usize,
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Option<Duration>,
    jitter: f64,
}

impl ExponentialBackoffRetryStrategy {
    /// Doubles the pause after every failed attempt.
    pub fn new(attempts: usize, initial_delay: Duration) -> Self {
        Self {
            attempts,
            initial_delay,
            multiplier: 2.0,
            max_delay: None,
            jitter: 0.0,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Spreads each pause uniformly over `delay * (1 ± jitter)`.
    /// The factor is clamped to `[0, 1]`.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }
}

impl RetryStrategy for ExponentialBackoffRetryStrategy {
    fn attempts_count(&self) -> usize {
        self.attempts
    }

    fn next_delay(&self, attempts_used: usize) -> Duration {
        let exponent = attempts_used.saturating_sub(1).min(i32::MAX as usize) as i32;
        let mut delay = self.initial_delay.mul_f64(self.multiplier.powi(exponent));
        if let Some(max) = self.max_delay {
            delay = delay.min(max);
        }
        if self.jitter > 0.0 {
            let spread = delay.as_secs_f64() * self.jitter;
            let base = delay.as_secs_f64();
            let randomized = rand::rng().random_range((base - spread)..=(base + spread));
            delay = Duration::from_secs_f64(randomized.max(0.0));
        }
        delay
    }
}

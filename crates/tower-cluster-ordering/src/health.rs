//! Adaptive health ordering.
//!
//! Every replica carries a health value in `(0, 1]`, starting at full health.
//! A rejected attempt multiplies it by the down multiplier, an accepted one by
//! the up multiplier, and the result is kept between the minimum health and
//! `1.0`. Damage heals linearly: after the decay duration without new
//! information a replica is back at full health. Replicas are tried in order
//! of decreasing health; equally healthy replicas keep their input order.

use crate::ordering::ReplicaOrdering;
use crate::storage::{ReplicaStorage, ReplicaStorageProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tower_cluster_core::{ConfigError, Replica, ReplicaResult, Request, ResponseVerdict};

const STORAGE_KEY: &str = "adaptive-health";

/// Tuning of [`AdaptiveHealthOrdering`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthOptions {
    up_multiplier: f64,
    down_multiplier: f64,
    minimum_health: f64,
    decay_duration: Duration,
}

impl HealthOptions {
    pub fn builder() -> HealthOptionsBuilder {
        HealthOptionsBuilder::new()
    }

    pub fn up_multiplier(&self) -> f64 {
        self.up_multiplier
    }

    pub fn down_multiplier(&self) -> f64 {
        self.down_multiplier
    }

    pub fn minimum_health(&self) -> f64 {
        self.minimum_health
    }

    pub fn decay_duration(&self) -> Duration {
        self.decay_duration
    }
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self {
            up_multiplier: 1.5,
            down_multiplier: 0.5,
            minimum_health: 0.001,
            decay_duration: Duration::from_secs(600),
        }
    }
}

/// Builder for [`HealthOptions`].
#[derive(Debug, Clone)]
pub struct HealthOptionsBuilder {
    options: HealthOptions,
}

impl HealthOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: HealthOptions::default(),
        }
    }

    /// Health multiplier applied on an accepted response. Must be at least `1.0`.
    pub fn up_multiplier(mut self, value: f64) -> Self {
        self.options.up_multiplier = value;
        self
    }

    /// Health multiplier applied on a rejected response. Must be in `(0, 1)`.
    pub fn down_multiplier(mut self, value: f64) -> Self {
        self.options.down_multiplier = value;
        self
    }

    /// Lower bound of health. Must be in `(0, 1]`.
    pub fn minimum_health(mut self, value: f64) -> Self {
        self.options.minimum_health = value;
        self
    }

    /// Time for a damaged replica to heal back to full health. Must be non-zero.
    pub fn decay_duration(mut self, value: Duration) -> Self {
        self.options.decay_duration = value;
        self
    }

    pub fn build(self) -> Result<HealthOptions, ConfigError> {
        let options = self.options;
        if !(options.up_multiplier >= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "up_multiplier",
                value: options.up_multiplier,
                expected: ">= 1.0",
            });
        }
        if !(options.down_multiplier > 0.0 && options.down_multiplier < 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "down_multiplier",
                value: options.down_multiplier,
                expected: "in (0, 1)",
            });
        }
        if !(options.minimum_health > 0.0 && options.minimum_health <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "minimum_health",
                value: options.minimum_health,
                expected: "in (0, 1]",
            });
        }
        if options.decay_duration.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: "decay_duration",
                value: 0.0,
                expected: "> 0",
            });
        }
        Ok(options)
    }
}

impl Default for HealthOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stored health of one replica.
#[derive(Debug, Clone, Copy)]
pub struct HealthState {
    value: f64,
    updated: Instant,
}

impl HealthState {
    fn full() -> Self {
        Self {
            value: 1.0,
            updated: Instant::now(),
        }
    }

    /// Health after linear healing up to `now`.
    fn effective(&self, now: Instant, decay: Duration) -> f64 {
        let elapsed = now.saturating_duration_since(self.updated);
        let healed = (elapsed.as_secs_f64() / decay.as_secs_f64()).min(1.0);
        self.value + (1.0 - self.value) * healed
    }
}

/// Orders replicas by learned health, healthiest first.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveHealthOrdering {
    options: HealthOptions,
}

impl AdaptiveHealthOrdering {
    pub fn new(options: HealthOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HealthOptions {
        &self.options
    }

    /// Current effective health of `replica`. Unknown replicas are fully healthy.
    pub fn health(&self, replica: &Replica, storage: &ReplicaStorageProvider) -> f64 {
        let now = Instant::now();
        self.storage(storage)
            .read(replica, |state| state.effective(now, self.options.decay_duration))
            .unwrap_or(1.0)
    }

    fn storage(&self, storage: &ReplicaStorageProvider) -> Arc<ReplicaStorage<HealthState>> {
        storage.obtain::<HealthState>(STORAGE_KEY)
    }
}

impl ReplicaOrdering for AdaptiveHealthOrdering {
    fn order(
        &self,
        replicas: &[Replica],
        storage: &ReplicaStorageProvider,
        _request: &Request,
    ) -> Vec<Replica> {
        let states = self.storage(storage);
        let now = Instant::now();
        let decay = self.options.decay_duration;

        let mut ranked: Vec<(f64, &Replica)> = replicas
            .iter()
            .map(|replica| {
                let health = states
                    .read(replica, |state| state.effective(now, decay))
                    .unwrap_or(1.0);
                (health, replica)
            })
            .collect();

        // sort_by is stable, ties keep the input order
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.into_iter().map(|(_, replica)| replica.clone()).collect()
    }

    fn learn(&self, result: &ReplicaResult, storage: &ReplicaStorageProvider) {
        let multiplier = match result.verdict() {
            ResponseVerdict::Accept => self.options.up_multiplier,
            ResponseVerdict::Reject => self.options.down_multiplier,
            ResponseVerdict::DontKnow => return,
        };
        let options = self.options;
        let now = Instant::now();

        let _health = self.storage(storage).update(result.replica(), HealthState::full, |state| {
            let current = state.effective(now, options.decay_duration);
            state.value = (current * multiplier).clamp(options.minimum_health, 1.0);
            state.updated = now;
            state.value
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            replica = %result.replica(),
            verdict = ?result.verdict(),
            health = _health,
            "replica health updated"
        );
    }
}

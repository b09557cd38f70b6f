//! Sequential timeout providers.
//!
//! The sequential strategy asks a provider for the timeout of every attempt
//! and caps the answer by the remaining budget.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tower_cluster_core::{Budget, ConfigError, Request};

/// Computes the timeout of the next sequential attempt.
pub trait SequentialTimeoutsProvider: Send + Sync {
    fn timeout(
        &self,
        request: &Request,
        budget: &Budget,
        current_replica_index: usize,
        total_replicas: usize,
    ) -> Duration;
}

/// Spreads the remaining budget over the attempts still to come.
///
/// For the first `division_factor` attempts the timeout is
/// `remaining / (min(division_factor, total_replicas) - index)`, which leaves
/// each later attempt the same share. Past that, and whenever the divisor
/// would not be positive, the attempt gets the whole remaining budget.
#[derive(Debug, Clone, Copy)]
pub struct EqualTimeoutsProvider {
    division_factor: usize,
}

impl EqualTimeoutsProvider {
    pub fn new(division_factor: usize) -> Result<Self, ConfigError> {
        if division_factor == 0 {
            return Err(ConfigError::NonPositiveDivisionFactor(0));
        }
        Ok(Self { division_factor })
    }

    pub fn division_factor(&self) -> usize {
        self.division_factor
    }
}

impl SequentialTimeoutsProvider for EqualTimeoutsProvider {
    fn timeout(
        &self,
        _request: &Request,
        budget: &Budget,
        current_replica_index: usize,
        total_replicas: usize,
    ) -> Duration {
        let remaining = budget.remaining();
        if current_replica_index >= self.division_factor {
            return remaining;
        }

        let attempts_left = self
            .division_factor
            .min(total_replicas)
            .saturating_sub(current_replica_index);
        if attempts_left == 0 {
            return remaining;
        }
        remaining / attempts_left as u32
    }
}

/// What a [`FixedTimeoutsProvider`] does once its list runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TailTimeoutBehaviour {
    /// Give every further attempt the whole remaining budget.
    UseRemainingBudget,
    /// Keep using the last timeout.
    UseLastValue,
}

/// Uses a fixed list of timeouts.
#[derive(Debug, Clone)]
pub struct FixedTimeoutsProvider {
    tail: TailTimeoutBehaviour,
    timeouts: Vec<Duration>,
}

impl FixedTimeoutsProvider {
    pub fn new(tail: TailTimeoutBehaviour, timeouts: Vec<Duration>) -> Result<Self, ConfigError> {
        if timeouts.is_empty() {
            return Err(ConfigError::EmptySequence("sequential timeouts"));
        }
        Ok(Self { tail, timeouts })
    }
}

impl SequentialTimeoutsProvider for FixedTimeoutsProvider {
    fn timeout(
        &self,
        _request: &Request,
        budget: &Budget,
        current_replica_index: usize,
        _total_replicas: usize,
    ) -> Duration {
        if let Some(timeout) = self.timeouts.get(current_replica_index) {
            return *timeout;
        }
        match self.tail {
            TailTimeoutBehaviour::UseRemainingBudget => budget.remaining(),
            TailTimeoutBehaviour::UseLastValue => self
                .timeouts
                .last()
                .copied()
                .unwrap_or_else(|| budget.remaining()),
        }
    }
}

/// Lazily evaluated timeout of one attempt.
pub type TimeoutSupplier = Arc<dyn Fn() -> Duration + Send + Sync>;

/// Takes the first timeouts from ad-hoc suppliers, then behaves like
/// [`EqualTimeoutsProvider`] over the attempts that are left.
#[derive(Clone)]
pub struct AdHocThenEqualTimeoutsProvider {
    suppliers: Vec<TimeoutSupplier>,
    equal: EqualTimeoutsProvider,
}

impl AdHocThenEqualTimeoutsProvider {
    pub fn new(division_factor: usize, suppliers: Vec<TimeoutSupplier>) -> Result<Self, ConfigError> {
        if suppliers.is_empty() {
            return Err(ConfigError::EmptySequence("timeout suppliers"));
        }
        Ok(Self {
            suppliers,
            equal: EqualTimeoutsProvider::new(division_factor)?,
        })
    }
}

impl fmt::Debug for AdHocThenEqualTimeoutsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdHocThenEqualTimeoutsProvider")
            .field("suppliers", &self.suppliers.len())
            .field("equal", &self.equal)
            .finish()
    }
}

impl SequentialTimeoutsProvider for AdHocThenEqualTimeoutsProvider {
    fn timeout(
        &self,
        request: &Request,
        budget: &Budget,
        current_replica_index: usize,
        total_replicas: usize,
    ) -> Duration {
        if let Some(supplier) = self.suppliers.get(current_replica_index) {
            return supplier();
        }
        let skipped = self.suppliers.len();
        self.equal.timeout(
            request,
            budget,
            current_replica_index - skipped,
            total_replicas.saturating_sub(skipped),
        )
    }
}

//! Forking delay providers.
//!
//! A forking delay is how long the forking strategy waits after launching an
//! attempt before it launches the next one on its own. `None` means "do not
//! fork on a timer any more": further attempts only start when an earlier one
//! completes without being accepted.

use std::time::Duration;
use tower_cluster_core::{Budget, ConfigError, Request};

/// Computes the delay before the next forked attempt.
pub trait ForkingDelaysProvider: Send + Sync {
    /// `current_replica_index` is the zero-based index of the attempt that was
    /// just launched; `total_replicas` is the size of the cluster.
    fn delay(
        &self,
        request: &Request,
        budget: &Budget,
        current_replica_index: usize,
        total_replicas: usize,
    ) -> Option<Duration>;
}

/// Splits the remaining budget evenly: `remaining / min(division_factor, total_replicas)`.
#[derive(Debug, Clone, Copy)]
pub struct EqualDelaysProvider {
    division_factor: usize,
}

impl EqualDelaysProvider {
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

impl ForkingDelaysProvider for EqualDelaysProvider {
    fn delay(
        &self,
        _request: &Request,
        budget: &Budget,
        _current_replica_index: usize,
        total_replicas: usize,
    ) -> Option<Duration> {
        let divisor = self.division_factor.min(total_replicas).max(1);
        Some(budget.remaining() / divisor as u32)
    }
}

/// What a [`FixedDelaysProvider`] does once its list runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TailDelayBehaviour {
    /// Stop forking on a timer.
    StopIssuingDelays,
    /// Keep using the last delay.
    RepeatLastValue,
    /// Cycle through the whole list again.
    RepeatAllValues,
}

/// Uses a fixed list of delays, ignoring the budget.
#[derive(Debug, Clone)]
pub struct FixedDelaysProvider {
    tail: TailDelayBehaviour,
    delays: Vec<Duration>,
}

impl FixedDelaysProvider {
    pub fn new(tail: TailDelayBehaviour, delays: Vec<Duration>) -> Result<Self, ConfigError> {
        if delays.is_empty() {
            return Err(ConfigError::EmptySequence("forking delays"));
        }
        Ok(Self { tail, delays })
    }

    pub fn tail(&self) -> TailDelayBehaviour {
        self.tail
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl ForkingDelaysProvider for FixedDelaysProvider {
    fn delay(
        &self,
        _request: &Request,
        _budget: &Budget,
        current_replica_index: usize,
        _total_replicas: usize,
    ) -> Option<Duration> {
        if let Some(delay) = self.delays.get(current_replica_index) {
            return Some(*delay);
        }
        match self.tail {
            TailDelayBehaviour::StopIssuingDelays => None,
            TailDelayBehaviour::RepeatLastValue => self.delays.last().copied(),
            TailDelayBehaviour::RepeatAllValues => {
                Some(self.delays[current_replica_index % self.delays.len()])
            }
        }
    }
}

/// Forks immediately. Used by the parallel strategy.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ZeroDelaysProvider;

impl ForkingDelaysProvider for ZeroDelaysProvider {
    fn delay(&self, _: &Request, _: &Budget, _: usize, _: usize) -> Option<Duration> {
        Some(Duration::ZERO)
    }
}

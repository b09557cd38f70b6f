//! The ordering contract and the stateless orderings.

use crate::storage::ReplicaStorageProvider;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use tower_cluster_core::{ReplicaResult, Replica, Request};

/// Ranks the replicas of a cluster for one request and learns from outcomes.
pub trait ReplicaOrdering: Send + Sync {
    /// Returns a permutation of `replicas` in the order they should be tried.
    fn order(
        &self,
        replicas: &[Replica],
        storage: &ReplicaStorageProvider,
        request: &Request,
    ) -> Vec<Replica>;

    /// Feeds the outcome of one attempt back into the ordering.
    ///
    /// Must be cheap: it runs on the request path after every attempt.
    fn learn(&self, result: &ReplicaResult, storage: &ReplicaStorageProvider);
}

/// Keeps the replicas in the order the cluster provider returned them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsIsOrdering;

impl ReplicaOrdering for AsIsOrdering {
    fn order(
        &self,
        replicas: &[Replica],
        _storage: &ReplicaStorageProvider,
        _request: &Request,
    ) -> Vec<Replica> {
        replicas.to_vec()
    }

    fn learn(&self, _result: &ReplicaResult, _storage: &ReplicaStorageProvider) {}
}

/// Shuffles the replicas for every request.
pub struct RandomOrdering {
    rng: Mutex<StdRng>,
}

impl RandomOrdering {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// A deterministic ordering, for tests and reproducible simulations.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomOrdering {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RandomOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomOrdering").finish_non_exhaustive()
    }
}

impl ReplicaOrdering for RandomOrdering {
    fn order(
        &self,
        replicas: &[Replica],
        _storage: &ReplicaStorageProvider,
        _request: &Request,
    ) -> Vec<Replica> {
        let mut ordered = replicas.to_vec();
        ordered.shuffle(&mut *self.rng.lock());
        ordered
    }

    fn learn(&self, _result: &ReplicaResult, _storage: &ReplicaStorageProvider) {}
}

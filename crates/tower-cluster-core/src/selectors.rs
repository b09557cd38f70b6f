//! Folding replica results into a cluster outcome.

use crate::budget::Budget;
use crate::model::Response;
use crate::result::{ClusterResultStatus, ReplicaResult, ResponseVerdict};

/// Chooses the response a [`ClusterResult`](crate::ClusterResult) reports.
pub trait ResponseSelector: Send + Sync {
    fn select(&self, results: &[ReplicaResult]) -> Option<Response>;
}

/// Prefers the last accepted response, then the last response with a known
/// code, then simply the last response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastAcceptedResponseSelector;

impl ResponseSelector for LastAcceptedResponseSelector {
    fn select(&self, results: &[ReplicaResult]) -> Option<Response> {
        results
            .iter()
            .rev()
            .find(|result| result.verdict() == ResponseVerdict::Accept)
            .or_else(|| {
                results
                    .iter()
                    .rev()
                    .find(|result| !result.response().code().is_unknown())
            })
            .or_else(|| results.last())
            .map(|result| result.response().clone())
    }
}

/// Maps the attempts of a finished strategy to a cluster status.
pub trait ClusterResultStatusSelector: Send + Sync {
    fn select(&self, results: &[ReplicaResult], budget: &Budget) -> ClusterResultStatus;
}

/// Success if anything was accepted, otherwise time expiry takes precedence
/// over replica exhaustion.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStatusSelector;

impl ClusterResultStatusSelector for DefaultStatusSelector {
    fn select(&self, results: &[ReplicaResult], budget: &Budget) -> ClusterResultStatus {
        if results.iter().any(ReplicaResult::is_accepted) {
            return ClusterResultStatus::Success;
        }
        if budget.has_expired() {
            ClusterResultStatus::TimeExpired
        } else {
            ClusterResultStatus::ReplicasExhausted
        }
    }
}

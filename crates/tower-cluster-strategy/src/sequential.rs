//! One attempt at a time.

use crate::sender::RequestSender;
use crate::strategy::RequestStrategy;
use crate::timeouts::SequentialTimeoutsProvider;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_cluster_core::{Budget, Canceled, Replica, ReplicaResult, Request};

/// Tries replicas one by one until one of them is accepted.
///
/// Each attempt gets the provider's timeout capped by the remaining budget.
/// No attempt is made once the budget has expired.
#[derive(Clone)]
pub struct SequentialRequestStrategy {
    timeouts: Arc<dyn SequentialTimeoutsProvider>,
}

impl SequentialRequestStrategy {
    pub fn new(timeouts: Arc<dyn SequentialTimeoutsProvider>) -> Self {
        Self { timeouts }
    }
}

impl fmt::Debug for SequentialRequestStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialRequestStrategy").finish_non_exhaustive()
    }
}

impl RequestStrategy for SequentialRequestStrategy {
    fn send<'a>(
        &'a self,
        request: &'a Request,
        sender: &'a dyn RequestSender,
        budget: &'a Budget,
        replicas: &'a [Replica],
        replicas_count: usize,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<ReplicaResult>, Canceled>> {
        Box::pin(async move {
            let mut results = Vec::new();

            for (index, replica) in replicas.iter().enumerate() {
                if budget.has_expired() {
                    break;
                }
                if cancellation.is_cancelled() {
                    return Err(Canceled::ByCaller);
                }

                let timeout = self
                    .timeouts
                    .timeout(request, budget, index, replicas_count)
                    .min(budget.remaining());

                let result = sender
                    .send_to_replica(replica, request, timeout, cancellation)
                    .await?;
                let accepted = result.is_accepted();
                results.push(result);

                if accepted {
                    break;
                }
            }

            Ok(results)
        })
    }
}

//! Overlapping attempts.

use crate::delays::{ForkingDelaysProvider, ZeroDelaysProvider};
use crate::sender::RequestSender;
use crate::strategy::RequestStrategy;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_cluster_core::{Budget, Canceled, ConfigError, Replica, ReplicaResult, Request};

/// Launches attempts in ranking order, overlapping them over time.
///
/// The first replica is tried immediately. The next one is launched when the
/// forking delay after the previous launch elapses, or as soon as a running
/// attempt completes without being accepted, but never while
/// `maximum_parallelism` attempts are already in flight. The first accepted
/// result wins: the remaining attempts are canceled and awaited before
/// returning. Every attempt gets the remaining budget as its timeout.
#[derive(Clone)]
pub struct ForkingRequestStrategy {
    delays: Arc<dyn ForkingDelaysProvider>,
    maximum_parallelism: usize,
}

impl ForkingRequestStrategy {
    pub fn new(
        delays: Arc<dyn ForkingDelaysProvider>,
        maximum_parallelism: usize,
    ) -> Result<Self, ConfigError> {
        if maximum_parallelism == 0 {
            return Err(ConfigError::OutOfRange {
                name: "maximum_parallelism",
                value: 0.0,
                expected: ">= 1",
            });
        }
        Ok(Self {
            delays,
            maximum_parallelism,
        })
    }

    pub fn maximum_parallelism(&self) -> usize {
        self.maximum_parallelism
    }
}

impl fmt::Debug for ForkingRequestStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkingRequestStrategy")
            .field("maximum_parallelism", &self.maximum_parallelism)
            .finish_non_exhaustive()
    }
}

impl RequestStrategy for ForkingRequestStrategy {
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
            if budget.has_expired() || replicas.is_empty() {
                return Ok(Vec::new());
            }
            if cancellation.is_cancelled() {
                return Err(Canceled::ByCaller);
            }

            let siblings = cancellation.child_token();
            let token = &siblings;
            let attempt = move |index: usize, replica: &'a Replica| async move {
                let outcome = sender
                    .send_to_replica(replica, request, budget.remaining(), token)
                    .await;
                (index, outcome)
            };

            let mut in_flight = FuturesUnordered::new();
            // One slot per launched attempt, filled on completion.
            let mut slots: Vec<Option<ReplicaResult>> = Vec::with_capacity(replicas.len());

            in_flight.push(attempt(0, &replicas[0]));
            slots.push(None);

            let mut fork_timer = Box::pin(tokio::time::sleep(Duration::ZERO));
            let mut fork_armed = self.arm(&mut fork_timer, request, budget, 0, replicas_count);
            let budget_timer = tokio::time::sleep(budget.remaining());
            tokio::pin!(budget_timer);

            let outcome = loop {
                let launched = slots.len();
                if in_flight.is_empty() && launched >= replicas.len() {
                    break Ok(());
                }
                let can_launch =
                    launched < replicas.len() && in_flight.len() < self.maximum_parallelism;

                tokio::select! {
                    biased;

                    _ = cancellation.cancelled() => break Err(Canceled::ByCaller),

                    Some((index, completed)) = in_flight.next(), if !in_flight.is_empty() => {
                        match completed {
                            Err(canceled) => break Err(canceled),
                            Ok(result) => {
                                let accepted = result.is_accepted();
                                slots[index] = Some(result);
                                if accepted {
                                    break Ok(());
                                }
                                if launched < replicas.len() && in_flight.len() < self.maximum_parallelism {
                                    in_flight.push(attempt(launched, &replicas[launched]));
                                    slots.push(None);
                                    fork_armed = self.arm(&mut fork_timer, request, budget, launched, replicas_count);
                                }
                            }
                        }
                    }

                    _ = &mut fork_timer, if fork_armed && can_launch => {
                        in_flight.push(attempt(launched, &replicas[launched]));
                        slots.push(None);
                        fork_armed = self.arm(&mut fork_timer, request, budget, launched, replicas_count);
                    }

                    _ = &mut budget_timer => break Ok(()),
                }
            };

            // Unwind whatever is still running before handing results back.
            siblings.cancel();
            while let Some((index, completed)) = in_flight.next().await {
                if let Ok(result) = completed {
                    slots[index] = Some(result);
                }
            }

            outcome.map(|()| slots.into_iter().flatten().collect())
        })
    }
}

impl ForkingRequestStrategy {
    /// Restarts the fork timer after the attempt at `index` was launched.
    /// Returns whether the timer is armed.
    fn arm(
        &self,
        timer: &mut std::pin::Pin<Box<tokio::time::Sleep>>,
        request: &Request,
        budget: &Budget,
        index: usize,
        replicas_count: usize,
    ) -> bool {
        match self.delays.delay(request, budget, index, replicas_count) {
            Some(delay) => {
                timer.set(tokio::time::sleep(delay));
                true
            }
            None => false,
        }
    }
}

/// Launches attempts against up to `parallelism` replicas at once.
#[derive(Clone, Debug)]
pub struct ParallelRequestStrategy {
    inner: ForkingRequestStrategy,
}

impl ParallelRequestStrategy {
    pub fn new(parallelism: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: ForkingRequestStrategy::new(Arc::new(ZeroDelaysProvider), parallelism)?,
        })
    }

    pub fn parallelism(&self) -> usize {
        self.inner.maximum_parallelism()
    }
}

impl RequestStrategy for ParallelRequestStrategy {
    fn send<'a>(
        &'a self,
        request: &'a Request,
        sender: &'a dyn RequestSender,
        budget: &'a Budget,
        replicas: &'a [Replica],
        replicas_count: usize,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<ReplicaResult>, Canceled>> {
        self.inner
            .send(request, sender, budget, replicas, replicas_count, cancellation)
    }
}

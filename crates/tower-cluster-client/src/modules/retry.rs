use crate::retry::{RetryPolicy, RetryStrategy};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tower_cluster_core::{ClusterResult, ClusterResultStatus, Next, RequestContext, RequestModule};

/// Repeats the rest of the pipeline while it ends in `ReplicasExhausted`.
///
/// The strategy bounds the attempt count and the pause between attempts; the
/// policy gets the final say based on the replica results. A pause that would
/// outlast the budget ends the loop. Cancellation during or after a pause
/// ends it with a `Canceled` result.
pub struct RequestRetryModule {
    policy: Arc<dyn RetryPolicy>,
    strategy: Arc<dyn RetryStrategy>,
}

impl RequestRetryModule {
    pub fn new(policy: Arc<dyn RetryPolicy>, strategy: Arc<dyn RetryStrategy>) -> Self {
        Self { policy, strategy }
    }
}

impl fmt::Debug for RequestRetryModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestRetryModule")
            .field("attempts", &self.strategy.attempts_count())
            .finish_non_exhaustive()
    }
}

impl RequestModule for RequestRetryModule {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            let attempts = self.strategy.attempts_count().max(1);
            let mut used = 0;

            loop {
                let result = next.run(ctx).await;
                used += 1;

                if used >= attempts
                    || result.status() != ClusterResultStatus::ReplicasExhausted
                    || !self.policy.needs_retry(result.replica_results())
                {
                    return result;
                }

                let delay = self.strategy.next_delay(used);
                if delay >= ctx.budget().remaining() {
                    return result;
                }

                tracing::debug!(
                    parent: ctx.span(),
                    service = ctx.service_name(),
                    attempt = used,
                    delay = ?delay,
                    "replicas exhausted, retrying request"
                );

                if !delay.is_zero() {
                    tokio::select! {
                        biased;
                        _ = ctx.cancellation().cancelled() => {
                            return ClusterResult::canceled(ctx.request().clone());
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                if ctx.cancellation().is_cancelled() {
                    return ClusterResult::canceled(ctx.request().clone());
                }
            }
        })
    }
}

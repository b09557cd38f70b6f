use crate::cluster::ClusterProvider;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tower_cluster_core::{
    ClusterResult, ClusterResultStatusSelector, DefaultStatusSelector,
    LastAcceptedResponseSelector, Next, RequestContext, RequestModule, ResponseSelector,
};
use tower_cluster_ordering::{ReplicaOrdering, ReplicaStorageProvider};
use tower_cluster_strategy::{RequestSender, RequestStrategy};

/// Terminal stage: resolves replicas, orders them and runs the strategy.
///
/// An empty cluster yields `ReplicasNotFound`. At most
/// `max_replicas_per_request` of the ordered replicas are handed to the
/// strategy. A canceled strategy yields `Canceled`; otherwise the status and
/// response selectors fold the attempts into the final result.
pub struct RequestExecutionModule {
    cluster: Arc<dyn ClusterProvider>,
    ordering: Arc<dyn ReplicaOrdering>,
    storage: Arc<ReplicaStorageProvider>,
    strategy: Arc<dyn RequestStrategy>,
    sender: Arc<dyn RequestSender>,
    status_selector: Arc<dyn ClusterResultStatusSelector>,
    response_selector: Arc<dyn ResponseSelector>,
    max_replicas_per_request: usize,
}

impl RequestExecutionModule {
    pub fn new(
        cluster: Arc<dyn ClusterProvider>,
        ordering: Arc<dyn ReplicaOrdering>,
        storage: Arc<ReplicaStorageProvider>,
        strategy: Arc<dyn RequestStrategy>,
        sender: Arc<dyn RequestSender>,
    ) -> Self {
        Self {
            cluster,
            ordering,
            storage,
            strategy,
            sender,
            status_selector: Arc::new(DefaultStatusSelector),
            response_selector: Arc::new(LastAcceptedResponseSelector),
            max_replicas_per_request: usize::MAX,
        }
    }

    pub fn with_status_selector(mut self, selector: Arc<dyn ClusterResultStatusSelector>) -> Self {
        self.status_selector = selector;
        self
    }

    pub fn with_response_selector(mut self, selector: Arc<dyn ResponseSelector>) -> Self {
        self.response_selector = selector;
        self
    }

    pub fn with_max_replicas_per_request(mut self, max: usize) -> Self {
        self.max_replicas_per_request = max.max(1);
        self
    }
}

impl fmt::Debug for RequestExecutionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutionModule")
            .field("max_replicas_per_request", &self.max_replicas_per_request)
            .finish_non_exhaustive()
    }
}

impl RequestModule for RequestExecutionModule {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            let replicas = self.cluster.replicas();
            if replicas.is_empty() {
                tracing::warn!(
                    parent: ctx.span(),
                    service = ctx.service_name(),
                    "cluster provider returned no replicas"
                );
                return ClusterResult::replicas_not_found(ctx.request().clone());
            }

            let mut ordered = self.ordering.order(&replicas, &self.storage, ctx.request());
            ordered.truncate(self.max_replicas_per_request);

            let outcome = self
                .strategy
                .send(
                    ctx.request(),
                    self.sender.as_ref(),
                    ctx.budget(),
                    &ordered,
                    ordered.len(),
                    ctx.cancellation(),
                )
                .await;

            match outcome {
                Ok(results) => {
                    let status = self.status_selector.select(&results, ctx.budget());
                    let response = self.response_selector.select(&results);
                    ClusterResult::new(status, results, response, ctx.request().clone())
                }
                Err(canceled) => {
                    tracing::info!(
                        parent: ctx.span(),
                        service = ctx.service_name(),
                        reason = %canceled,
                        "request canceled"
                    );
                    ClusterResult::canceled(ctx.request().clone())
                }
            }
        })
    }
}

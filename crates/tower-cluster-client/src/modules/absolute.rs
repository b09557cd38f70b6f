use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tower_cluster_core::{
    ClusterResult, ClusterResultStatusSelector, Next, Replica, ReplicaResult, RequestContext,
    RequestModule, Response, ResponseClassifier, ResponseCode, SharedCriterion, Transport,
    TransportError,
};

/// Sends requests with an absolute URL straight through the transport.
///
/// Relative requests are passed on to the rest of the pipeline. An absolute
/// request is sent once with the whole remaining budget as its timeout, and
/// the response is classified into a single-attempt result whose replica is
/// the request URL itself.
pub struct AbsoluteUrlSenderModule {
    transport: Arc<dyn Transport>,
    classifier: Arc<dyn ResponseClassifier>,
    criteria: Vec<SharedCriterion>,
    status_selector: Arc<dyn ClusterResultStatusSelector>,
}

impl AbsoluteUrlSenderModule {
    pub fn new(
        transport: Arc<dyn Transport>,
        classifier: Arc<dyn ResponseClassifier>,
        criteria: Vec<SharedCriterion>,
        status_selector: Arc<dyn ClusterResultStatusSelector>,
    ) -> Self {
        Self {
            transport,
            classifier,
            criteria,
            status_selector,
        }
    }
}

impl fmt::Debug for AbsoluteUrlSenderModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsoluteUrlSenderModule")
            .field("criteria", &self.criteria.len())
            .finish_non_exhaustive()
    }
}

impl RequestModule for AbsoluteUrlSenderModule {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            let Some(url) = ctx.request().url().as_absolute().cloned() else {
                return next.run(ctx).await;
            };
            let replica = Replica::new(url);

            let request = ctx.request().clone();
            let started = Instant::now();
            let timeout = ctx.budget().remaining();

            let response = match self
                .transport
                .send(request.clone(), timeout, ctx.cancellation())
                .await
            {
                Ok(response) => response,
                Err(TransportError::Canceled) => return ClusterResult::canceled(request),
                Err(TransportError::Other(error)) => {
                    tracing::warn!(
                        parent: ctx.span(),
                        service = ctx.service_name(),
                        url = %replica,
                        error = %error,
                        "transport failed to send request"
                    );
                    Response::unknown_failure()
                }
            };

            if response.code() == ResponseCode::CANCELED {
                return ClusterResult::canceled(request);
            }

            let verdict = self.classifier.decide(&response, &self.criteria);
            let results = vec![ReplicaResult::new(
                replica,
                response.clone(),
                verdict,
                started.elapsed(),
            )];
            let status = self.status_selector.select(&results, ctx.budget());

            ClusterResult::new(status, results, Some(response), request)
        })
    }
}

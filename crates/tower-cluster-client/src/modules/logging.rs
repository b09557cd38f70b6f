use futures::future::BoxFuture;
use tokio::time::Instant;
use tower_cluster_core::{ClusterResult, ClusterResultStatus, Next, RequestContext, RequestModule};

/// Logs the start and the outcome of every logical request.
#[derive(Debug, Clone, Copy)]
pub struct LoggingModule {
    requests: bool,
    results: bool,
}

impl LoggingModule {
    pub fn new(requests: bool, results: bool) -> Self {
        Self { requests, results }
    }
}

impl Default for LoggingModule {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl RequestModule for LoggingModule {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            let started = Instant::now();

            if self.requests {
                tracing::info!(
                    parent: ctx.span(),
                    service = ctx.service_name(),
                    method = %ctx.request().method(),
                    url = %ctx.request().url(),
                    timeout = ?ctx.budget().total(),
                    "sending request"
                );
            }

            let result = next.run(ctx).await;

            if self.results {
                let elapsed = started.elapsed();
                let code = result.response().map(|response| response.code().as_u16());
                let replica = result.replica().map(|replica| replica.authority());
                match result.status() {
                    ClusterResultStatus::Success => tracing::info!(
                        parent: ctx.span(),
                        service = ctx.service_name(),
                        status = %result.status(),
                        code,
                        replica = replica.as_deref(),
                        elapsed = ?elapsed,
                        "request succeeded"
                    ),
                    status => tracing::warn!(
                        parent: ctx.span(),
                        service = ctx.service_name(),
                        status = %status,
                        code,
                        replica = replica.as_deref(),
                        attempts = result.replica_results().len(),
                        elapsed = ?elapsed,
                        "request failed"
                    ),
                }
            }

            result
        })
    }
}

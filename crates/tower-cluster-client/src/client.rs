use crate::config::ClusterClientBuilder;
use futures::future::BoxFuture;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_cluster_core::{
    Budget, ClusterEvent, ClusterResult, EventListeners, Next, Request, RequestContext,
    RequestModule,
};
use tower_cluster_ordering::ReplicaStorageProvider;
use tower_cluster_throttling::ThrottlingStore;
use tower_service::Service;
use tracing::Instrument;

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// A client for one logical service backed by a set of replicas.
///
/// Every call runs the configured module pipeline under a fresh time budget
/// and always yields a [`ClusterResult`]; failures are expressed through its
/// status. Cloning is cheap and clones share replica health and throttling
/// state.
#[derive(Clone)]
pub struct ClusterClient {
    inner: Arc<Inner>,
}

struct Inner {
    service_name: Arc<str>,
    modules: Vec<Arc<dyn RequestModule>>,
    default_timeout: Duration,
    storage: Arc<ReplicaStorageProvider>,
    throttling: Arc<ThrottlingStore>,
    listeners: EventListeners<ClusterEvent>,
}

impl ClusterClient {
    pub fn builder() -> ClusterClientBuilder {
        ClusterClientBuilder::new()
    }

    pub(crate) fn from_parts(
        service_name: Arc<str>,
        modules: Vec<Arc<dyn RequestModule>>,
        default_timeout: Duration,
        storage: Arc<ReplicaStorageProvider>,
        throttling: Arc<ThrottlingStore>,
        listeners: EventListeners<ClusterEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                service_name,
                modules,
                default_timeout,
                storage,
                throttling,
                listeners,
            }),
        }
    }

    /// Sends `request` with a total time budget of `timeout`.
    pub async fn send(&self, request: Request, timeout: Duration) -> ClusterResult {
        self.send_with_cancellation(request, timeout, CancellationToken::new())
            .await
    }

    /// Sends `request`; canceling `cancellation` stops all attempts and yields
    /// a `Canceled` result.
    pub async fn send_with_cancellation(
        &self,
        request: Request,
        timeout: Duration,
        cancellation: CancellationToken,
    ) -> ClusterResult {
        let inner = &self.inner;
        let span = tracing::info_span!(
            "cluster_request",
            service = %inner.service_name,
            method = %request.method(),
        );
        let mut ctx = RequestContext::new(
            request,
            Budget::start(timeout),
            cancellation,
            Arc::clone(&inner.service_name),
        )
        .with_span(span.clone());

        let result = Next::new(&inner.modules)
            .run(&mut ctx)
            .instrument(span)
            .await;
        let elapsed = ctx.budget().elapsed();

        #[cfg(feature = "metrics")]
        {
            counter!(
                "cluster_client_results_total",
                "service" => inner.service_name.to_string(),
                "status" => result.status().to_string()
            )
            .increment(1);
            histogram!(
                "cluster_client_request_duration_seconds",
                "service" => inner.service_name.to_string()
            )
            .record(elapsed.as_secs_f64());
        }

        inner.listeners.emit(&ClusterEvent::RequestCompleted {
            service: inner.service_name.to_string(),
            status: result.status(),
            attempts: result.replica_results().len(),
            elapsed,
            timestamp: std::time::Instant::now(),
        });

        result
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    pub fn default_timeout(&self) -> Duration {
        self.inner.default_timeout
    }

    /// Replica state learned by orderings, shared by every clone.
    pub fn replica_storage(&self) -> &Arc<ReplicaStorageProvider> {
        &self.inner.storage
    }

    pub fn throttling_store(&self) -> &Arc<ThrottlingStore> {
        &self.inner.throttling
    }

    /// Number of modules in the pipeline.
    pub fn modules_count(&self) -> usize {
        self.inner.modules.len()
    }
}

impl fmt::Debug for ClusterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterClient")
            .field("service", &self.inner.service_name)
            .field("modules", &self.inner.modules.len())
            .field("default_timeout", &self.inner.default_timeout)
            .finish()
    }
}

impl Service<Request> for ClusterClient {
    type Response = ClusterResult;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<ClusterResult, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move {
            let timeout = client.default_timeout();
            Ok(client.send(request, timeout).await)
        })
    }
}

//! Client configuration.

use crate::client::ClusterClient;
use crate::cluster::ClusterProvider;
use crate::modules::{
    AbsoluteUrlSenderModule, LoggingModule, RequestExecutionModule, RequestRetryModule,
    RequestValidationModule, TimeoutValidationModule,
};
use crate::retry::{ImmediateRetryStrategy, NeverRetryPolicy, RetryPolicy, RetryStrategy};
use std::sync::Arc;
use std::time::Duration;
use tower_cluster_core::{
    criteria, ClusterEvent, ClusterResultStatus, ClusterResultStatusSelector, ConfigError, DefaultResponseClassifier,
    DefaultStatusSelector, EventListeners, FnListener, LastAcceptedResponseSelector, RequestModule,
    ResponseClassifier, ResponseSelector, SharedCriterion, Transport,
};
use tower_cluster_ordering::{AsIsOrdering, ReplicaOrdering, ReplicaStorageProvider};
use tower_cluster_strategy::{
    AttemptLogging, EqualTimeoutsProvider, ReplicaRequestSender, RequestStrategy,
    SequentialRequestStrategy,
};
use tower_cluster_throttling::{
    AdaptiveThrottlingModule, AdaptiveThrottlingOptions, ThrottlingEvent, ThrottlingStore,
};

/// Which log records the client writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Start of every logical request.
    pub requests: bool,
    /// Outcome of every logical request.
    pub results: bool,
    /// Every attempt sent to a replica.
    pub replica_requests: bool,
    /// Every classified replica response.
    pub replica_results: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            requests: true,
            results: true,
            replica_requests: true,
            replica_results: true,
        }
    }
}

/// Builder for [`ClusterClient`].
///
/// A transport and a cluster provider are required; everything else has a
/// default.
pub struct ClusterClientBuilder {
    service_name: String,
    transport: Option<Arc<dyn Transport>>,
    cluster: Option<Arc<dyn ClusterProvider>>,
    ordering: Arc<dyn ReplicaOrdering>,
    strategy: Option<Arc<dyn RequestStrategy>>,
    classifier: Arc<dyn ResponseClassifier>,
    criteria: Vec<SharedCriterion>,
    status_selector: Arc<dyn ClusterResultStatusSelector>,
    response_selector: Arc<dyn ResponseSelector>,
    default_timeout: Duration,
    max_replicas_per_request: usize,
    retry_policy: Arc<dyn RetryPolicy>,
    retry_strategy: Arc<dyn RetryStrategy>,
    throttling: Option<AdaptiveThrottlingOptions>,
    throttling_store: Option<Arc<ThrottlingStore>>,
    logging: LoggingOptions,
    modules: Vec<Arc<dyn RequestModule>>,
    listeners: EventListeners<ClusterEvent>,
    throttling_listeners: EventListeners<ThrottlingEvent>,
}

impl ClusterClientBuilder {
    pub fn new() -> Self {
        Self {
            service_name: "<unnamed>".to_string(),
            transport: None,
            cluster: None,
            ordering: Arc::new(AsIsOrdering),
            strategy: None,
            classifier: Arc::new(DefaultResponseClassifier),
            criteria: criteria::default_criteria(),
            status_selector: Arc::new(DefaultStatusSelector),
            response_selector: Arc::new(LastAcceptedResponseSelector),
            default_timeout: Duration::from_secs(30),
            max_replicas_per_request: 3,
            retry_policy: Arc::new(NeverRetryPolicy),
            retry_strategy: Arc::new(ImmediateRetryStrategy::new(1)),
            throttling: None,
            throttling_store: None,
            logging: LoggingOptions::default(),
            modules: Vec::new(),
            listeners: EventListeners::new(),
            throttling_listeners: EventListeners::new(),
        }
    }

    /// Logical service name used in logs, events and metrics.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn cluster<C: ClusterProvider + 'static>(mut self, cluster: C) -> Self {
        self.cluster = Some(Arc::new(cluster));
        self
    }

    /// Default: [`AsIsOrdering`].
    pub fn ordering<O: ReplicaOrdering + 'static>(mut self, ordering: O) -> Self {
        self.ordering = Arc::new(ordering);
        self
    }

    /// Default: sequential with equal timeouts over
    /// `max_replicas_per_request` attempts.
    pub fn strategy<S: RequestStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    pub fn classifier<C: ResponseClassifier + 'static>(mut self, classifier: C) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Replaces the criteria chain. Default: [`criteria::default_criteria`].
    pub fn criteria(mut self, criteria: Vec<SharedCriterion>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn status_selector<S: ClusterResultStatusSelector + 'static>(mut self, selector: S) -> Self {
        self.status_selector = Arc::new(selector);
        self
    }

    pub fn response_selector<S: ResponseSelector + 'static>(mut self, selector: S) -> Self {
        self.response_selector = Arc::new(selector);
        self
    }

    /// Timeout used by the `tower::Service` implementation.
    ///
    /// Default: 30 seconds
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Upper bound on the replicas one logical request may try.
    ///
    /// Default: 3
    pub fn max_replicas_per_request(mut self, max: usize) -> Self {
        self.max_replicas_per_request = max;
        self
    }

    /// Repeats requests that exhausted every replica.
    ///
    /// Default: no retries
    pub fn retry<P, S>(mut self, policy: P, strategy: S) -> Self
    where
        P: RetryPolicy + 'static,
        S: RetryStrategy + 'static,
    {
        self.retry_policy = Arc::new(policy);
        self.retry_strategy = Arc::new(strategy);
        self
    }

    /// Enables adaptive throttling with the given options.
    pub fn adaptive_throttling(mut self, options: AdaptiveThrottlingOptions) -> Self {
        self.throttling = Some(options);
        self
    }

    /// Shares throttling counters with other clients built on the same store.
    /// By default every client owns a fresh store.
    pub fn throttling_store(mut self, store: Arc<ThrottlingStore>) -> Self {
        self.throttling_store = Some(store);
        self
    }

    pub fn logging(mut self, logging: LoggingOptions) -> Self {
        self.logging = logging;
        self
    }

    /// Appends a custom module. Custom modules run after validation and
    /// before retries, in the order they were added.
    pub fn module<M: RequestModule + 'static>(mut self, module: M) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ClusterEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    /// Called with the final status and elapsed time of every logical request.
    pub fn on_request_completed<F>(self, f: F) -> Self
    where
        F: Fn(ClusterResultStatus, Duration) + Send + Sync + 'static,
    {
        self.on_event(move |event| {
            if let ClusterEvent::RequestCompleted {
                status, elapsed, ..
            } = event
            {
                f(*status, *elapsed);
            }
        })
    }

    pub fn on_throttling_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ThrottlingEvent) + Send + Sync + 'static,
    {
        self.throttling_listeners.add(FnListener::new(f));
        self
    }

    pub fn build(self) -> Result<ClusterClient, ConfigError> {
        let transport = self.transport.ok_or(ConfigError::Missing("transport"))?;
        let cluster = self.cluster.ok_or(ConfigError::Missing("cluster provider"))?;
        if self.default_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: "default_timeout",
                value: 0.0,
                expected: "> 0",
            });
        }
        if self.max_replicas_per_request == 0 {
            return Err(ConfigError::OutOfRange {
                name: "max_replicas_per_request",
                value: 0.0,
                expected: ">= 1",
            });
        }
        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => Arc::new(SequentialRequestStrategy::new(Arc::new(
                EqualTimeoutsProvider::new(self.max_replicas_per_request)?,
            ))),
        };

        let service_name: Arc<str> = Arc::from(self.service_name);
        let storage = Arc::new(ReplicaStorageProvider::new());
        let throttling_store = self.throttling_store.unwrap_or_default();

        let sender = ReplicaRequestSender::new(
            Arc::clone(&transport),
            Arc::clone(&self.ordering),
            Arc::clone(&storage),
        )
        .with_service_name(Arc::clone(&service_name))
        .with_classifier(Arc::clone(&self.classifier))
        .with_criteria(self.criteria.clone())
        .with_logging(AttemptLogging {
            requests: self.logging.replica_requests,
            results: self.logging.replica_results,
        })
        .with_listeners(self.listeners.clone());

        let mut modules: Vec<Arc<dyn RequestModule>> = vec![
            Arc::new(LoggingModule::new(
                self.logging.requests,
                self.logging.results,
            )),
            Arc::new(RequestValidationModule),
            Arc::new(TimeoutValidationModule),
        ];
        modules.extend(self.modules);
        modules.push(Arc::new(RequestRetryModule::new(
            self.retry_policy,
            self.retry_strategy,
        )));
        if let Some(options) = self.throttling {
            modules.push(Arc::new(
                AdaptiveThrottlingModule::new(options, &throttling_store)
                    .with_listeners(self.throttling_listeners),
            ));
        }
        modules.push(Arc::new(AbsoluteUrlSenderModule::new(
            transport,
            Arc::clone(&self.classifier),
            self.criteria,
            Arc::clone(&self.status_selector),
        )));
        modules.push(Arc::new(
            RequestExecutionModule::new(
                cluster,
                self.ordering,
                Arc::clone(&storage),
                strategy,
                Arc::new(sender),
            )
            .with_status_selector(self.status_selector)
            .with_response_selector(self.response_selector)
            .with_max_replicas_per_request(self.max_replicas_per_request),
        ));

        Ok(ClusterClient::from_parts(
            service_name,
            modules,
            self.default_timeout,
            storage,
            throttling_store,
            self.listeners,
        ))
    }
}

impl Default for ClusterClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

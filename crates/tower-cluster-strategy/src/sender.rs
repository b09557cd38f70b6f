//! Sending one attempt to one replica.

use crate::converter::RequestConverter;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_cluster_core::{
    Canceled, ClusterEvent, DefaultResponseClassifier, EventListeners, Replica, ReplicaResult,
    Request, Response, ResponseClassifier, ResponseCode, SharedCriterion, Transport,
    TransportError,
};
use tower_cluster_ordering::{ReplicaOrdering, ReplicaStorageProvider};

/// Sends a request to a single replica and classifies the outcome.
///
/// Only cancellation escapes as an error; every other failure is folded into
/// the response of the returned [`ReplicaResult`].
pub trait RequestSender: Send + Sync {
    fn send_to_replica<'a>(
        &'a self,
        replica: &'a Replica,
        request: &'a Request,
        timeout: Duration,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<ReplicaResult, Canceled>>;
}

/// Which per-attempt log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptLogging {
    /// Log every request sent to a replica.
    pub requests: bool,
    /// Log every classified result.
    pub results: bool,
}

impl Default for AttemptLogging {
    fn default() -> Self {
        Self {
            requests: true,
            results: true,
        }
    }
}

/// The standard [`RequestSender`]: convert, send through the transport,
/// classify with the criteria chain, then let the ordering learn.
pub struct ReplicaRequestSender {
    service_name: Arc<str>,
    transport: Arc<dyn Transport>,
    converter: RequestConverter,
    classifier: Arc<dyn ResponseClassifier>,
    criteria: Vec<SharedCriterion>,
    ordering: Arc<dyn ReplicaOrdering>,
    storage: Arc<ReplicaStorageProvider>,
    logging: AttemptLogging,
    listeners: EventListeners<ClusterEvent>,
}

impl ReplicaRequestSender {
    pub fn new(
        transport: Arc<dyn Transport>,
        ordering: Arc<dyn ReplicaOrdering>,
        storage: Arc<ReplicaStorageProvider>,
    ) -> Self {
        Self {
            service_name: Arc::from("<unnamed>"),
            transport,
            converter: RequestConverter,
            classifier: Arc::new(DefaultResponseClassifier),
            criteria: Vec::new(),
            ordering,
            storage,
            logging: AttemptLogging::default(),
            listeners: EventListeners::new(),
        }
    }

    pub fn with_service_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_criteria(mut self, criteria: Vec<SharedCriterion>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_logging(mut self, logging: AttemptLogging) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_listeners(mut self, listeners: EventListeners<ClusterEvent>) -> Self {
        self.listeners = listeners;
        self
    }

    async fn attempt(
        &self,
        replica: &Replica,
        request: &Request,
        timeout: Duration,
        cancellation: &CancellationToken,
    ) -> Result<ReplicaResult, Canceled> {
        let started = Instant::now();

        if self.logging.requests {
            tracing::info!(
                service = %self.service_name,
                replica = %replica.authority(),
                method = %request.method(),
                url = %request.url(),
                timeout = ?timeout,
                "sending request to replica"
            );
        }

        self.listeners.emit(&ClusterEvent::AttemptStarted {
            service: self.service_name.to_string(),
            replica: replica.clone(),
            timeout,
            timestamp: std::time::Instant::now(),
        });

        let response = match self.converter.convert(request, replica) {
            None => Response::unknown(),
            Some(absolute) => match self.transport.send(absolute, timeout, cancellation).await {
                Ok(response) => response,
                Err(TransportError::Canceled) => return Err(attribute(cancellation)),
                Err(TransportError::Other(error)) => {
                    tracing::warn!(
                        service = %self.service_name,
                        replica = %replica.authority(),
                        error = %error,
                        "transport failed to send request"
                    );
                    Response::unknown_failure()
                }
            },
        };

        if response.code() == ResponseCode::CANCELED {
            return Err(attribute(cancellation));
        }

        let verdict = self.classifier.decide(&response, &self.criteria);
        let result = ReplicaResult::new(replica.clone(), response, verdict, started.elapsed());

        if self.logging.results {
            tracing::info!(
                service = %self.service_name,
                replica = %replica.authority(),
                code = %result.response().code(),
                verdict = ?verdict,
                elapsed = ?result.duration(),
                "received response from replica"
            );
        }

        self.listeners.emit(&ClusterEvent::AttemptCompleted {
            service: self.service_name.to_string(),
            replica: replica.clone(),
            code: result.response().code(),
            verdict,
            duration: result.duration(),
            timestamp: std::time::Instant::now(),
        });

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "cluster_client_attempts_total",
            "service" => self.service_name.to_string(),
            "verdict" => verdict_label(verdict)
        )
        .increment(1);

        self.ordering.learn(&result, &self.storage);

        Ok(result)
    }
}

impl RequestSender for ReplicaRequestSender {
    fn send_to_replica<'a>(
        &'a self,
        replica: &'a Replica,
        request: &'a Request,
        timeout: Duration,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<ReplicaResult, Canceled>> {
        Box::pin(self.attempt(replica, request, timeout, cancellation))
    }
}

fn attribute(cancellation: &CancellationToken) -> Canceled {
    if cancellation.is_cancelled() {
        Canceled::ByCaller
    } else {
        Canceled::ByTransport
    }
}

#[cfg(feature = "metrics")]
fn verdict_label(verdict: tower_cluster_core::ResponseVerdict) -> &'static str {
    match verdict {
        tower_cluster_core::ResponseVerdict::Accept => "accept",
        tower_cluster_core::ResponseVerdict::Reject => "reject",
        tower_cluster_core::ResponseVerdict::DontKnow => "dont_know",
    }
}

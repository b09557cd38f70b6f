use std::time::Instant;
use tower_cluster_core::RequestEvent;

/// Events emitted by adaptive throttling.
#[derive(Debug, Clone)]
pub enum ThrottlingEvent {
    /// The request was shed without reaching any replica.
    RequestThrottled {
        service: String,
        timestamp: Instant,
        probability: f64,
        ratio: f64,
    },
    /// The request was let through and its outcome has been counted.
    OutcomeRecorded {
        service: String,
        timestamp: Instant,
        accepted: bool,
        requests: f64,
        accepts: f64,
    },
}

impl RequestEvent for ThrottlingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ThrottlingEvent::RequestThrottled { .. } => "request_throttled",
            ThrottlingEvent::OutcomeRecorded { .. } => "outcome_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ThrottlingEvent::RequestThrottled { timestamp, .. }
            | ThrottlingEvent::OutcomeRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn service_name(&self) -> &str {
        match self {
            ThrottlingEvent::RequestThrottled { service, .. }
            | ThrottlingEvent::OutcomeRecorded { service, .. } => service,
        }
    }
}

//! Outcomes of single attempts and of whole logical requests.

use crate::model::{Request, Response};
use crate::replica::Replica;
use std::fmt;
use std::time::Duration;

/// Outcome of classifying a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseVerdict {
    /// The response is good enough to stop trying other replicas.
    Accept,
    /// The response is bad; another replica may do better.
    Reject,
    /// The criterion has no opinion about the response.
    DontKnow,
}

/// Result of one attempt against one replica.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaResult {
    replica: Replica,
    response: Response,
    verdict: ResponseVerdict,
    duration: Duration,
}

impl ReplicaResult {
    pub fn new(
        replica: Replica,
        response: Response,
        verdict: ResponseVerdict,
        duration: Duration,
    ) -> Self {
        Self {
            replica,
            response,
            verdict,
            duration,
        }
    }

    pub fn replica(&self) -> &Replica {
        &self.replica
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn verdict(&self) -> ResponseVerdict {
        self.verdict
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == ResponseVerdict::Accept
    }
}

/// Final status of a logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClusterResultStatus {
    /// Some replica produced an accepted response.
    Success,
    /// The time budget ran out before any replica accepted.
    TimeExpired,
    /// Every replica was tried and none accepted.
    ReplicasExhausted,
    /// The cluster provider returned no replicas.
    ReplicasNotFound,
    /// The request was shed by adaptive throttling.
    Throttled,
    /// The caller (or the transport) canceled the request.
    Canceled,
    /// The request itself was invalid.
    IncorrectArguments,
}

impl fmt::Display for ClusterResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClusterResultStatus::Success => "Success",
            ClusterResultStatus::TimeExpired => "TimeExpired",
            ClusterResultStatus::ReplicasExhausted => "ReplicasExhausted",
            ClusterResultStatus::ReplicasNotFound => "ReplicasNotFound",
            ClusterResultStatus::Throttled => "Throttled",
            ClusterResultStatus::Canceled => "Canceled",
            ClusterResultStatus::IncorrectArguments => "IncorrectArguments",
        };
        f.write_str(name)
    }
}

/// Final outcome of a logical request.
#[derive(Debug, Clone)]
pub struct ClusterResult {
    status: ClusterResultStatus,
    replica_results: Vec<ReplicaResult>,
    response: Option<Response>,
    request: Request,
}

impl ClusterResult {
    pub fn new(
        status: ClusterResultStatus,
        replica_results: Vec<ReplicaResult>,
        response: Option<Response>,
        request: Request,
    ) -> Self {
        Self {
            status,
            replica_results,
            response,
            request,
        }
    }

    /// Result without any attempts.
    fn empty(status: ClusterResultStatus, request: Request) -> Self {
        Self::new(status, Vec::new(), None, request)
    }

    pub fn throttled(request: Request) -> Self {
        Self::empty(ClusterResultStatus::Throttled, request)
    }

    pub fn time_expired(request: Request) -> Self {
        Self::empty(ClusterResultStatus::TimeExpired, request)
    }

    pub fn replicas_not_found(request: Request) -> Self {
        Self::empty(ClusterResultStatus::ReplicasNotFound, request)
    }

    pub fn incorrect_arguments(request: Request) -> Self {
        Self::empty(ClusterResultStatus::IncorrectArguments, request)
    }

    pub fn canceled(request: Request) -> Self {
        Self::empty(ClusterResultStatus::Canceled, request)
    }

    pub fn status(&self) -> ClusterResultStatus {
        self.status
    }

    /// Attempts in the order they were issued.
    pub fn replica_results(&self) -> &[ReplicaResult] {
        &self.replica_results
    }

    /// Response chosen by the response selector, if there was any attempt.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn is_success(&self) -> bool {
        self.status == ClusterResultStatus::Success
    }

    /// Replica that produced the selected response.
    pub fn replica(&self) -> Option<&Replica> {
        let response = self.response.as_ref()?;
        self.replica_results
            .iter()
            .rev()
            .find(|result| result.response() == response)
            .map(ReplicaResult::replica)
    }
}

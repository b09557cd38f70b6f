//! Response criteria.
//!
//! A criterion is a pure predicate that looks at a [`Response`] and either
//! takes a side ([`ResponseVerdict::Accept`] / [`ResponseVerdict::Reject`]) or
//! abstains with [`ResponseVerdict::DontKnow`]. Criteria are evaluated in order
//! by a [`ResponseClassifier`](crate::ResponseClassifier); new policies are
//! added by writing a new criterion.
//!
//! Closures implement the trait directly:
//!
//! ```rust
//! use tower_cluster_core::{Response, ResponseCode, ResponseCriterion, ResponseVerdict};
//!
//! let reject_not_found = |response: &Response| {
//!     if response.code() == ResponseCode::NOT_FOUND {
//!         ResponseVerdict::Reject
//!     } else {
//!         ResponseVerdict::DontKnow
//!     }
//! };
//!
//! assert_eq!(reject_not_found.decide(&Response::new(ResponseCode::NOT_FOUND)), ResponseVerdict::Reject);
//! ```

use crate::model::{header_names, Response, ResponseCode};
use crate::result::ResponseVerdict;
use std::sync::Arc;

/// Capability of judging a single response.
pub trait ResponseCriterion: Send + Sync {
    fn decide(&self, response: &Response) -> ResponseVerdict;
}

impl<F> ResponseCriterion for F
where
    F: Fn(&Response) -> ResponseVerdict + Send + Sync,
{
    fn decide(&self, response: &Response) -> ResponseVerdict {
        self(response)
    }
}

/// Shared, type-erased criterion.
pub type SharedCriterion = Arc<dyn ResponseCriterion>;

/// Accepts everything. Usually the last criterion of a chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAcceptCriterion;

impl ResponseCriterion for AlwaysAcceptCriterion {
    fn decide(&self, _response: &Response) -> ResponseVerdict {
        ResponseVerdict::Accept
    }
}

/// Rejects everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRejectCriterion;

impl ResponseCriterion for AlwaysRejectCriterion {
    fn decide(&self, _response: &Response) -> ResponseVerdict {
        ResponseVerdict::Reject
    }
}

/// Accepts responses carrying the [`DONT_RETRY`](header_names::DONT_RETRY) marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptNonRetriableCriterion;

impl ResponseCriterion for AcceptNonRetriableCriterion {
    fn decide(&self, response: &Response) -> ResponseVerdict {
        if response.headers().contains_key(header_names::DONT_RETRY) {
            ResponseVerdict::Accept
        } else {
            ResponseVerdict::DontKnow
        }
    }
}

/// Rejects timeouts and connection-level failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectNetworkErrorsCriterion;

impl ResponseCriterion for RejectNetworkErrorsCriterion {
    fn decide(&self, response: &Response) -> ResponseVerdict {
        if response.code().is_network_error() {
            ResponseVerdict::Reject
        } else {
            ResponseVerdict::DontKnow
        }
    }
}

/// Rejects 5xx responses, except `501` and `505` which no other replica would answer differently.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectServerErrorsCriterion;

impl ResponseCriterion for RejectServerErrorsCriterion {
    fn decide(&self, response: &Response) -> ResponseVerdict {
        let code = response.code();
        if code == ResponseCode::NOT_IMPLEMENTED || code == ResponseCode::HTTP_VERSION_NOT_SUPPORTED
        {
            return ResponseVerdict::DontKnow;
        }
        if code.is_server_error() {
            ResponseVerdict::Reject
        } else {
            ResponseVerdict::DontKnow
        }
    }
}

/// Rejects `429 Too Many Requests` and `503 Service Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectThrottlingErrorsCriterion;

impl ResponseCriterion for RejectThrottlingErrorsCriterion {
    fn decide(&self, response: &Response) -> ResponseVerdict {
        match response.code() {
            ResponseCode::TOO_MANY_REQUESTS | ResponseCode::SERVICE_UNAVAILABLE => {
                ResponseVerdict::Reject
            }
            _ => ResponseVerdict::DontKnow,
        }
    }
}

/// Rejects the `Unknown` and `UnknownFailure` sentinels.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectUnknownErrorsCriterion;

impl ResponseCriterion for RejectUnknownErrorsCriterion {
    fn decide(&self, response: &Response) -> ResponseVerdict {
        if response.code().is_unknown() {
            ResponseVerdict::Reject
        } else {
            ResponseVerdict::DontKnow
        }
    }
}

/// The conventional criteria chain for idempotent requests.
pub fn default_criteria() -> Vec<SharedCriterion> {
    vec![
        Arc::new(AcceptNonRetriableCriterion),
        Arc::new(RejectNetworkErrorsCriterion),
        Arc::new(RejectServerErrorsCriterion),
        Arc::new(RejectThrottlingErrorsCriterion),
        Arc::new(RejectUnknownErrorsCriterion),
        Arc::new(AlwaysAcceptCriterion),
    ]
}

//! Core model for tower-cluster.
//!
//! This crate holds the vocabulary shared by every other tower-cluster crate:
//! - [`Request`] / [`Response`] values and [`ResponseCode`]
//! - [`Budget`], the time allowance of one logical request
//! - [`ResponseVerdict`], response criteria and the [`ResponseClassifier`]
//! - [`ReplicaResult`] / [`ClusterResult`] and the selectors that fold them
//! - the [`Transport`] seam and the [`RequestModule`] chain contract
//! - an event system for observability
//!
//! # Example
//!
//! ```rust
//! use tower_cluster_core::{criteria, DefaultResponseClassifier, Response, ResponseClassifier, ResponseCode, ResponseVerdict};
//!
//! let classifier = DefaultResponseClassifier;
//! let criteria = criteria::default_criteria();
//!
//! let verdict = classifier.decide(&Response::new(ResponseCode::SERVICE_UNAVAILABLE), &criteria);
//! assert_eq!(verdict, ResponseVerdict::Reject);
//! ```

pub mod budget;
pub mod classifier;
pub mod criteria;
pub mod error;
pub mod events;
pub mod model;
pub mod module;
pub mod replica;
pub mod result;
pub mod selectors;
pub mod transport;

pub use budget::Budget;
pub use classifier::{DefaultResponseClassifier, ResponseClassifier};
pub use criteria::{ResponseCriterion, SharedCriterion};
pub use error::{BoxError, Canceled, ConfigError, TransportError};
pub use events::{ClusterEvent, EventListener, EventListeners, FnListener, RequestEvent};
pub use model::{header_names, Request, RequestUrl, Response, ResponseCode};
pub use module::{Next, RequestContext, RequestModule};
pub use replica::Replica;
pub use result::{ClusterResult, ClusterResultStatus, ReplicaResult, ResponseVerdict};
pub use selectors::{
    ClusterResultStatusSelector, DefaultStatusSelector, LastAcceptedResponseSelector,
    ResponseSelector,
};
pub use transport::{ServiceTransport, Transport};

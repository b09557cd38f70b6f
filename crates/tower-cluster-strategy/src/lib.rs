//! Request strategies for tower-cluster.
//!
//! A strategy decides how many replicas are tried, when, and with which
//! timeout. It drives a [`RequestSender`], which performs one attempt against
//! one replica: it converts relative URLs, calls the transport, classifies the
//! response and lets the replica ordering learn from it.
//!
//! - [`SequentialRequestStrategy`]: one attempt at a time, timeouts from a
//!   [`SequentialTimeoutsProvider`]
//! - [`ForkingRequestStrategy`]: overlapping attempts, spaced by a
//!   [`ForkingDelaysProvider`] and bounded by a maximum parallelism
//! - [`ParallelRequestStrategy`]: forking without delays
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tower_cluster_strategy::{
//!     EqualDelaysProvider, EqualTimeoutsProvider, ForkingRequestStrategy, SequentialRequestStrategy,
//! };
//!
//! let sequential = SequentialRequestStrategy::new(Arc::new(EqualTimeoutsProvider::new(3).unwrap()));
//! let forking = ForkingRequestStrategy::new(Arc::new(EqualDelaysProvider::new(3).unwrap()), 3).unwrap();
//! # let _ = (sequential, forking);
//! ```

mod converter;
mod delays;
mod forking;
mod sender;
mod sequential;
mod strategy;
mod timeouts;

pub use converter::RequestConverter;
pub use delays::{EqualDelaysProvider, FixedDelaysProvider, ForkingDelaysProvider, TailDelayBehaviour};
pub use forking::{ForkingRequestStrategy, ParallelRequestStrategy};
pub use sender::{AttemptLogging, ReplicaRequestSender, RequestSender};
pub use sequential::SequentialRequestStrategy;
pub use strategy::RequestStrategy;
pub use timeouts::{
    AdHocThenEqualTimeoutsProvider, EqualTimeoutsProvider, FixedTimeoutsProvider,
    SequentialTimeoutsProvider, TailTimeoutBehaviour, TimeoutSupplier,
};

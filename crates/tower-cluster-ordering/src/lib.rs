//! Replica ordering for tower-cluster.
//!
//! An ordering decides in which order the replicas of a cluster are tried for
//! a request, and learns from the outcome of every attempt. State learned
//! about replicas lives in a [`ReplicaStorageProvider`] owned by the client,
//! not in globals, so independent clients never share health information.
//!
//! - [`AsIsOrdering`]: keeps the order of the cluster provider
//! - [`RandomOrdering`]: shuffles per request (seedable)
//! - [`AdaptiveHealthOrdering`]: healthiest replicas first
//!
//! # Example
//!
//! ```rust
//! use tower_cluster_core::{Replica, ReplicaResult, Request, Response, ResponseVerdict};
//! use tower_cluster_ordering::{AdaptiveHealthOrdering, ReplicaOrdering, ReplicaStorageProvider};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ordering = AdaptiveHealthOrdering::default();
//! let storage = ReplicaStorageProvider::new();
//! let a: Replica = "http://a:80/".parse().unwrap();
//! let b: Replica = "http://b:80/".parse().unwrap();
//!
//! let failed = ReplicaResult::new(a.clone(), Response::timeout(), ResponseVerdict::Reject, Duration::ZERO);
//! ordering.learn(&failed, &storage);
//!
//! let ordered = ordering.order(&[a.clone(), b.clone()], &storage, &Request::get("/"));
//! assert_eq!(ordered, vec![b, a]);
//! # }
//! ```

mod health;
mod ordering;
mod storage;

pub use health::{AdaptiveHealthOrdering, HealthOptions, HealthOptionsBuilder, HealthState};
pub use ordering::{AsIsOrdering, RandomOrdering, ReplicaOrdering};
pub use storage::{ReplicaStorage, ReplicaStorageProvider};

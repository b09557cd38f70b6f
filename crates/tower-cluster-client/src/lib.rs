//! Cluster-aware request client for tower.
//!
//! [`ClusterClient`] sends each logical request to the replicas of one service.
//! It decides which replicas to try, in what order, with what timeout, how
//! many at once and when to give up. Every call runs a pipeline of
//! [`RequestModule`](tower_cluster_core::RequestModule)s under one shrinking
//! time budget and yields a [`ClusterResult`](tower_cluster_core::ClusterResult).
//!
//! # Features
//!
//! - Replica orderings that learn from results (as-is, random, adaptive health)
//! - Sequential, forking and parallel strategies with pluggable delay and
//!   timeout providers
//! - Response classification through an ordered chain of criteria
//! - Whole-request retries bounded by the budget
//! - Optional adaptive throttling of overloaded services
//! - Structured `tracing` logs, typed events and optional `metrics`
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tower_cluster_client::{ClusterClient, FixedClusterProvider};
//! use tower_cluster_core::{Request, Response, ResponseCode, ServiceTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ServiceTransport::new(tower::service_fn(|_request: Request| async {
//!     Ok::<_, std::convert::Infallible>(Response::new(ResponseCode::OK))
//! }));
//!
//! let client = ClusterClient::builder()
//!     .service_name("billing")
//!     .transport(transport)
//!     .cluster(FixedClusterProvider::from_urls([
//!         "http://replica1:8080/",
//!         "http://replica2:8080/",
//!     ])?)
//!     .build()?;
//!
//! let result = client
//!     .send(Request::get("api/invoices"), Duration::from_secs(5))
//!     .await;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! See [`modules`] for the built-in stages and their order. Custom modules
//! are added with [`ClusterClientBuilder::module`].

mod client;
mod cluster;
mod config;
pub mod modules;
pub mod retry;

pub use client::ClusterClient;
pub use cluster::{ClusterProvider, FixedClusterProvider};
pub use config::{ClusterClientBuilder, LoggingOptions};
pub use retry::{
    AlwaysRetryPolicy, ExponentialBackoffRetryStrategy, FixedRetryStrategy, FnRetryPolicy,
    ImmediateRetryStrategy, NeverRetryPolicy, RetryPolicy, RetryStrategy,
};

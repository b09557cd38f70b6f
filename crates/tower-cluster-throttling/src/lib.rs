//! Adaptive client-side throttling for tower-cluster.
//!
//! [`AdaptiveThrottlingModule`] is a pipeline stage that sheds requests to an
//! overloaded service before they reach any replica. Instead of an open/closed
//! breaker it keeps decaying counts of requests and accepted requests per
//! service and rejects with a probability that grows as requests outrun
//! accepts:
//!
//! ```text
//! probability = clamp((requests - critical_ratio * accepts) / (requests + 1), 0, probability_cap)
//! ```
//!
//! A shed request counts as a request, so sustained accepts always pull the
//! probability back down. Nothing is shed until the service has seen
//! `minimum_requests` requests.
//! Counters halve once per decay period, so old history fades.
//!
//! Counters live in a [`ThrottlingStore`] owned by the client. Modules created
//! for the same service name on the same store share them.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tower_cluster_throttling::{AdaptiveThrottlingModule, AdaptiveThrottlingOptions, ThrottlingStore};
//!
//! let store = ThrottlingStore::new();
//! let options = AdaptiveThrottlingOptions::builder("billing")
//!     .minimum_requests(50)
//!     .decay_period(Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//!
//! let module = AdaptiveThrottlingModule::new(options, &store);
//! assert_eq!(module.rejection_probability(), 0.0);
//! ```

mod config;
mod events;
mod module;
mod store;

pub use config::{AdaptiveThrottlingOptions, AdaptiveThrottlingOptionsBuilder};
pub use events::ThrottlingEvent;
pub use module::AdaptiveThrottlingModule;
pub use store::{ServiceCounters, ThrottlingStore};

//! Client tests driven through a scripted in-memory transport.

pub mod cancellation;
pub mod logging;
pub mod pipeline;
pub mod retries;
pub mod throttling;

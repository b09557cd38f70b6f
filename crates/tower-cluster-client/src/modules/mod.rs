//! Built-in pipeline stages.
//!
//! The client assembles them in this order:
//!
//! 1. [`LoggingModule`]
//! 2. [`RequestValidationModule`]
//! 3. [`TimeoutValidationModule`]
//! 4. user modules
//! 5. [`RequestRetryModule`]
//! 6. [`AdaptiveThrottlingModule`](tower_cluster_throttling::AdaptiveThrottlingModule), when configured
//! 7. [`AbsoluteUrlSenderModule`]
//! 8. [`RequestExecutionModule`]

mod absolute;
mod execution;
mod logging;
mod retry;
mod validation;

pub use absolute::AbsoluteUrlSenderModule;
pub use execution::RequestExecutionModule;
pub use logging::LoggingModule;
pub use retry::RequestRetryModule;
pub use validation::{RequestValidationModule, TimeoutValidationModule};

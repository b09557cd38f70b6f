//! Configuration for adaptive throttling.

use std::time::Duration;
use tower_cluster_core::ConfigError;

/// Tuning of one [`AdaptiveThrottlingModule`](crate::AdaptiveThrottlingModule).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdaptiveThrottlingOptions {
    service_name: String,
    decay_period: Duration,
    minimum_requests: u32,
    critical_ratio: f64,
    probability_cap: f64,
}

impl AdaptiveThrottlingOptions {
    /// Starts a builder for the service `service_name`. Counters are shared
    /// by every module built with the same service name and store.
    pub fn builder(service_name: impl Into<String>) -> AdaptiveThrottlingOptionsBuilder {
        AdaptiveThrottlingOptionsBuilder::new(service_name)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn decay_period(&self) -> Duration {
        self.decay_period
    }

    pub fn minimum_requests(&self) -> u32 {
        self.minimum_requests
    }

    pub fn critical_ratio(&self) -> f64 {
        self.critical_ratio
    }

    pub fn probability_cap(&self) -> f64 {
        self.probability_cap
    }
}

/// Builder for [`AdaptiveThrottlingOptions`].
#[derive(Debug, Clone)]
pub struct AdaptiveThrottlingOptionsBuilder {
    options: AdaptiveThrottlingOptions,
}

impl AdaptiveThrottlingOptionsBuilder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            options: AdaptiveThrottlingOptions {
                service_name: service_name.into(),
                decay_period: Duration::from_secs(120),
                minimum_requests: 30,
                critical_ratio: 2.0,
                probability_cap: 0.8,
            },
        }
    }

    /// Counters are halved once per elapsed decay period.
    ///
    /// Default: 2 minutes
    pub fn decay_period(mut self, period: Duration) -> Self {
        self.options.decay_period = period;
        self
    }

    /// Below this many (decayed) requests nothing is throttled.
    ///
    /// Default: 30
    pub fn minimum_requests(mut self, count: u32) -> Self {
        self.options.minimum_requests = count;
        self
    }

    /// Requests-to-accepts ratio above which requests start being shed. Must be
    /// greater than `1.0`.
    ///
    /// Default: 2.0
    pub fn critical_ratio(mut self, ratio: f64) -> Self {
        self.options.critical_ratio = ratio;
        self
    }

    /// Upper bound of the rejection probability, in `(0, 1]`.
    ///
    /// Default: 0.8
    pub fn probability_cap(mut self, cap: f64) -> Self {
        self.options.probability_cap = cap;
        self
    }

    pub fn build(self) -> Result<AdaptiveThrottlingOptions, ConfigError> {
        let options = self.options;
        if options.decay_period.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: "decay_period",
                value: 0.0,
                expected: "> 0",
            });
        }
        if options.minimum_requests == 0 {
            return Err(ConfigError::OutOfRange {
                name: "minimum_requests",
                value: 0.0,
                expected: ">= 1",
            });
        }
        if options.critical_ratio.is_nan() || options.critical_ratio <= 1.0 {
            return Err(ConfigError::OutOfRange {
                name: "critical_ratio",
                value: options.critical_ratio,
                expected: "> 1.0",
            });
        }
        if options.probability_cap.is_nan()
            || options.probability_cap <= 0.0
            || options.probability_cap > 1.0
        {
            return Err(ConfigError::OutOfRange {
                name: "probability_cap",
                value: options.probability_cap,
                expected: "in (0, 1]",
            });
        }
        Ok(options)
    }
}

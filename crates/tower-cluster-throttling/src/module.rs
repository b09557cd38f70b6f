//! The throttling pipeline stage.

use crate::config::AdaptiveThrottlingOptions;
use crate::events::ThrottlingEvent;
use crate::store::{CounterState, ServiceCounters, ThrottlingStore};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tower_cluster_core::{
    ClusterResult, ClusterResultStatus, EventListeners, Next, RequestContext, RequestModule,
};

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Sheds requests with a probability derived from how far the service's recent
/// requests outrun `critical_ratio` times its accepts.
///
/// Every decision reads and updates the shared counters of the configured
/// service under one lock. A request that is let through is counted again once
/// the downstream result is known: `Success` increments both counters, any
/// other status increments requests only. A shed request increments requests
/// only and returns [`ClusterResultStatus::Throttled`] without running the rest
/// of the chain.
pub struct AdaptiveThrottlingModule {
    options: AdaptiveThrottlingOptions,
    counters: Arc<ServiceCounters>,
    rng: Mutex<StdRng>,
    listeners: EventListeners<ThrottlingEvent>,
}

impl AdaptiveThrottlingModule {
    pub fn new(options: AdaptiveThrottlingOptions, store: &ThrottlingStore) -> Self {
        Self::with_rng(options, store, StdRng::from_os_rng())
    }

    /// Same as [`new`](Self::new) with a deterministic sampler.
    pub fn with_seed(options: AdaptiveThrottlingOptions, store: &ThrottlingStore, seed: u64) -> Self {
        Self::with_rng(options, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(options: AdaptiveThrottlingOptions, store: &ThrottlingStore, rng: StdRng) -> Self {
        let counters = store.counters(options.service_name());
        Self {
            options,
            counters,
            rng: Mutex::new(rng),
            listeners: EventListeners::new(),
        }
    }

    pub fn with_listeners(mut self, listeners: EventListeners<ThrottlingEvent>) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn options(&self) -> &AdaptiveThrottlingOptions {
        &self.options
    }

    /// Decayed request count of the service.
    pub fn requests(&self) -> f64 {
        self.read(|state| state.requests)
    }

    /// Decayed accept count of the service.
    pub fn accepts(&self) -> f64 {
        self.read(|state| state.accepts)
    }

    /// `requests / max(accepts, 1)`, or `0` before the first request.
    pub fn ratio(&self) -> f64 {
        self.read(ratio)
    }

    /// `(requests - critical_ratio * accepts) / (requests + 1)`, capped.
    ///
    /// Requests are only shed once the request count reaches the configured
    /// minimum; below it this value is reported but never drawn against.
    pub fn rejection_probability(&self) -> f64 {
        self.read(|state| self.probability(state))
    }

    fn read<R>(&self, f: impl FnOnce(&CounterState) -> R) -> R {
        self.counters
            .with_state(self.options.decay_period(), |state| f(state))
    }

    fn probability(&self, state: &CounterState) -> f64 {
        let excess = state.requests - self.options.critical_ratio() * state.accepts;
        (excess / (state.requests + 1.0)).clamp(0.0, self.options.probability_cap())
    }

    /// Draws against the current probability; a shed request is counted
    /// before the lock is released.
    fn try_throttle(&self) -> Option<(f64, f64)> {
        self.counters
            .with_state(self.options.decay_period(), |state| {
                if state.requests < f64::from(self.options.minimum_requests()) {
                    return None;
                }
                let probability = self.probability(state);
                if probability <= 0.0 {
                    return None;
                }
                let sample: f64 = self.rng.lock().random();
                if sample >= probability {
                    return None;
                }
                let shed_at = (probability, ratio(state));
                state.requests += 1.0;
                Some(shed_at)
            })
    }

    fn record(&self, accepted: bool) -> (f64, f64) {
        self.counters
            .with_state(self.options.decay_period(), |state| {
                state.requests += 1.0;
                if accepted {
                    state.accepts += 1.0;
                }
                (state.requests, state.accepts)
            })
    }
}

fn ratio(state: &CounterState) -> f64 {
    if state.requests > 0.0 {
        state.requests / state.accepts.max(1.0)
    } else {
        0.0
    }
}

impl RequestModule for AdaptiveThrottlingModule {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            let service = self.options.service_name();

            if let Some((probability, ratio)) = self.try_throttle() {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    parent: ctx.span(),
                    service,
                    probability,
                    ratio,
                    "request throttled"
                );

                #[cfg(feature = "metrics")]
                {
                    counter!("cluster_client_throttled_total", "service" => service.to_string())
                        .increment(1);
                    gauge!("cluster_client_rejection_probability", "service" => service.to_string())
                        .set(probability);
                }

                self.listeners.emit(&ThrottlingEvent::RequestThrottled {
                    service: service.to_string(),
                    timestamp: Instant::now(),
                    probability,
                    ratio,
                });
                return ClusterResult::throttled(ctx.request().clone());
            }

            let result = next.run(ctx).await;

            let accepted = result.status() == ClusterResultStatus::Success;
            let (requests, accepts) = self.record(accepted);

            #[cfg(feature = "metrics")]
            gauge!("cluster_client_rejection_probability", "service" => service.to_string())
                .set(self.rejection_probability());

            self.listeners.emit(&ThrottlingEvent::OutcomeRecorded {
                service: service.to_string(),
                timestamp: Instant::now(),
                accepted,
                requests,
                accepts,
            });
            result
        })
    }
}

impl fmt::Debug for AdaptiveThrottlingModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveThrottlingModule")
            .field("options", &self.options)
            .field("counters", &self.counters)
            .finish()
    }
}

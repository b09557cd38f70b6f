//! Per-service throttling counters.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Beyond this many elapsed periods the counters are simply reset.
const MAX_HALVINGS: u128 = 64;

/// Requests and accepts of one service.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CounterState {
    pub(crate) requests: f64,
    pub(crate) accepts: f64,
    epoch: Instant,
}

impl CounterState {
    fn new() -> Self {
        Self {
            requests: 0.0,
            accepts: 0.0,
            epoch: Instant::now(),
        }
    }

    /// Halves both counters once per whole `period` elapsed since the last decay.
    fn decay(&mut self, now: Instant, period: Duration) {
        let elapsed = now.saturating_duration_since(self.epoch);
        let halvings = elapsed.as_nanos() / period.as_nanos().max(1);
        if halvings == 0 {
            return;
        }
        if halvings >= MAX_HALVINGS {
            self.requests = 0.0;
            self.accepts = 0.0;
            self.epoch = now;
            return;
        }

        let factor = 0.5_f64.powi(halvings as i32);
        self.requests *= factor;
        self.accepts *= factor;
        self.epoch += period * halvings as u32;
    }
}

/// Counters of one service, guarded by a single lock.
pub struct ServiceCounters {
    state: Mutex<CounterState>,
}

impl ServiceCounters {
    fn new() -> Self {
        Self {
            state: Mutex::new(CounterState::new()),
        }
    }

    /// Runs `f` on the decayed counters while holding the lock.
    pub(crate) fn with_state<R>(
        &self,
        decay_period: Duration,
        f: impl FnOnce(&mut CounterState) -> R,
    ) -> R {
        let mut state = self.state.lock();
        state.decay(Instant::now(), decay_period);
        f(&mut state)
    }
}

impl fmt::Debug for ServiceCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ServiceCounters")
            .field("requests", &state.requests)
            .field("accepts", &state.accepts)
            .finish()
    }
}

/// Map from service name to its counters, owned by a client.
///
/// Modules built for the same service name on the same store share their
/// history; separate stores never do.
#[derive(Default)]
pub struct ThrottlingStore {
    services: Mutex<HashMap<String, Arc<ServiceCounters>>>,
}

impl ThrottlingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counters of `service_name`, creating them on first use.
    pub fn counters(&self, service_name: &str) -> Arc<ServiceCounters> {
        let mut services = self.services.lock();
        if let Some(counters) = services.get(service_name) {
            return Arc::clone(counters);
        }
        let counters = Arc::new(ServiceCounters::new());
        services.insert(service_name.to_string(), Arc::clone(&counters));
        counters
    }

    /// Number of services tracked.
    pub fn len(&self) -> usize {
        self.services.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.lock().is_empty()
    }
}

impl fmt::Debug for ThrottlingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottlingStore")
            .field("services", &self.len())
            .finish()
    }
}

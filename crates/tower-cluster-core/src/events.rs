//! Event system for cluster requests.
//!
//! Components emit typed events to registered listeners. Emission is
//! fire-and-forget: a listener that panics is isolated so it can never change
//! the outcome of a request.

use crate::model::ResponseCode;
use crate::replica::Replica;
use crate::result::{ClusterResultStatus, ResponseVerdict};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for events emitted by cluster components.
pub trait RequestEvent: Send + Sync + fmt::Debug {
    /// Short machine-friendly event type, e.g. `"attempt_started"`.
    fn event_type(&self) -> &'static str;

    /// When this event occurred.
    fn timestamp(&self) -> Instant;

    /// Logical service the event belongs to.
    fn service_name(&self) -> &str;
}

/// Trait for listening to events.
pub trait EventListener<E: RequestEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// Type alias for shared event listeners.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A collection of event listeners.
#[derive(Clone)]
pub struct EventListeners<E: RequestEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: RequestEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to all registered listeners.
    ///
    /// A panicking listener is caught and the remaining listeners still run.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: RequestEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RequestEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// A closure-backed event listener.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: RequestEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

/// Events emitted while executing a logical request.
#[derive(Debug, Clone)]
pub enum ClusterEvent {
    /// An attempt is about to be sent to a replica.
    AttemptStarted {
        service: String,
        replica: Replica,
        timeout: Duration,
        timestamp: Instant,
    },

    /// An attempt produced a classified response.
    AttemptCompleted {
        service: String,
        replica: Replica,
        code: ResponseCode,
        verdict: ResponseVerdict,
        duration: Duration,
        timestamp: Instant,
    },

    /// A logical request finished.
    RequestCompleted {
        service: String,
        status: ClusterResultStatus,
        attempts: usize,
        elapsed: Duration,
        timestamp: Instant,
    },
}

impl RequestEvent for ClusterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ClusterEvent::AttemptStarted { .. } => "attempt_started",
            ClusterEvent::AttemptCompleted { .. } => "attempt_completed",
            ClusterEvent::RequestCompleted { .. } => "request_completed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ClusterEvent::AttemptStarted { timestamp, .. }
            | ClusterEvent::AttemptCompleted { timestamp, .. }
            | ClusterEvent::RequestCompleted { timestamp, .. } => *timestamp,
        }
    }

    fn service_name(&self) -> &str {
        match self {
            ClusterEvent::AttemptStarted { service, .. }
            | ClusterEvent::AttemptCompleted { service, .. }
            | ClusterEvent::RequestCompleted { service, .. } => service,
        }
    }
}

use thiserror::Error;

/// Boxed error used at the transport boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Deliberate cancellation of a logical request or of one of its attempts.
///
/// This is the only failure that escapes the request sender and the
/// strategies; every other fault is turned into a classified response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Canceled {
    /// The caller's cancellation token fired.
    #[error("request was canceled by the caller")]
    ByCaller,

    /// The transport canceled the attempt on its own.
    #[error("attempt was canceled by the transport")]
    ByTransport,
}

impl Canceled {
    /// Returns true if the cancellation is attributable to the caller.
    pub fn is_by_caller(&self) -> bool {
        matches!(self, Canceled::ByCaller)
    }
}

/// Failure raised by a [`Transport`](crate::Transport).
///
/// Transports are expected to return responses for ordinary network
/// conditions; raising is reserved for cancellation and programmer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport observed a cancellation while sending.
    #[error("transport call was canceled")]
    Canceled,

    /// Anything else the transport could not turn into a response.
    #[error("transport failure: {0}")]
    Other(#[source] BoxError),
}

impl TransportError {
    /// Wraps an arbitrary error.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        TransportError::Other(error.into())
    }
}

/// Invalid configuration detected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A division factor must be a positive integer.
    #[error("division factor must be positive, got {0}")]
    NonPositiveDivisionFactor(i64),

    /// A sequence of durations or suppliers was empty.
    #[error("{0} must contain at least one value")]
    EmptySequence(&'static str),

    /// A numeric option fell outside of its allowed range.
    #[error("{name} is out of range: {value} ({expected})")]
    OutOfRange {
        /// Option name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Human-readable constraint.
        expected: &'static str,
    },

    /// A required component was never supplied to a builder.
    #[error("missing required component: {0}")]
    Missing(&'static str),
}

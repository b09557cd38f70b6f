//! Time budget of a logical request.
//!
//! A [`Budget`] is created once per logical request and read by every
//! component downstream: modules, strategies and timeout providers. It is
//! never reset. The start instant comes from the tokio clock so tests can
//! freeze time with `tokio::time::pause`.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Remaining time allowance for a logical request across all of its attempts.
#[derive(Clone, Copy)]
pub struct Budget {
    total: Duration,
    started: Instant,
    infinite: bool,
}

impl Budget {
    /// Starts a new budget of `total` time from now.
    pub fn start(total: Duration) -> Self {
        Self {
            total,
            started: Instant::now(),
            infinite: false,
        }
    }

    /// Alias of [`Budget::start`] that reads better in tests and call sites
    /// which care about what is left rather than what was granted.
    pub fn with_remaining(remaining: Duration) -> Self {
        Self::start(remaining)
    }

    /// A budget that never expires. Its remaining time is `Duration::MAX`.
    pub fn infinite() -> Self {
        Self {
            total: Duration::MAX,
            started: Instant::now(),
            infinite: true,
        }
    }

    /// A budget that has always expired.
    pub fn expired() -> Self {
        Self::start(Duration::ZERO)
    }

    /// Total time granted to the request.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Time elapsed since the budget was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `total - elapsed`, clamped to zero.
    pub fn remaining(&self) -> Duration {
        if self.infinite {
            return Duration::MAX;
        }
        self.total.saturating_sub(self.elapsed())
    }

    /// Returns `true` once nothing is left of the budget.
    pub fn has_expired(&self) -> bool {
        !self.infinite && self.remaining().is_zero()
    }

    /// Returns `true` for [`Budget::infinite`].
    pub fn is_infinite(&self) -> bool {
        self.infinite
    }
}

impl fmt::Debug for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.infinite {
            return f.write_str("Budget(infinite)");
        }
        f.debug_struct("Budget")
            .field("total", &self.total)
            .field("remaining", &self.remaining())
            .finish()
    }
}

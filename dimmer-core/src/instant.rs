//! Monotonic time abstraction shared by firmware and host targets.
//!
//! The core never reads a clock itself. Callers hand in timestamps from the
//! Embassy time driver on the MCU or from a simulated clock on the host, and
//! the core only needs to add durations and measure elapsed time.

use core::ops::Add;
use core::time::Duration;

/// Trait implemented by monotonic instant wrappers used by the dimmer engine.
pub trait MonotonicInstant: Copy + Ord + Add<Duration, Output = Self> {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Microsecond timestamp used by host tooling and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Micros(u64);

impl Micros {
    /// Timestamp at the origin of the clock.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from a raw microsecond count.
    #[must_use]
    pub const fn from_micros(value: u64) -> Self {
        Self(value)
    }

    /// Creates a timestamp from a raw millisecond count.
    #[must_use]
    pub const fn from_millis(value: u64) -> Self {
        Self(value * 1_000)
    }

    /// Returns the raw microsecond count.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for Micros {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let delta = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(delta))
    }
}

impl MonotonicInstant for Micros {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

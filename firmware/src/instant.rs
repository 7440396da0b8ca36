//! Embassy time adapter for the dimmer core.

use core::ops::Add;
use core::time::Duration;

use dimmer_core::MonotonicInstant;
use embassy_time::Instant;

/// Embassy [`Instant`] wrapped so the core can schedule against it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    /// Reads the time driver.
    #[cfg(target_os = "none")]
    #[must_use]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    #[must_use]
    pub const fn into_embassy(self) -> Instant {
        self.0
    }

    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0.as_micros()
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(value: Instant) -> Self {
        Self(value)
    }
}

impl Add<Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.checked_add(to_embassy(rhs)).unwrap_or(Instant::MAX))
    }
}

impl MonotonicInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_duration_since(earlier.0).as_micros())
    }
}

/// Converts a core duration to the driver's tick-based duration.
#[must_use]
pub fn to_embassy(duration: Duration) -> embassy_time::Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    embassy_time::Duration::from_micros(micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(micros: u64) -> FirmwareInstant {
        FirmwareInstant::from(Instant::from_micros(micros))
    }

    #[test]
    fn adding_a_duration_moves_forward() {
        let later = at(1_000) + Duration::from_micros(250);
        assert_eq!(later.as_micros(), 1_250);
    }

    #[test]
    fn elapsed_time_saturates_at_zero() {
        assert_eq!(
            at(5_000).saturating_duration_since(at(2_000)),
            Duration::from_micros(3_000)
        );
        assert_eq!(at(2_000).saturating_duration_since(at(5_000)), Duration::ZERO);
    }

    #[test]
    fn durations_convert_to_driver_ticks() {
        assert_eq!(to_embassy(Duration::from_millis(3)).as_micros(), 3_000);
    }
}

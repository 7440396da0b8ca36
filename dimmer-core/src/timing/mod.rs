//! Per-half-cycle firing decisions.
//!
//! Phase control turns a brightness into a delay after the crossing. Pulse
//! density turns it into a fire/skip verdict for the whole half-cycle, see
//! [`pulse_density`].

use core::time::Duration;

pub mod pulse_density;

pub use pulse_density::{PULSE_WINDOW, PulseDensityWindow};

/// Highest brightness level.
pub const MAX_LEVEL: u8 = 100;

/// Clamps an arbitrary integer to the 0-100 brightness range.
#[must_use]
pub fn clamp_level(value: i32) -> u8 {
    u8::try_from(value.clamp(0, i32::from(MAX_LEVEL))).unwrap_or(MAX_LEVEL)
}

/// What a channel wants from its gate during the current half-cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FireDecision {
    /// Leave the gate alone this half-cycle.
    Skip,
    /// Assert the gate once `Duration` has elapsed since the crossing.
    FireAfter(Duration),
}

impl FireDecision {
    /// Returns the firing delay, if the half-cycle fires at all.
    #[must_use]
    pub const fn delay(self) -> Option<Duration> {
        match self {
            FireDecision::Skip => None,
            FireDecision::FireAfter(delay) => Some(delay),
        }
    }
}

/// Leading-edge firing delay: `T − v·T/100`, truncated to whole microseconds.
///
/// Returns `None` for `level == 0` so a zero brightness never schedules a pulse
/// that could spill into the next half-cycle.
#[must_use]
pub fn phase_delay(half_cycle: Duration, level: u8) -> Option<Duration> {
    let level = level.min(MAX_LEVEL);
    if level == 0 {
        return None;
    }
    let period_us = half_cycle.as_micros();
    let conduction_us = period_us * u128::from(level) / u128::from(MAX_LEVEL);
    let delay_us = u64::try_from(period_us - conduction_us).unwrap_or(u64::MAX);
    Some(Duration::from_micros(delay_us))
}

/// Phase-control decision for one half-cycle.
#[must_use]
pub fn phase_decision(half_cycle: Duration, level: u8) -> FireDecision {
    match phase_delay(half_cycle, level) {
        Some(delay) => FireDecision::FireAfter(delay),
        None => FireDecision::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_CYCLE_50HZ: Duration = Duration::from_micros(10_000);

    #[test]
    fn zero_level_never_fires() {
        assert_eq!(phase_delay(HALF_CYCLE_50HZ, 0), None);
        assert_eq!(phase_decision(HALF_CYCLE_50HZ, 0), FireDecision::Skip);
    }

    #[test]
    fn full_level_fires_at_crossing() {
        assert_eq!(phase_delay(HALF_CYCLE_50HZ, 100), Some(Duration::ZERO));
    }

    #[test]
    fn midpoint_fires_halfway_through_half_cycle() {
        assert_eq!(
            phase_delay(HALF_CYCLE_50HZ, 50),
            Some(Duration::from_micros(5_000))
        );
        assert_eq!(
            phase_delay(Duration::from_micros(8_333), 25),
            Some(Duration::from_micros(8_333 - 2_083))
        );
    }

    #[test]
    fn delay_is_monotonically_non_increasing() {
        for half_cycle in [HALF_CYCLE_50HZ, Duration::from_micros(8_333)] {
            let mut previous = half_cycle;
            for level in 1..=MAX_LEVEL {
                let delay = phase_delay(half_cycle, level).expect("non-zero level fires");
                assert!(delay <= previous, "level {level} delayed past level {}", level - 1);
                assert!(delay < half_cycle);
                previous = delay;
            }
        }
    }

    #[test]
    fn out_of_range_levels_are_clamped() {
        assert_eq!(clamp_level(-12), 0);
        assert_eq!(clamp_level(42), 42);
        assert_eq!(clamp_level(250), 100);
        assert_eq!(phase_delay(HALF_CYCLE_50HZ, 200), Some(Duration::ZERO));
    }
}

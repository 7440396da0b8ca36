//! Linear brightness transitions counted in half-cycles.

use core::fmt;

/// Phase of the ramp state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RampState {
    /// The output sits at the end value.
    Idle,
    /// The output is moving towards the end value.
    Transitioning,
}

impl fmt::Display for RampState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RampState::Idle => f.write_str("idle"),
            RampState::Transitioning => f.write_str("ramping"),
        }
    }
}

/// Interpolates brightness between two levels over a fixed number of
/// half-cycles.
///
/// Invariant: `elapsed <= total`. A `total` of zero means every retarget is
/// applied immediately.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ramp {
    start: u8,
    end: u8,
    elapsed: u16,
    total: u16,
    current: u8,
}

impl Ramp {
    /// Creates an idle ramp resting at `level`.
    #[must_use]
    pub const fn new(level: u8, total: u16) -> Self {
        Self {
            start: level,
            end: level,
            elapsed: total,
            total,
            current: level,
        }
    }

    /// Starts a transition from the current level to `end`.
    ///
    /// Any transition in progress is abandoned; there is no queueing.
    pub fn retarget(&mut self, end: u8) {
        self.start = self.current;
        self.end = end;
        if self.total == 0 || self.start == end {
            self.elapsed = self.total;
            self.current = end;
        } else {
            self.elapsed = 0;
        }
    }

    /// Changes the ramp length, restarting any transition from the current level.
    pub fn set_total(&mut self, total: u16) {
        self.total = total;
        self.retarget(self.end);
    }

    /// Advances one half-cycle.
    ///
    /// Returns `true` when this step completed the transition.
    pub fn step(&mut self) -> bool {
        if self.elapsed >= self.total {
            return false;
        }
        self.elapsed += 1;

        let start = i32::from(self.start);
        let span = i32::from(self.end) - start;
        let progressed = span * i32::from(self.elapsed) / i32::from(self.total);
        self.current = u8::try_from(start + progressed).unwrap_or(self.end);

        self.elapsed == self.total
    }

    /// Level applied during the current half-cycle.
    #[must_use]
    pub const fn current(&self) -> u8 {
        self.current
    }

    /// Level the ramp started from.
    #[must_use]
    pub const fn start(&self) -> u8 {
        self.start
    }

    /// Level the ramp is heading to.
    #[must_use]
    pub const fn end(&self) -> u8 {
        self.end
    }

    /// Half-cycles spent in the current transition.
    #[must_use]
    pub const fn elapsed(&self) -> u16 {
        self.elapsed
    }

    /// Half-cycles a full transition takes.
    #[must_use]
    pub const fn total(&self) -> u16 {
        self.total
    }

    /// Current phase of the state machine.
    #[must_use]
    pub const fn state(&self) -> RampState {
        if self.elapsed < self.total {
            RampState::Transitioning
        } else {
            RampState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_ramp_applies_immediately() {
        let mut ramp = Ramp::new(10, 0);
        ramp.retarget(80);
        assert_eq!(ramp.current(), 80);
        assert_eq!(ramp.state(), RampState::Idle);
        assert!(!ramp.step());
        assert_eq!(ramp.current(), 80);
    }

    #[test]
    fn upward_ramp_hits_truncated_midpoint() {
        let mut ramp = Ramp::new(50, 40);
        ramp.retarget(100);
        assert_eq!(ramp.state(), RampState::Transitioning);
        for _ in 0..20 {
            ramp.step();
        }
        assert_eq!(ramp.current(), 75);
        for _ in 0..19 {
            assert!(!ramp.step());
        }
        assert!(ramp.step());
        assert_eq!(ramp.current(), 100);
        assert_eq!(ramp.state(), RampState::Idle);
    }

    #[test]
    fn downward_ramp_truncates_towards_start() {
        let mut ramp = Ramp::new(100, 3);
        ramp.retarget(0);
        ramp.step();
        // 100 - 100 * 1 / 3 truncates to 67, never rounds to 66.
        assert_eq!(ramp.current(), 67);
        ramp.step();
        assert_eq!(ramp.current(), 34);
        ramp.step();
        assert_eq!(ramp.current(), 0);
    }

    #[test]
    fn retarget_mid_ramp_starts_from_current_value() {
        let mut ramp = Ramp::new(0, 10);
        ramp.retarget(100);
        for _ in 0..5 {
            ramp.step();
        }
        ramp.retarget(20);
        assert_eq!(ramp.start(), 50);
        assert_eq!(ramp.end(), 20);
        assert_eq!(ramp.elapsed(), 0);
        assert_eq!(ramp.current(), 50);
    }

    #[test]
    fn elapsed_never_exceeds_total() {
        let mut ramp = Ramp::new(0, 4);
        ramp.retarget(40);
        for _ in 0..10 {
            ramp.step();
            assert!(ramp.elapsed() <= ramp.total());
        }
        assert_eq!(ramp.current(), 40);
    }

    #[test]
    fn changing_length_restarts_from_current_level() {
        let mut ramp = Ramp::new(0, 10);
        ramp.retarget(100);
        ramp.step();
        ramp.set_total(0);
        assert_eq!(ramp.current(), 100);
        assert_eq!(ramp.state(), RampState::Idle);

        ramp.set_total(20);
        assert_eq!(ramp.state(), RampState::Idle);
        assert_eq!(ramp.current(), 100);
    }
}

//! Zero-cross edge debouncing.
//!
//! The opto-coupled detector produces a burst of rising edges around every
//! crossing. Only the first edge after a quiet debounce window counts; the
//! rest are bounce and are dropped without being reported.

use core::time::Duration;

use crate::instant::MonotonicInstant;

/// Outcome of feeding one rising edge into the detector.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeVerdict {
    /// First edge of a new crossing; channels must be serviced.
    Accepted,
    /// Edge belongs to a crossing that was already handled.
    Suppressed,
}

impl EdgeVerdict {
    /// Returns `true` when the edge starts a new half-cycle.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, EdgeVerdict::Accepted)
    }
}

/// Debounced half-cycle boundary detector.
#[derive(Clone, Debug)]
pub struct ZeroCrossDetector<I> {
    window: Duration,
    last_crossing: Option<I>,
    handled: bool,
    accepted: u32,
    suppressed: u32,
}

impl<I> ZeroCrossDetector<I>
where
    I: MonotonicInstant,
{
    /// Creates a detector that ignores edges closer than `window` to the last
    /// accepted one.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_crossing: None,
            handled: false,
            accepted: 0,
            suppressed: 0,
        }
    }

    /// Classifies a rising edge observed at `now`.
    pub fn on_edge(&mut self, now: I) -> EdgeVerdict {
        let quiet = match self.last_crossing {
            Some(previous) => now.saturating_duration_since(previous) > self.window,
            None => true,
        };
        if quiet {
            self.last_crossing = Some(now);
            self.handled = false;
        }

        if self.handled {
            self.suppressed = self.suppressed.wrapping_add(1);
            return EdgeVerdict::Suppressed;
        }

        self.handled = true;
        self.accepted = self.accepted.wrapping_add(1);
        EdgeVerdict::Accepted
    }

    /// Debounce window in use.
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Timestamp of the most recent accepted crossing.
    pub fn last_crossing(&self) -> Option<I> {
        self.last_crossing
    }

    /// Number of crossings accepted so far (wrapping).
    pub const fn accepted_count(&self) -> u32 {
        self.accepted
    }

    /// Number of bounce edges dropped so far (wrapping).
    pub const fn suppressed_count(&self) -> u32 {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::Micros;

    fn detector() -> ZeroCrossDetector<Micros> {
        ZeroCrossDetector::new(Duration::from_millis(5))
    }

    #[test]
    fn first_edge_is_always_accepted() {
        let mut zc = detector();
        assert_eq!(zc.on_edge(Micros::from_micros(0)), EdgeVerdict::Accepted);
        assert_eq!(zc.last_crossing(), Some(Micros::from_micros(0)));
    }

    #[test]
    fn edges_inside_window_are_bounce() {
        let mut zc = detector();
        assert!(zc.on_edge(Micros::from_millis(0)).is_accepted());
        assert_eq!(zc.on_edge(Micros::from_millis(1)), EdgeVerdict::Suppressed);
        assert_eq!(zc.on_edge(Micros::from_millis(4)), EdgeVerdict::Suppressed);
        assert_eq!(zc.accepted_count(), 1);
        assert_eq!(zc.suppressed_count(), 2);
    }

    #[test]
    fn edges_a_half_cycle_apart_are_separate_crossings() {
        let mut zc = detector();
        assert!(zc.on_edge(Micros::from_millis(0)).is_accepted());
        assert!(zc.on_edge(Micros::from_millis(10)).is_accepted());
        assert!(zc.on_edge(Micros::from_millis(20)).is_accepted());
        assert_eq!(zc.accepted_count(), 3);
    }

    #[test]
    fn window_is_measured_from_accepted_edge() {
        let mut zc = detector();
        assert!(zc.on_edge(Micros::from_millis(0)).is_accepted());
        // Bounce does not slide the window forward.
        assert!(!zc.on_edge(Micros::from_millis(3)).is_accepted());
        assert!(zc.on_edge(Micros::from_micros(5_001)).is_accepted());
    }

    #[test]
    fn edge_exactly_at_window_boundary_is_bounce() {
        let mut zc = detector();
        assert!(zc.on_edge(Micros::from_millis(0)).is_accepted());
        assert!(!zc.on_edge(Micros::from_millis(5)).is_accepted());
    }
}

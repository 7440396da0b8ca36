//! Push-button debouncing.
//!
//! The button is sampled on a fixed tick. Each sample nudges a counter toward
//! pressed or released, and an edge is reported only once the counter reaches
//! the threshold on the opposite side of the last reported state.

/// Sampling period of the button task.
pub const BUTTON_SAMPLE_PERIOD_MS: u64 = 5;

/// Consecutive agreeing samples needed to change state (20 ms at 5 ms ticks).
pub const BUTTON_THRESHOLD: i8 = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// Counter-based debouncer for one active-level input.
#[derive(Debug)]
pub struct Debouncer {
    counter: i8,
    threshold: i8,
    pressed: bool,
}

impl Debouncer {
    /// Creates a debouncer in the released state.
    #[must_use]
    pub const fn new(threshold: i8) -> Self {
        Self {
            counter: 0,
            threshold,
            pressed: false,
        }
    }

    /// Feeds one sample; `active` is true while the contact reads pressed.
    pub fn sample(&mut self, active: bool) -> Option<ButtonEdge> {
        if active {
            self.counter = (self.counter + 1).min(self.threshold);
        } else {
            self.counter = (self.counter - 1).max(-self.threshold);
        }

        if !self.pressed && self.counter >= self.threshold {
            self.pressed = true;
            return Some(ButtonEdge::Pressed);
        }
        if self.pressed && self.counter <= -self.threshold {
            self.pressed = false;
            return Some(ButtonEdge::Released);
        }
        None
    }

    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(BUTTON_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(debouncer: &mut Debouncer, samples: &[bool]) -> std::vec::Vec<ButtonEdge> {
        samples
            .iter()
            .filter_map(|sample| debouncer.sample(*sample))
            .collect()
    }

    #[test]
    fn steady_press_reports_once() {
        let mut debouncer = Debouncer::default();
        let edges = feed(&mut debouncer, &[true; 12]);
        assert_eq!(edges, [ButtonEdge::Pressed]);
        assert!(debouncer.is_pressed());
    }

    #[test]
    fn chatter_is_ignored() {
        let mut debouncer = Debouncer::default();
        let edges = feed(
            &mut debouncer,
            &[true, false, true, false, true, true, false, true],
        );
        assert!(edges.is_empty());
        assert!(!debouncer.is_pressed());
    }

    #[test]
    fn press_then_release() {
        let mut debouncer = Debouncer::default();
        let mut samples = std::vec![true; 6];
        samples.extend([false; 10]);
        let edges = feed(&mut debouncer, &samples);
        assert_eq!(edges, [ButtonEdge::Pressed, ButtonEdge::Released]);
    }
}

//! Burst-mode duty cycle tracking.
//!
//! The window remembers whether each of the last [`PULSE_WINDOW`] half-cycles
//! fired. A half-cycle fires when the requested level is strictly above the
//! fired percentage observed so far, which drives the pulse train towards the
//! requested duty cycle without ever switching mid-cycle.

use super::MAX_LEVEL;

/// Number of half-cycles remembered by the window.
pub const PULSE_WINDOW: u8 = 100;

const WINDOW_MASK: u128 = (1 << PULSE_WINDOW) - 1;
const OLDEST_BIT: u128 = 1 << (PULSE_WINDOW - 1);

/// Sliding fire/skip history for one pulse-density channel.
///
/// Bit 0 holds the newest decision, bit `used - 1` the oldest valid one.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PulseDensityWindow {
    history: u128,
    fired: u8,
    used: u8,
}

impl PulseDensityWindow {
    /// Creates an empty window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            history: 0,
            fired: 0,
            used: 0,
        }
    }

    /// Forgets every recorded decision.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decides whether the current half-cycle fires at `level` and records it.
    pub fn advance(&mut self, level: u8) -> bool {
        if self.used == PULSE_WINDOW {
            if self.history & OLDEST_BIT != 0 {
                self.fired -= 1;
            }
            self.history &= !OLDEST_BIT;
        }

        let level = u32::from(level.min(MAX_LEVEL));
        let fire = self.used > 0
            && level * u32::from(self.used) > u32::from(MAX_LEVEL) * u32::from(self.fired);

        self.history = ((self.history << 1) | u128::from(fire)) & WINDOW_MASK;
        self.used = (self.used + 1).min(PULSE_WINDOW);
        if fire {
            self.fired += 1;
        }
        fire
    }

    /// Fired half-cycles currently inside the window.
    #[must_use]
    pub const fn fired(&self) -> u8 {
        self.fired
    }

    /// Valid entries in the window; grows to [`PULSE_WINDOW`] while warming up.
    #[must_use]
    pub const fn used(&self) -> u8 {
        self.used
    }

    /// Returns `true` once the window holds a full history.
    #[must_use]
    pub const fn is_warm(&self) -> bool {
        self.used == PULSE_WINDOW
    }

    /// Returns the decision recorded `age` half-cycles ago (0 = newest).
    #[must_use]
    pub fn fired_at(&self, age: u8) -> Option<bool> {
        (age < self.used).then(|| self.history & (1 << age) != 0)
    }
}

//! Per-channel dimmer record.
//!
//! A [`Channel`] owns everything one triac output needs: its set-points, the
//! ramp state machine and the pulse-density history. It never touches
//! hardware; each half-cycle it returns a [`FireDecision`] that the caller
//! turns into deferred gate activity.

use core::fmt;
use core::time::Duration;

use crate::config::{ChannelConfig, DimmerMode, ramp_half_cycles};
use crate::ramp::{Ramp, RampState};
use crate::timing::{self, FireDecision, MAX_LEVEL, PulseDensityWindow};

/// Stable identity of a registered channel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Creates an identifier from a raw registry index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Deterministic index into the registry.
    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Result of servicing one half-cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HalfCycleUpdate {
    pub decision: FireDecision,
    /// Level applied during this half-cycle.
    pub level: u8,
    /// `true` when this half-cycle finished a ramp.
    pub ramp_completed: bool,
}

/// Consistent copy of a channel's observable state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub mode: DimmerMode,
    pub value: u8,
    pub target: u8,
    pub minimum: u8,
    pub powered: bool,
    pub ramp_state: RampState,
    pub ramp_elapsed: u16,
    pub ramp_total: u16,
}

impl ChannelSnapshot {
    /// Output state as reported upstream: on whenever any power is delivered.
    #[must_use]
    pub const fn state(&self) -> bool {
        self.value > 0
    }
}

/// Dimmer channel state.
#[derive(Clone, Debug)]
pub struct Channel {
    id: ChannelId,
    config: ChannelConfig,
    half_cycle: Duration,
    target: u8,
    minimum: u8,
    powered: bool,
    ramp: Ramp,
    pulses: PulseDensityWindow,
}

impl Channel {
    /// Creates a dark channel. The configuration must already be validated.
    #[must_use]
    pub fn new(id: ChannelId, config: ChannelConfig) -> Self {
        let total = ramp_half_cycles(config.ramp, config.ac_frequency_hz);
        Self {
            id,
            config,
            half_cycle: config.half_cycle(),
            target: 0,
            minimum: 0,
            powered: false,
            ramp: Ramp::new(0, total),
            pulses: PulseDensityWindow::new(),
        }
    }

    /// Applies the initial brightness.
    pub fn begin(&mut self, initial: u8) {
        self.set(initial);
    }

    /// Sets a new brightness, clamped to `minimum..=100`, and switches on.
    pub fn set(&mut self, value: u8) {
        self.target = value.min(MAX_LEVEL).max(self.minimum);
        self.powered = true;
        self.retarget(self.target);
    }

    /// Sets the brightness floor. Raises the target when it falls below.
    pub fn set_minimum(&mut self, value: u8) {
        self.minimum = value.min(MAX_LEVEL);
        if self.target < self.minimum {
            self.target = self.minimum;
        }
        self.retarget(self.effective_target());
    }

    /// Ramps back up to the stored target.
    pub fn on(&mut self) {
        self.powered = true;
        self.retarget(self.target);
    }

    /// Ramps down to the brightness floor, keeping the target for a later `on`.
    pub fn off(&mut self) {
        self.powered = false;
        self.retarget(self.minimum);
    }

    /// Flips between [`Channel::on`] and [`Channel::off`].
    pub fn toggle(&mut self) {
        if self.powered {
            self.off();
        } else {
            self.on();
        }
    }

    /// Changes how long future transitions take.
    pub fn set_ramp_duration(&mut self, ramp: Duration) {
        self.config.ramp = ramp;
        self.ramp
            .set_total(ramp_half_cycles(ramp, self.config.ac_frequency_hz));
    }

    /// Advances the ramp and decides what the gate does this half-cycle.
    pub fn half_cycle(&mut self) -> HalfCycleUpdate {
        let ramp_completed = self.ramp.step();
        let level = self.ramp.current();

        let decision = match self.config.mode {
            DimmerMode::PhaseControl => timing::phase_decision(self.half_cycle, level),
            DimmerMode::PulseDensity => {
                if self.pulses.advance(level) {
                    FireDecision::FireAfter(Duration::ZERO)
                } else {
                    FireDecision::Skip
                }
            }
        };

        HalfCycleUpdate {
            decision,
            level,
            ramp_completed,
        }
    }

    fn effective_target(&self) -> u8 {
        if self.powered {
            self.target
        } else {
            self.minimum
        }
    }

    fn retarget(&mut self, end: u8) {
        if end == self.ramp.end() {
            return;
        }
        self.pulses.reset();
        self.ramp.retarget(end);
    }

    pub const fn id(&self) -> ChannelId {
        self.id
    }

    pub const fn mode(&self) -> DimmerMode {
        self.config.mode
    }

    pub const fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub const fn half_cycle_period(&self) -> Duration {
        self.half_cycle
    }

    /// Level applied during the current half-cycle.
    pub const fn value(&self) -> u8 {
        self.ramp.current()
    }

    /// `true` while any power is delivered.
    pub const fn state(&self) -> bool {
        self.value() > 0
    }

    pub const fn target(&self) -> u8 {
        self.target
    }

    pub const fn minimum(&self) -> u8 {
        self.minimum
    }

    pub const fn is_powered(&self) -> bool {
        self.powered
    }

    pub const fn ramp(&self) -> &Ramp {
        &self.ramp
    }

    pub const fn pulse_window(&self) -> &PulseDensityWindow {
        &self.pulses
    }

    /// Copies the observable state in one go.
    #[must_use]
    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            id: self.id,
            mode: self.config.mode,
            value: self.ramp.current(),
            target: self.target,
            minimum: self.minimum,
            powered: self.powered,
            ramp_state: self.ramp.state(),
            ramp_elapsed: self.ramp.elapsed(),
            ramp_total: self.ramp.total(),
        }
    }
}

//! Dimmer engine: zero-cross fan-out, gate scheduling and the channel API.
//!
//! [`DimmerEngine`] is a plain owned state machine. It takes the time of every
//! event as an argument and drives outputs through a [`GateDriver`] handed to
//! [`DimmerEngine::poll`], so the same code runs under the firmware executor
//! and inside host tests. [`crate::shared::SharedDimmer`] wraps it for use
//! from interrupt and foreground contexts at once.

use core::fmt;
use core::time::Duration;

use crate::channel::{ChannelId, ChannelSnapshot};
use crate::config::{ChannelConfig, ConfigError, DimmerConfig};
use crate::driver::{GateAction, GateDriver};
use crate::instant::MonotonicInstant;
use crate::registry::{ChannelRegistry, DEFAULT_CHANNEL_CAPACITY};
use crate::telemetry::{TELEMETRY_RING_CAPACITY, TelemetryEventKind, TelemetryRecorder};
use crate::timer::TimerWheel;
use crate::zero_cross::{EdgeVerdict, ZeroCrossDetector};

/// Default number of timer slots: an assert/release pair per channel plus the
/// forced release of a gate still held when the next crossing arrives.
pub const DEFAULT_TIMER_CAPACITY: usize = 3 * DEFAULT_CHANNEL_CAPACITY;

/// Errors surfaced by the channel API.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DimmerError {
    /// Every channel slot is already registered.
    CapacityExceeded,
    /// The identifier does not name a registered channel.
    UnknownChannel(ChannelId),
    /// The channel configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for DimmerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimmerError::CapacityExceeded => f.write_str("channel capacity exceeded"),
            DimmerError::UnknownChannel(id) => write!(f, "unknown channel {id}"),
            DimmerError::Config(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl From<ConfigError> for DimmerError {
    fn from(value: ConfigError) -> Self {
        DimmerError::Config(value)
    }
}

/// Owned dimmer state for every channel plus the shared timing machinery.
pub struct DimmerEngine<
    I,
    const CHANNELS: usize = DEFAULT_CHANNEL_CAPACITY,
    const TIMERS: usize = DEFAULT_TIMER_CAPACITY,
    const TELEMETRY: usize = TELEMETRY_RING_CAPACITY,
> where
    I: MonotonicInstant,
{
    config: DimmerConfig,
    detector: ZeroCrossDetector<I>,
    channels: ChannelRegistry<CHANNELS>,
    timers: TimerWheel<I, TIMERS>,
    telemetry: TelemetryRecorder<I, TELEMETRY>,
}

impl<I, const CHANNELS: usize, const TIMERS: usize, const TELEMETRY: usize>
    DimmerEngine<I, CHANNELS, TIMERS, TELEMETRY>
where
    I: MonotonicInstant,
{
    /// Creates an engine without channels.
    ///
    /// `config` is validated together with each channel at registration.
    #[must_use]
    pub const fn new(config: DimmerConfig) -> Self {
        Self {
            config,
            detector: ZeroCrossDetector::new(config.debounce()),
            channels: ChannelRegistry::new(),
            timers: TimerWheel::new(),
            telemetry: TelemetryRecorder::new(),
        }
    }

    /// Registers a new channel.
    ///
    /// # Errors
    ///
    /// See [`ChannelRegistry::register`].
    pub fn register(&mut self, config: ChannelConfig) -> Result<ChannelId, DimmerError> {
        self.channels.register(config, &self.config)
    }

    /// Applies the initial brightness of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn begin(&mut self, id: ChannelId, initial: u8) -> Result<(), DimmerError> {
        self.channels.get_mut(id)?.begin(initial);
        Ok(())
    }

    /// Sets a channel's brightness; see [`crate::channel::Channel::set`].
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn set(&mut self, id: ChannelId, value: u8) -> Result<(), DimmerError> {
        self.channels.get_mut(id)?.set(value);
        Ok(())
    }

    /// Sets a channel's brightness floor.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn set_minimum(&mut self, id: ChannelId, value: u8) -> Result<(), DimmerError> {
        self.channels.get_mut(id)?.set_minimum(value);
        Ok(())
    }

    /// Switches a channel on.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn on(&mut self, id: ChannelId) -> Result<(), DimmerError> {
        self.channels.get_mut(id)?.on();
        Ok(())
    }

    /// Switches a channel off.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn off(&mut self, id: ChannelId) -> Result<(), DimmerError> {
        self.channels.get_mut(id)?.off();
        Ok(())
    }

    /// Flips a channel between on and off.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn toggle(&mut self, id: ChannelId) -> Result<(), DimmerError> {
        self.channels.get_mut(id)?.toggle();
        Ok(())
    }

    /// Changes a channel's ramp duration.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn set_ramp_duration(&mut self, id: ChannelId, ramp: Duration) -> Result<(), DimmerError> {
        self.channels.get_mut(id)?.set_ramp_duration(ramp);
        Ok(())
    }

    /// Level applied to a channel during the current half-cycle.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn value(&self, id: ChannelId) -> Result<u8, DimmerError> {
        Ok(self.channels.get(id)?.value())
    }

    /// `true` while a channel delivers any power.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn state(&self, id: ChannelId) -> Result<bool, DimmerError> {
        Ok(self.channels.get(id)?.state())
    }

    /// Copies a channel's observable state.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn snapshot(&self, id: ChannelId) -> Result<ChannelSnapshot, DimmerError> {
        Ok(self.channels.get(id)?.snapshot())
    }

    /// Handles a rising zero-cross edge observed at `now`.
    ///
    /// Accepted crossings advance every channel by one half-cycle in
    /// registration order and arm their gate pulses relative to `now`.
    pub fn on_zero_cross_edge(&mut self, now: I) -> EdgeVerdict {
        let verdict = self.detector.on_edge(now);
        if !verdict.is_accepted() {
            self.telemetry
                .record(TelemetryEventKind::EdgeSuppressed, now);
            return verdict;
        }

        self.telemetry
            .record(TelemetryEventKind::ZeroCrossAccepted, now);
        self.fan_out(now);
        verdict
    }

    fn fan_out(&mut self, now: I) {
        let width = self.config.trigger_width();

        for channel in self.channels.iter_mut() {
            let id = channel.id();
            if self.timers.cancel_channel(id, now).is_err() {
                self.telemetry
                    .record(TelemetryEventKind::TimerOverflow(id), now);
            }

            let update = channel.half_cycle();
            if update.ramp_completed {
                self.telemetry
                    .record(TelemetryEventKind::RampComplete(id), now);
            }

            let Some(delay) = update.decision.delay() else {
                continue;
            };
            if self.timers.schedule_pulse(id, now + delay, width).is_err() {
                self.telemetry
                    .record(TelemetryEventKind::TimerOverflow(id), now);
            }
        }
    }

    /// Fires every gate action due at or before `now`.
    ///
    /// Returns the number of actions applied.
    pub fn poll<D>(&mut self, now: I, driver: &mut D) -> usize
    where
        D: GateDriver + ?Sized,
    {
        let mut fired = 0;
        while let Some(entry) = self.timers.pop_due(now) {
            driver.apply(entry.channel, entry.action);
            let event = match entry.action {
                GateAction::Assert => TelemetryEventKind::GateAsserted(entry.channel),
                GateAction::Release => TelemetryEventKind::GateReleased(entry.channel),
            };
            self.telemetry.record(event, entry.deadline);
            fired += 1;
        }
        fired
    }

    /// Drops every armed pulse and forces all gates low.
    pub fn release_all<D>(&mut self, driver: &mut D)
    where
        D: GateDriver + ?Sized,
    {
        self.timers.clear();
        driver.release_all();
    }

    /// Deadline of the next armed gate action.
    pub fn next_deadline(&self) -> Option<I> {
        self.timers.next_deadline()
    }

    /// Records an edge that arrived while servicing was disabled.
    pub fn record_ignored_edge(&mut self, now: I) {
        self.telemetry.record(TelemetryEventKind::EdgeIgnored, now);
    }

    pub const fn config(&self) -> &DimmerConfig {
        &self.config
    }

    pub const fn detector(&self) -> &ZeroCrossDetector<I> {
        &self.detector
    }

    pub const fn channels(&self) -> &ChannelRegistry<CHANNELS> {
        &self.channels
    }

    pub const fn timers(&self) -> &TimerWheel<I, TIMERS> {
        &self.timers
    }

    pub const fn telemetry(&self) -> &TelemetryRecorder<I, TELEMETRY> {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut TelemetryRecorder<I, TELEMETRY> {
        &mut self.telemetry
    }
}

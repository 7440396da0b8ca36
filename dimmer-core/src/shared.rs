//! Interrupt-safe wrapper around [`DimmerEngine`].
//!
//! The zero-cross handler and the foreground loop both reach the engine
//! through a [`critical_section::Mutex`], so every multi-field read or update
//! is atomic with respect to the interrupt. The wrapper is `const`
//! constructible and meant to live in a `static`.

use core::cell::RefCell;
use core::time::Duration;

use critical_section::Mutex;
use portable_atomic::{AtomicBool, Ordering};

use crate::channel::{ChannelId, ChannelSnapshot};
use crate::config::{ChannelConfig, DimmerConfig};
use crate::dimmer::{DEFAULT_TIMER_CAPACITY, DimmerEngine, DimmerError};
use crate::driver::GateDriver;
use crate::instant::MonotonicInstant;
use crate::registry::DEFAULT_CHANNEL_CAPACITY;
use crate::telemetry::{TELEMETRY_RING_CAPACITY, TelemetryRecord};
use crate::zero_cross::EdgeVerdict;

/// Dimmer engine shared between the zero-cross interrupt and the foreground.
pub struct SharedDimmer<
    I,
    const CHANNELS: usize = DEFAULT_CHANNEL_CAPACITY,
    const TIMERS: usize = DEFAULT_TIMER_CAPACITY,
    const TELEMETRY: usize = TELEMETRY_RING_CAPACITY,
> where
    I: MonotonicInstant,
{
    engine: Mutex<RefCell<DimmerEngine<I, CHANNELS, TIMERS, TELEMETRY>>>,
    servicing: AtomicBool,
}

impl<I, const CHANNELS: usize, const TIMERS: usize, const TELEMETRY: usize>
    SharedDimmer<I, CHANNELS, TIMERS, TELEMETRY>
where
    I: MonotonicInstant,
{
    /// Creates a dimmer with zero-cross servicing disabled.
    #[must_use]
    pub const fn new(config: DimmerConfig) -> Self {
        Self {
            engine: Mutex::new(RefCell::new(DimmerEngine::new(config))),
            servicing: AtomicBool::new(false),
        }
    }

    /// Runs `f` with exclusive access to the engine inside a critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut DimmerEngine<I, CHANNELS, TIMERS, TELEMETRY>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.engine.borrow_ref_mut(cs)))
    }

    /// Registers a channel.
    ///
    /// # Errors
    ///
    /// See [`DimmerEngine::register`].
    pub fn register(&self, config: ChannelConfig) -> Result<ChannelId, DimmerError> {
        self.with(|engine| engine.register(config))
    }

    /// Applies the initial brightness and starts zero-cross servicing.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn begin(&self, id: ChannelId, initial: u8) -> Result<(), DimmerError> {
        self.with(|engine| engine.begin(id, initial))?;
        self.enable_interrupt();
        Ok(())
    }

    /// Resumes zero-cross servicing.
    pub fn enable_interrupt(&self) {
        self.servicing.store(true, Ordering::Release);
    }

    /// Suspends zero-cross servicing. Channel state is kept; edges are ignored.
    pub fn disable_interrupt(&self) {
        self.servicing.store(false, Ordering::Release);
    }

    /// Returns `true` while zero-cross edges are serviced.
    pub fn interrupt_enabled(&self) -> bool {
        self.servicing.load(Ordering::Acquire)
    }

    /// Zero-cross interrupt entry point.
    ///
    /// Returns `None` when servicing is disabled.
    pub fn on_zero_cross_edge(&self, now: I) -> Option<EdgeVerdict> {
        if !self.interrupt_enabled() {
            self.with(|engine| engine.record_ignored_edge(now));
            return None;
        }
        Some(self.with(|engine| engine.on_zero_cross_edge(now)))
    }

    /// Fires gate actions due at `now`; see [`DimmerEngine::poll`].
    pub fn poll<D>(&self, now: I, driver: &mut D) -> usize
    where
        D: GateDriver + ?Sized,
    {
        self.with(|engine| engine.poll(now, driver))
    }

    /// Deadline of the next armed gate action.
    pub fn next_deadline(&self) -> Option<I> {
        self.with(|engine| engine.next_deadline())
    }

    /// Drops armed pulses and forces every gate low.
    pub fn release_all<D>(&self, driver: &mut D)
    where
        D: GateDriver + ?Sized,
    {
        self.with(|engine| engine.release_all(driver));
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn set(&self, id: ChannelId, value: u8) -> Result<(), DimmerError> {
        self.with(|engine| engine.set(id, value))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn set_minimum(&self, id: ChannelId, value: u8) -> Result<(), DimmerError> {
        self.with(|engine| engine.set_minimum(id, value))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn on(&self, id: ChannelId) -> Result<(), DimmerError> {
        self.with(|engine| engine.on(id))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn off(&self, id: ChannelId) -> Result<(), DimmerError> {
        self.with(|engine| engine.off(id))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn toggle(&self, id: ChannelId) -> Result<(), DimmerError> {
        self.with(|engine| engine.toggle(id))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn set_ramp_duration(&self, id: ChannelId, ramp: Duration) -> Result<(), DimmerError> {
        self.with(|engine| engine.set_ramp_duration(id, ramp))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn value(&self, id: ChannelId) -> Result<u8, DimmerError> {
        self.with(|engine| engine.value(id))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn state(&self, id: ChannelId) -> Result<bool, DimmerError> {
        self.with(|engine| engine.state(id))
    }

    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for unregistered identifiers.
    pub fn snapshot(&self, id: ChannelId) -> Result<ChannelSnapshot, DimmerError> {
        self.with(|engine| engine.snapshot(id))
    }

    pub fn channel_count(&self) -> usize {
        self.with(|engine| engine.channels().len())
    }

    /// Forwards telemetry recorded since the previous drain to `sink`.
    ///
    /// `sink` runs inside the critical section and must not block.
    pub fn drain_telemetry(&self, sink: impl FnMut(&TelemetryRecord<I>)) -> usize {
        self.with(|engine| engine.telemetry_mut().drain_new(sink))
    }
}

//! Static configuration for the dimmer engine and its channels.
//!
//! Everything here is supplied at construction time and never persisted.
//! Values are validated once, when a channel is registered, so the
//! zero-cross path can rely on them without re-checking.

use core::fmt;
use core::time::Duration;

/// Default debounce window applied to zero-cross edges.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(5);

/// Default gate pulse width.
pub const DEFAULT_TRIGGER_WIDTH: Duration = Duration::from_micros(200);

/// Longest gate pulse accepted by [`DimmerConfig::validate`].
pub const MAX_TRIGGER_WIDTH: Duration = Duration::from_micros(1_000);

/// Default mains frequency.
pub const DEFAULT_AC_FREQUENCY_HZ: u16 = 50;

/// Highest mains frequency accepted for a channel.
pub const MAX_AC_FREQUENCY_HZ: u16 = 1_000;

/// Largest representable ramp length, in half-cycles.
pub const MAX_RAMP_HALF_CYCLES: u16 = u16::MAX;

/// Operating algorithm of a channel. Fixed for the channel's lifetime.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DimmerMode {
    /// Leading-edge phase control: fire part-way through every half-cycle.
    #[default]
    PhaseControl,
    /// Burst mode: fire whole half-cycles, skipping some to meet the duty cycle.
    PulseDensity,
}

impl DimmerMode {
    /// Short label used by status output and the operator console.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DimmerMode::PhaseControl => "phase",
            DimmerMode::PulseDensity => "burst",
        }
    }
}

impl fmt::Display for DimmerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reasons a configuration was refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Mains frequency was zero or above [`MAX_AC_FREQUENCY_HZ`].
    FrequencyOutOfRange(u16),
    /// The debounce window was zero.
    DebounceDisabled,
    /// The debounce window is not shorter than a half-cycle.
    DebounceTooLong,
    /// The gate pulse width was zero or above [`MAX_TRIGGER_WIDTH`].
    TriggerWidthOutOfRange,
    /// The gate pulse would outlast a half-cycle.
    TriggerWidthTooLong,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FrequencyOutOfRange(hz) => {
                write!(f, "ac frequency {hz}Hz out of range 1-{MAX_AC_FREQUENCY_HZ}Hz")
            }
            ConfigError::DebounceDisabled => f.write_str("debounce window must be non-zero"),
            ConfigError::DebounceTooLong => {
                f.write_str("debounce window must be shorter than a half-cycle")
            }
            ConfigError::TriggerWidthOutOfRange => f.write_str("trigger width must be 1-1000us"),
            ConfigError::TriggerWidthTooLong => {
                f.write_str("trigger width must be shorter than a half-cycle")
            }
        }
    }
}

/// System-wide settings shared by every channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DimmerConfig {
    debounce: Duration,
    trigger_width: Duration,
}

impl DimmerConfig {
    /// Creates a configuration with explicit timings.
    #[must_use]
    pub const fn new(debounce: Duration, trigger_width: Duration) -> Self {
        Self {
            debounce,
            trigger_width,
        }
    }

    /// Returns a copy with a different debounce window.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Returns a copy with a different gate pulse width.
    #[must_use]
    pub const fn with_trigger_width(mut self, trigger_width: Duration) -> Self {
        self.trigger_width = trigger_width;
        self
    }

    /// Window during which repeated zero-cross edges are treated as bounce.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Time the gate stays asserted after each firing.
    #[must_use]
    pub const fn trigger_width(&self) -> Duration {
        self.trigger_width
    }

    /// Checks the frequency-independent limits.
    ///
    /// # Errors
    ///
    /// Returns the first limit that the configuration violates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce.is_zero() {
            return Err(ConfigError::DebounceDisabled);
        }
        if self.trigger_width.is_zero() || self.trigger_width > MAX_TRIGGER_WIDTH {
            return Err(ConfigError::TriggerWidthOutOfRange);
        }
        Ok(())
    }
}

impl Default for DimmerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, DEFAULT_TRIGGER_WIDTH)
    }
}

/// Per-channel settings supplied at registration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelConfig {
    pub mode: DimmerMode,
    pub ac_frequency_hz: u16,
    pub ramp: Duration,
}

impl ChannelConfig {
    /// Creates a channel configuration.
    #[must_use]
    pub const fn new(mode: DimmerMode, ac_frequency_hz: u16, ramp: Duration) -> Self {
        Self {
            mode,
            ac_frequency_hz,
            ramp,
        }
    }

    /// Phase-control channel on 50 Hz mains without a ramp.
    #[must_use]
    pub const fn phase_control() -> Self {
        Self::new(DimmerMode::PhaseControl, DEFAULT_AC_FREQUENCY_HZ, Duration::ZERO)
    }

    /// Pulse-density channel on 50 Hz mains without a ramp.
    #[must_use]
    pub const fn pulse_density() -> Self {
        Self::new(DimmerMode::PulseDensity, DEFAULT_AC_FREQUENCY_HZ, Duration::ZERO)
    }

    /// Returns a copy using a different mains frequency.
    #[must_use]
    pub const fn with_frequency(mut self, ac_frequency_hz: u16) -> Self {
        self.ac_frequency_hz = ac_frequency_hz;
        self
    }

    /// Returns a copy using a different ramp duration.
    #[must_use]
    pub const fn with_ramp(mut self, ramp: Duration) -> Self {
        self.ramp = ramp;
        self
    }

    /// Length of one mains half-cycle: `1 / (2 · f)`.
    #[must_use]
    pub const fn half_cycle(&self) -> Duration {
        half_cycle_period(self.ac_frequency_hz)
    }

    /// Checks this channel against the shared system settings.
    ///
    /// # Errors
    ///
    /// Returns the first limit that the combined configuration violates.
    pub fn validate(&self, system: &DimmerConfig) -> Result<(), ConfigError> {
        if self.ac_frequency_hz == 0 || self.ac_frequency_hz > MAX_AC_FREQUENCY_HZ {
            return Err(ConfigError::FrequencyOutOfRange(self.ac_frequency_hz));
        }
        system.validate()?;

        let half_cycle = self.half_cycle();
        if system.debounce() >= half_cycle {
            return Err(ConfigError::DebounceTooLong);
        }
        if system.trigger_width() >= half_cycle {
            return Err(ConfigError::TriggerWidthTooLong);
        }
        Ok(())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::phase_control()
    }
}

/// Half-cycle period in whole microseconds for a mains frequency.
#[must_use]
pub const fn half_cycle_period(ac_frequency_hz: u16) -> Duration {
    if ac_frequency_hz == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(500_000 / ac_frequency_hz as u64)
}

/// Number of half-cycles a ramp of `ramp` lasts: `round(seconds · 2 · f)`,
/// clamped to [`MAX_RAMP_HALF_CYCLES`].
#[must_use]
pub fn ramp_half_cycles(ramp: Duration, ac_frequency_hz: u16) -> u16 {
    let half_cycles_x1m = ramp
        .as_micros()
        .saturating_mul(2 * u128::from(ac_frequency_hz));
    let rounded = half_cycles_x1m.saturating_add(500_000) / 1_000_000;
    u16::try_from(rounded).unwrap_or(MAX_RAMP_HALF_CYCLES)
}

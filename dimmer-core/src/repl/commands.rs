//! High-level console command dispatcher.
//!
//! Parsed [`Command`]s are applied to anything implementing [`DimmerControl`],
//! which keeps the dispatcher shared between the firmware console and the
//! host emulator.

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::channel::{ChannelId, ChannelSnapshot};
use crate::dimmer::DimmerError;
use crate::instant::MonotonicInstant;
use crate::shared::SharedDimmer;
use crate::timing::clamp_level;

use super::grammar::{self, Command, PowerAction};

/// Most channels reported by one `status` command.
pub const MAX_STATUS_CHANNELS: usize = 8;

/// One line per command, printed by `help`.
pub const HELP_LINES: &[&str] = &[
    "on|off|toggle [ch=N]   switch a channel",
    "set <0-100> [ch=N]     set brightness",
    "min <0-100> [ch=N]     set brightness floor",
    "ramp <n>ms|<n>s [ch=N] set transition time",
    "status [ch=N]          show channel state",
    "irq on|off             resume or suspend zero-cross servicing",
    "run <n>ms|<n>s         advance the simulated mains clock",
    "help                   show this text",
];

/// Operations the dispatcher needs from a dimmer.
pub trait DimmerControl {
    fn channel_count(&self) -> usize;

    fn set(&mut self, id: ChannelId, value: u8) -> Result<(), DimmerError>;

    fn set_minimum(&mut self, id: ChannelId, value: u8) -> Result<(), DimmerError>;

    fn on(&mut self, id: ChannelId) -> Result<(), DimmerError>;

    fn off(&mut self, id: ChannelId) -> Result<(), DimmerError>;

    fn toggle(&mut self, id: ChannelId) -> Result<(), DimmerError>;

    fn set_ramp_duration(&mut self, id: ChannelId, ramp: Duration) -> Result<(), DimmerError>;

    fn snapshot(&self, id: ChannelId) -> Result<ChannelSnapshot, DimmerError>;

    /// Resumes (`true`) or suspends (`false`) zero-cross servicing.
    fn set_interrupt_enabled(&mut self, enabled: bool);
}

impl<I, const CHANNELS: usize, const TIMERS: usize, const TELEMETRY: usize> DimmerControl
    for &SharedDimmer<I, CHANNELS, TIMERS, TELEMETRY>
where
    I: MonotonicInstant,
{
    fn channel_count(&self) -> usize {
        SharedDimmer::channel_count(self)
    }

    fn set(&mut self, id: ChannelId, value: u8) -> Result<(), DimmerError> {
        SharedDimmer::set(self, id, value)
    }

    fn set_minimum(&mut self, id: ChannelId, value: u8) -> Result<(), DimmerError> {
        SharedDimmer::set_minimum(self, id, value)
    }

    fn on(&mut self, id: ChannelId) -> Result<(), DimmerError> {
        SharedDimmer::on(self, id)
    }

    fn off(&mut self, id: ChannelId) -> Result<(), DimmerError> {
        SharedDimmer::off(self, id)
    }

    fn toggle(&mut self, id: ChannelId) -> Result<(), DimmerError> {
        SharedDimmer::toggle(self, id)
    }

    fn set_ramp_duration(&mut self, id: ChannelId, ramp: Duration) -> Result<(), DimmerError> {
        SharedDimmer::set_ramp_duration(self, id, ramp)
    }

    fn snapshot(&self, id: ChannelId) -> Result<ChannelSnapshot, DimmerError> {
        SharedDimmer::snapshot(self, id)
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        if enabled {
            self.enable_interrupt();
        } else {
            self.disable_interrupt();
        }
    }
}

/// Command execution successes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A channel command was applied; carries the resulting state.
    Applied(ChannelSnapshot),
    Status(Vec<ChannelSnapshot, MAX_STATUS_CHANNELS>),
    Interrupt(bool),
    /// The caller should advance its clock by this much.
    Run(Duration),
    Help,
}

/// Errors surfaced while executing a command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    Parse(grammar::ParseError),
    Dimmer(DimmerError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Parse(err) => err.fmt(f),
            CommandError::Dimmer(err) => err.fmt(f),
        }
    }
}

impl From<grammar::ParseError> for CommandError {
    fn from(error: grammar::ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<DimmerError> for CommandError {
    fn from(error: DimmerError) -> Self {
        Self::Dimmer(error)
    }
}

/// Dispatches console commands into a dimmer.
pub struct CommandExecutor<C> {
    control: C,
}

impl<C> CommandExecutor<C> {
    /// Creates a new executor around the provided dimmer handle.
    pub const fn new(control: C) -> Self {
        Self { control }
    }
}

impl<C> CommandExecutor<C>
where
    C: DimmerControl,
{
    /// Parses and executes a console line.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Parse`] for malformed input and
    /// [`CommandError::Dimmer`] when the addressed channel does not exist.
    pub fn execute(&mut self, line: &str) -> Result<CommandOutcome, CommandError> {
        let command = grammar::parse(line)?;
        self.dispatch(command)
    }

    /// Executes an already parsed command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Dimmer`] when the addressed channel does not exist.
    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        match command {
            Command::Power { action, channel } => {
                let id = channel.unwrap_or_default();
                match action {
                    PowerAction::On => self.control.on(id)?,
                    PowerAction::Off => self.control.off(id)?,
                    PowerAction::Toggle => self.control.toggle(id)?,
                }
                self.applied(id)
            }
            Command::Set { level, channel } => {
                let id = channel.unwrap_or_default();
                self.control.set(id, clamp_level(level))?;
                self.applied(id)
            }
            Command::Minimum { level, channel } => {
                let id = channel.unwrap_or_default();
                self.control.set_minimum(id, clamp_level(level))?;
                self.applied(id)
            }
            Command::Ramp { duration, channel } => {
                let id = channel.unwrap_or_default();
                self.control.set_ramp_duration(id, duration)?;
                self.applied(id)
            }
            Command::Status { channel } => self.status(channel),
            Command::Interrupt(enabled) => {
                self.control.set_interrupt_enabled(enabled);
                Ok(CommandOutcome::Interrupt(enabled))
            }
            Command::Run(duration) => Ok(CommandOutcome::Run(duration)),
            Command::Help => Ok(CommandOutcome::Help),
        }
    }

    fn applied(&self, id: ChannelId) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Applied(self.control.snapshot(id)?))
    }

    fn status(&self, channel: Option<ChannelId>) -> Result<CommandOutcome, CommandError> {
        let mut snapshots = Vec::new();
        if let Some(id) = channel {
            // First push into an empty vector of capacity `MAX_STATUS_CHANNELS`.
            let _ = snapshots.push(self.control.snapshot(id)?);
            return Ok(CommandOutcome::Status(snapshots));
        }

        for index in 0..self.control.channel_count().min(MAX_STATUS_CHANNELS) {
            let Ok(raw) = u8::try_from(index) else {
                break;
            };
            // Bounded by `MAX_STATUS_CHANNELS` above, so this never drops.
            let _ = snapshots.push(self.control.snapshot(ChannelId::new(raw))?);
        }
        Ok(CommandOutcome::Status(snapshots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelConfig, DimmerConfig};
    use crate::instant::Micros;

    fn dimmer() -> SharedDimmer<Micros, 2, 4, 16> {
        let dimmer = SharedDimmer::new(DimmerConfig::default());
        dimmer.register(ChannelConfig::phase_control()).unwrap();
        dimmer.register(ChannelConfig::pulse_density()).unwrap();
        dimmer
    }

    #[test]
    fn set_clamps_and_reports_snapshot() {
        let dimmer = dimmer();
        let mut executor = CommandExecutor::new(&dimmer);

        let outcome = executor.execute("set 150").expect("set should succeed");
        let CommandOutcome::Applied(snapshot) = outcome else {
            panic!("set should report the channel");
        };
        assert_eq!(snapshot.id, ChannelId::new(0));
        assert_eq!(snapshot.target, 100);
        assert_eq!(snapshot.value, 100);

        executor.execute("set -3 ch=1").unwrap();
        assert_eq!(dimmer.value(ChannelId::new(1)), Ok(0));

        executor.execute("set 99999999999 ch=1").unwrap();
        assert_eq!(dimmer.value(ChannelId::new(1)), Ok(100));
    }

    #[test]
    fn minimum_and_toggle_route_to_channel() {
        let dimmer = dimmer();
        let mut executor = CommandExecutor::new(&dimmer);
        executor.execute("min 20 ch=1").unwrap();
        executor.execute("set 5 ch=1").unwrap();
        assert_eq!(dimmer.value(ChannelId::new(1)), Ok(20));

        executor.execute("toggle ch=1").unwrap();
        let snapshot = dimmer.snapshot(ChannelId::new(1)).unwrap();
        assert!(!snapshot.powered);
        assert_eq!(snapshot.value, 20);
    }

    #[test]
    fn status_lists_every_channel() {
        let dimmer = dimmer();
        let mut executor = CommandExecutor::new(&dimmer);
        let CommandOutcome::Status(all) = executor.execute("status").unwrap() else {
            panic!("status should list channels");
        };
        assert_eq!(all.len(), 2);

        let CommandOutcome::Status(one) = executor.execute("status ch=1").unwrap() else {
            panic!("status should list one channel");
        };
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, ChannelId::new(1));
    }

    #[test]
    fn irq_switch_toggles_servicing() {
        let dimmer = dimmer();
        let mut executor = CommandExecutor::new(&dimmer);
        assert_eq!(
            executor.execute("irq on"),
            Ok(CommandOutcome::Interrupt(true))
        );
        assert!(dimmer.interrupt_enabled());
        executor.execute("irq off").unwrap();
        assert!(!dimmer.interrupt_enabled());
    }

    #[test]
    fn errors_are_typed() {
        let dimmer = dimmer();
        let mut executor = CommandExecutor::new(&dimmer);
        assert!(matches!(
            executor.execute("dim 5"),
            Err(CommandError::Parse(_))
        ));
        assert_eq!(
            executor.execute("on ch=7"),
            Err(CommandError::Dimmer(DimmerError::UnknownChannel(
                ChannelId::new(7)
            )))
        );
    }

    #[test]
    fn ramp_and_run_pass_durations_through() {
        let dimmer = dimmer();
        let mut executor = CommandExecutor::new(&dimmer);
        executor.execute("ramp 1s").unwrap();
        assert_eq!(dimmer.snapshot(ChannelId::new(0)).unwrap().ramp_total, 100);
        assert_eq!(
            executor.execute("run 250ms"),
            Ok(CommandOutcome::Run(Duration::from_millis(250)))
        );
    }
}

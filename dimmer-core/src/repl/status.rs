//! Textual rendering of channel state for the console.
//!
//! [`StatusFormatter`] keeps the output identical across the firmware console
//! and the emulator, e.g.
//! `ch0 value=75 target=100 min=0 state=on ramp=20/40 mode=phase`.

use core::fmt;

use crate::channel::ChannelSnapshot;
use crate::ramp::RampState;

/// Helper that renders a [`ChannelSnapshot`] into one line.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a ChannelSnapshot,
}

impl<'a> StatusFormatter<'a> {
    /// Creates a new formatter for the provided snapshot.
    #[must_use]
    pub const fn new(snapshot: &'a ChannelSnapshot) -> Self {
        Self { snapshot }
    }

    /// Writes the channel line without a trailing newline.
    pub fn write_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let snapshot = self.snapshot;
        write!(
            writer,
            "{} value={} target={} min={} state={}",
            snapshot.id,
            snapshot.value,
            snapshot.target,
            snapshot.minimum,
            if snapshot.state() { "on" } else { "off" },
        )?;

        if !snapshot.powered && snapshot.state() {
            writer.write_str(" (floor)")?;
        }

        match snapshot.ramp_state {
            RampState::Transitioning => write!(
                writer,
                " ramp={}/{}",
                snapshot.ramp_elapsed, snapshot.ramp_total
            )?,
            RampState::Idle => writer.write_str(" ramp=idle")?,
        }

        write!(writer, " mode={}", snapshot.mode)
    }
}

impl fmt::Display for StatusFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_line(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelId;
    use crate::config::DimmerMode;

    fn snapshot() -> ChannelSnapshot {
        ChannelSnapshot {
            id: ChannelId::new(0),
            mode: DimmerMode::PhaseControl,
            value: 75,
            target: 100,
            minimum: 0,
            powered: true,
            ramp_state: RampState::Transitioning,
            ramp_elapsed: 20,
            ramp_total: 40,
        }
    }

    #[test]
    fn ramping_channel_line() {
        let snapshot = snapshot();
        let mut line = heapless::String::<96>::new();
        StatusFormatter::new(&snapshot).write_line(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "ch0 value=75 target=100 min=0 state=on ramp=20/40 mode=phase"
        );
    }

    #[test]
    fn idle_channel_at_floor() {
        let snapshot = ChannelSnapshot {
            id: ChannelId::new(3),
            mode: DimmerMode::PulseDensity,
            value: 15,
            target: 60,
            minimum: 15,
            powered: false,
            ramp_state: RampState::Idle,
            ramp_elapsed: 0,
            ramp_total: 0,
        };
        assert_eq!(
            format!("{}", StatusFormatter::new(&snapshot)),
            "ch3 value=15 target=60 min=15 state=on (floor) ramp=idle mode=burst"
        );
    }
}

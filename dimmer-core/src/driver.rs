//! Gate output abstraction.

use core::fmt;

use crate::channel::ChannelId;

/// Level change applied to a triac gate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum GateAction {
    /// Drive the gate pin high to trigger the triac.
    Assert,
    /// Return the gate pin low; the triac keeps conducting until the next crossing.
    Release,
}

impl fmt::Display for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateAction::Assert => f.write_str("assert"),
            GateAction::Release => f.write_str("release"),
        }
    }
}

/// Abstraction over the physical gate outputs.
pub trait GateDriver {
    /// Applies the requested action to the channel's gate.
    fn apply(&mut self, channel: ChannelId, action: GateAction);

    /// Releases every gate.
    fn release_all(&mut self);
}

/// Gate driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopGateDriver;

impl NoopGateDriver {
    /// Creates a new no-op gate driver.
    pub const fn new() -> Self {
        Self
    }
}

impl GateDriver for NoopGateDriver {
    fn apply(&mut self, _: ChannelId, _: GateAction) {}

    fn release_all(&mut self) {}
}

impl<D> GateDriver for &mut D
where
    D: GateDriver + ?Sized,
{
    fn apply(&mut self, channel: ChannelId, action: GateAction) {
        (**self).apply(channel, action);
    }

    fn release_all(&mut self) {
        (**self).release_all();
    }
}

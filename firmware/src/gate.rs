//! Triac gate outputs.

use dimmer_core::{ChannelId, GateAction, GateDriver};
use embassy_stm32::gpio::Output;

/// Push-pull outputs driving the optocoupler LEDs, indexed by channel.
///
/// A high level lights the LED and fires the triac.
pub struct HardwareGateDriver<'d, const N: usize> {
    outputs: [Output<'d>; N],
}

impl<'d, const N: usize> HardwareGateDriver<'d, N> {
    pub fn new(mut outputs: [Output<'d>; N]) -> Self {
        for output in &mut outputs {
            output.set_low();
        }
        Self { outputs }
    }
}

impl<const N: usize> GateDriver for HardwareGateDriver<'_, N> {
    fn apply(&mut self, channel: ChannelId, action: GateAction) {
        let Some(output) = self.outputs.get_mut(channel.as_index()) else {
            defmt::warn!("gate: no output for channel {}", channel.raw());
            return;
        };
        match action {
            GateAction::Assert => output.set_high(),
            GateAction::Release => output.set_low(),
        }
    }

    fn release_all(&mut self) {
        for output in &mut self.outputs {
            output.set_low();
        }
    }
}

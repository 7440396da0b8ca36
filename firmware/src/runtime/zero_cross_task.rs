use dimmer_core::zero_cross::EdgeVerdict;
use embassy_stm32::exti::ExtiInput;

use super::{DIMMER, GATE_WAKE};
use crate::instant::FirmwareInstant;

#[embassy_executor::task]
pub async fn run(mut input: ExtiInput<'static>) -> ! {
    loop {
        input.wait_for_rising_edge().await;
        let now = FirmwareInstant::now();
        if DIMMER.on_zero_cross_edge(now) == Some(EdgeVerdict::Accepted) {
            GATE_WAKE.signal(());
        }
    }
}

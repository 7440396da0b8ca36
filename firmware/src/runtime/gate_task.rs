use embassy_futures::select::select;
use embassy_time::Timer;

use super::{DIMMER, FirmwareGates, GATE_WAKE};
use crate::instant::FirmwareInstant;

/// Fires due gate actions, then sleeps until the next deadline or crossing.
///
/// While zero-cross servicing is suspended every gate is held low.
#[embassy_executor::task]
pub async fn run(mut gates: FirmwareGates) -> ! {
    loop {
        if !DIMMER.interrupt_enabled() {
            DIMMER.release_all(&mut gates);
            GATE_WAKE.wait().await;
            continue;
        }

        DIMMER.poll(FirmwareInstant::now(), &mut gates);

        match DIMMER.next_deadline() {
            Some(deadline) => {
                select(Timer::at(deadline.into_embassy()), GATE_WAKE.wait()).await;
            }
            None => GATE_WAKE.wait().await,
        }
    }
}

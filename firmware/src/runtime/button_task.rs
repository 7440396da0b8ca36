use dimmer_core::ChannelId;
use embassy_stm32::gpio::{Input, Level, Output};
use embassy_time::{Duration, Ticker};

use super::DIMMER;
use crate::button::{BUTTON_SAMPLE_PERIOD_MS, ButtonEdge, Debouncer};

/// Toggles `channel` on each debounced press and mirrors its power state on the LED.
#[embassy_executor::task]
pub async fn run(button: Input<'static>, mut led: Output<'static>, channel: ChannelId) -> ! {
    let mut debouncer = Debouncer::default();
    let mut ticker = Ticker::every(Duration::from_millis(BUTTON_SAMPLE_PERIOD_MS));

    loop {
        ticker.next().await;
        if debouncer.sample(button.is_low()) != Some(ButtonEdge::Pressed) {
            continue;
        }

        match DIMMER
            .toggle(channel)
            .and_then(|()| DIMMER.snapshot(channel))
        {
            Ok(snapshot) => {
                led.set_level(if snapshot.powered {
                    Level::High
                } else {
                    Level::Low
                });
                defmt::info!(
                    "button: ch{} {}",
                    channel.raw(),
                    if snapshot.powered { "on" } else { "off" }
                );
            }
            Err(err) => defmt::warn!("button: {}", defmt::Display2Format(&err)),
        }
    }
}

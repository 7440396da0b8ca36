use embassy_time::{Duration, Ticker};

use super::DIMMER;
use crate::telemetry::{TELEMETRY_DRAIN_PERIOD_MS, drain_batch, log_record};

#[embassy_executor::task]
pub async fn run() -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(TELEMETRY_DRAIN_PERIOD_MS));
    loop {
        ticker.next().await;
        for record in &drain_batch(&DIMMER) {
            log_record(record, record.timestamp.as_micros());
        }
    }
}

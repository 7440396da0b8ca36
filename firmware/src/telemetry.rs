//! Telemetry mirroring.
//!
//! The zero-cross path records into the core's ring inside a critical section.
//! The telemetry task copies new records out in one batch and logs them here,
//! over defmt on the target and stdout on the host.

use core::fmt::Write as _;

use dimmer_core::MonotonicInstant;
use dimmer_core::SharedDimmer;
use dimmer_core::telemetry::{TELEMETRY_RING_CAPACITY, TelemetryRecord};
use heapless::{String, Vec};

/// How often the telemetry task drains the ring.
pub const TELEMETRY_DRAIN_PERIOD_MS: u64 = 250;

/// Longest rendered event label, e.g. `timer-overflow ch3`.
pub const LABEL_CAPACITY: usize = 32;

pub type TelemetryBatch<I, const N: usize = TELEMETRY_RING_CAPACITY> = Vec<TelemetryRecord<I>, N>;

/// Copies records recorded since the last drain, oldest first.
pub fn drain_batch<I, const CHANNELS: usize, const TIMERS: usize, const TELEMETRY: usize>(
    dimmer: &SharedDimmer<I, CHANNELS, TIMERS, TELEMETRY>,
) -> TelemetryBatch<I, TELEMETRY>
where
    I: MonotonicInstant,
{
    let mut batch = TelemetryBatch::new();
    dimmer.drain_telemetry(|record| {
        // The batch is as large as the ring, so this never drops.
        let _ = batch.push(*record);
    });
    batch
}

/// Renders an event label without allocating.
pub fn event_label<I>(record: &TelemetryRecord<I>) -> String<LABEL_CAPACITY>
where
    I: Copy,
{
    let mut label = String::new();
    let _ = write!(label, "{}", record.event);
    label
}

/// Logs one record with its timestamp in microseconds.
pub fn log_record<I>(record: &TelemetryRecord<I>, timestamp_us: u64)
where
    I: Copy,
{
    emit_log(record.id, event_label(record).as_str(), timestamp_us);
}

#[cfg(target_os = "none")]
fn emit_log(id: u32, label: &str, timestamp_us: u64) {
    defmt::info!("telemetry:#{} {} t={}us", id, label, timestamp_us);
}

#[cfg(not(target_os = "none"))]
fn emit_log(id: u32, label: &str, timestamp_us: u64) {
    println!("telemetry:#{id} {label} t={timestamp_us}us");
}

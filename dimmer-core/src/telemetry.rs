//! Telemetry event catalog and ring buffer shared by firmware and host targets.
//!
//! The zero-cross path must never block on logging, so events are written into
//! a fixed-size [`HistoryBuf`] and drained later from the foreground, where
//! the firmware mirrors them to defmt and the emulator prints them.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::channel::ChannelId;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Monotonic identifier assigned to each recorded event.
pub type EventId = u32;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    /// A crossing was accepted and channels were serviced.
    ZeroCrossAccepted,
    /// An edge fell inside the debounce window.
    EdgeSuppressed,
    /// An edge arrived while servicing was disabled.
    EdgeIgnored,
    GateAsserted(ChannelId),
    GateReleased(ChannelId),
    /// A ramp reached its end value.
    RampComplete(ChannelId),
    /// A gate pulse could not be armed because every timer slot was taken.
    TimerOverflow(ChannelId),
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::ZeroCrossAccepted => f.write_str("zero-cross"),
            TelemetryEventKind::EdgeSuppressed => f.write_str("edge-suppressed"),
            TelemetryEventKind::EdgeIgnored => f.write_str("edge-ignored"),
            TelemetryEventKind::GateAsserted(ch) => write!(f, "gate-asserted {ch}"),
            TelemetryEventKind::GateReleased(ch) => write!(f, "gate-released {ch}"),
            TelemetryEventKind::RampComplete(ch) => write!(f, "ramp-complete {ch}"),
            TelemetryEventKind::TimerOverflow(ch) => write!(f, "timer-overflow {ch}"),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<I>
where
    I: Copy,
{
    pub id: EventId,
    pub timestamp: I,
    pub event: TelemetryEventKind,
}

/// Records telemetry events into a fixed-size ring buffer.
///
/// Older entries are overwritten once the ring is full. A drain cursor tracks
/// which records the foreground has already forwarded.
pub struct TelemetryRecorder<I, const CAPACITY: usize = TELEMETRY_RING_CAPACITY>
where
    I: Copy,
{
    ring: HistoryBuf<TelemetryRecord<I>, CAPACITY>,
    next_event_id: EventId,
    drained_until: EventId,
}

impl<I, const CAPACITY: usize> TelemetryRecorder<I, CAPACITY>
where
    I: Copy,
{
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
            drained_until: 0,
        }
    }

    /// Records an event and returns its identifier.
    pub fn record(&mut self, event: TelemetryEventKind, timestamp: I) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });

        id
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord<I>> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    pub fn latest(&self) -> Option<&TelemetryRecord<I>> {
        self.ring.recent()
    }

    /// Hands every record not yet drained to `sink`, oldest first.
    ///
    /// Returns the number of records forwarded. Records overwritten before
    /// they could be drained are lost silently.
    pub fn drain_new(&mut self, mut sink: impl FnMut(&TelemetryRecord<I>)) -> usize {
        let cursor = self.drained_until;
        let mut forwarded = 0;
        for record in self
            .ring
            .oldest_ordered()
            .filter(|record| record.id.wrapping_sub(cursor) < u32::MAX / 2)
        {
            sink(record);
            forwarded += 1;
        }
        self.drained_until = self.next_event_id;
        forwarded
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total number of events recorded since creation (wrapping).
    pub const fn recorded(&self) -> EventId {
        self.next_event_id
    }
}

impl<I, const CAPACITY: usize> Default for TelemetryRecorder<I, CAPACITY>
where
    I: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::Micros;

    #[test]
    fn labels_name_the_channel() {
        let ch = ChannelId::new(2);
        assert_eq!(
            format!("{}", TelemetryEventKind::GateAsserted(ch)),
            "gate-asserted ch2"
        );
        assert_eq!(
            format!("{}", TelemetryEventKind::ZeroCrossAccepted),
            "zero-cross"
        );
    }

    #[test]
    fn ring_keeps_most_recent_records() {
        let mut recorder: TelemetryRecorder<Micros, 4> = TelemetryRecorder::new();
        for step in 0..6_u64 {
            recorder.record(
                TelemetryEventKind::ZeroCrossAccepted,
                Micros::from_millis(step * 10),
            );
        }

        assert_eq!(recorder.len(), 4);
        let ids: std::vec::Vec<_> = recorder.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids, [2, 3, 4, 5]);
        assert_eq!(recorder.latest().map(|r| r.timestamp), Some(Micros::from_millis(50)));
    }

    #[test]
    fn drain_forwards_each_record_once() {
        let mut recorder: TelemetryRecorder<Micros, 8> = TelemetryRecorder::new();
        recorder.record(TelemetryEventKind::ZeroCrossAccepted, Micros::ZERO);
        recorder.record(
            TelemetryEventKind::GateAsserted(ChannelId::new(0)),
            Micros::from_micros(5_000),
        );

        let mut seen = std::vec::Vec::new();
        assert_eq!(recorder.drain_new(|record| seen.push(record.event)), 2);
        assert_eq!(recorder.drain_new(|record| seen.push(record.event)), 0);

        recorder.record(TelemetryEventKind::EdgeSuppressed, Micros::from_micros(5_100));
        assert_eq!(recorder.drain_new(|record| seen.push(record.event)), 1);
        assert_eq!(
            seen,
            [
                TelemetryEventKind::ZeroCrossAccepted,
                TelemetryEventKind::GateAsserted(ChannelId::new(0)),
                TelemetryEventKind::EdgeSuppressed,
            ]
        );
    }
}

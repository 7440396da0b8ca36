//! Simulated mains supply and gate output.

use std::time::Duration;

use dimmer_core::instant::MonotonicInstant;
use dimmer_core::zero_cross::EdgeVerdict;
use dimmer_core::{ChannelId, GateAction, GateDriver, Micros, SharedDimmer};

/// How often the simulated gate task polls the timer wheel.
pub const POLL_INTERVAL: Duration = Duration::from_micros(50);

/// One gate transition seen by [`RecordingGateDriver`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GateEvent {
    pub at: Micros,
    pub channel: ChannelId,
    pub action: GateAction,
}

/// Gate driver that keeps every transition and measures firing delays.
#[derive(Debug, Default)]
pub struct RecordingGateDriver {
    now: Micros,
    last_crossing: Option<Micros>,
    pub(crate) events: Vec<GateEvent>,
    last_delay: Vec<(ChannelId, Duration)>,
}

impl RecordingGateDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_now(&mut self, now: Micros) {
        self.now = now;
    }

    fn mark_crossing(&mut self, at: Micros) {
        self.last_crossing = Some(at);
    }

    /// Number of gate pulses fired on `channel`.
    pub fn pulse_count(&self, channel: ChannelId) -> usize {
        self.events
            .iter()
            .filter(|event| event.channel == channel && event.action == GateAction::Assert)
            .count()
    }

    /// Delay between the latest crossing and the latest pulse on `channel`.
    pub fn last_delay(&self, channel: ChannelId) -> Option<Duration> {
        self.last_delay
            .iter()
            .find(|(id, _)| *id == channel)
            .map(|(_, delay)| *delay)
    }
}

impl GateDriver for RecordingGateDriver {
    fn apply(&mut self, channel: ChannelId, action: GateAction) {
        self.events.push(GateEvent {
            at: self.now,
            channel,
            action,
        });

        if action == GateAction::Assert {
            let Some(crossing) = self.last_crossing else {
                return;
            };
            let delay = self.now.saturating_duration_since(crossing);
            match self.last_delay.iter_mut().find(|(id, _)| *id == channel) {
                Some(entry) => entry.1 = delay,
                None => self.last_delay.push((channel, delay)),
            }
        }
    }

    fn release_all(&mut self) {
        let mut seen: Vec<ChannelId> = Vec::new();
        let mut held: Vec<ChannelId> = Vec::new();
        for event in self.events.iter().rev() {
            if seen.contains(&event.channel) {
                continue;
            }
            seen.push(event.channel);
            if event.action == GateAction::Assert {
                held.push(event.channel);
            }
        }
        for channel in held {
            self.events.push(GateEvent {
                at: self.now,
                channel,
                action: GateAction::Release,
            });
        }
    }
}

/// Counters for one [`MainsSimulator::advance`] call.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MainsStats {
    pub crossings: u32,
    pub bounces: u32,
    pub gate_actions: usize,
}

/// A clean mains source with an optional bouncing zero-cross comparator.
#[derive(Debug)]
pub struct MainsSimulator {
    now: Micros,
    half_cycle: Duration,
    next_crossing: Micros,
    bounce: Option<Duration>,
    pending_bounce: Option<Micros>,
}

impl MainsSimulator {
    /// Creates a source at `frequency_hz` whose first crossing is at time zero.
    #[must_use]
    pub fn new(frequency_hz: u16) -> Self {
        Self {
            now: Micros::ZERO,
            half_cycle: dimmer_core::config::half_cycle_period(frequency_hz),
            next_crossing: Micros::ZERO,
            bounce: None,
            pending_bounce: None,
        }
    }

    /// Adds a second, spurious edge `offset` after every real crossing.
    #[must_use]
    pub fn with_bounce(mut self, offset: Duration) -> Self {
        self.bounce = Some(offset);
        self
    }

    #[must_use]
    pub fn now(&self) -> Micros {
        self.now
    }

    /// Runs the supply for `duration`, feeding edges to the dimmer and
    /// polling its timer wheel every [`POLL_INTERVAL`].
    pub fn advance<const CHANNELS: usize, const TIMERS: usize, const TELEMETRY: usize>(
        &mut self,
        dimmer: &SharedDimmer<Micros, CHANNELS, TIMERS, TELEMETRY>,
        driver: &mut RecordingGateDriver,
        duration: Duration,
    ) -> MainsStats {
        let end = self.now + duration;
        let mut stats = MainsStats::default();

        while self.now < end {
            if self.now >= self.next_crossing {
                let crossing = self.next_crossing;
                if dimmer.on_zero_cross_edge(crossing) == Some(EdgeVerdict::Accepted) {
                    driver.mark_crossing(crossing);
                    stats.crossings += 1;
                }
                self.pending_bounce = self.bounce.map(|offset| crossing + offset);
                self.next_crossing = crossing + self.half_cycle;
            }

            if let Some(bounce) = self.pending_bounce
                && self.now >= bounce
            {
                dimmer.on_zero_cross_edge(bounce);
                self.pending_bounce = None;
                stats.bounces += 1;
            }

            driver.set_now(self.now);
            stats.gate_actions += dimmer.poll(self.now, driver);
            self.now = self.now + POLL_INTERVAL;
        }

        stats
    }
}

//! One-shot gate timers.
//!
//! Every accepted crossing schedules at most two entries per channel: the
//! gate assertion after the phase delay and the release one trigger width
//! later. Entries carry their own deadline so a single hardware alarm (or the
//! Embassy timer queue) can service the whole wheel by always waiting for
//! [`TimerWheel::next_deadline`].

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::channel::ChannelId;
use crate::driver::GateAction;
use crate::instant::MonotonicInstant;

/// Errors raised while arming gate timers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimerError {
    /// Every timer slot is already armed.
    Full,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::Full => f.write_str("timer slots exhausted"),
        }
    }
}

/// Gate action armed for a future instant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScheduledGate<I> {
    pub deadline: I,
    pub channel: ChannelId,
    pub action: GateAction,
    seq: u32,
}

impl<I> ScheduledGate<I>
where
    I: MonotonicInstant,
{
    fn sort_key(&self) -> (I, u32) {
        (self.deadline, self.seq)
    }
}

/// Fixed-capacity set of pending gate actions.
#[derive(Clone, Debug)]
pub struct TimerWheel<I, const CAPACITY: usize> {
    entries: Vec<ScheduledGate<I>, CAPACITY>,
    next_seq: u32,
}

impl<I, const CAPACITY: usize> TimerWheel<I, CAPACITY>
where
    I: MonotonicInstant,
{
    /// Creates an empty wheel.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Arms `action` for `channel` at `deadline`.
    ///
    /// Entries sharing a deadline fire in the order they were scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Full`] when every slot is taken.
    pub fn schedule(
        &mut self,
        deadline: I,
        channel: ChannelId,
        action: GateAction,
    ) -> Result<(), TimerError> {
        let seq = self.next_seq;
        self.entries
            .push(ScheduledGate {
                deadline,
                channel,
                action,
                seq,
            })
            .map_err(|_| TimerError::Full)?;
        self.next_seq = self.next_seq.wrapping_add(1);
        Ok(())
    }

    /// Arms a full gate pulse: assertion at `assert_at`, release `width` later.
    ///
    /// Both entries are armed or neither is, so a pulse can never be left
    /// without its release.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Full`] when fewer than two slots are free.
    pub fn schedule_pulse(
        &mut self,
        channel: ChannelId,
        assert_at: I,
        width: Duration,
    ) -> Result<(), TimerError> {
        if CAPACITY - self.entries.len() < 2 {
            return Err(TimerError::Full);
        }
        self.schedule(assert_at, channel, GateAction::Assert)?;
        self.schedule(assert_at + width, channel, GateAction::Release)
    }

    /// Drops every pending entry for `channel`.
    ///
    /// When the gate is currently held (its release is pending but the
    /// assertion already fired) a release is re-armed at `now` so the pin
    /// never stays high into the new half-cycle.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Full`] if the release could not be re-armed.
    pub fn cancel_channel(&mut self, channel: ChannelId, now: I) -> Result<(), TimerError> {
        let pending = |action| {
            self.entries
                .iter()
                .any(|entry| entry.channel == channel && entry.action == action)
        };
        let gate_held = pending(GateAction::Release) && !pending(GateAction::Assert);

        self.entries.retain(|entry| entry.channel != channel);

        if gate_held {
            self.schedule(now, channel, GateAction::Release)?;
        }
        Ok(())
    }

    /// Removes and returns the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: I) -> Option<ScheduledGate<I>> {
        let (index, _) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline <= now)
            .min_by_key(|(_, entry)| entry.sort_key())?;
        Some(self.entries.swap_remove(index))
    }

    /// Deadline of the entry that fires next.
    pub fn next_deadline(&self) -> Option<I> {
        self.entries.iter().map(|entry| entry.deadline).min()
    }

    /// Number of pending entries for `channel`.
    pub fn pending_for(&self, channel: ChannelId) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.channel == channel)
            .count()
    }

    /// Iterates pending entries in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledGate<I>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Discards every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<I, const CAPACITY: usize> Default for TimerWheel<I, CAPACITY>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

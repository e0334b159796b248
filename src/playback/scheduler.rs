//! Epoch-tagged timer queue.
//!
//! The engine never sleeps. Timers are recorded with a due time and the
//! epoch they belong to; the host calls `tick` and due timers are popped in
//! order.

use super::Epoch;

pub type TimerId = u64;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Absolute replay deadline: remaining visible duration plus margin
    ReplayTimeout,
    /// Periodic stall and near-end check
    StallWatchdog,
    /// Recorder never reported that it stopped
    RecorderStopTimeout,
}

impl TimerKind {
    /// Whether the timer belongs to a running replay.
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::ReplayTimeout | Self::StallWatchdog)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub id: TimerId,
    pub due: f64,
    pub kind: TimerKind,
    pub epoch: Epoch,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: TimerId,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, kind: TimerKind, epoch: Epoch) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due,
            kind,
            epoch,
        });
        id
    }

    /// Pop the earliest timer due at or before `now`.
    ///
    /// Ties are broken by scheduling order.
    pub fn pop_due(&mut self, now: f64) -> Option<Timer> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(idx, _)| idx)?;
        Some(self.timers.remove(idx))
    }

    pub fn cancel_kind(&mut self, kind: TimerKind) {
        self.timers.retain(|t| t.kind != kind);
    }

    /// Drop every replay timer (timeout and watchdog).
    pub fn cancel_replay(&mut self) {
        self.timers.retain(|t| !t.kind.is_replay());
    }

    pub fn next_due(&self) -> Option<f64> {
        self.timers.iter().map(|t| t.due).min_by(f64::total_cmp)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

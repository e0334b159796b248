//! The active replay and its end-of-session detection.
//!
//! The media element's own "ended" event is not reliable for
//! fragment-assembled streams, so four signals race to finish a session:
//! - the native ended event
//! - an absolute timeout of remaining visible duration plus a margin
//! - a stall watchdog (no progress within the stall window)
//! - a near-end guard against the decoded and the expected duration
//!
//! Whichever fires first wins; `ended_fired` keeps the finish exactly-once.

use std::fmt;

use super::Epoch;
use crate::session::SessionId;

/// Event reported by the replay collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEvent {
    /// Epoch the collaborator was given when the media was loaded
    pub epoch: Epoch,
    pub kind: ReplayEventKind,
    /// Media position in seconds at the time of the event
    pub media_time: f64,
}

impl ReplayEvent {
    pub fn new(epoch: Epoch, kind: ReplayEventKind, media_time: f64) -> Self {
        Self {
            epoch,
            kind,
            media_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEventKind {
    /// Media is ready to seek; `duration` is the decoded length if known
    MetadataLoaded { duration: Option<f64> },
    /// Playback position advanced
    TimeUpdate,
    /// Native end of media
    Ended,
    /// Media failed to load, decode or play
    Error(String),
}

/// Which signal finished a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndSignal {
    NativeEnded,
    Timeout,
    Stalled,
    NearEnd,
    Failed,
}

impl fmt::Display for EndSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NativeEnded => "ended",
            Self::Timeout => "timeout",
            Self::Stalled => "stalled",
            Self::NearEnd => "near-end",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    /// Waiting for metadata before seeking
    Loading,
    Playing,
    Paused,
}

/// State of the one replay that may run at a time.
///
/// Positions are media time: seconds into the assembled stream, which
/// starts `lead_in` seconds before the session's first retained fragment.
#[derive(Debug, Clone)]
pub struct ActiveReplay {
    pub session: SessionId,
    pub epoch: Epoch,
    pub phase: ReplayPhase,
    /// Absolute time of the session's first retained fragment
    pub origin: f64,
    pub lead_in: f64,
    /// Media time to seek to once metadata is loaded
    pub start_position: f64,
    /// Media time of the session's visible end
    pub end_position: f64,
    pub position: f64,
    pub decoded_duration: Option<f64>,
    pub ended_fired: bool,
    stall_position: f64,
    stall_since: f64,
}

impl ActiveReplay {
    pub fn new(
        session: SessionId,
        epoch: Epoch,
        origin: f64,
        lead_in: f64,
        start_position: f64,
        end_position: f64,
    ) -> Self {
        Self {
            session,
            epoch,
            phase: ReplayPhase::Loading,
            origin,
            lead_in,
            start_position,
            end_position,
            position: start_position,
            decoded_duration: None,
            ended_fired: false,
            stall_position: start_position,
            stall_since: 0.0,
        }
    }

    /// Absolute time of the current position.
    pub fn absolute_position(&self) -> f64 {
        self.origin + self.position - self.lead_in
    }

    /// Visible seconds left from the current position.
    pub fn remaining(&self) -> f64 {
        (self.end_position - self.position).max(0.0)
    }

    /// Record a decoded duration; non-finite values (live-style streams) are ignored.
    pub fn set_decoded_duration(&mut self, duration: Option<f64>) {
        self.decoded_duration = duration.filter(|d| d.is_finite() && *d > 0.0);
    }

    /// Restart stall tracking from the current position at `now`.
    pub fn reset_stall(&mut self, now: f64) {
        self.stall_position = self.position;
        self.stall_since = now;
    }

    /// Update the position reported by the collaborator.
    pub fn observe(&mut self, media_time: f64, now: f64, min_progress: f64) {
        if !media_time.is_finite() {
            return;
        }
        self.position = media_time;
        if (media_time - self.stall_position).abs() >= min_progress {
            self.stall_position = media_time;
            self.stall_since = now;
        }
    }

    /// No progress of at least the minimum since `window` seconds ago.
    pub fn is_stalled(&self, now: f64, window: f64) -> bool {
        self.phase == ReplayPhase::Playing && now - self.stall_since >= window
    }

    /// Position is within `tolerance` of the decoded or the expected end.
    pub fn is_near_end(&self, tolerance: f64) -> bool {
        let limit = match self.decoded_duration {
            Some(decoded) => decoded.min(self.end_position),
            None => self.end_position,
        };
        self.position >= limit - tolerance
    }

    /// Claim the finish. Returns `false` if another signal already did.
    pub fn finish(&mut self) -> bool {
        if self.ended_fired {
            return false;
        }
        self.ended_fired = true;
        true
    }
}

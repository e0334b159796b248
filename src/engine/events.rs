//! Engine outputs for UI collaborators.

use crate::playback::{EndSignal, Epoch, PlaybackState};
use crate::session::SessionId;

/// Something a UI may want to react to.
///
/// Events are queued in order and drained with
/// [`FlashbackEngine::take_events`](super::FlashbackEngine::take_events).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },
    /// User-facing message
    Notice(String),
    ReplayStarted {
        session: SessionId,
        epoch: Epoch,
    },
    ReplayFinished {
        session: SessionId,
        signal: EndSignal,
    },
    MarkerAdded(f64),
    /// A degenerate session was dropped on finalization
    SessionDiscarded(SessionId),
}

/// What a seek request led to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOutcome {
    /// Replay media was handed to the output
    Started {
        epoch: Epoch,
        session: SessionId,
        offset: f64,
    },
    /// Waiting for live capture to stop; the seek resumes afterwards
    Pending { epoch: Epoch },
    /// The target was past every session; live capture resumed
    Live,
    /// The request was not allowed in the current state
    Ignored,
}

impl SeekOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

//! Playback state machine.

use std::fmt;

use crate::error::FlashbackError;

/// Where the engine is between live capture and replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Capturing live fragments
    Recording,
    /// Capture stopped by the user
    RecordingStopped,
    /// Live capture is being torn down before a replay starts
    Transitioning,
    /// Replaying a session
    Flashback,
    /// Replay paused at the current position
    FlashbackPaused,
}

impl PlaybackState {
    /// States a seek may start from.
    pub const SEEKABLE: [PlaybackState; 5] = [
        PlaybackState::Recording,
        PlaybackState::RecordingStopped,
        PlaybackState::Transitioning,
        PlaybackState::Flashback,
        PlaybackState::FlashbackPaused,
    ];

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_replaying(&self) -> bool {
        matches!(self, Self::Flashback | Self::FlashbackPaused)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::RecordingStopped => "stopped",
            Self::Transitioning => "transitioning",
            Self::Flashback => "flashback",
            Self::FlashbackPaused => "paused",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// User toggle (stop/resume capture, pause/resume replay)
    Toggle,
    /// User escape from replay back to live capture
    Escape,
    /// Seek request
    Seek,
    /// Replay media for a resolved session has been handed out
    ReplayReady,
    /// Replay ran out of sessions or failed; capture resumes
    ResumeLive,
    /// Capture could not be (re)started
    CaptureUnavailable,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Escape => "escape to live",
            Self::Seek => "seek",
            Self::ReplayReady => "start replay",
            Self::ResumeLive => "resume live capture",
            Self::CaptureUnavailable => "stop capture",
        }
    }
}

/// Transition table.
///
/// # Errors
/// `InvalidStateTransition` when `action` is not allowed in `from`.
pub fn next_state(from: PlaybackState, action: Action) -> Result<PlaybackState, FlashbackError> {
    use PlaybackState::*;

    let to = match (from, action) {
        (Recording, Action::Toggle) => Some(RecordingStopped),
        (RecordingStopped, Action::Toggle) => Some(Recording),
        (Flashback, Action::Toggle) => Some(FlashbackPaused),
        (FlashbackPaused, Action::Toggle) => Some(Flashback),

        (Flashback | FlashbackPaused, Action::Escape) => Some(Recording),

        (_, Action::Seek) => Some(Transitioning),

        (Transitioning | Flashback | FlashbackPaused, Action::ReplayReady) => Some(Flashback),

        (RecordingStopped | Transitioning | Flashback | FlashbackPaused, Action::ResumeLive) => {
            Some(Recording)
        }

        (_, Action::CaptureUnavailable) => Some(RecordingStopped),

        _ => None,
    };

    to.ok_or(FlashbackError::InvalidStateTransition {
        action: action.name(),
        state: from,
    })
}

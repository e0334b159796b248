//! Engine error taxonomy.

use crate::playback::PlaybackState;
use crate::session::SessionId;

/// Errors produced by the flashback engine.
///
/// None of these cross the public API as panics: callers get them back as
/// values and the engine itself degrades to "skip and continue".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlashbackError {
    #[error("Nothing has been recorded yet")]
    NoDataAvailable,

    #[error("Cannot {action} while {state}")]
    InvalidStateTransition {
        action: &'static str,
        state: PlaybackState,
    },

    #[error("A marker already exists near {time:.2}s")]
    DuplicateMarker { time: f64 },

    #[error("Replay of session {session} failed: {message}")]
    ReplayLoadFailure { session: SessionId, message: String },

    #[error("No capture source available")]
    CaptureUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FlashbackError {
    /// Whether the error should be shown to the user.
    ///
    /// Invalid transitions and duplicate markers are expected noise from
    /// rapid input and stay silent.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            Self::InvalidStateTransition { .. } | Self::DuplicateMarker { .. }
        )
    }
}

//! The visible absolute-time window.
//!
//! Every consumer of "what time range can the user navigate" goes through
//! [`compute_visible_window`], so the cursor, markers and any renderer agree
//! on the same numbers.

use crate::playback::PlaybackState;

/// Retained absolute-time span the user may navigate within.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisibleWindow {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

impl VisibleWindow {
    pub fn new(start: f64, end: f64) -> Self {
        let start = start.min(end);
        Self {
            start,
            end,
            duration: end - start,
        }
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    pub fn clamp(&self, time: f64) -> f64 {
        time.clamp(self.start, self.end)
    }

    /// Position of `time` as a 0..=1 fraction of the window.
    pub fn fraction(&self, time: f64) -> f64 {
        if self.duration > 0.0 {
            ((time - self.start) / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Derive the visible window from the playback state and session bounds.
///
/// - live capture: the last `max_duration` seconds up to `lifetime`
/// - otherwise: from the earliest visible session start to
///   `max(max_duration, lifetime)`, which keeps the first window full-width
pub fn compute_visible_window(
    state: PlaybackState,
    lifetime: f64,
    max_duration: f64,
    visible_start: Option<f64>,
) -> VisibleWindow {
    if state == PlaybackState::Recording {
        let end = lifetime;
        return VisibleWindow::new((end - max_duration).max(0.0), end);
    }

    let end = lifetime.max(max_duration);
    let start = visible_start.unwrap_or(0.0).max(0.0);
    VisibleWindow::new(start, end)
}

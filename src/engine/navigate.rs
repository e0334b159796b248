//! Step and marker navigation.

use tracing::debug;

use super::{EngineEvent, FlashbackEngine, SeekOutcome};
use crate::error::FlashbackError;
use crate::navigation::{cumulative_step, Direction, MarkerId};
use crate::playback::PlaybackState;

/// States a forward step or forward marker jump may start from.
const FORWARD_STATES: [PlaybackState; 4] = [
    PlaybackState::RecordingStopped,
    PlaybackState::Transitioning,
    PlaybackState::Flashback,
    PlaybackState::FlashbackPaused,
];

impl FlashbackEngine {
    /// Jump back. Rapid presses double the distance from where the burst
    /// started: 1, 2, 4, 8, 16 seconds.
    pub fn step_back(&mut self) -> Result<SeekOutcome, FlashbackError> {
        let now = self.clock.now();
        let position = self.current_absolute_time();
        self.forward_presses.reset();
        let (presses, anchor) = self.back_presses.press(now, position);
        let offset = cumulative_step(presses, self.config.navigation.max_step_exponent);
        debug!(presses, anchor, offset, "step back");
        self.seek(anchor - offset, &PlaybackState::SEEKABLE)
    }

    /// Jump forward. Ignored while live; stepping past the newest session
    /// resumes live capture.
    pub fn step_forward(&mut self) -> Result<SeekOutcome, FlashbackError> {
        if !FORWARD_STATES.contains(&self.state) {
            debug!(state = %self.state, "step forward ignored");
            return Ok(SeekOutcome::Ignored);
        }
        let now = self.clock.now();
        let position = self.current_absolute_time();
        self.back_presses.reset();
        let (presses, anchor) = self.forward_presses.press(now, position);
        let offset = cumulative_step(presses, self.config.navigation.max_step_exponent);
        debug!(presses, anchor, offset, "step forward");
        self.seek(anchor + offset, &FORWARD_STATES)
    }

    /// Bookmark the current position.
    ///
    /// # Errors
    /// `NoDataAvailable` with an empty buffer, `DuplicateMarker` when a
    /// marker already sits within epsilon of the position.
    pub fn add_marker(&mut self) -> Result<MarkerId, FlashbackError> {
        if self.buffer.is_empty() {
            return Err(self.no_data());
        }
        let time = self.current_absolute_time();
        match self.markers.add(time, self.lifetime) {
            Ok(id) => {
                debug!(marker = id, time, "marker added");
                self.events.push_back(EngineEvent::MarkerAdded(time));
                Ok(id)
            }
            Err(err) => {
                debug!(%err, "marker rejected");
                Err(err)
            }
        }
    }

    /// Jump to a marker.
    ///
    /// Backward goes to the `skip_count`-th marker before the current
    /// position, or to the start of the visible window when there are
    /// fewer. Forward goes to the next marker, or back to live capture
    /// from a replay when there is none.
    pub fn navigate_marker(
        &mut self,
        direction: Direction,
        skip_count: usize,
    ) -> Result<SeekOutcome, FlashbackError> {
        let current = self.current_absolute_time();
        self.navigate_marker_from(current, direction, skip_count)
    }

    /// Marker navigation with rapid presses folded into a skip count.
    ///
    /// Repeated backward presses within the rapid-press window skip one
    /// more marker each, counted from where the burst started.
    pub fn press_marker(&mut self, direction: Direction) -> Result<SeekOutcome, FlashbackError> {
        let position = self.current_absolute_time();
        match direction {
            Direction::Backward => {
                let now = self.clock.now();
                let (presses, anchor) = self.marker_presses.press(now, position);
                self.navigate_marker_from(anchor, direction, presses as usize)
            }
            Direction::Forward => {
                self.marker_presses.reset();
                self.navigate_marker_from(position, direction, 1)
            }
        }
    }

    fn navigate_marker_from(
        &mut self,
        current: f64,
        direction: Direction,
        skip_count: usize,
    ) -> Result<SeekOutcome, FlashbackError> {
        if self.buffer.is_empty() {
            return Err(self.no_data());
        }
        match direction {
            Direction::Backward => {
                let target = self
                    .markers
                    .previous(current, skip_count)
                    .unwrap_or(self.window.start);
                debug!(current, skip_count, target, "marker back");
                self.seek(target, &PlaybackState::SEEKABLE)
            }
            Direction::Forward => match self.markers.next(current) {
                Some(target) => {
                    debug!(current, target, "marker forward");
                    self.seek(target, &FORWARD_STATES)
                }
                None if self.state.is_replaying() => {
                    self.go_live();
                    Ok(SeekOutcome::Live)
                }
                None => Ok(SeekOutcome::Ignored),
            },
        }
    }
}

//! Seams to the outside world.
//!
//! The engine has no media or UI dependency of its own. A host plugs in a
//! capture device that produces fragments and a replay output that plays
//! assembled media, and feeds their callbacks back into the engine.

use crate::error::FlashbackError;
use crate::playback::Epoch;
use crate::session::ReplayMedia;

/// Live capture source.
///
/// `start` and `stop` are requests. Fragments arrive through
/// [`FlashbackEngine::ingest`] and the final stop is reported through
/// [`FlashbackEngine::notify_recorder_stopped`].
///
/// [`FlashbackEngine::ingest`]: super::FlashbackEngine::ingest
/// [`FlashbackEngine::notify_recorder_stopped`]: super::FlashbackEngine::notify_recorder_stopped
pub trait CaptureDevice {
    fn is_available(&self) -> bool {
        true
    }

    /// Begin delivering fragments.
    fn start(&mut self) -> Result<(), FlashbackError>;

    /// Stop delivering fragments. The device may still flush one late fragment.
    fn stop(&mut self);

    /// Container type of produced fragments, if the device knows it.
    fn mime_type(&self) -> Option<&str> {
        None
    }
}

/// Media element that plays assembled sessions.
///
/// Every call carries the epoch of the replay it belongs to, and every event
/// the output reports back must echo it.
pub trait ReplayOutput {
    fn load(&mut self, epoch: Epoch, media: &ReplayMedia);
    fn seek(&mut self, epoch: Epoch, media_time: f64);
    fn play(&mut self, epoch: Epoch);
    fn pause(&mut self, epoch: Epoch);
    /// Release the current media, if any.
    fn unload(&mut self);
}

/// Capture device that accepts start/stop and produces nothing by itself.
#[derive(Debug, Clone, Default)]
pub struct NullCapture {
    pub running: bool,
}

impl CaptureDevice for NullCapture {
    fn start(&mut self) -> Result<(), FlashbackError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// Replay output that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReplay;

impl ReplayOutput for NullReplay {
    fn load(&mut self, _epoch: Epoch, _media: &ReplayMedia) {}
    fn seek(&mut self, _epoch: Epoch, _media_time: f64) {}
    fn play(&mut self, _epoch: Epoch) {}
    fn pause(&mut self, _epoch: Epoch) {}
    fn unload(&mut self) {}
}

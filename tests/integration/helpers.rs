//! Shared test harness: recording collaborators and a manual clock.

use std::cell::RefCell;
use std::rc::Rc;

use flashback::buffer::FragmentInput;
use flashback::clock::ManualClock;
use flashback::engine::{CaptureDevice, FlashbackEngine, ReplayOutput};
use flashback::playback::{Epoch, ReplayEvent, ReplayEventKind};
use flashback::session::{ReplayMedia, SessionId};
use flashback::{Config, FlashbackError};

#[derive(Debug, Default)]
pub struct CaptureLog {
    pub starts: usize,
    pub stops: usize,
    pub unavailable: bool,
    pub fail_start: bool,
}

pub struct MockCapture(Rc<RefCell<CaptureLog>>);

impl CaptureDevice for MockCapture {
    fn is_available(&self) -> bool {
        !self.0.borrow().unavailable
    }

    fn start(&mut self) -> Result<(), FlashbackError> {
        let mut log = self.0.borrow_mut();
        if log.fail_start {
            return Err(FlashbackError::CaptureUnavailable);
        }
        log.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.0.borrow_mut().stops += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayCall {
    Load {
        epoch: Epoch,
        session: SessionId,
        bytes: usize,
        lead_in: f64,
    },
    Seek(Epoch, f64),
    Play(Epoch),
    Pause(Epoch),
    Unload,
}

pub struct MockReplay(Rc<RefCell<Vec<ReplayCall>>>);

impl ReplayOutput for MockReplay {
    fn load(&mut self, epoch: Epoch, media: &ReplayMedia) {
        self.0.borrow_mut().push(ReplayCall::Load {
            epoch,
            session: media.session,
            bytes: media.bytes.len(),
            lead_in: media.lead_in,
        });
    }

    fn seek(&mut self, epoch: Epoch, media_time: f64) {
        self.0.borrow_mut().push(ReplayCall::Seek(epoch, media_time));
    }

    fn play(&mut self, epoch: Epoch) {
        self.0.borrow_mut().push(ReplayCall::Play(epoch));
    }

    fn pause(&mut self, epoch: Epoch) {
        self.0.borrow_mut().push(ReplayCall::Pause(epoch));
    }

    fn unload(&mut self) {
        self.0.borrow_mut().push(ReplayCall::Unload);
    }
}

/// Engine plus handles on everything it talks to.
pub struct Harness {
    pub engine: FlashbackEngine,
    pub clock: ManualClock,
    pub capture: Rc<RefCell<CaptureLog>>,
    pub replay: Rc<RefCell<Vec<ReplayCall>>>,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        let clock = ManualClock::new(0.0);
        let capture = Rc::new(RefCell::new(CaptureLog::default()));
        let replay = Rc::new(RefCell::new(Vec::new()));
        let engine = FlashbackEngine::new(
            config,
            Box::new(clock.clone()),
            Box::new(MockCapture(Rc::clone(&capture))),
            Box::new(MockReplay(Rc::clone(&replay))),
        );
        Self {
            engine,
            clock,
            capture,
            replay,
        }
    }

    /// Harness already capturing live with the given retention.
    pub fn live(max_duration: f64, margin: f64) -> Self {
        let mut harness = Self::new(config(max_duration, margin));
        harness.engine.start().unwrap();
        harness
    }

    /// Ingest `count` fragments of `duration` seconds and 100 bytes each.
    pub fn feed(&mut self, count: usize, duration: f64) {
        for _ in 0..count {
            self.engine
                .ingest(FragmentInput::new(vec![7; 100], duration));
        }
    }

    /// Stop live capture and deliver the recorder's stop callback.
    pub fn stop_capture(&mut self) {
        self.engine.toggle();
        self.engine.notify_recorder_stopped();
    }

    pub fn advance(&mut self, seconds: f64) {
        self.clock.advance(seconds);
        self.engine.tick();
    }

    pub fn event(&mut self, kind: ReplayEventKind, media_time: f64) {
        let epoch = self.engine.epoch();
        self.engine
            .notify_replay_event(ReplayEvent::new(epoch, kind, media_time));
    }

    /// Report metadata for the current replay, which starts playback.
    pub fn metadata(&mut self, duration: f64) {
        self.event(
            ReplayEventKind::MetadataLoaded {
                duration: Some(duration),
            },
            0.0,
        );
    }

    pub fn loads(&self) -> Vec<ReplayCall> {
        self.replay
            .borrow()
            .iter()
            .filter(|c| matches!(c, ReplayCall::Load { .. }))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.replay.borrow_mut().clear();
    }
}

pub fn config(max_duration: f64, margin: f64) -> Config {
    let mut config = Config::default();
    config.buffer.max_duration = max_duration;
    config.buffer.buffer_margin = margin;
    config
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

//! Simulated collaborators.
//!
//! A capture device that emits fixed-length fragments on a cadence and a
//! replay element that "plays" assembled media in real time. Both are
//! pumped by [`Simulation::pump`], which feeds their output back into the
//! engine the way a real host's event loop would.
//!
//! Payload size is proportional to duration (`BYTES_PER_SECOND`), so the
//! simulated replay derives its decoded duration from the assembled bytes.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::buffer::FragmentInput;
use crate::clock::Clock;
use crate::config::Config;
use crate::engine::{CaptureDevice, FlashbackEngine, ReplayOutput};
use crate::error::FlashbackError;
use crate::playback::{Epoch, ReplayEvent, ReplayEventKind};
use crate::session::ReplayMedia;

/// Simulated encoder bitrate.
pub const BYTES_PER_SECOND: f64 = 1000.0;

#[derive(Debug)]
struct CaptureSim {
    running: bool,
    stop_reported: bool,
    fragment_duration: f64,
    next_due: Option<f64>,
    sequence: u64,
}

impl CaptureSim {
    fn poll(&mut self, now: f64) -> (Vec<FragmentInput>, bool) {
        let mut fragments = Vec::new();
        if self.running {
            let mut due = *self.next_due.get_or_insert(now + self.fragment_duration);
            while due <= now {
                fragments.push(self.fragment());
                due += self.fragment_duration;
            }
            self.next_due = Some(due);
        }
        let stopped = std::mem::take(&mut self.stop_reported);
        (fragments, stopped)
    }

    fn fragment(&mut self) -> FragmentInput {
        self.sequence += 1;
        let len = (self.fragment_duration * BYTES_PER_SECOND).round() as usize;
        FragmentInput::new(vec![(self.sequence % 251) as u8; len.max(1)], self.fragment_duration)
    }
}

/// Capture half handed to the engine.
#[derive(Debug, Clone)]
pub struct SimCapture(Rc<RefCell<CaptureSim>>);

impl CaptureDevice for SimCapture {
    fn start(&mut self) -> Result<(), FlashbackError> {
        let mut sim = self.0.borrow_mut();
        sim.running = true;
        sim.next_due = None;
        Ok(())
    }

    fn stop(&mut self) {
        let mut sim = self.0.borrow_mut();
        if sim.running {
            sim.running = false;
            // The encoder flushes what it has, then reports the stop.
            sim.stop_reported = true;
        }
    }

    fn mime_type(&self) -> Option<&str> {
        Some("video/webm")
    }
}

#[derive(Debug, Default)]
struct ReplaySim {
    epoch: Option<Epoch>,
    decoded: f64,
    position: f64,
    playing: bool,
    metadata_sent: bool,
    ended: bool,
    last_poll: Option<f64>,
}

impl ReplaySim {
    fn poll(&mut self, now: f64) -> Vec<ReplayEvent> {
        let elapsed = self.last_poll.map_or(0.0, |last| (now - last).max(0.0));
        self.last_poll = Some(now);

        let Some(epoch) = self.epoch else {
            return Vec::new();
        };
        let mut events = Vec::new();
        if !self.metadata_sent {
            self.metadata_sent = true;
            let duration = Some(self.decoded);
            events.push(ReplayEvent::new(
                epoch,
                ReplayEventKind::MetadataLoaded { duration },
                0.0,
            ));
            return events;
        }
        if self.playing && !self.ended {
            self.position = (self.position + elapsed).min(self.decoded);
            events.push(ReplayEvent::new(
                epoch,
                ReplayEventKind::TimeUpdate,
                self.position,
            ));
            if self.position >= self.decoded {
                self.ended = true;
                events.push(ReplayEvent::new(epoch, ReplayEventKind::Ended, self.position));
            }
        }
        events
    }
}

/// Replay half handed to the engine.
#[derive(Debug, Clone)]
pub struct SimReplay(Rc<RefCell<ReplaySim>>);

impl ReplayOutput for SimReplay {
    fn load(&mut self, epoch: Epoch, media: &ReplayMedia) {
        let mut sim = self.0.borrow_mut();
        *sim = ReplaySim {
            epoch: Some(epoch),
            decoded: media.bytes.len() as f64 / BYTES_PER_SECOND,
            last_poll: sim.last_poll,
            ..ReplaySim::default()
        };
    }

    fn seek(&mut self, epoch: Epoch, media_time: f64) {
        let mut sim = self.0.borrow_mut();
        if sim.epoch == Some(epoch) {
            sim.position = media_time.clamp(0.0, sim.decoded);
        }
    }

    fn play(&mut self, epoch: Epoch) {
        let mut sim = self.0.borrow_mut();
        if sim.epoch == Some(epoch) {
            sim.playing = true;
        }
    }

    fn pause(&mut self, epoch: Epoch) {
        let mut sim = self.0.borrow_mut();
        if sim.epoch == Some(epoch) {
            sim.playing = false;
        }
    }

    fn unload(&mut self) {
        let mut sim = self.0.borrow_mut();
        let last_poll = sim.last_poll;
        *sim = ReplaySim {
            last_poll,
            ..ReplaySim::default()
        };
    }
}

/// An engine wired to simulated collaborators.
pub struct Simulation<C: Clock> {
    pub engine: FlashbackEngine,
    clock: C,
    capture: Rc<RefCell<CaptureSim>>,
    replay: Rc<RefCell<ReplaySim>>,
}

impl<C: Clock + Clone + 'static> Simulation<C> {
    pub fn new(config: Config, clock: C, fragment_duration: f64) -> Self {
        let capture = Rc::new(RefCell::new(CaptureSim {
            running: false,
            stop_reported: false,
            fragment_duration,
            next_due: None,
            sequence: 0,
        }));
        let replay = Rc::new(RefCell::new(ReplaySim::default()));
        let engine = FlashbackEngine::new(
            config,
            Box::new(clock.clone()),
            Box::new(SimCapture(Rc::clone(&capture))),
            Box::new(SimReplay(Rc::clone(&replay))),
        );
        Self {
            engine,
            clock,
            capture,
            replay,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Deliver everything the simulated devices produced up to now, then
    /// fire due timers.
    pub fn pump(&mut self) {
        let now = self.clock.now();

        let (fragments, stopped) = self.capture.borrow_mut().poll(now);
        for fragment in fragments {
            self.engine.ingest(fragment);
        }
        if stopped {
            trace!("simulated recorder stopped");
            self.engine.notify_recorder_stopped();
        }

        // Events may trigger a new load, which re-borrows the replay sim.
        let events = self.replay.borrow_mut().poll(now);
        for event in events {
            self.engine.notify_replay_event(event);
        }

        self.engine.tick();
    }
}

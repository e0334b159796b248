//! The flashback engine.
//!
//! `FlashbackEngine` owns the four sources of truth (fragment buffer,
//! sessions, visible window and markers) and the playback state machine.
//! It is a message-driven core: the host calls `ingest`, `seek`, `tick` and
//! the notification methods from one thread, and the engine drives its
//! collaborators in response.
//!
//! Every mutation funnels through `settle`, which re-applies retention,
//! pre-roll marking, session bounds, the visible window and marker pruning
//! in that order, so no caller can observe the sources out of sync.

mod collaborators;
mod events;
mod navigate;
mod replay;

use std::collections::VecDeque;

use tracing::{debug, info, trace, warn};

pub use collaborators::{CaptureDevice, NullCapture, NullReplay, ReplayOutput};
pub use events::{EngineEvent, SeekOutcome};

use crate::buffer::{Fragment, FragmentBuffer, FragmentId, FragmentInput, DURATION_EPSILON};
use crate::clock::Clock;
use crate::config::{clamp_buffer_margin, clamp_max_duration, Config};
use crate::error::FlashbackError;
use crate::navigation::{MarkerSet, PressCounter};
use crate::playback::{
    next_state, Action, ActiveReplay, EndSignal, Epoch, EpochCounter, PlaybackState, TimerKind,
    TimerQueue,
};
use crate::session::{Finalization, SessionAggregator, SessionSummary};
use crate::window::{compute_visible_window, VisibleWindow};

/// Continuous-capture instant replay engine.
pub struct FlashbackEngine {
    config: Config,
    clock: Box<dyn Clock>,
    capture: Box<dyn CaptureDevice>,
    output: Box<dyn ReplayOutput>,

    buffer: FragmentBuffer,
    sessions: SessionAggregator,
    markers: MarkerSet,
    window: VisibleWindow,
    global_visible_start: Option<f64>,
    lifetime: f64,

    state: PlaybackState,
    epoch: EpochCounter,
    timers: TimerQueue,
    replay: Option<ActiveReplay>,
    pending_seek: Option<f64>,
    cursor: f64,
    stop_pending: bool,
    /// A stop was forced by timeout and its callback may still arrive.
    /// Cleared once capture restarts and delivers data.
    late_stop_expected: bool,

    back_presses: PressCounter,
    forward_presses: PressCounter,
    marker_presses: PressCounter,

    events: VecDeque<EngineEvent>,
}

impl FlashbackEngine {
    /// Create an engine in `RecordingStopped`. Call [`start`](Self::start)
    /// to begin live capture.
    pub fn new(
        config: Config,
        clock: Box<dyn Clock>,
        capture: Box<dyn CaptureDevice>,
        output: Box<dyn ReplayOutput>,
    ) -> Self {
        let config = config.validated();
        let window = compute_visible_window(
            PlaybackState::RecordingStopped,
            0.0,
            config.buffer.max_duration,
            None,
        );
        let press_window = config.navigation.rapid_press_window;

        Self {
            markers: MarkerSet::new(config.navigation.marker_epsilon),
            back_presses: PressCounter::new(press_window),
            forward_presses: PressCounter::new(press_window),
            marker_presses: PressCounter::new(press_window),
            config,
            clock,
            capture,
            output,
            buffer: FragmentBuffer::new(),
            sessions: SessionAggregator::new(),
            window,
            global_visible_start: None,
            lifetime: 0.0,
            state: PlaybackState::RecordingStopped,
            epoch: EpochCounter::new(),
            timers: TimerQueue::new(),
            replay: None,
            pending_seek: None,
            cursor: 0.0,
            stop_pending: false,
            late_stop_expected: false,
            events: VecDeque::new(),
        }
    }

    // === Accessors ===

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch.current()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Total seconds ever captured. Only grows.
    pub fn lifetime_duration(&self) -> f64 {
        self.lifetime
    }

    pub fn buffered_duration(&self) -> f64 {
        self.buffer.buffered_duration()
    }

    pub fn buffer(&self) -> &FragmentBuffer {
        &self.buffer
    }

    pub fn sessions(&self) -> &SessionAggregator {
        &self.sessions
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn replay(&self) -> Option<&ActiveReplay> {
        self.replay.as_ref()
    }

    pub fn visible_window(&self) -> VisibleWindow {
        self.window
    }

    /// Due time of the earliest pending timer, for hosts that sleep between ticks.
    pub fn next_timer_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    pub fn list_sessions_for_display(&self) -> Vec<SessionSummary> {
        self.sessions.summaries()
    }

    /// Absolute time the user is looking at.
    ///
    /// Live capture and a stopped recorder sit at the live edge; a replay
    /// reports its playback position; a pending seek reports its target.
    pub fn current_absolute_time(&self) -> f64 {
        let time = match self.state {
            PlaybackState::Recording | PlaybackState::RecordingStopped => self.lifetime,
            PlaybackState::Transitioning => self.pending_seek.unwrap_or(self.cursor),
            PlaybackState::Flashback | PlaybackState::FlashbackPaused => self
                .replay
                .as_ref()
                .map(ActiveReplay::absolute_position)
                .unwrap_or(self.cursor),
        };
        time.clamp(0.0, self.lifetime)
    }

    /// Drain queued events in the order they happened.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    // === Ingestion and retention ===

    /// Accept a fragment from the capture collaborator.
    ///
    /// Fragments with a non-finite or non-positive duration are dropped.
    pub fn ingest(&mut self, input: FragmentInput) -> Option<FragmentId> {
        if !input.is_well_formed() {
            warn!(
                duration = input.duration_hint,
                bytes = input.payload.len(),
                "dropping malformed fragment"
            );
            return None;
        }

        let capturing = self.state == PlaybackState::Recording;
        if capturing {
            // The restarted recorder is delivering, so the old one is gone.
            self.late_stop_expected = false;
        }
        let mime_type = self
            .capture
            .mime_type()
            .unwrap_or(self.config.buffer.mime_type.as_str())
            .to_string();
        let (session, is_header) = self.sessions.assign(
            self.lifetime,
            capturing,
            self.config.buffer.late_chunk_threshold,
            &mime_type,
        );

        let id = self.buffer.allocate_id();
        let fragment = Fragment::from_input(id, input, session, is_header, self.lifetime);
        self.lifetime = fragment.absolute_end;
        trace!(
            fragment = %id,
            session = %session,
            duration = fragment.duration,
            is_header,
            "ingested fragment"
        );
        self.buffer.push(fragment);
        self.sessions.attach(session, id);

        self.settle();
        Some(id)
    }

    /// Change the retention target (clamped to 1..=3600 seconds).
    pub fn set_max_duration(&mut self, seconds: f64) {
        let seconds = clamp_max_duration(seconds);
        debug!(max_duration = seconds, "retention target changed");
        self.config.buffer.max_duration = seconds;
        self.settle();
    }

    /// Change the margin retained beyond the visible duration.
    pub fn set_buffer_margin(&mut self, seconds: f64) {
        let seconds = clamp_buffer_margin(seconds);
        debug!(buffer_margin = seconds, "buffer margin changed");
        self.config.buffer.buffer_margin = seconds;
        self.settle();
    }

    /// Bring every derived structure back in line with the buffer.
    fn settle(&mut self) {
        self.enforce_retention();
        self.buffer.mark_pre_roll(self.config.buffer.max_duration);
        self.sessions.refresh_all(&self.buffer);

        for session in self.sessions.remove_non_viable(&mut self.buffer) {
            trace!(session = %session, "session scrolled out of the window");
        }
        self.global_visible_start = self.sessions.recompute_boundaries().map(|(start, _)| start);
        self.refresh_window();

        let pruned = self.markers.prune(self.window.start, self.lifetime);
        if pruned > 0 {
            debug!(pruned, "pruned markers outside the window");
        }

        if let Some(replay) = &self.replay {
            if self.sessions.get(replay.session).is_none() {
                let session = replay.session;
                debug!(session = %session, "replayed session was evicted");
                self.finish_replay(EndSignal::Failed);
            }
        }
    }

    /// Evict the oldest fragments until the buffer fits the retention limit.
    fn enforce_retention(&mut self) {
        let limit = self.config.buffer.retention_limit();
        while self.buffer.buffered_duration() > limit + DURATION_EPSILON {
            let Some(mut fragment) = self.buffer.evict_oldest() else {
                break;
            };
            if let Some(session) = self.sessions.get_mut(fragment.session_id) {
                session.absorb_eviction(&mut fragment);
            }
            debug!(
                fragment = %fragment.id,
                session = %fragment.session_id,
                header = fragment.is_header,
                buffered = self.buffer.buffered_duration(),
                "evicted fragment"
            );
        }
    }

    fn refresh_window(&mut self) {
        self.window = compute_visible_window(
            self.state,
            self.lifetime,
            self.config.buffer.max_duration,
            self.global_visible_start,
        );
    }

    // === State machine ===

    /// Apply `action` through the transition table. Invalid transitions are
    /// logged and ignored.
    fn apply(&mut self, action: Action) -> bool {
        match next_state(self.state, action) {
            Ok(to) => {
                self.set_state(to);
                true
            }
            Err(err) => {
                debug!(%err, "ignored state transition");
                false
            }
        }
    }

    fn set_state(&mut self, to: PlaybackState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug!(%from, %to, "state changed");
        self.state = to;
        self.events.push_back(EngineEvent::StateChanged { from, to });
        self.refresh_window();
    }

    fn notice(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "notice");
        self.events.push_back(EngineEvent::Notice(message));
    }

    fn no_data(&mut self) -> FlashbackError {
        let err = FlashbackError::NoDataAvailable;
        self.notice(err.to_string());
        err
    }

    // === Capture lifecycle ===

    /// Start live capture.
    ///
    /// # Errors
    /// `CaptureUnavailable` if the capture device can't start. The engine
    /// stays in `RecordingStopped`.
    pub fn start(&mut self) -> Result<(), FlashbackError> {
        if self.state == PlaybackState::Recording {
            return Ok(());
        }
        self.go_live();
        if self.state == PlaybackState::Recording {
            Ok(())
        } else {
            Err(FlashbackError::CaptureUnavailable)
        }
    }

    /// Toggle between stop/record or pause/play, depending on the state.
    ///
    /// Returns the state after the toggle.
    pub fn toggle(&mut self) -> PlaybackState {
        match self.state {
            PlaybackState::Recording => {
                self.request_capture_stop();
                self.apply(Action::Toggle);
            }
            PlaybackState::RecordingStopped => self.go_live(),
            PlaybackState::Flashback => self.pause_replay(),
            PlaybackState::FlashbackPaused => self.resume_replay(),
            PlaybackState::Transitioning => {
                self.apply(Action::Toggle);
            }
        }
        self.state
    }

    /// Leave replay and return to live capture.
    pub fn escape(&mut self) -> PlaybackState {
        match next_state(self.state, Action::Escape) {
            Ok(_) => self.go_live(),
            Err(err) => debug!(%err, "ignored escape"),
        }
        self.state
    }

    /// The capture collaborator reports that recording has fully stopped.
    ///
    /// Finalizes the active session. If a seek was waiting for the
    /// recorder, it resumes now.
    pub fn notify_recorder_stopped(&mut self) {
        if self.stop_pending {
            self.stop_pending = false;
            self.timers.cancel_kind(TimerKind::RecorderStopTimeout);
            self.finalize_capture();
            self.resume_pending_seek();
        } else if self.late_stop_expected {
            self.late_stop_expected = false;
            trace!("late recorder stop after timeout");
        } else if self.state == PlaybackState::Recording {
            warn!("capture stopped unexpectedly");
            self.finalize_capture();
            self.apply(Action::CaptureUnavailable);
            self.notice(FlashbackError::CaptureUnavailable.to_string());
        } else {
            trace!(state = %self.state, "ignoring duplicate recorder stop");
        }
    }

    fn request_capture_stop(&mut self) {
        self.capture.stop();
        self.stop_pending = true;
        let due = self.clock.now() + self.config.replay.recorder_stop_timeout;
        self.timers.cancel_kind(TimerKind::RecorderStopTimeout);
        self.timers
            .schedule(due, TimerKind::RecorderStopTimeout, self.epoch.current());
    }

    /// Finalize without waiting for the recorder's callback.
    fn force_capture_stop(&mut self) {
        self.stop_pending = false;
        self.late_stop_expected = true;
        self.timers.cancel_kind(TimerKind::RecorderStopTimeout);
        self.finalize_capture();
    }

    fn finalize_capture(&mut self) {
        let min_duration = self.config.buffer.min_session_duration;
        let min_bytes = self.config.buffer.min_session_bytes;
        match self
            .sessions
            .finalize_active(&mut self.buffer, min_duration, min_bytes)
        {
            Some(Finalization::Kept(session)) => {
                debug!(session = %session, "session finalized");
            }
            Some(Finalization::Discarded {
                session,
                purged_fragments,
            }) => {
                debug!(session = %session, purged_fragments, "degenerate session discarded");
                self.events.push_back(EngineEvent::SessionDiscarded(session));
            }
            None => trace!("no active session to finalize"),
        }
        self.settle();
    }

    fn resume_pending_seek(&mut self) {
        if self.state != PlaybackState::Transitioning {
            return;
        }
        match self.pending_seek.take() {
            Some(target) => {
                // Failures were already surfaced as notices.
                if let Err(err) = self.start_replay_at(target) {
                    debug!(%err, "pending seek did not start a replay");
                }
            }
            None => self.go_live(),
        }
    }

    /// Tear down any replay and resume live capture.
    fn go_live(&mut self) {
        self.timers.cancel_replay();
        if self.replay.take().is_some() {
            self.output.unload();
        }
        self.pending_seek = None;
        self.epoch.advance();
        // Only the stop forced right here may still owe a callback.
        self.late_stop_expected = false;
        if self.stop_pending {
            self.force_capture_stop();
        }
        self.back_presses.reset();
        self.forward_presses.reset();
        self.marker_presses.reset();

        if !self.capture.is_available() {
            warn!("no capture source available");
            self.apply(Action::CaptureUnavailable);
            self.notice(FlashbackError::CaptureUnavailable.to_string());
            return;
        }
        match self.capture.start() {
            Ok(()) => {
                self.apply(Action::ResumeLive);
                info!(lifetime = self.lifetime, "live capture resumed");
            }
            Err(err) => {
                warn!(%err, "capture failed to start");
                self.apply(Action::CaptureUnavailable);
                self.notice(err.to_string());
            }
        }
        self.cursor = self.lifetime;
    }

    // === Timers ===

    /// Fire every timer that is due. Timers from superseded replays no-op.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        while let Some(timer) = self.timers.pop_due(now) {
            if timer.kind.is_replay() && !self.epoch.is_current(timer.epoch) {
                trace!(epoch = %timer.epoch, kind = ?timer.kind, "dropping stale timer");
                continue;
            }
            match timer.kind {
                TimerKind::ReplayTimeout => self.finish_replay(EndSignal::Timeout),
                TimerKind::StallWatchdog => self.check_watchdog(now),
                TimerKind::RecorderStopTimeout => {
                    if self.stop_pending {
                        warn!("recorder did not report stop in time, finalizing");
                        self.force_capture_stop();
                        self.resume_pending_seek();
                    }
                }
            }
        }
    }
}

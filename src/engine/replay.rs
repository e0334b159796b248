//! Seeking and replay scheduling.

use tracing::{debug, info, trace, warn};

use super::{EngineEvent, FlashbackEngine, SeekOutcome};
use crate::error::FlashbackError;
use crate::navigation::resolve;
use crate::playback::{
    next_state, Action, ActiveReplay, EndSignal, PlaybackState, ReplayEvent, ReplayEventKind,
    ReplayPhase, TimerKind,
};
use crate::session::{assemble, SessionId};

impl FlashbackEngine {
    /// Seek to absolute time `target`.
    ///
    /// The target is clamped to `[0, lifetime]`. From live capture, or while
    /// an earlier stop is still unconfirmed, the seek completes once the
    /// recorder reports back (`Pending`). Otherwise the replay starts right
    /// away.
    ///
    /// # Errors
    /// `NoDataAvailable` when nothing has been captured or nothing
    /// replayable is left.
    pub fn seek(
        &mut self,
        target: f64,
        allowed: &[PlaybackState],
    ) -> Result<SeekOutcome, FlashbackError> {
        if !allowed.contains(&self.state) {
            debug!(state = %self.state, "seek not allowed from this state");
            return Ok(SeekOutcome::Ignored);
        }
        if let Err(err) = next_state(self.state, Action::Seek) {
            debug!(%err, "ignored seek");
            return Ok(SeekOutcome::Ignored);
        }
        if self.buffer.is_empty() {
            return Err(self.no_data());
        }

        let target = if target.is_nan() {
            self.current_absolute_time()
        } else {
            target.clamp(0.0, self.lifetime)
        };

        // Supersede whatever replay was running before touching shared state.
        let epoch = self.epoch.advance();
        self.timers.cancel_replay();
        if self.replay.take().is_some() {
            self.output.unload();
        }
        self.cursor = target;
        debug!(target, epoch = %epoch, from = %self.state, "seek");

        match self.state {
            PlaybackState::Recording => {
                self.apply(Action::Seek);
                self.pending_seek = Some(target);
                self.request_capture_stop();
                Ok(SeekOutcome::Pending { epoch })
            }
            PlaybackState::RecordingStopped | PlaybackState::Transitioning
                if self.stop_pending =>
            {
                self.apply(Action::Seek);
                self.pending_seek = Some(target);
                Ok(SeekOutcome::Pending { epoch })
            }
            _ => {
                self.apply(Action::Seek);
                self.pending_seek = None;
                self.start_replay_at(target)
            }
        }
    }

    /// Seek from any state.
    pub fn seek_to(&mut self, target: f64) -> Result<SeekOutcome, FlashbackError> {
        self.seek(target, &PlaybackState::SEEKABLE)
    }

    /// Resolve `target` and hand the owning session to the replay output.
    pub(super) fn start_replay_at(&mut self, target: f64) -> Result<SeekOutcome, FlashbackError> {
        let Some(resolution) = resolve(self.sessions.sessions(), target) else {
            let err = self.no_data();
            self.go_live();
            return Err(err);
        };
        if resolution.past_end {
            debug!(target, "seek past the newest session, going live");
            self.go_live();
            return Ok(SeekOutcome::Live);
        }
        Ok(self.load_session(resolution.session, resolution.offset))
    }

    /// Assemble and load `session`, starting `offset` seconds into its
    /// visible span. Sessions without playable bytes are skipped.
    fn load_session(&mut self, session: SessionId, offset: f64) -> SeekOutcome {
        let mut next = Some((session, offset));
        while let Some((id, offset)) = next.take() {
            let Some(session) = self.sessions.get(id) else {
                break;
            };
            let media = assemble(session, &self.buffer);
            if media.is_empty() {
                warn!(session = %id, "session has no playable payload, skipping");
                next = self.sessions.next_after(id).map(|s| (s.id, 0.0));
                continue;
            }

            let origin = session.absolute_start;
            let start = media.lead_in + (session.visible_start_abs - origin) + offset;
            let end = media.lead_in + (session.visible_end_abs - origin);
            let epoch = self.epoch.current();

            self.output.load(epoch, &media);
            let replay = ActiveReplay::new(id, epoch, origin, media.lead_in, start, end);
            self.cursor = replay.absolute_position();
            self.replay = Some(replay);

            // Covers media that never reports metadata.
            let due = self.clock.now() + (end - start) + self.config.replay.timeout_margin;
            self.timers.schedule(due, TimerKind::ReplayTimeout, epoch);

            self.apply(Action::ReplayReady);
            self.events
                .push_back(EngineEvent::ReplayStarted { session: id, epoch });
            info!(
                session = %id,
                epoch = %epoch,
                offset,
                bytes = media.bytes.len(),
                fragments = media.fragment_count,
                "replay started"
            );
            return SeekOutcome::Started {
                epoch,
                session: id,
                offset,
            };
        }

        self.go_live();
        SeekOutcome::Live
    }

    /// Event from the replay output.
    ///
    /// Events tagged with a superseded epoch are dropped.
    pub fn notify_replay_event(&mut self, event: ReplayEvent) {
        if !self.epoch.is_current(event.epoch) {
            trace!(epoch = %event.epoch, kind = ?event.kind, "dropping stale replay event");
            return;
        }
        let now = self.clock.now();
        let Some(replay) = self.replay.as_mut() else {
            trace!(kind = ?event.kind, "replay event without an active replay");
            return;
        };
        if replay.epoch != event.epoch || replay.ended_fired {
            return;
        }

        match event.kind {
            ReplayEventKind::MetadataLoaded { duration } => {
                replay.set_decoded_duration(duration);
                if replay.phase != ReplayPhase::Loading {
                    return;
                }
                let epoch = replay.epoch;
                replay.position = replay.start_position;
                self.output.seek(epoch, replay.start_position);
                if self.state == PlaybackState::Flashback {
                    replay.phase = ReplayPhase::Playing;
                    replay.reset_stall(now);
                    self.output.play(epoch);
                    self.arm_replay_timers(now);
                } else {
                    replay.phase = ReplayPhase::Paused;
                    self.timers.cancel_replay();
                }
            }
            ReplayEventKind::TimeUpdate => {
                let min_progress = self.config.replay.stall_min_progress;
                replay.observe(event.media_time, now, min_progress);
                self.cursor = replay.absolute_position();
                let near_end = replay.phase != ReplayPhase::Loading
                    && replay.is_near_end(self.config.replay.near_end_tolerance);
                if near_end {
                    self.finish_replay(EndSignal::NearEnd);
                }
            }
            ReplayEventKind::Ended => self.finish_replay(EndSignal::NativeEnded),
            ReplayEventKind::Error(message) => {
                let err = FlashbackError::ReplayLoadFailure {
                    session: replay.session,
                    message,
                };
                warn!(%err, "skipping session");
                self.finish_replay(EndSignal::Failed);
            }
        }
    }

    /// (Re)arm the absolute timeout and the stall watchdog.
    fn arm_replay_timers(&mut self, now: f64) {
        let Some(replay) = &self.replay else {
            return;
        };
        let epoch = replay.epoch;
        let remaining = replay.remaining();
        self.timers.cancel_replay();
        self.timers.schedule(
            now + remaining + self.config.replay.timeout_margin,
            TimerKind::ReplayTimeout,
            epoch,
        );
        self.timers.schedule(
            now + self.config.replay.stall_poll_interval,
            TimerKind::StallWatchdog,
            epoch,
        );
    }

    pub(super) fn check_watchdog(&mut self, now: f64) {
        let Some(replay) = &self.replay else {
            return;
        };
        if replay.ended_fired || replay.phase != ReplayPhase::Playing {
            return;
        }
        if replay.is_near_end(self.config.replay.near_end_tolerance) {
            self.finish_replay(EndSignal::NearEnd);
        } else if replay.is_stalled(now, self.config.replay.stall_window) {
            self.finish_replay(EndSignal::Stalled);
        } else {
            let epoch = replay.epoch;
            self.timers.schedule(
                now + self.config.replay.stall_poll_interval,
                TimerKind::StallWatchdog,
                epoch,
            );
        }
    }

    /// Finish the current session exactly once and move on.
    pub(super) fn finish_replay(&mut self, signal: EndSignal) {
        let Some(replay) = self.replay.as_mut() else {
            return;
        };
        if !replay.finish() {
            return;
        }
        let session = replay.session;
        self.timers.cancel_replay();
        info!(session = %session, %signal, "replay finished");
        self.events
            .push_back(EngineEvent::ReplayFinished { session, signal });
        self.advance_after(session);
    }

    /// Play the next session after `session`, or go live when none is left.
    fn advance_after(&mut self, session: SessionId) {
        self.output.unload();
        self.replay = None;
        match self.sessions.next_after(session).map(|s| s.id) {
            Some(next) => {
                let epoch = self.epoch.advance();
                debug!(from = %session, to = %next, epoch = %epoch, "advancing to next session");
                self.load_session(next, 0.0);
            }
            None => self.go_live(),
        }
    }

    /// Pause the running replay.
    pub(super) fn pause_replay(&mut self) {
        if !self.apply(Action::Toggle) {
            return;
        }
        self.timers.cancel_replay();
        if let Some(replay) = self.replay.as_mut() {
            if replay.phase == ReplayPhase::Playing {
                replay.phase = ReplayPhase::Paused;
            }
            self.cursor = replay.absolute_position();
            self.output.pause(replay.epoch);
        }
    }

    /// Resume a paused replay at its current position.
    pub(super) fn resume_replay(&mut self) {
        if !self.apply(Action::Toggle) {
            return;
        }
        let now = self.clock.now();
        match self.replay.as_mut() {
            Some(replay) if replay.phase == ReplayPhase::Paused => {
                replay.phase = ReplayPhase::Playing;
                replay.reset_stall(now);
                self.output.play(replay.epoch);
                self.arm_replay_timers(now);
            }
            // Still loading: metadata starts playback, the timeout covers
            // media that never loads.
            Some(replay) => {
                let due = now
                    + (replay.end_position - replay.start_position)
                    + self.config.replay.timeout_margin;
                let epoch = replay.epoch;
                self.timers.cancel_replay();
                self.timers.schedule(due, TimerKind::ReplayTimeout, epoch);
            }
            None => {
                let target = self.cursor;
                self.epoch.advance();
                if let Err(err) = self.start_replay_at(target) {
                    debug!(%err, "could not resume replay");
                }
            }
        }
    }
}

//! Session aggregation: which session owns each fragment, and the bounds
//! derived from all of them.

use tracing::{debug, trace};

use super::{Session, SessionId, SessionLifecycle, SessionSummary};
use crate::buffer::{FragmentBuffer, FragmentId};

/// Result of finalizing the active session.
#[derive(Debug, Clone, PartialEq)]
pub enum Finalization {
    /// The session was long enough to keep
    Kept(SessionId),
    /// The session was degenerate and its fragments were purged
    Discarded {
        session: SessionId,
        purged_fragments: usize,
    },
}

/// Chronologically ordered list of sessions plus the active one.
#[derive(Debug, Default)]
pub struct SessionAggregator {
    sessions: Vec<Session>,
    active: Option<SessionId>,
    next_id: u64,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    /// Pick the session a new fragment starting at `absolute_start` belongs to.
    ///
    /// - an active session always wins
    /// - while capturing with no active session a new active session is opened
    /// - otherwise a late fragment within `late_threshold` of the last
    ///   session's visible end joins it; anything else gets its own
    ///   (already finalized) session
    ///
    /// Returns the owning session and whether the fragment opens it.
    pub fn assign(
        &mut self,
        absolute_start: f64,
        capturing: bool,
        late_threshold: f64,
        mime_type: &str,
    ) -> (SessionId, bool) {
        if let Some(active) = self.active {
            return (active, false);
        }

        if capturing {
            let id = self.open(absolute_start, mime_type, SessionLifecycle::Active);
            self.active = Some(id);
            return (id, true);
        }

        if let Some(last) = self.sessions.last() {
            let gap = absolute_start - last.visible_end_abs;
            if gap.abs() <= late_threshold {
                debug!(session = %last.id, gap, "reattaching late fragment");
                return (last.id, false);
            }
        }

        let id = self.open(absolute_start, mime_type, SessionLifecycle::Finalized);
        debug!(session = %id, "late fragment opened a detached session");
        (id, true)
    }

    fn open(
        &mut self,
        absolute_start: f64,
        mime_type: &str,
        lifecycle: SessionLifecycle,
    ) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        let mut session = Session::new(id, mime_type, absolute_start);
        session.lifecycle = lifecycle;
        self.sessions.push(session);
        trace!(session = %id, absolute_start, "opened session");
        id
    }

    /// Record that `fragment` belongs to `session`.
    pub fn attach(&mut self, session: SessionId, fragment: FragmentId) {
        if let Some(s) = self.get_mut(session) {
            s.fragments.push(fragment);
        }
    }

    /// Close the active session, discarding it when it is degenerate.
    ///
    /// Returns `None` when there was no active session, which makes a
    /// second stop callback harmless.
    pub fn finalize_active(
        &mut self,
        buffer: &mut FragmentBuffer,
        min_duration: f64,
        min_bytes: usize,
    ) -> Option<Finalization> {
        let id = self.active.take()?;
        let session = self.get_mut(id)?;
        session.lifecycle = SessionLifecycle::Finalized;
        session.refresh_bounds(buffer);

        let bytes: usize = session
            .fragments
            .iter()
            .filter_map(|&f| buffer.get(f))
            .map(|f| f.payload_len())
            .sum();
        let duration = session.retained_duration();

        if duration < min_duration || bytes < min_bytes {
            let purged = buffer.purge_session(id);
            self.sessions.retain(|s| s.id != id);
            debug!(session = %id, duration, bytes, "discarded degenerate session");
            return Some(Finalization::Discarded {
                session: id,
                purged_fragments: purged.len(),
            });
        }

        debug!(session = %id, duration, "finalized session");
        Some(Finalization::Kept(id))
    }

    /// Refresh the bounds of every session.
    pub fn refresh_all(&mut self, buffer: &FragmentBuffer) {
        for session in &mut self.sessions {
            session.refresh_bounds(buffer);
        }
    }

    /// Delete finalized sessions with nothing visible and release their fragments.
    pub fn remove_non_viable(&mut self, buffer: &mut FragmentBuffer) -> Vec<SessionId> {
        let doomed: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|s| !s.is_viable() && Some(s.id) != self.active)
            .map(|s| s.id)
            .collect();

        for &id in &doomed {
            let purged = buffer.purge_session(id);
            debug!(session = %id, fragments = purged.len(), "removed session without visible data");
        }
        self.sessions.retain(|s| !doomed.contains(&s.id));
        doomed
    }

    /// Assign cumulative playback offsets in chronological order.
    ///
    /// Returns the global visible span `(start, end)` across all sessions,
    /// or `None` when nothing is visible.
    pub fn recompute_boundaries(&mut self) -> Option<(f64, f64)> {
        self.sessions
            .sort_by(|a, b| a.absolute_start.total_cmp(&b.absolute_start));

        let mut cumulative = 0.0;
        let mut span: Option<(f64, f64)> = None;
        for session in &mut self.sessions {
            session.playback_start = cumulative;
            cumulative += session.visible_duration;
            session.playback_end = cumulative;

            if session.is_viable() {
                span = Some(match span {
                    None => (session.visible_start_abs, session.visible_end_abs),
                    Some((start, end)) => (
                        start.min(session.visible_start_abs),
                        end.max(session.visible_end_abs),
                    ),
                });
            }
        }
        span
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// First viable session after `id`.
    pub fn next_after(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id > id && s.is_viable())
    }

    pub fn active(&self) -> Option<SessionId> {
        self.active
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(Session::summary).collect()
    }
}

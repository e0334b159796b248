//! Map an absolute time onto a session and an offset inside it.

use crate::session::{Session, SessionId};

/// Where an absolute time lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub session: SessionId,
    /// Seconds from the session's visible start
    pub offset: f64,
    /// The target is at or beyond the end of the newest session
    pub past_end: bool,
}

/// Resolve `target` against sessions in playback order.
///
/// Targets before a session (including gaps between sessions) land on
/// that session's visible start; targets past every session land on the
/// end of the last one with `past_end` set, leaving the caller to decide
/// whether to go live.
pub fn resolve(sessions: &[Session], target: f64) -> Option<Resolution> {
    let mut ordered: Vec<&Session> = sessions.iter().filter(|s| s.is_viable()).collect();
    ordered.sort_by(|a, b| a.playback_start.total_cmp(&b.playback_start));

    for session in &ordered {
        if target < session.visible_start_abs {
            return Some(Resolution {
                session: session.id,
                offset: 0.0,
                past_end: false,
            });
        }
        if session.contains(target) {
            return Some(Resolution {
                session: session.id,
                offset: target - session.visible_start_abs,
                past_end: false,
            });
        }
    }

    ordered.last().map(|last| Resolution {
        session: last.id,
        offset: last.visible_duration,
        past_end: true,
    })
}

//! Recording sessions.
//!
//! A session is a contiguous logical recording bounded by start/stop
//! actions. It references its fragments in the [`FragmentBuffer`] by id and
//! caches bounds derived from them:
//! - absolute extent of every retained fragment
//! - the visible (non pre-roll) span and its duration
//! - cumulative playback offsets across all sessions
//!
//! [`FragmentBuffer`]: crate::buffer::FragmentBuffer

mod aggregator;
mod assembly;

use std::fmt;

use chrono::{DateTime, Utc};

pub use aggregator::{Finalization, SessionAggregator};
pub use assembly::{assemble, ReplayMedia};

use crate::buffer::{Fragment, FragmentBuffer, FragmentId};

/// Monotonic session identifier. Higher ids are chronologically later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether the session can still receive fragments from live capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifecycle {
    Active,
    Finalized,
}

/// Header payload kept after the header fragment itself was evicted.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderPayload {
    pub bytes: Vec<u8>,
    /// Media duration carried by the header fragment
    pub duration: f64,
}

/// Row for a session listing panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub visible_duration: f64,
    pub cumulative_end: f64,
}

/// A logical recording.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Fragment ids sorted by absolute start
    pub fragments: Vec<FragmentId>,
    pub visible_duration: f64,
    pub pre_roll_duration: f64,
    pub absolute_start: f64,
    pub absolute_end: f64,
    pub visible_start_abs: f64,
    pub visible_end_abs: f64,
    pub playback_start: f64,
    pub playback_end: f64,
    pub header: Option<HeaderPayload>,
    pub mime_type: String,
    pub lifecycle: SessionLifecycle,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, mime_type: impl Into<String>, absolute_start: f64) -> Self {
        Self {
            id,
            fragments: Vec::new(),
            visible_duration: 0.0,
            pre_roll_duration: 0.0,
            absolute_start,
            absolute_end: absolute_start,
            visible_start_abs: absolute_start,
            visible_end_abs: absolute_start,
            playback_start: 0.0,
            playback_end: 0.0,
            header: None,
            mime_type: mime_type.into(),
            lifecycle: SessionLifecycle::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == SessionLifecycle::Active
    }

    /// A session with nothing visible must be removed.
    pub fn is_viable(&self) -> bool {
        self.visible_duration > 0.0
    }

    /// Total retained duration, pre-roll included.
    pub fn retained_duration(&self) -> f64 {
        self.visible_duration + self.pre_roll_duration
    }

    /// Whether `time` falls inside the visible span.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.visible_start_abs && time < self.visible_end_abs
    }

    /// Recompute every cached bound from the fragments still in `buffer`.
    ///
    /// Ids of fragments that are no longer buffered are dropped.
    pub fn refresh_bounds(&mut self, buffer: &FragmentBuffer) {
        let mut fragments: Vec<&Fragment> =
            self.fragments.iter().filter_map(|&id| buffer.get(id)).collect();
        // Stable sort: already-ordered input keeps its order.
        fragments.sort_by(|a, b| a.absolute_start.total_cmp(&b.absolute_start));
        self.fragments = fragments.iter().map(|f| f.id).collect();

        let Some(first) = fragments.first() else {
            self.visible_duration = 0.0;
            self.pre_roll_duration = 0.0;
            self.absolute_end = self.absolute_start;
            self.visible_start_abs = self.absolute_start;
            self.visible_end_abs = self.absolute_start;
            return;
        };

        self.absolute_start = first.absolute_start;
        self.absolute_end = fragments
            .iter()
            .map(|f| f.absolute_end)
            .fold(first.absolute_end, f64::max);

        let (pre_roll, visible): (Vec<&Fragment>, Vec<&Fragment>) =
            fragments.iter().copied().partition(|f| f.is_pre_roll);
        self.pre_roll_duration = pre_roll.iter().map(|f| f.duration).sum();
        self.visible_duration = visible.iter().map(|f| f.duration).sum();

        match (visible.first(), visible.last()) {
            (Some(first_visible), Some(last_visible)) => {
                self.visible_start_abs = first_visible.absolute_start;
                self.visible_end_abs = last_visible.absolute_end;
            }
            _ => {
                self.visible_start_abs = self.absolute_end;
                self.visible_end_abs = self.absolute_end;
            }
        }
    }

    /// Keep the header payload of an evicted header fragment.
    ///
    /// Later fragments of the session are only decodable behind the
    /// header, so its bytes outlive the fragment.
    pub fn absorb_eviction(&mut self, fragment: &mut Fragment) {
        self.fragments.retain(|&id| id != fragment.id);
        if fragment.is_header && self.header.is_none() {
            if let Some(bytes) = fragment.payload.take() {
                self.header = Some(HeaderPayload {
                    bytes,
                    duration: fragment.duration,
                });
            }
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            visible_duration: self.visible_duration,
            cumulative_end: self.playback_end,
        }
    }
}

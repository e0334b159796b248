//! Fragment types.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::session::SessionId;

/// Monotonic fragment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentId(pub u64);

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// A fragment as delivered by the capture collaborator.
#[derive(Debug, Clone)]
pub struct FragmentInput {
    pub payload: Vec<u8>,
    /// Reported duration in seconds
    pub duration_hint: f64,
    pub created_at: DateTime<Utc>,
}

impl FragmentInput {
    pub fn new(payload: Vec<u8>, duration_hint: f64) -> Self {
        Self {
            payload,
            duration_hint,
            created_at: Utc::now(),
        }
    }

    /// Whether the duration can be placed on the timeline.
    pub fn is_well_formed(&self) -> bool {
        self.duration_hint.is_finite() && self.duration_hint > 0.0
    }
}

/// One retained unit of captured media.
///
/// Everything except `is_pre_roll` (recomputed on every settle) and
/// `payload` (taken when the fragment is evicted) is fixed at creation.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub id: FragmentId,
    pub payload: Option<Vec<u8>>,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub session_id: SessionId,
    pub is_header: bool,
    pub is_pre_roll: bool,
    pub absolute_start: f64,
    pub absolute_end: f64,
}

impl Fragment {
    pub fn from_input(
        id: FragmentId,
        input: FragmentInput,
        session_id: SessionId,
        is_header: bool,
        absolute_start: f64,
    ) -> Self {
        Self {
            id,
            duration: input.duration_hint,
            payload: Some(input.payload),
            created_at: input.created_at,
            session_id,
            is_header,
            is_pre_roll: false,
            absolute_start,
            absolute_end: absolute_start + input.duration_hint,
        }
    }

    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }
}

//! Fragment buffer: the flat, arrival-ordered queue of captured fragments.
//!
//! The buffer owns every fragment still retained. It tracks the summed
//! duration of what it holds, evicts from the front, and applies the global
//! "last N seconds are visible" pre-roll partition across session borders.

mod fragment;

use std::collections::VecDeque;

pub use fragment::{Fragment, FragmentId, FragmentInput};

use crate::session::SessionId;

/// Tolerance for floating point duration comparisons.
pub const DURATION_EPSILON: f64 = 1e-9;

/// Ordered queue of retained fragments.
#[derive(Debug, Default)]
pub struct FragmentBuffer {
    fragments: VecDeque<Fragment>,
    buffered_duration: f64,
    next_id: u64,
}

impl FragmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the id for the next fragment.
    pub fn allocate_id(&mut self) -> FragmentId {
        let id = FragmentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a fragment and account for its duration.
    pub fn push(&mut self, fragment: Fragment) {
        self.buffered_duration += fragment.duration;
        self.fragments.push_back(fragment);
    }

    /// Remove the oldest fragment.
    ///
    /// The newest fragment is never evicted so a live session always keeps
    /// something to replay.
    pub fn evict_oldest(&mut self) -> Option<Fragment> {
        if self.fragments.len() <= 1 {
            return None;
        }
        let fragment = self.fragments.pop_front()?;
        self.subtract(fragment.duration);
        Some(fragment)
    }

    /// Remove every fragment owned by `session`.
    pub fn purge_session(&mut self, session: SessionId) -> Vec<Fragment> {
        let mut purged = Vec::new();
        let mut kept = VecDeque::with_capacity(self.fragments.len());
        for fragment in self.fragments.drain(..) {
            if fragment.session_id == session {
                purged.push(fragment);
            } else {
                kept.push_back(fragment);
            }
        }
        self.fragments = kept;
        for fragment in &purged {
            self.subtract(fragment.duration);
        }
        purged
    }

    fn subtract(&mut self, duration: f64) {
        self.buffered_duration -= duration;
        if self.fragments.is_empty() || self.buffered_duration < DURATION_EPSILON {
            self.buffered_duration = self.fragments.iter().map(|f| f.duration).sum();
        }
    }

    /// Mark the newest `max_duration` seconds visible and everything older pre-roll.
    ///
    /// Walks the whole buffer newest to oldest, so a session straddling the
    /// cut ends up with both pre-roll and visible fragments.
    pub fn mark_pre_roll(&mut self, max_duration: f64) {
        let mut visible = 0.0;
        for fragment in self.fragments.iter_mut().rev() {
            if visible < max_duration - DURATION_EPSILON {
                fragment.is_pre_roll = false;
                visible += fragment.duration;
            } else {
                fragment.is_pre_roll = true;
            }
        }
    }

    /// Look up a fragment by id. Ids are monotonic, so the queue is sorted by id.
    pub fn get(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments
            .binary_search_by_key(&id, |f| f.id)
            .ok()
            .map(|idx| &self.fragments[idx])
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Fragment> {
        self.fragments.iter()
    }

    pub fn newest(&self) -> Option<&Fragment> {
        self.fragments.back()
    }

    pub fn oldest(&self) -> Option<&Fragment> {
        self.fragments.front()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Total seconds currently retained.
    pub fn buffered_duration(&self) -> f64 {
        self.buffered_duration
    }

    /// Total payload bytes currently retained.
    pub fn buffered_bytes(&self) -> usize {
        self.fragments.iter().map(Fragment::payload_len).sum()
    }
}

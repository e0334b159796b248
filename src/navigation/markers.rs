//! Markers: user bookmarks on the absolute timeline.
//!
//! Markers are kept sorted by time and never closer than `epsilon` to each
//! other. They are pruned as the retained window slides forward.

use chrono::{DateTime, Utc};

use crate::error::FlashbackError;

/// Monotonic marker identifier.
pub type MarkerId = u64;

/// A bookmarked instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    /// Absolute time in seconds
    pub absolute_time: f64,
    pub created_at: DateTime<Utc>,
}

/// Sorted set of markers.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    markers: Vec<Marker>,
    epsilon: f64,
    next_id: MarkerId,
}

impl MarkerSet {
    pub fn new(epsilon: f64) -> Self {
        Self {
            markers: Vec::new(),
            epsilon,
            next_id: 1,
        }
    }

    /// Add a marker at `time`, clamped into `[0, lifetime]`.
    ///
    /// # Errors
    /// `DuplicateMarker` if an existing marker is within `epsilon`.
    pub fn add(&mut self, time: f64, lifetime: f64) -> Result<MarkerId, FlashbackError> {
        let time = time.clamp(0.0, lifetime.max(0.0));
        if self
            .markers
            .iter()
            .any(|m| (m.absolute_time - time).abs() < self.epsilon)
        {
            return Err(FlashbackError::DuplicateMarker { time });
        }

        let id = self.next_id;
        self.next_id += 1;
        let idx = self.markers.partition_point(|m| m.absolute_time < time);
        self.markers.insert(
            idx,
            Marker {
                id,
                absolute_time: time,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// The `skip_count`-th marker strictly before `current - epsilon`,
    /// counting backwards from the nearest (1 = nearest).
    pub fn previous(&self, current: f64, skip_count: usize) -> Option<f64> {
        let skip = skip_count.max(1);
        self.markers
            .iter()
            .rev()
            .filter(|m| m.absolute_time < current - self.epsilon)
            .nth(skip - 1)
            .map(|m| m.absolute_time)
    }

    /// The first marker strictly after `current + epsilon`.
    pub fn next(&self, current: f64) -> Option<f64> {
        self.markers
            .iter()
            .find(|m| m.absolute_time > current + self.epsilon)
            .map(|m| m.absolute_time)
    }

    /// Remove markers outside `[window_start, lifetime]`.
    ///
    /// Returns how many were removed.
    pub fn prune(&mut self, window_start: f64, lifetime: f64) -> usize {
        let before = self.markers.len();
        self.markers
            .retain(|m| m.absolute_time >= window_start && m.absolute_time <= lifetime);
        before - self.markers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn times(&self) -> Vec<f64> {
        self.markers.iter().map(|m| m.absolute_time).collect()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

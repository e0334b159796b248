//! Navigation within the retained window.
//!
//! This module handles seek-time resolution, step sizing for repeated
//! back/forward input, and marker bookkeeping.

mod markers;
mod resolve;
mod step;

pub use markers::{Marker, MarkerId, MarkerSet};
pub use resolve::{resolve, Resolution};
pub use step::{cumulative_step, PressCounter};

/// Direction of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

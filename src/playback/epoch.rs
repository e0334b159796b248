//! Replay epochs.
//!
//! Every seek (and every replay hand-off) advances the epoch. Callbacks and
//! timers capture the epoch current when they were registered and must
//! no-op if it has moved on by the time they fire.

use std::fmt;

/// Generation id of a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(pub u64);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Single source of truth for the current epoch.
#[derive(Debug, Default)]
pub struct EpochCounter {
    current: Epoch,
}

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Epoch {
        self.current
    }

    /// Move to a new epoch, invalidating everything tagged with older ones.
    pub fn advance(&mut self) -> Epoch {
        self.current = Epoch(self.current.0.wrapping_add(1));
        self.current
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current == epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_invalidates_previous() {
        let mut counter = EpochCounter::new();
        let first = counter.advance();
        assert!(counter.is_current(first));
        let second = counter.advance();
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
        assert!(second > first);
        assert_eq!(second.to_string(), "e2");
    }
}

//! Step sizing for repeated back/forward presses.
//!
//! Presses closer together than the rapid-press window form a burst. The
//! seek target of the n-th press in a burst is measured from the position
//! at the first press, `2^(n-1)` seconds away: 1, 2, 4, 8, 16, ... So the
//! individual jumps are 1, 1, 2, 4, 8 seconds.

/// Cumulative offset in seconds after `presses` presses of one burst.
///
/// Zero presses means no movement; the exponent is capped at `max_exponent`.
pub fn cumulative_step(presses: u32, max_exponent: u32) -> f64 {
    if presses == 0 {
        return 0.0;
    }
    let exponent = (presses - 1).min(max_exponent);
    2f64.powi(exponent as i32)
}

/// Debounced press counter.
///
/// Counts presses within a burst and remembers the position the burst
/// started from.
#[derive(Debug, Clone)]
pub struct PressCounter {
    window: f64,
    count: u32,
    last_press: Option<f64>,
    anchor: f64,
}

impl PressCounter {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            count: 0,
            last_press: None,
            anchor: 0.0,
        }
    }

    /// Register a press at `now` while the cursor is at `position`.
    ///
    /// Returns the press count within the current burst and the burst anchor.
    pub fn press(&mut self, now: f64, position: f64) -> (u32, f64) {
        let in_burst = self
            .last_press
            .is_some_and(|last| now - last <= self.window);
        if in_burst {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 1;
            self.anchor = position;
        }
        self.last_press = Some(now);
        (self.count, self.anchor)
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_press = None;
    }
}

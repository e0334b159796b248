//! Player state management
//!
//! Contains the `PlayerState` struct that holds UI-only state for the
//! interactive front-end, as well as shared types used across player modules.
//! Everything about capture and replay lives in the engine.

/// Result of processing an input event.
///
/// This enum is returned by input handlers to signal control flow
/// decisions to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    /// Keep running
    Continue,
    /// Exit the player
    Quit,
}

/// Engine command produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Toggle,
    StepBack,
    StepForward,
    AddMarker,
    MarkerBack,
    MarkerForward,
    GoLive,
    GrowRetention,
    ShrinkRetention,
}

/// UI state of the interactive player.
#[derive(Debug)]
pub struct PlayerState {
    // === UI modes ===
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Whether the session list panel is visible
    pub show_sessions: bool,

    // === Notices ===
    /// Last user-visible message from the engine
    pub notice: Option<String>,
    /// Clock time after which the notice is hidden
    pub notice_until: f64,

    // === Viewport state ===
    /// Current terminal width
    pub term_cols: u16,
    /// Current terminal height
    pub term_rows: u16,

    // === Rendering flags ===
    /// True when screen needs to be redrawn
    pub needs_render: bool,
    /// Clock time of the last redraw
    pub last_render: f64,
}

impl PlayerState {
    /// Number of chrome lines at the bottom (separator + progress + status bar)
    pub const STATUS_LINES: u16 = 3;

    /// How long a notice stays on screen (seconds)
    pub const NOTICE_SECONDS: f64 = 3.0;

    pub fn new(term_cols: u16, term_rows: u16) -> Self {
        Self {
            show_help: false,
            show_sessions: false,
            notice: None,
            notice_until: 0.0,
            term_cols,
            term_rows,
            needs_render: true,
            last_render: 0.0,
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.needs_render = true;
    }

    pub fn toggle_sessions(&mut self) {
        self.show_sessions = !self.show_sessions;
        self.needs_render = true;
    }

    pub fn handle_resize(&mut self, cols: u16, rows: u16) {
        self.term_cols = cols;
        self.term_rows = rows;
        self.needs_render = true;
    }

    /// Show `message` until `now + NOTICE_SECONDS`.
    pub fn set_notice(&mut self, message: String, now: f64) {
        self.notice = Some(message);
        self.notice_until = now + Self::NOTICE_SECONDS;
        self.needs_render = true;
    }

    /// The notice to display at `now`, if it hasn't expired.
    pub fn visible_notice(&self, now: f64) -> Option<&str> {
        self.notice.as_deref().filter(|_| now < self.notice_until)
    }
}

//! Theme configuration for CLI and player output
//!
//! Centralizes color definitions. Colors are crossterm colors so the same
//! theme drives both the interactive player (queued crossterm commands) and
//! plain CLI output (ANSI strings).

use crossterm::style::{Color, ResetColor, SetForegroundColor};

/// Colors used across the CLI and the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Primary text color (used for most content)
    pub text_primary: Color,
    /// Secondary/dimmed text color
    pub text_secondary: Color,
    /// Accent color for highlights and the played part of the progress bar
    pub accent: Color,
    /// Live capture indicator
    pub live: Color,
    /// Marker glyphs on the progress bar
    pub marker: Color,
    pub error: Color,
    pub success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::standard()
    }
}

impl Theme {
    /// Gray text with a green accent, standard ANSI colors only.
    pub fn standard() -> Self {
        Self {
            text_primary: Color::Grey,
            text_secondary: Color::DarkGrey,
            accent: Color::DarkGreen,
            live: Color::DarkRed,
            marker: Color::DarkYellow,
            error: Color::DarkRed,
            success: Color::DarkGreen,
        }
    }

    /// Format text with the accent color.
    pub fn accent_text(&self, text: &str) -> String {
        paint(self.accent, text)
    }

    /// Format text with the primary color.
    pub fn primary_text(&self, text: &str) -> String {
        paint(self.text_primary, text)
    }

    /// Format text with the secondary color.
    pub fn secondary_text(&self, text: &str) -> String {
        paint(self.text_secondary, text)
    }

    pub fn error_text(&self, text: &str) -> String {
        paint(self.error, text)
    }

    pub fn success_text(&self, text: &str) -> String {
        paint(self.success, text)
    }
}

fn paint(color: Color, text: &str) -> String {
    format!("{}{}{}", SetForegroundColor(color), text, ResetColor)
}

/// Raw ANSI sequences for diff-style output.
pub mod ansi {
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const RESET: &str = "\x1b[0m";
}

/// Theme used by every command.
pub fn current_theme() -> Theme {
    Theme::default()
}

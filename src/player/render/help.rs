//! Help overlay and session panel for the interactive player.

use std::io::Write;

use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use crate::player::render::format_duration;
use crate::session::SessionSummary;
use crate::theme::Theme;

/// Help text lines for the help overlay.
pub const HELP_LINES: &[&str] = &[
    "",
    "  ╔═══════════════════════════════════════════╗",
    "  ║              Flashback Help               ║",
    "  ╠═══════════════════════════════════════════╣",
    "  ║                                           ║",
    "  ║  Capture and replay                       ║",
    "  ║    Space      Stop/resume or pause/play   ║",
    "  ║    <-/->      Step back / forward         ║",
    "  ║               (rapid presses double)      ║",
    "  ║    Esc        Back to live                ║",
    "  ║                                           ║",
    "  ║  Markers                                  ║",
    "  ║    m          Add marker                  ║",
    "  ║    [ / ]      Previous / next marker      ║",
    "  ║                                           ║",
    "  ║  Retention                                ║",
    "  ║    + / -      Keep more / less            ║",
    "  ║    s          Toggle session panel        ║",
    "  ║                                           ║",
    "  ║  General                                  ║",
    "  ║    ?          Show this help              ║",
    "  ║    q          Quit                        ║",
    "  ║                                           ║",
    "  ║         Press any key to close            ║",
    "  ╚═══════════════════════════════════════════╝",
    "",
];

/// Width of the help box (for centering calculations).
pub const HELP_BOX_WIDTH: usize = 47;

/// Calculate the starting row for centering the help box.
pub fn calc_help_start_row(term_height: u16) -> u16 {
    let box_height = HELP_LINES.len() as u16;
    (term_height.saturating_sub(box_height)) / 2
}

/// Calculate the starting column for centering the help box.
pub fn calc_help_start_col(term_width: u16) -> u16 {
    ((term_width as usize).saturating_sub(HELP_BOX_WIDTH) / 2) as u16
}

/// Clear the screen and draw a centered help box.
pub fn render_help(out: &mut impl Write, width: u16, height: u16, theme: &Theme) -> Result<()> {
    let start_row = calc_help_start_row(height);
    let col = calc_help_start_col(width);

    queue!(out, Clear(ClearType::All))?;
    for (i, line) in HELP_LINES.iter().enumerate() {
        queue!(
            out,
            MoveTo(col, start_row + i as u16),
            SetForegroundColor(theme.accent),
            Print(line),
            ResetColor,
        )?;
    }
    Ok(())
}

/// Rows of the session panel, newest last.
pub fn session_rows(sessions: &[SessionSummary]) -> Vec<String> {
    let mut rows = vec![format!("{:<6} {:>9} {:>9}", "id", "visible", "ends at")];
    rows.extend(sessions.iter().map(|s| {
        format!(
            "{:<6} {:>8.1}s {:>9}",
            s.id.to_string(),
            s.visible_duration,
            format_duration(s.cumulative_end)
        )
    }));
    rows
}

/// Draw the session panel from the top-left corner.
pub fn render_sessions(
    out: &mut impl Write,
    sessions: &[SessionSummary],
    max_rows: u16,
    theme: &Theme,
) -> Result<()> {
    for (i, row) in session_rows(sessions)
        .iter()
        .take(max_rows as usize)
        .enumerate()
    {
        let color = if i == 0 {
            theme.text_secondary
        } else {
            theme.text_primary
        };
        queue!(
            out,
            MoveTo(1, i as u16),
            SetForegroundColor(color),
            Print(row),
            ResetColor,
        )?;
    }
    Ok(())
}

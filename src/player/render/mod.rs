//! Rendering components for the interactive player.
//!
//! This module contains the UI rendering functions: progress bar over the
//! visible window, status bar, help overlay and the session panel.

mod help;
mod progress;
mod status;

pub use help::{
    calc_help_start_col, calc_help_start_row, render_help, render_sessions, session_rows,
    HELP_BOX_WIDTH, HELP_LINES,
};
pub use progress::{build_progress_bar_chars, format_duration, render_progress_bar};
pub use status::{render_separator_line, render_status_bar, status_segments, StatusLine};

use std::io::Write;

use anyhow::Result;
use crossterm::{
    queue,
    terminal::{Clear, ClearType},
};

use crate::engine::FlashbackEngine;
use crate::player::state::PlayerState;
use crate::theme::Theme;

/// Draw one full frame.
pub fn render_frame(
    out: &mut impl Write,
    engine: &FlashbackEngine,
    state: &PlayerState,
    now: f64,
    theme: &Theme,
) -> Result<()> {
    if state.show_help {
        render_help(out, state.term_cols, state.term_rows, theme)?;
        out.flush()?;
        return Ok(());
    }

    queue!(out, Clear(ClearType::All))?;
    if state.show_sessions {
        let rows = state.term_rows.saturating_sub(PlayerState::STATUS_LINES);
        render_sessions(out, &engine.list_sessions_for_display(), rows, theme)?;
    }

    let base = state.term_rows.saturating_sub(PlayerState::STATUS_LINES);
    render_separator_line(out, state.term_cols, base, theme)?;
    render_progress_bar(
        out,
        state.term_cols,
        base + 1,
        &engine.visible_window(),
        engine.current_absolute_time(),
        &engine.markers().times(),
        theme,
    )?;

    let status = StatusLine {
        state: engine.state(),
        max_duration: engine.config().buffer.max_duration,
        buffered_duration: engine.buffered_duration(),
        buffered_bytes: engine.buffer().buffered_bytes(),
        session_count: engine.sessions().len(),
        marker_count: engine.markers().len(),
        notice: state.visible_notice(now),
    };
    render_status_bar(out, state.term_cols, base + 2, &status, theme)?;
    out.flush()?;
    Ok(())
}

//! Status bar rendering for the interactive player.
//!
//! Displays the engine state, retention figures, notices and keyboard
//! shortcuts.

use std::io::Write;

use anyhow::Result;
use crossterm::style::{ResetColor, SetForegroundColor};
use humansize::{format_size, BINARY};

use crate::playback::PlaybackState;
use crate::theme::Theme;

/// Everything the status bar shows.
#[derive(Debug, Clone)]
pub struct StatusLine<'a> {
    pub state: PlaybackState,
    pub max_duration: f64,
    pub buffered_duration: f64,
    pub buffered_bytes: usize,
    pub session_count: usize,
    pub marker_count: usize,
    pub notice: Option<&'a str>,
}

/// Render a separator line.
pub fn render_separator_line(
    out: &mut impl Write,
    width: u16,
    row: u16,
    theme: &Theme,
) -> Result<()> {
    let mut output = String::with_capacity(width as usize * 3 + 20);
    output.push_str(&format!("\x1b[{};1H", row + 1));
    output.push_str(&SetForegroundColor(theme.text_secondary).to_string());
    output.push_str(&"─".repeat(width as usize));
    output.push_str(&ResetColor.to_string());
    write!(out, "{}", output)?;
    Ok(())
}

/// Plain text of the status bar, without colors.
///
/// Returns the segments in display order: state, figures, then either the
/// notice or the shortcut hints.
pub fn status_segments(status: &StatusLine<'_>) -> Vec<String> {
    let icon = match status.state {
        PlaybackState::Recording => "● REC",
        PlaybackState::RecordingStopped => "■ STOPPED",
        PlaybackState::Transitioning => "… SEEKING",
        PlaybackState::Flashback => "▶ FLASHBACK",
        PlaybackState::FlashbackPaused => "⏸ PAUSED",
    };

    let mut segments = vec![
        icon.to_string(),
        format!(
            "keep:{:.0}s buf:{:.1}s/{}",
            status.max_duration,
            status.buffered_duration,
            format_size(status.buffered_bytes, BINARY)
        ),
        format!("sess:{}", status.session_count),
    ];
    if status.marker_count > 0 {
        segments.push(format!("◆{}", status.marker_count));
    }

    match status.notice {
        Some(notice) => segments.push(format!("│ {}", notice)),
        None => segments.push(
            "│ space:rec/pause ←/→:step m:mrk [/]:jump esc:live +/-:keep s:sess ?:hlp q:quit"
                .to_string(),
        ),
    }
    segments
}

/// Render the status bar at `row`.
pub fn render_status_bar(
    out: &mut impl Write,
    width: u16,
    row: u16,
    status: &StatusLine<'_>,
    theme: &Theme,
) -> Result<()> {
    let segments = status_segments(status);
    let state_color = match status.state {
        PlaybackState::Recording => theme.live,
        PlaybackState::Flashback | PlaybackState::FlashbackPaused => theme.accent,
        _ => theme.text_primary,
    };

    let mut output = String::with_capacity(256);
    let mut visible_len: usize = 1;
    output.push_str(&format!("\x1b[{};1H ", row + 1));

    for (i, segment) in segments.iter().enumerate() {
        let color = match i {
            0 => state_color,
            _ if status.notice.is_some() && i == segments.len() - 1 => theme.error,
            _ if i == segments.len() - 1 => theme.text_secondary,
            _ => theme.text_primary,
        };
        output.push_str(&SetForegroundColor(color).to_string());
        output.push_str(segment);
        output.push(' ');
        visible_len += segment.chars().count() + 1;
    }

    // Pad to full width to overwrite any leftover content
    let padding = (width as usize).saturating_sub(visible_len);
    output.push_str(&" ".repeat(padding));
    output.push_str(&ResetColor.to_string());

    write!(out, "{}", output)?;
    Ok(())
}

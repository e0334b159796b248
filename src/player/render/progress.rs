//! Progress bar rendering for the interactive player.
//!
//! The bar spans the visible window, shows the playhead and marker
//! indicators, and is fully filled while live.

use std::io::Write;

use anyhow::Result;
use crossterm::style::{ResetColor, SetForegroundColor};

use crate::theme::Theme;
use crate::window::VisibleWindow;

const PLAYHEAD: char = '⏺';
const MARKER: char = '◆';
const TRACK: char = '─';

/// Format a duration in seconds to MM:SS format.
pub fn format_duration(seconds: f64) -> String {
    let total_secs = seconds as u64;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}", mins, secs)
}

/// Build the progress bar character array.
///
/// Returns the characters and the number of filled positions. The playhead
/// is drawn at the first unfilled position, so a bar at the live edge has
/// none.
pub fn build_progress_bar_chars(
    bar_width: usize,
    window: &VisibleWindow,
    current_time: f64,
    markers: &[f64],
) -> (Vec<char>, usize) {
    let filled = (bar_width as f64 * window.fraction(current_time)) as usize;

    let mut bar: Vec<char> = vec![TRACK; bar_width];
    if filled < bar_width {
        bar[filled] = PLAYHEAD;
    }

    for &marker in markers {
        if !window.contains(marker) {
            continue;
        }
        let pos = ((window.fraction(marker) * bar_width as f64) as usize)
            .min(bar_width.saturating_sub(1));
        if pos < bar_width && bar[pos] != PLAYHEAD {
            bar[pos] = MARKER;
        }
    }

    (bar, filled)
}

/// Render the progress bar at `row`.
pub fn render_progress_bar(
    out: &mut impl Write,
    width: u16,
    row: u16,
    window: &VisibleWindow,
    current_time: f64,
    markers: &[f64],
    theme: &Theme,
) -> Result<()> {
    let bar_width = (width as usize).saturating_sub(16); // Padding and time display
    let (bar, filled) = build_progress_bar_chars(bar_width, window, current_time, markers);

    let time_display = format!(
        " {}/{}",
        format_duration(current_time),
        format_duration(window.end)
    );

    let mut output = String::with_capacity(width as usize * 4);
    output.push_str(&format!("\x1b[{};1H ", row + 1));

    let accent = SetForegroundColor(theme.accent).to_string();
    let marker = SetForegroundColor(theme.marker).to_string();
    let track = SetForegroundColor(theme.text_secondary).to_string();
    let primary = SetForegroundColor(theme.text_primary).to_string();

    output.push_str(&accent);
    for (i, &c) in bar.iter().enumerate() {
        if c == MARKER {
            output.push_str(&marker);
            output.push(c);
            output.push_str(if i < filled { &accent } else { &track });
        } else if i < filled {
            output.push('━');
        } else if i == filled {
            output.push_str(&primary);
            output.push(c);
            output.push_str(&track);
        } else {
            output.push(c);
        }
    }

    output.push_str(&primary);
    output.push_str(&time_display);

    let used_width = 1 + bar_width + time_display.len();
    let remaining = (width as usize).saturating_sub(used_width);
    output.push_str(&" ".repeat(remaining));
    output.push_str(&ResetColor.to_string());

    write!(out, "{}", output)?;
    Ok(())
}

//! Keyboard input handling for the interactive player.
//!
//! Keys either change UI state directly (help, session panel) or map to a
//! `PlayerCommand` that the main loop applies to the engine.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::player::state::{InputResult, PlayerCommand, PlayerState};

/// Handle any terminal event.
pub fn handle_event(event: Event, state: &mut PlayerState) -> (InputResult, Option<PlayerCommand>) {
    match event {
        Event::Key(key) => handle_key_event(key, state),
        Event::Resize(cols, rows) => {
            state.handle_resize(cols, rows);
            (InputResult::Continue, None)
        }
        _ => (InputResult::Continue, None), // Ignore focus events, mouse, etc.
    }
}

/// Handle a keyboard event.
pub fn handle_key_event(
    key: KeyEvent,
    state: &mut PlayerState,
) -> (InputResult, Option<PlayerCommand>) {
    if key.kind == KeyEventKind::Release {
        return (InputResult::Continue, None);
    }

    // If help is showing, any key closes it
    if state.show_help {
        state.show_help = false;
        state.needs_render = true;
        return (InputResult::Continue, None);
    }

    let command = match key.code {
        // === Quit ===
        KeyCode::Char('q') => return (InputResult::Quit, None),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return (InputResult::Quit, None)
        }

        // === Panels ===
        KeyCode::Char('?') => {
            state.toggle_help();
            None
        }
        KeyCode::Char('s') => {
            state.toggle_sessions();
            None
        }

        // === Capture and replay ===
        KeyCode::Char(' ') => Some(PlayerCommand::Toggle),
        KeyCode::Esc => Some(PlayerCommand::GoLive),
        KeyCode::Left => Some(PlayerCommand::StepBack),
        KeyCode::Right => Some(PlayerCommand::StepForward),

        // === Markers ===
        KeyCode::Char('m') => Some(PlayerCommand::AddMarker),
        KeyCode::Char('[') => Some(PlayerCommand::MarkerBack),
        KeyCode::Char(']') => Some(PlayerCommand::MarkerForward),

        // === Retention ===
        KeyCode::Char('+') | KeyCode::Char('=') => Some(PlayerCommand::GrowRetention),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(PlayerCommand::ShrinkRetention),

        _ => None,
    };

    (InputResult::Continue, command)
}

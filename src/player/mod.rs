//! Interactive terminal player
//!
//! Drives a [`FlashbackEngine`] wired to simulated capture and replay
//! collaborators, so the whole buffer, seek and marker flow can be tried
//! from a terminal.
//!
//! # Architecture
//!
//! - `state`: UI-only state (`PlayerState`) and shared types (`InputResult`, `PlayerCommand`)
//! - `input`: keyboard event mapping
//! - `render`: progress bar, status bar, help overlay and session panel
//! - `sim`: simulated collaborators and the `Simulation` pump
//!
//! # Usage
//!
//! ```no_run
//! use flashback::player::run_player;
//! use flashback::Config;
//!
//! run_player(Config::default(), 1.0).unwrap();
//! ```

pub mod input;
pub mod render;
pub mod sim;
pub mod state;

pub use sim::Simulation;
pub use state::{InputResult, PlayerCommand, PlayerState};

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor, event, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::{EngineEvent, FlashbackEngine};
use crate::navigation::Direction;
use crate::theme::current_theme;

/// Input poll timeout, which doubles as the simulation tick.
const FRAME: Duration = Duration::from_millis(50);

/// Minimum seconds between redraws when nothing changed.
const IDLE_REDRAW: f64 = 0.25;

/// Run the interactive player until the user quits.
#[cfg(not(tarpaulin_include))]
pub fn run_player(config: Config, fragment_duration: f64) -> Result<()> {
    let clock = SystemClock::new();
    let mut sim = Simulation::new(config, clock, fragment_duration);
    if let Err(e) = sim.engine.start() {
        debug!("initial start failed: {}", e);
    }

    let (cols, rows) = terminal::size()?;
    let mut state = PlayerState::new(cols, rows);
    let theme = current_theme();

    let _raw_mode = RawModeGuard::enable()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    info!("player started");

    let result = event_loop(&mut sim, &mut state, &mut stdout, &theme);

    execute!(stdout, LeaveAlternateScreen, cursor::Show)?;
    info!("player stopped");
    result
}

#[cfg(not(tarpaulin_include))]
fn event_loop(
    sim: &mut Simulation<SystemClock>,
    state: &mut PlayerState,
    out: &mut impl Write,
    theme: &crate::theme::Theme,
) -> Result<()> {
    loop {
        if event::poll(FRAME)? {
            let (result, command) = input::handle_event(event::read()?, state);
            if result == InputResult::Quit {
                return Ok(());
            }
            if let Some(command) = command {
                apply_command(&mut sim.engine, command);
                state.needs_render = true;
            }
        }

        sim.pump();
        let now = sim.clock().now();
        for event in sim.engine.take_events() {
            absorb_event(state, event, now);
        }

        if state.needs_render || now - state.last_render >= IDLE_REDRAW {
            render::render_frame(out, &sim.engine, state, now, theme)?;
            state.needs_render = false;
            state.last_render = now;
        }
    }
}

/// Forward a key command to the engine.
///
/// Failures the user should see already arrive as notices, so errors are
/// only logged here.
pub fn apply_command(engine: &mut FlashbackEngine, command: PlayerCommand) {
    let result = match command {
        PlayerCommand::Toggle => {
            engine.toggle();
            Ok(())
        }
        PlayerCommand::GoLive => {
            engine.escape();
            Ok(())
        }
        PlayerCommand::StepBack => engine.step_back().map(drop),
        PlayerCommand::StepForward => engine.step_forward().map(drop),
        PlayerCommand::AddMarker => engine.add_marker().map(drop),
        PlayerCommand::MarkerBack => engine.press_marker(Direction::Backward).map(drop),
        PlayerCommand::MarkerForward => engine.press_marker(Direction::Forward).map(drop),
        PlayerCommand::GrowRetention => {
            let max = engine.config().buffer.max_duration;
            engine.set_max_duration(max + 5.0);
            Ok(())
        }
        PlayerCommand::ShrinkRetention => {
            let max = engine.config().buffer.max_duration;
            engine.set_max_duration(max - 5.0);
            Ok(())
        }
    };
    if let Err(e) = result {
        debug!("{:?} failed: {}", command, e);
    }
}

/// Fold an engine event into UI state.
pub fn absorb_event(state: &mut PlayerState, event: EngineEvent, now: f64) {
    match event {
        EngineEvent::Notice(message) => state.set_notice(message, now),
        EngineEvent::SessionDiscarded(id) => {
            state.set_notice(format!("Session {} was too short and was dropped", id), now)
        }
        _ => {}
    }
    state.needs_render = true;
}

/// Restores cooked mode when the player exits, including on error.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

//! Scripted simulation command handler
//!
//! Runs a deterministic capture, bookmark and seek-back sequence against a
//! manual clock and prints what the engine ended up holding.

use anyhow::{bail, Result};
use humansize::{format_size, BINARY};

use flashback::clock::{Clock, ManualClock};
use flashback::engine::EngineEvent;
use flashback::player::render::{format_duration, session_rows};
use flashback::player::Simulation;
use flashback::theme::current_theme;
use flashback::Config;

/// Simulation step in seconds.
const STEP: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub seconds: f64,
    pub fragment: f64,
    pub seek_back: f64,
    pub max_duration: Option<f64>,
}

/// Run the scripted sequence and print a report.
pub fn handle(opts: SimulateOptions) -> Result<()> {
    if !(opts.fragment.is_finite() && opts.fragment > 0.0) {
        bail!("Fragment length must be a positive number of seconds");
    }
    if !(opts.seconds.is_finite() && opts.seconds >= 0.0) {
        bail!("Capture length must be a non-negative number of seconds");
    }

    let mut config = Config::load()?;
    if let Some(max) = opts.max_duration {
        config.buffer.max_duration = max;
    }

    let mut sim = Simulation::new(config, ManualClock::new(0.0), opts.fragment);
    let mut timeline = Vec::new();
    sim.engine.start()?;

    advance(&mut sim, opts.seconds / 2.0, &mut timeline);
    if let Err(e) = sim.engine.add_marker() {
        timeline.push(format!("{:>6.1}s  marker rejected: {}", sim.clock().now(), e));
    }
    advance(&mut sim, opts.seconds / 2.0, &mut timeline);

    let target = sim.engine.lifetime_duration() - opts.seek_back.max(0.0);
    sim.engine.seek_to(target)?;
    advance(&mut sim, opts.seek_back.max(0.0) + 2.0, &mut timeline);

    print_report(&sim, &opts, &timeline);
    Ok(())
}

fn advance(sim: &mut Simulation<ManualClock>, seconds: f64, timeline: &mut Vec<String>) {
    let steps = (seconds / STEP).round() as usize;
    for _ in 0..steps {
        sim.clock().advance(STEP);
        sim.pump();
        let now = sim.clock().now();
        for event in sim.engine.take_events() {
            if let Some(line) = describe(&event) {
                timeline.push(format!("{:>6.1}s  {}", now, line));
            }
        }
    }
}

fn describe(event: &EngineEvent) -> Option<String> {
    match event {
        EngineEvent::StateChanged { from, to } => Some(format!("{} -> {}", from, to)),
        EngineEvent::Notice(message) => Some(format!("notice: {}", message)),
        EngineEvent::ReplayStarted { session, .. } => Some(format!("replaying {}", session)),
        EngineEvent::ReplayFinished { session, signal } => {
            Some(format!("{} finished ({})", session, signal))
        }
        EngineEvent::MarkerAdded(time) => Some(format!("marker at {}", format_duration(*time))),
        EngineEvent::SessionDiscarded(id) => Some(format!("{} discarded", id)),
    }
}

#[cfg(not(tarpaulin_include))]
fn print_report(sim: &Simulation<ManualClock>, opts: &SimulateOptions, timeline: &[String]) {
    let theme = current_theme();
    let engine = &sim.engine;
    let window = engine.visible_window();

    println!(
        "{}",
        theme.accent_text(&format!(
            "Simulated {:.1}s of capture in {:.1}s fragments, then seeked back {:.1}s",
            opts.seconds, opts.fragment, opts.seek_back
        ))
    );
    println!();
    for line in timeline {
        println!("{}", theme.secondary_text(line));
    }
    println!();

    println!("State:    {}", engine.state());
    println!(
        "Buffered: {:.1}s ({}) in {} fragments",
        engine.buffered_duration(),
        format_size(engine.buffer().buffered_bytes(), BINARY),
        engine.buffer().len()
    );
    println!(
        "Window:   {} - {}",
        format_duration(window.start),
        format_duration(window.end)
    );
    let markers: Vec<String> = engine
        .markers()
        .times()
        .into_iter()
        .map(format_duration)
        .collect();
    println!(
        "Markers:  {}",
        if markers.is_empty() {
            "none".to_string()
        } else {
            markers.join(", ")
        }
    );
    println!();
    println!("Sessions:");
    for row in session_rows(&engine.list_sessions_for_display()) {
        println!("  {}", theme.primary_text(&row));
    }
}

//! Interactive player command handler

use anyhow::{bail, Result};

use flashback::player::run_player;
use flashback::Config;

/// Launch the interactive player.
#[cfg(not(tarpaulin_include))]
pub fn handle(fragment: f64) -> Result<()> {
    if !atty::is(atty::Stream::Stdout) || !atty::is(atty::Stream::Stdin) {
        bail!("The interactive player needs a terminal; try `flashback simulate` instead");
    }
    if !(fragment.is_finite() && fragment > 0.0) {
        bail!("Fragment length must be a positive number of seconds");
    }
    let config = Config::load()?;
    run_player(config, fragment)
}

//! Flashback CLI

mod commands;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

/// Flashback - rolling capture buffer with instant replay
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive player with a simulated capture source
    Run {
        /// Length of each captured fragment in seconds
        #[arg(long, default_value_t = 1.0)]
        fragment: f64,
    },
    /// Run a scripted capture and replay and print the resulting buffer
    Simulate {
        /// Seconds of capture before seeking back
        #[arg(long, default_value_t = 40.0)]
        seconds: f64,
        /// Length of each captured fragment in seconds
        #[arg(long, default_value_t = 1.0)]
        fragment: f64,
        /// How far back from live to seek
        #[arg(long, default_value_t = 10.0)]
        seek_back: f64,
        /// Override the retention target in seconds
        #[arg(long)]
        max_duration: Option<f64>,
    },
    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Open the configuration file in $EDITOR
    Edit,
    /// Add missing fields to an existing configuration file
    Migrate {
        /// Apply without asking
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Commands::Run { .. });
    init_logging(cli.verbose, cli.log_file.as_ref(), interactive)?;

    match cli.command {
        Commands::Run { fragment } => commands::run::handle(fragment),
        Commands::Simulate {
            seconds,
            fragment,
            seek_back,
            max_duration,
        } => commands::simulate::handle(commands::simulate::SimulateOptions {
            seconds,
            fragment,
            seek_back,
            max_duration,
        }),
        Commands::Config(ConfigCommands::Show) => commands::config::handle_show(),
        Commands::Config(ConfigCommands::Edit) => commands::config::handle_edit(),
        Commands::Config(ConfigCommands::Migrate { yes }) => {
            commands::config::handle_migrate(yes)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` overrides the verbosity flags. The interactive player owns the
/// terminal, so without `--log-file` it logs nothing.
fn init_logging(verbose: u8, log_file: Option<&PathBuf>, interactive: bool) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

//! tabfsm - table-driven state machines
//!
//! Runs the built-in player demo, validates table files and drives them
//! with a list of events.

mod commands;
mod config;
mod demo;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use std::path::PathBuf;
use tabfsm_core::{CoreError, MissingTransition};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabfsm")]
#[command(about = "Table-driven finite state machines")]
#[command(version)]
struct Cli {
    /// Fail on events that have no row for the current state
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in Stopped/Playing player
    Demo,

    /// Validate a table file and print its rows
    Check {
        /// Table file (.json, otherwise YAML)
        table: PathBuf,
    },

    /// Feed events through a table file
    Run {
        /// Table file (.json, otherwise YAML)
        table: PathBuf,

        /// Events to process, in order
        #[arg(short, long, value_delimiter = ',', required = true)]
        events: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration (from file if TABFSM_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    if !config.output.color {
        colored::control::set_override(false);
    }

    let policy = if cli.strict {
        MissingTransition::Error
    } else {
        config.engine.missing_transition
    };
    tracing::debug!("missing-transition policy: {:?}", policy);

    let result = match cli.command {
        Commands::Demo => demo::run(policy).map(|last| {
            tracing::info!("demo finished in {}", last.name());
        }),
        Commands::Check { table } => commands::check(&table).map(|report| print!("{}", report)),
        Commands::Run { table, events } => commands::run(&table, &events, policy),
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

fn report_error(e: &CoreError) {
    eprintln!("{} [{}]: {}", "Error".red(), e.error_code(), e);
}

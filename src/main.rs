//! Noise Before Defeat CLI - play scripted matches, preview ratings, and inspect records.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Noise Before Defeat - a two-player grid strategy game
#[derive(Parser, Debug)]
#[command(name = "nbd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log rule decisions to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a match from a script of intents
    Play {
        /// JSON script of `{player, intent}` steps
        #[arg(short, long, required = true)]
        script: PathBuf,

        /// TOML match configuration (players, ratings, turn timer)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the match record to file (the match must be finished)
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Preview the rating change for a match result
    Rate {
        /// Winner's rating before the match
        #[arg(long)]
        winner_elo: u32,

        /// Loser's rating before the match
        #[arg(long)]
        loser_elo: u32,

        /// Loser's current losing streak
        #[arg(long, default_value = "0")]
        loser_streak: u32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Show a saved match record
    Show {
        /// Record file (.json)
        #[arg(required = true)]
        record: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Play {
            script,
            config,
            format,
            save,
        } => cli::play::execute(&script, config.as_deref(), format, save.as_deref()),

        Commands::Rate {
            winner_elo,
            loser_elo,
            loser_streak,
            format,
        } => cli::rate::execute(winner_elo, loser_elo, loser_streak, format),

        Commands::Show { record, format } => cli::show::execute(&record, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

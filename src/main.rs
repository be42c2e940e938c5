//! hexdice CLI - Command-line interface for running and viewing hexdice games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// hexdice - A deterministic hex-grid dice conquest engine
#[derive(Parser, Debug)]
#[command(name = "hexdice")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debug logging to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a single game with the AI on every seat
    Run {
        #[command(flatten)]
        game: cli::GameArgs,

        /// Numeric seed for both streams (default: time-based)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Rounds before the game is called a draw
        #[arg(short = 'r', long, default_value = "500")]
        max_rounds: u32,

        /// Output format: text, json, or log
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save a recording to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Save the final game state to file
        #[arg(long)]
        save_state: Option<PathBuf>,

        /// Suppress progress messages
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a recorded game
    Replay {
        /// Recording file (JSON)
        #[arg(required = true)]
        recording: PathBuf,

        /// Output format: board, text, or log
        #[arg(short, long, default_value = "board")]
        format: cli::ReplayFormat,

        /// Show the game after this many actions
        #[arg(short, long)]
        action: Option<usize>,
    },

    /// Run many games in parallel and aggregate statistics
    Tournament {
        #[command(flatten)]
        game: cli::GameArgs,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Rounds per game before a draw
        #[arg(short = 'r', long)]
        max_rounds: Option<u32>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Generate and show a starting position
    Generate {
        #[command(flatten)]
        game: cli::GameArgs,

        /// Numeric seed (default: time-based)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Write the position as a custom map
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Name stored in the exported map
        #[arg(long, default_value = "Generated")]
        name: String,
    },

    /// Validate a settings file, custom map or saved game
    Validate {
        /// File to validate
        #[arg(required = true)]
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "hexdice=debug" } else { "hexdice=warn" })
    });
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Run {
            game,
            seed,
            max_rounds,
            format,
            save,
            save_state,
            quiet,
        } => cli::run::execute(
            &game,
            seed,
            max_rounds,
            format,
            save.as_deref(),
            save_state.as_deref(),
            quiet,
        ),

        Commands::Replay {
            recording,
            format,
            action,
        } => cli::replay::execute(&recording, format, action),

        Commands::Tournament {
            game,
            games,
            seed,
            threads,
            max_rounds,
            format,
            progress,
        } => cli::tournament::execute(&game, games, seed, threads, max_rounds, format, progress),

        Commands::Generate {
            game,
            seed,
            export,
            name,
        } => cli::generate::execute(&game, seed, export.as_deref(), &name),

        Commands::Validate { file } => cli::validate::execute(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

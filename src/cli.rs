//! CLI command implementations for hexdice.

pub(crate) mod generate;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;

mod output;

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use hexdice::config::GameSettings;
use hexdice::custom_map::CustomMap;
use hexdice::game::{Difficulty, GameMode};
use hexdice::rng::GameSeeds;
use thiserror::Error;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// The full event log.
    Log,
}

/// Output format for the `replay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayFormat {
    /// Board drawings, one per turn.
    Board,
    /// Structured status report.
    Text,
    /// The event log.
    Log,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// AI strength flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DifficultyArg {
    /// Loose play.
    Easy,
    /// Standard play.
    Normal,
    /// Hoarding play.
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Self::Easy,
            DifficultyArg::Normal => Self::Normal,
            DifficultyArg::Hard => Self::Hard,
        }
    }
}

/// Setup rules flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    /// Everyone starts with territory.
    Classic,
    /// Single starts among barbarians.
    Conquest,
}

impl From<ModeArg> for GameMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Classic => Self::Classic,
            ModeArg::Conquest => Self::Conquest,
        }
    }
}

/// Game settings shared by every command that starts a game.
#[derive(Debug, Clone, Args)]
pub(crate) struct GameArgs {
    /// Settings file (TOML); flags override its values
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Custom map file (JSON) used instead of a generated map
    #[arg(long)]
    pub(crate) map: Option<PathBuf>,

    /// Number of civilizations (2-8)
    #[arg(short, long)]
    pub(crate) players: Option<usize>,

    /// Target land cells
    #[arg(long)]
    pub(crate) cells: Option<usize>,

    /// Fraction of land to flood (0-1)
    #[arg(long)]
    pub(crate) water: Option<f64>,

    /// AI strength
    #[arg(short, long)]
    pub(crate) difficulty: Option<DifficultyArg>,

    /// Setup rules
    #[arg(short, long)]
    pub(crate) mode: Option<ModeArg>,

    /// Lose dice placed outside the largest region
    #[arg(long)]
    pub(crate) corruption: bool,
}

impl GameArgs {
    /// Settings from the config file (or defaults) with flags applied.
    pub(crate) fn settings(&self) -> Result<GameSettings, CliError> {
        let mut settings = match &self.config {
            Some(path) => GameSettings::from_file(path)?,
            None => GameSettings::default(),
        };
        if let Some(path) = &self.map {
            let json = std::fs::read_to_string(path).map_err(|e| {
                CliError::new(format!("Failed to read {}: {e}", path.display()))
            })?;
            settings.custom_map = Some(CustomMap::from_json(&json)?);
        }
        if let Some(players) = self.players {
            settings.players = players;
        }
        if let Some(cells) = self.cells {
            settings.cell_count = cells;
        }
        if let Some(water) = self.water {
            settings.water_level = water;
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty.into();
        }
        if let Some(mode) = self.mode {
            settings.mode = mode.into();
        }
        settings.corruption |= self.corruption;
        settings.validate()?;
        Ok(settings)
    }
}

/// Seeds from a numeric seed, or fresh ones.
pub(crate) fn seeds_from(seed: Option<u64>) -> GameSeeds {
    seed.map_or_else(GameSeeds::fresh, GameSeeds::from_number)
}

/// Whether stdout is a terminal that understands colors.
pub(crate) fn color_stdout() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}

/// CLI error type.
#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

macro_rules! cli_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(e: $ty) -> Self {
                    Self::new(e.to_string())
                }
            }
        )*
    };
}

cli_error_from!(
    std::io::Error,
    serde_json::Error,
    hexdice::config::ConfigError,
    hexdice::custom_map::MapFormatError,
    hexdice::persistence::PersistError,
    hexdice::replay::ReplayError,
    hexdice::setup::SetupError,
    hexdice::tournament::TournamentError,
);

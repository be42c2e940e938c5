//! Game settings.
//!
//! Settings load from TOML; every field has a default so a partial (or empty)
//! file is valid. Command-line flags override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::custom_map::CustomMap;
use crate::game::{DiceDisplay, Difficulty, GameMode, GameOptions, MAX_PLAYERS, PlayerId};

/// Smallest generated map.
pub const MIN_CELLS: usize = 8;

/// Largest generated map.
pub const MAX_CELLS: usize = 2_000;

/// Settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for these settings.
    #[error("{path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Alliance group tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AllianceTag {
    /// Group A.
    #[serde(alias = "a")]
    A,
    /// Group B.
    #[serde(alias = "b")]
    B,
}

/// Alliance tags held by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceMembership {
    /// Member player.
    pub player: PlayerId,
    /// Groups joined.
    pub tags: Vec<AllianceTag>,
}

/// Everything needed to start a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Civilizations, 2 to 8.
    pub players: usize,
    /// Leading seats controlled by people.
    pub humans: usize,
    /// Target land cells.
    pub cell_count: usize,
    /// Fraction of land to flood.
    pub water_level: f64,
    /// Chance a classic-mode claim borders existing territory.
    pub compactness: f64,
    /// Lose dice placed outside the largest region.
    pub corruption: bool,
    /// AI strength.
    pub difficulty: Difficulty,
    /// Setup rules.
    pub mode: GameMode,
    /// Dice rendering style.
    pub dice_display: DiceDisplay,
    /// Seconds a notification stays visible.
    pub notification_duration: f32,
    /// Show the battle result overlay.
    pub show_dice_results: bool,
    /// Seconds the battle result stays visible.
    pub dice_result_duration: f32,
    /// Alliance memberships.
    pub alliances: Vec<AllianceMembership>,
    /// Prepared map used instead of generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_map: Option<CustomMap>,
}

impl Default for GameSettings {
    fn default() -> Self {
        let options = GameOptions::default();
        Self {
            players: 4,
            humans: 0,
            cell_count: 100,
            water_level: 0.2,
            compactness: 0.5,
            corruption: options.corruption,
            difficulty: Difficulty::Normal,
            mode: GameMode::Classic,
            dice_display: options.dice_display,
            notification_duration: options.notification_duration,
            show_dice_results: options.show_dice_results,
            dice_result_duration: options.dice_result_duration,
            alliances: Vec::new(),
            custom_map: None,
        }
    }
}

impl GameSettings {
    /// Load and validate settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read, parsed, or fails
    /// validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Parse and validate settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if parsing or validation fails.
    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: source_path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every field is in range.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.custom_map.is_none() {
            if !(2..=MAX_PLAYERS).contains(&self.players) {
                return invalid(format!("players must be 2-{MAX_PLAYERS}, got {}", self.players));
            }
            if self.humans > self.players {
                return invalid(format!(
                    "humans ({}) cannot exceed players ({})",
                    self.humans, self.players
                ));
            }
            if !(MIN_CELLS..=MAX_CELLS).contains(&self.cell_count) {
                return invalid(format!(
                    "cell_count must be {MIN_CELLS}-{MAX_CELLS}, got {}",
                    self.cell_count
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.water_level) {
            return invalid(format!("water_level must be in [0, 1], got {}", self.water_level));
        }
        if !(0.0..=1.0).contains(&self.compactness) {
            return invalid(format!("compactness must be in [0, 1], got {}", self.compactness));
        }
        if self.notification_duration < 0.0 || self.dice_result_duration < 0.0 {
            return invalid("durations must not be negative".to_string());
        }
        let seats = self.seat_count();
        for membership in &self.alliances {
            if usize::from(membership.player) >= seats {
                return invalid(format!(
                    "alliance member {} is not a player",
                    membership.player
                ));
            }
        }
        Ok(())
    }

    /// Civilizations in the game, from the custom map when present.
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.custom_map
            .as_ref()
            .map_or(self.players, |m| m.player_count)
    }

    /// Rule and display options for the game state.
    #[must_use]
    pub fn options(&self) -> GameOptions {
        GameOptions {
            corruption: self.corruption,
            dice_display: self.dice_display,
            notification_duration: self.notification_duration,
            show_dice_results: self.show_dice_results,
            dice_result_duration: self.dice_result_duration,
        }
    }

    /// Tags held by `player`.
    #[must_use]
    pub fn tags_of(&self, player: PlayerId) -> Vec<AllianceTag> {
        self.alliances
            .iter()
            .filter(|m| m.player == player)
            .flat_map(|m| m.tags.iter().copied())
            .collect()
    }
}

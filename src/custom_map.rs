//! Custom map documents.
//!
//! A custom map is a JSON document listing cells by axial coordinate with an
//! optional owner and dice count. Adjacency is never stored; it is rebuilt
//! from coordinates on import.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{Board, Difficulty, GameState, Hex, MAX_DICE, MAX_PLAYERS, PlayerId};

/// Owner value for an unowned cell.
pub const UNOWNED: i32 = -1;

/// Custom map errors.
#[derive(Debug, Error)]
pub enum MapFormatError {
    /// Not JSON, or required fields are missing.
    #[error("malformed map document: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed but semantically invalid.
    #[error("invalid map: {0}")]
    Invalid(String),
}

/// Seat controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerType {
    /// A person.
    Human,
    /// The AI.
    Ai,
}

/// Who moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FirstTurn {
    /// A fixed seat.
    Fixed(PlayerId),
    /// Drawn from the map stream.
    Random(RandomMarker),
}

/// The literal `"random"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomMarker {
    /// `"random"`.
    Random,
}

impl FirstTurn {
    /// A random first mover.
    pub const RANDOM: Self = Self::Random(RandomMarker::Random);
}

/// One cell of a custom map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMapCell {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
    /// Owning seat, or `-1`.
    pub owner: i32,
    /// Dice on the cell.
    pub dice: u8,
}

/// A complete custom map document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMap {
    /// Display name.
    pub map_name: String,
    /// Seats, 2 to 8.
    pub player_count: usize,
    /// Cells in id order.
    pub cells: Vec<CustomMapCell>,
    /// Controller per seat.
    pub player_types: Vec<PlayerType>,
    /// AI strength.
    pub ai_difficulty: Difficulty,
    /// First mover.
    pub first_turn: FirstTurn,
}

impl CustomMap {
    /// Parse and validate a document.
    ///
    /// # Errors
    ///
    /// Returns `MapFormatError::Json` for malformed input and
    /// `MapFormatError::Invalid` for semantic problems.
    pub fn from_json(json: &str) -> Result<Self, MapFormatError> {
        let map: Self = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `MapFormatError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, MapFormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check seat counts, coordinates, owners, dice and the first mover.
    ///
    /// # Errors
    ///
    /// Returns `MapFormatError::Invalid` describing the first problem.
    pub fn validate(&self) -> Result<(), MapFormatError> {
        let invalid = |msg: String| Err(MapFormatError::Invalid(msg));

        if !(2..=MAX_PLAYERS).contains(&self.player_count) {
            return invalid(format!("player count must be 2-{MAX_PLAYERS}, got {}", self.player_count));
        }
        if self.player_types.len() < self.player_count {
            return invalid(format!(
                "{} player types for {} players",
                self.player_types.len(),
                self.player_count
            ));
        }
        if self.cells.is_empty() {
            return invalid("map has no cells".to_string());
        }

        let mut seen = HashSet::with_capacity(self.cells.len());
        let seats = i32::try_from(self.player_count).unwrap_or(i32::MAX);
        for (i, cell) in self.cells.iter().enumerate() {
            if !seen.insert((cell.q, cell.r)) {
                return invalid(format!("duplicate cell at ({}, {})", cell.q, cell.r));
            }
            if cell.owner != UNOWNED && !(0..seats).contains(&cell.owner) {
                return invalid(format!("cell {i} has owner {} out of range", cell.owner));
            }
            if cell.dice > MAX_DICE {
                return invalid(format!("cell {i} has {} dice", cell.dice));
            }
        }

        if let FirstTurn::Fixed(first) = self.first_turn
            && usize::from(first) >= self.player_count
        {
            return invalid(format!("first turn {first} is not a player"));
        }
        Ok(())
    }

    /// Build the board. Owned cells carry at least one die.
    #[must_use]
    pub fn to_board(&self) -> Board {
        let hexes: Vec<Hex> = self.cells.iter().map(|c| Hex::new(c.q, c.r)).collect();
        let mut board = Board::from_hexes(&hexes);
        for (cell, source) in board.cells_mut().iter_mut().zip(&self.cells) {
            cell.owner = PlayerId::try_from(source.owner).ok();
            cell.dice = if cell.owner.is_some() {
                source.dice.max(1)
            } else {
                source.dice
            };
        }
        board
    }

    /// Whether seat `player` is human.
    #[must_use]
    pub fn is_human(&self, player: usize) -> bool {
        self.player_types.get(player) == Some(&PlayerType::Human)
    }

    /// Export a running game. Barbarian cells become unowned.
    #[must_use]
    pub fn from_state(state: &GameState, map_name: &str) -> Self {
        let civs: Vec<_> = state.players.iter().filter(|p| p.is_civilization()).collect();
        let cells = state
            .board
            .iter()
            .map(|c| {
                let owner = c
                    .owner
                    .filter(|&o| state.player(o).is_some_and(|p| p.is_civilization()))
                    .map_or(UNOWNED, i32::from);
                CustomMapCell {
                    q: c.hex.q,
                    r: c.hex.r,
                    owner,
                    dice: c.dice,
                }
            })
            .collect();
        let first_turn = if state.player(state.active).is_some_and(|p| p.is_civilization()) {
            FirstTurn::Fixed(state.active)
        } else {
            FirstTurn::RANDOM
        };

        Self {
            map_name: map_name.to_string(),
            player_count: civs.len(),
            cells,
            player_types: civs
                .iter()
                .map(|p| if p.human { PlayerType::Human } else { PlayerType::Ai })
                .collect(),
            ai_difficulty: state.difficulty,
            first_turn,
        }
    }
}

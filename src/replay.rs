//! Game replay and viewing system.
//!
//! Because hexdice games are 100% deterministic, a replay requires only:
//! - the settings the game was started with
//! - the map and gameplay seeds
//! - the list of applied actions
//!
//! No state deltas needed. To view action N, re-run the game from the start
//! and apply the first N actions.
//!
//! # Time Travel
//!
//! - **Forward**: apply the next recorded action
//! - **Backward**: re-run from the start to (`position` - 1)
//! - **Jump to action N**: re-run from the start to N

mod render;
mod text;

pub use render::render_ascii;
pub use text::{render_log, render_text};

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::GameSettings;
use crate::error::GameError;
use crate::game::{Action, GameState, Outcome};
use crate::rng::GameSeeds;
use crate::setup::{self, SetupError};

/// Minimal recording: settings, seeds and actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Settings the game started with.
    pub settings: GameSettings,
    /// Seeds for layout and dice.
    pub seeds: GameSeeds,
    /// Actions in the order they were applied.
    pub actions: Vec<Action>,
}

impl Recording {
    /// Create a new recording.
    #[must_use]
    pub fn new(settings: GameSettings, seeds: GameSeeds, actions: Vec<Action>) -> Self {
        Self {
            settings,
            seeds,
            actions,
        }
    }

    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a recording.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::Json` for malformed input.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save recording to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load recording from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the contents are not a
    /// recording.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Error type for replay operations.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Reading or writing the recording failed.
    #[error("recording file error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not a recording.
    #[error("malformed recording: {0}")]
    Json(#[from] serde_json::Error),
    /// The recorded settings no longer produce a game.
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    /// A recorded action was rejected, so the recording does not match.
    #[error("action {index} rejected: {source}")]
    Rejected {
        /// Position in the recording.
        index: usize,
        /// Engine error.
        source: GameError,
    },
    /// Position out of bounds.
    #[error("action {requested} out of bounds (max: {max})")]
    OutOfBounds {
        /// Requested position.
        requested: usize,
        /// Last valid position.
        max: usize,
    },
    /// Every recorded action has been applied.
    #[error("end of recording")]
    EndOfRecording,
}

/// Replay engine: steps through a recording deterministically.
#[derive(Debug)]
pub struct ReplayEngine {
    /// The recording being replayed.
    recording: Recording,
    /// Current game state.
    state: GameState,
    /// Actions applied so far.
    position: usize,
}

impl ReplayEngine {
    /// Create a new replay engine before the first action.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded settings fail to set up.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        Self::new_at(recording, 0)
    }

    /// Create a new replay engine after `target` actions.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is past the end, setup fails or a
    /// recorded action is rejected.
    pub fn new_at(recording: Recording, target: usize) -> Result<Self, ReplayError> {
        if target > recording.actions.len() {
            return Err(ReplayError::OutOfBounds {
                requested: target,
                max: recording.actions.len(),
            });
        }
        let state = setup::new_game(&recording.settings, &recording.seeds)?;
        let mut engine = Self {
            recording,
            state,
            position: 0,
        };
        while engine.position < target {
            engine.step_forward()?;
        }
        Ok(engine)
    }

    /// Get the recording.
    #[must_use]
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Actions applied so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total recorded actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recording.actions.len()
    }

    /// Whether the recording has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recording.actions.is_empty()
    }

    /// Get current game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Whether every action has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position >= self.recording.actions.len()
    }

    /// Apply the next action.
    ///
    /// # Errors
    ///
    /// Returns `EndOfRecording` at the end, or `Rejected` if the engine
    /// refuses the action.
    pub fn step_forward(&mut self) -> Result<Outcome, ReplayError> {
        let action = *self
            .recording
            .actions
            .get(self.position)
            .ok_or(ReplayError::EndOfRecording)?;
        let outcome = self
            .state
            .apply(action)
            .map_err(|source| ReplayError::Rejected {
                index: self.position,
                source,
            })?;
        debug!(position = self.position, ?action, "replayed action");
        self.position += 1;
        Ok(outcome)
    }

    /// Step back one action by replaying from the start.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` at the start.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        let target = self.position.checked_sub(1).ok_or(ReplayError::OutOfBounds {
            requested: 0,
            max: self.len(),
        })?;
        self.jump(target)
    }

    /// Move to just after action `target`.
    ///
    /// Moving forward applies the missing actions; moving back re-runs the
    /// game from the start.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` past the end, or any replay error.
    pub fn jump(&mut self, target: usize) -> Result<(), ReplayError> {
        if target > self.len() {
            return Err(ReplayError::OutOfBounds {
                requested: target,
                max: self.len(),
            });
        }
        if target < self.position {
            *self = Self::new_at(self.recording.clone(), target)?;
        }
        while self.position < target {
            self.step_forward()?;
        }
        Ok(())
    }

    /// Render current state to ASCII for terminal viewing.
    #[must_use]
    pub fn render_ascii(&self, color: bool) -> String {
        render_ascii(&self.state, color)
    }

    /// Render current state to structured text.
    #[must_use]
    pub fn render_text(&self) -> String {
        render_text(&self.state)
    }
}

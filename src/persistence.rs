//! Save and restore.
//!
//! The whole `GameState` is written as JSON. The gameplay generator is
//! stored only as its draw count; loading rebuilds it from the seed so the
//! restored game continues the exact same dice stream. Boards that break a
//! game invariant are rejected instead of loaded.

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;

use crate::game::GameState;
use crate::game::invariants::{InvariantViolation, check_invariants, check_structure};
use crate::game::region::largest_region;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading or writing the file failed.
    #[error("save file error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not a saved game.
    #[error("corrupt save: {0}")]
    Json(#[from] serde_json::Error),
    /// The save has no gameplay seed; start a new game instead.
    #[error("save has no gameplay seed")]
    MissingSeed,
    /// The save parses but describes an impossible position.
    #[error("inconsistent save: {}", describe(.0))]
    Invalid(Vec<InvariantViolation>),
}

fn describe(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Serialize a game.
///
/// # Errors
///
/// Returns `PersistError::Json` if serialization fails.
pub fn to_json(state: &GameState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(state)?)
}

/// Restore a game and re-seed its generator.
///
/// # Errors
///
/// Returns `PersistError::Json` for malformed input,
/// `PersistError::MissingSeed` if the seed is empty, or
/// `PersistError::Invalid` if the board breaks a game invariant.
pub fn from_json(json: &str) -> Result<GameState, PersistError> {
    let mut state: GameState = serde_json::from_str(json)?;
    if state.seed.is_empty() {
        return Err(PersistError::MissingSeed);
    }
    let broken = check_structure(&state);
    if !broken.is_empty() {
        return Err(PersistError::Invalid(broken));
    }
    state.reseed();
    state.rebuild_cell_sets();
    for player in &mut state.players {
        player.largest_region =
            largest_region(&state.board, player.id).map_or_else(BTreeSet::new, |r| r.cells);
    }
    state.refresh_totals();
    let violations = check_invariants(&state);
    if !violations.is_empty() {
        return Err(PersistError::Invalid(violations));
    }
    Ok(state)
}

/// Write a game to `path`.
///
/// # Errors
///
/// Returns a `PersistError` if serialization or the write fails.
pub fn save_game(state: &GameState, path: &Path) -> Result<(), PersistError> {
    std::fs::write(path, to_json(state)?)?;
    Ok(())
}

/// Read a game from `path`.
///
/// # Errors
///
/// Returns a `PersistError` if the read fails or the contents are not a
/// valid save.
pub fn load_game(path: &Path) -> Result<GameState, PersistError> {
    let json = std::fs::read_to_string(path)?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{duel_board, two_player_state};
    use crate::game::Action;
    use crate::rng::RandomSource;

    #[test]
    fn test_round_trip_resumes_stream() {
        let mut state = two_player_state(duel_board());
        state.apply(Action::Attack { from: 1, to: 2 }).unwrap();
        let draws = state.rng().draws();
        assert!(draws > 0);

        let mut restored = from_json(&to_json(&state).unwrap()).unwrap();
        assert_eq!(restored.rng().draws(), draws);
        assert_eq!(restored.board, state.board);
        assert_eq!(restored.log, state.log);

        let mut original_rng = state.rng().clone();
        let mut restored_rng = restored.rng().clone();
        assert_eq!(original_rng.next_f64().to_bits(), restored_rng.next_f64().to_bits());

        state.apply(Action::EndTurn).unwrap();
        restored.apply(Action::EndTurn).unwrap();
        assert_eq!(restored.board, state.board);
    }

    #[test]
    fn test_missing_seed() {
        let mut state = two_player_state(duel_board());
        state.seed.clear();
        let json = to_json(&state).unwrap();
        assert!(matches!(from_json(&json), Err(PersistError::MissingSeed)));
    }

    #[test]
    fn test_overfull_cell_rejected() {
        let mut state = two_player_state(duel_board());
        state.board.cells_mut()[3].dice = 9;
        let json = to_json(&state).unwrap();

        let Err(PersistError::Invalid(violations)) = from_json(&json) else {
            panic!("an overfull cell must not load");
        };
        assert!(violations.iter().any(|v| v.message.contains("9 dice")));
    }

    #[test]
    fn test_out_of_range_ids_rejected() {
        let mut state = two_player_state(duel_board());
        state.board.cells_mut()[2].id = 12;
        let json = to_json(&state).unwrap();
        assert!(matches!(from_json(&json), Err(PersistError::Invalid(_))));

        let mut state = two_player_state(duel_board());
        state.board.cells_mut()[0].neighbors.push(4);
        let json = to_json(&state).unwrap();
        assert!(matches!(from_json(&json), Err(PersistError::Invalid(_))));
    }

    #[test]
    fn test_excess_reserve_rejected() {
        let mut state = two_player_state(duel_board());
        state.players[1].reserve = 5;
        let json = to_json(&state).unwrap();

        let err = from_json(&json).unwrap_err();
        assert!(err.to_string().contains("reserve"), "{err}");
    }

    #[test]
    fn test_saved_region_is_recomputed() {
        let mut state = two_player_state(duel_board());
        state.players[1].largest_region.extend([0, 1, 5, 6]);
        state.players[1].reserve = 4;
        let json = to_json(&state).unwrap();

        assert!(matches!(from_json(&json), Err(PersistError::Invalid(_))));
    }

    #[test]
    fn test_corrupt_json() {
        assert!(matches!(from_json("{\"board\": 3}"), Err(PersistError::Json(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let state = two_player_state(duel_board());

        save_game(&state, &path).unwrap();
        let loaded = load_game(&path).unwrap();
        assert_eq!(loaded.board, state.board);
        assert_eq!(loaded.active, state.active);
    }
}

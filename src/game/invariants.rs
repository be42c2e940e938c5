//! Game invariants - sanity checks that detect bugs.
//!
//! These should NEVER trigger in a correctly implemented game. Debug builds
//! panic on a violation; release builds log it and clamp the state back into
//! range so a long batch run keeps going.

use thiserror::Error;
use tracing::warn;

use crate::game::{GameState, MAX_DICE};

/// Invariant violation error.
#[derive(Debug, Clone, Error)]
#[error("Invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check the indices a loaded state relies on before anything walks it.
///
/// Cell ids must be dense, neighbor ids must point at real cells, owners
/// and player ids must match seats, and the active seat and any pending
/// attack must exist.
#[must_use]
pub fn check_structure(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let cells = state.board.len();

    for (idx, cell) in state.board.iter().enumerate() {
        if cell.id != idx {
            violations.push(violation(format!("Cell at index {idx} has id {}", cell.id)));
        }
        if let Some(&n) = cell.neighbors.iter().find(|&&n| n >= cells) {
            violations.push(violation(format!("Cell {idx} has neighbor {n} off the board")));
        }
        if let Some(owner) = cell.owner
            && usize::from(owner) >= state.players.len()
        {
            violations.push(violation(format!("Cell {idx} owned by unknown player {owner}")));
        }
    }
    for (idx, player) in state.players.iter().enumerate() {
        if usize::from(player.id) != idx {
            violations.push(violation(format!("Seat {idx} holds player {}", player.id)));
        }
    }
    if let Some(pending) = state.pending
        && (pending.from >= cells || pending.to >= cells)
    {
        violations.push(violation(format!(
            "Pending attack {} -> {} is off the board",
            pending.from, pending.to
        )));
    }
    if state.player(state.active).is_none() {
        violations.push(violation(format!("Active seat {} is not a player", state.active)));
    }
    violations
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let board = &state.board;

    for (idx, cell) in board.iter().enumerate() {
        if cell.id != idx {
            violations.push(violation(format!("Cell at index {idx} has id {}", cell.id)));
        }
        for &n in &cell.neighbors {
            if n == cell.id {
                violations.push(violation(format!("Cell {} lists itself as a neighbor", cell.id)));
            } else if !board.are_adjacent(n, cell.id) {
                violations.push(violation(format!(
                    "Adjacency {} -> {n} is not mirrored",
                    cell.id
                )));
            }
        }

        match cell.owner {
            Some(owner) => {
                if cell.dice < 1 || cell.dice > MAX_DICE {
                    violations.push(violation(format!(
                        "Cell {} owned by {owner} has {} dice",
                        cell.id, cell.dice
                    )));
                }
                match state.player(owner) {
                    None => violations.push(violation(format!(
                        "Cell {} owned by unknown player {owner}",
                        cell.id
                    ))),
                    Some(p) if !p.cells.contains(&cell.id) => violations.push(violation(format!(
                        "Cell {} missing from player {owner}'s cell set",
                        cell.id
                    ))),
                    Some(_) => {}
                }
            }
            None if cell.dice > MAX_DICE => violations.push(violation(format!(
                "Unowned cell {} has {} dice",
                cell.id, cell.dice
            ))),
            None => {}
        }
    }

    for player in &state.players {
        for &c in &player.cells {
            if !board.get(c).is_some_and(|cell| cell.is_owned_by(player.id)) {
                violations.push(violation(format!(
                    "Player {} lists cell {c} it does not own",
                    player.id
                )));
            }
        }

        if player.alive {
            if player.reserve > player.largest_region_size() {
                violations.push(violation(format!(
                    "Player {} reserve {} exceeds largest region {}",
                    player.id,
                    player.reserve,
                    player.largest_region_size()
                )));
            }
        } else {
            if !player.cells.is_empty() || board.count_owned(player.id) > 0 {
                violations.push(violation(format!(
                    "Dead player {} still owns {} cells",
                    player.id,
                    board.count_owned(player.id)
                )));
            }
            if player.reserve > 0 {
                violations.push(violation(format!(
                    "Dead player {} holds {} reserve dice",
                    player.id, player.reserve
                )));
            }
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

/// Check invariants after a mutation.
///
/// Debug builds panic. Release builds log each violation and clamp dice,
/// reserves and dead players back into range.
pub(crate) fn enforce(state: &mut GameState) {
    if cfg!(debug_assertions) {
        assert_invariants(state);
        return;
    }

    let violations = check_invariants(state);
    if violations.is_empty() {
        return;
    }
    for v in &violations {
        warn!(turn = state.turn, "{v}");
    }
    repair(state);
}

fn repair(state: &mut GameState) {
    for cell in state.board.cells_mut() {
        if cell.owner.is_some() {
            cell.dice = cell.dice.clamp(1, MAX_DICE);
        } else {
            cell.dice = cell.dice.min(MAX_DICE);
        }
    }
    for cell in state.board.cells_mut() {
        if let Some(owner) = cell.owner
            && state.players.get(usize::from(owner)).is_none_or(|p| !p.alive)
        {
            cell.owner = None;
        }
    }
    state.rebuild_cell_sets();
    for player in &mut state.players {
        if player.alive {
            player.reserve = player.reserve.min(player.largest_region_size());
        } else {
            player.reserve = 0;
        }
    }
    state.refresh_totals();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{duel_board, two_player_state};

    #[test]
    fn test_valid_game_passes() {
        let game = two_player_state(duel_board());
        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_dice_out_of_range_detected() {
        let mut game = two_player_state(duel_board());
        game.board.get_mut(0).unwrap().dice = MAX_DICE + 1;

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].message.contains("dice"));
    }

    #[test]
    fn test_owned_cell_with_zero_dice_detected() {
        let mut game = two_player_state(duel_board());
        game.board.get_mut(3).unwrap().dice = 0;
        assert!(!check_invariants(&game).is_empty());
    }

    #[test]
    fn test_excess_reserve_detected() {
        let mut game = two_player_state(duel_board());
        game.players[0].reserve = 3;

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("reserve"));
    }

    #[test]
    fn test_reserve_exactly_at_cap_passes() {
        let mut game = two_player_state(duel_board());
        game.players[0].reserve = 2;
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_dead_player_with_territory_detected() {
        let mut game = two_player_state(duel_board());
        // Kill the player but leave the board owner in place
        game.players[1].eliminate();

        let violations = check_invariants(&game);
        assert!(!violations.is_empty());
        assert!(violations.iter().any(|v| v.message.contains("Dead player")));
    }

    #[test]
    fn test_stale_cell_set_detected() {
        let mut game = two_player_state(duel_board());
        game.players[0].cells.insert(3);

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("does not own")));
    }

    #[test]
    fn test_repair_restores_invariants() {
        let mut game = two_player_state(duel_board());
        game.board.get_mut(0).unwrap().dice = 0;
        game.players[0].reserve = 10;

        repair(&mut game);
        assert!(check_invariants(&game).is_empty());
        assert_eq!(game.board.get(0).unwrap().dice, 1);
        assert_eq!(game.players[0].reserve, 2);
    }

    #[test]
    fn test_structure_of_valid_game_passes() {
        let game = two_player_state(duel_board());
        assert!(check_structure(&game).is_empty());
    }

    #[test]
    fn test_dangling_neighbor_detected() {
        let mut game = two_player_state(duel_board());
        game.board.get_mut(0).unwrap().neighbors.push(99);

        let violations = check_structure(&game);
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].message.contains("off the board"));
    }

    #[test]
    fn test_sparse_ids_and_bad_seat_detected() {
        let mut game = two_player_state(duel_board());
        game.board.get_mut(1).unwrap().id = 40;
        game.active = 7;

        let violations = check_structure(&game);
        assert!(violations.iter().any(|v| v.message.contains("has id 40")));
        assert!(violations.iter().any(|v| v.message.contains("Active seat 7")));
    }

    #[test]
    fn test_violation_display() {
        let v = violation("bad".to_string());
        assert_eq!(v.to_string(), "Invariant violation: bad");
    }
}

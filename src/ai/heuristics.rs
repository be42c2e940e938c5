//! Shared scoring helpers.

use crate::game::{Cell, CellId, GameState, PlayerId, region};

/// Rough chance that `attack` dice beat `defense` dice.
///
/// Not exact; the shape matters more than the numbers. Ties go to the
/// defender, so equal stacks score below one half.
#[must_use]
pub fn win_probability(attack: u8, defense: u8) -> f64 {
    if attack <= 1 {
        return 0.0;
    }
    let diff = f64::from(attack) - f64::from(defense);
    if diff == 0.0 {
        0.45
    } else if diff > 0.0 {
        0.5 + diff * 0.1
    } else {
        0.5 + diff * 0.12
    }
}

/// Whether `a` and `b` are joined through cells owned by `player`.
///
/// Cells both in the largest region are connected without a search.
#[must_use]
pub fn are_connected(state: &GameState, player: PlayerId, a: CellId, b: CellId) -> bool {
    if a == b {
        return true;
    }
    if let Some(p) = state.player(player)
        && p.largest_region.contains(&a)
        && p.largest_region.contains(&b)
    {
        return true;
    }
    region::are_connected(&state.board, player, a, b)
}

/// Whether capturing `to` from `from` would join two separate parts of
/// `player`'s territory.
///
/// Only the first other owned neighbor of the target is checked.
#[must_use]
pub fn is_move_connecting(state: &GameState, player: PlayerId, from: &Cell, to: &Cell) -> bool {
    let sample = to.neighbors.iter().copied().find(|&n| {
        n != from.id && state.board.get(n).is_some_and(|c| c.is_owned_by(player))
    });
    sample.is_some_and(|n| !are_connected(state, player, from.id, n))
}

/// A scored attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Source cell.
    pub from: CellId,
    /// Target cell.
    pub to: CellId,
    /// Higher is better.
    pub score: f64,
}

/// Sort best first, keeping generation order among equal scores.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Every (source, target) pair `player` could attack, in cell order.
pub fn attack_pairs<'a>(
    state: &'a GameState,
    player: PlayerId,
) -> impl Iterator<Item = (&'a Cell, &'a Cell)> + 'a {
    state
        .player(player)
        .into_iter()
        .flat_map(|p| p.cells.iter())
        .filter_map(move |&c| state.board.get(c))
        .filter(|from| from.dice >= 2)
        .flat_map(move |from| {
            from.neighbors
                .iter()
                .filter_map(move |&n| state.board.get(n))
                .filter(move |to| !to.is_owned_by(player))
                .map(move |to| (from, to))
        })
}

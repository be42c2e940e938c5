//! Barbarian play: hit whatever is weakest relative to the attacking stack.

use super::heuristics::Candidate;
use crate::game::{GameState, PlayerId};

/// The attack with the largest dice margin, if it is not a losing one.
///
/// Barbarian-held cells are never targeted; unowned cells are.
#[must_use]
pub fn choose(state: &GameState, player: PlayerId) -> Option<Candidate> {
    let me = state.player(player)?;
    let mut best: Option<Candidate> = None;

    for from in me.cells.iter().filter_map(|&c| state.board.get(c)) {
        if from.dice < 2 {
            continue;
        }
        for to in from.neighbors.iter().filter_map(|&n| state.board.get(n)) {
            let barbarian_held = to
                .owner
                .and_then(|o| state.player(o))
                .is_some_and(|p| p.barbarian);
            if barbarian_held {
                continue;
            }
            let score = f64::from(from.dice) - f64::from(to.dice);
            if best.is_none_or(|b| score > b.score) {
                best = Some(Candidate {
                    from: from.id,
                    to: to.id,
                    score,
                });
            }
        }
    }
    best.filter(|b| b.score >= 0.0)
}

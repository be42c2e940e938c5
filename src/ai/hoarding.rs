//! Hard play.
//!
//! Reinforcements that do not fit on the main region are lost, so the hard
//! AI measures how far its income overflows the free space there and only
//! spends stacks when the overflow would waste them anyway. Joining
//! territory is always taken.

use tracing::debug;

use super::heuristics::{Candidate, attack_pairs, is_move_connecting, rank, win_probability};
use crate::game::{GameState, MAX_DICE, PlayerId};

/// Income plus reserve minus free slots on the largest region.
///
/// Positive means next turn's dice will not all fit.
#[must_use]
pub fn overflow(state: &GameState, player: PlayerId) -> i64 {
    let Some(me) = state.player(player) else {
        return 0;
    };
    let free: i64 = me
        .largest_region
        .iter()
        .filter_map(|&c| state.board.get(c))
        .map(|c| i64::from(MAX_DICE.saturating_sub(c.dice)))
        .sum();
    i64::from(me.largest_region_size()) + i64::from(me.reserve) - free
}

/// Every acceptable attack for `player`, best first.
#[must_use]
pub fn candidates(state: &GameState, player: PlayerId) -> Vec<Candidate> {
    let Some(me) = state.player(player) else {
        return Vec::new();
    };
    let overflow = overflow(state, player);

    let mut moves: Vec<Candidate> = attack_pairs(state, player)
        .filter_map(|(from, to)| {
            let connecting = is_move_connecting(state, player, from, to);
            if to.owner.is_some_and(|o| me.is_allied_with(o)) && !connecting {
                return None;
            }
            let p = win_probability(from.dice, to.dice);

            let score = if overflow <= 0 {
                if connecting && p > 0.4 { 5000.0 } else { return None }
            } else if connecting && p > 0.4 {
                2000.0
            } else if me.largest_region.contains(&from.id) {
                match from.dice {
                    MAX_DICE => {
                        let mut s = p * 1000.0;
                        if to.dice <= 2 {
                            s += 200.0;
                        }
                        if to.dice >= 6 {
                            s -= 100.0;
                        }
                        s
                    }
                    6..MAX_DICE => p * 500.0,
                    _ if overflow > 10 => p * 100.0,
                    _ => return None,
                }
            } else {
                return None;
            };

            (score > 0.0).then_some(Candidate {
                from: from.id,
                to: to.id,
                score,
            })
        })
        .collect();
    rank(&mut moves);
    moves
}

/// Pick an attack, or `None` to keep hoarding.
#[must_use]
pub fn choose(state: &GameState, player: PlayerId) -> Option<Candidate> {
    let moves = candidates(state, player);
    let chosen = moves.first().copied();
    debug!(
        player,
        overflow = overflow(state, player),
        options = moves.len(),
        ?chosen,
        "hoarding move"
    );
    chosen
}

//! Easy and normal play: take the likeliest wins, prefer joining territory.

use tracing::debug;

use super::heuristics::{Candidate, attack_pairs, is_move_connecting, rank, win_probability};
use crate::game::{GameState, MAX_DICE, Personality, PlayerId};
use crate::rng::RandomSource;

/// Odds below which no tier attacks.
const HOPELESS: f64 = 0.2;

/// Easy play picks among this many of the best moves.
const EASY_SPREAD: usize = 3;

/// Extra score per grudge point.
const GRUDGE_WEIGHT: f64 = 5.0;

/// Cap on the grudge bonus.
const GRUDGE_CAP: f64 = 25.0;

/// Strength of a standard player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Sloppy; picks loosely among good moves.
    Easy,
    /// Always takes the best-scored move.
    Normal,
}

impl Tier {
    fn floor(self) -> f64 {
        match self {
            Self::Easy => 0.4,
            Self::Normal => 0.5,
        }
    }
}

/// Every acceptable attack for `player`, best first.
#[must_use]
pub fn candidates(state: &GameState, player: PlayerId, tier: Tier) -> Vec<Candidate> {
    let Some(me) = state.player(player) else {
        return Vec::new();
    };
    let floor = match me.personality {
        Personality::Aggressive => tier.floor() - 0.05,
        Personality::Kind => tier.floor() + 0.05,
        _ => tier.floor(),
    };

    let mut moves: Vec<Candidate> = attack_pairs(state, player)
        .filter_map(|(from, to)| {
            let p = win_probability(from.dice, to.dice);
            if p < HOPELESS || p < floor {
                return None;
            }
            let connecting = is_move_connecting(state, player, from, to);
            if let Some(owner) = to.owner
                && me.is_allied_with(owner)
                && !connecting
                && !me.was_betrayed_by(owner)
            {
                return None;
            }

            let mut score = p * 100.0;
            if connecting {
                score += 500.0;
            }
            if from.dice == MAX_DICE {
                score += 50.0;
            }
            if to.dice == 1 {
                score += 30.0;
            }
            if me.personality == Personality::Aggressive {
                score += 10.0;
            }
            if let Some(owner) = to.owner {
                score += (f64::from(me.grudge_against(owner)) * GRUDGE_WEIGHT).min(GRUDGE_CAP);
            }
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

/// Pick an attack, or `None` to stop attacking.
pub fn choose<R: RandomSource>(
    state: &GameState,
    player: PlayerId,
    tier: Tier,
    rng: &mut R,
) -> Option<Candidate> {
    let moves = candidates(state, player, tier);
    let pick = if tier == Tier::Easy && moves.len() > EASY_SPREAD {
        rng.index(EASY_SPREAD)
    } else {
        0
    };
    let chosen = moves.get(pick).copied();
    debug!(player, ?tier, options = moves.len(), ?chosen, "standard move");
    chosen
}

//! AI decision engine.
//!
//! The AI only reads the game: [`choose_move`] inspects a `&GameState` and
//! proposes one move, which the caller submits through the same
//! [`GameState::apply`] path a person would use. [`take_turn`] is the loop
//! headless callers use to let the AI play out a whole turn.
//!
//! Strategies:
//!
//! | Strategy | Who | Idea |
//! |----------|-----|------|
//! | [`Strategy::Barbarian`] | barbarian hordes | greedy dice margin |
//! | [`Strategy::Standard`] | easy, normal | best odds, join territory |
//! | [`Strategy::Hoarding`] | hard | only spend dice that would overflow |

pub mod barbarian;
pub mod heuristics;
pub mod hoarding;
pub mod standard;
pub mod surrender;

use tracing::{debug, warn};

use crate::error::GameError;
use crate::game::{Action, CellId, Difficulty, GameState, Outcome, Player, PlayerId};
use crate::rng::RandomSource;

pub use heuristics::{are_connected, is_move_connecting, win_probability};
pub use standard::Tier;
pub use surrender::{mark_prompted, surrender_prompt_due, surrender_target};

/// A move proposed by the AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiMove {
    /// Attack `to` from `from`.
    Attack {
        /// Source cell.
        from: CellId,
        /// Target cell.
        to: CellId,
    },
    /// Give up, handing territory to `to`.
    Surrender {
        /// Recipient, `None` to split among neighbors.
        to: Option<PlayerId>,
    },
    /// Stop attacking and reinforce.
    EndTurn,
}

impl AiMove {
    /// The engine action for this move made by `player`.
    #[must_use]
    pub const fn into_action(self, player: PlayerId) -> Action {
        match self {
            Self::Attack { from, to } => Action::Attack { from, to },
            Self::Surrender { to } => Action::Surrender { player, to },
            Self::EndTurn => Action::EndTurn,
        }
    }
}

/// How a player picks attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Greedy horde.
    Barbarian,
    /// Odds-driven play at the given strength.
    Standard(Tier),
    /// Capacity-aware hard play.
    Hoarding,
}

impl Strategy {
    /// The strategy for `player` at `difficulty`.
    #[must_use]
    pub const fn for_player(player: &Player, difficulty: Difficulty) -> Self {
        if player.barbarian {
            return Self::Barbarian;
        }
        match difficulty {
            Difficulty::Easy => Self::Standard(Tier::Easy),
            Difficulty::Normal => Self::Standard(Tier::Normal),
            Difficulty::Hard => Self::Hoarding,
        }
    }
}

/// Propose the next move for `player`.
///
/// Consumes randomness only for the easy tier's loose pick. When no attack
/// is worth making a civilization checks whether to surrender.
pub fn choose_move<R: RandomSource>(state: &GameState, player: PlayerId, rng: &mut R) -> AiMove {
    let Some(me) = state.player(player).filter(|p| p.alive) else {
        return AiMove::EndTurn;
    };
    if state.is_over() {
        return AiMove::EndTurn;
    }

    let strategy = Strategy::for_player(me, state.difficulty);
    let attack = match strategy {
        Strategy::Barbarian => barbarian::choose(state, player),
        Strategy::Standard(tier) => standard::choose(state, player, tier, rng),
        Strategy::Hoarding => hoarding::choose(state, player),
    };
    if let Some(c) = attack {
        return AiMove::Attack {
            from: c.from,
            to: c.to,
        };
    }

    if strategy != Strategy::Barbarian
        && let Some(leader) = surrender_target(state, player)
    {
        debug!(player, leader, "ai surrenders");
        return AiMove::Surrender { to: Some(leader) };
    }
    AiMove::EndTurn
}

/// What happened during an AI-played turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    /// Actions applied, in order.
    pub actions: Vec<Action>,
    /// Outcomes of those actions.
    pub outcomes: Vec<Outcome>,
    /// The action limit was hit and the turn was ended by force.
    pub stalled: bool,
}

/// Let the AI play the active player's turn to completion.
///
/// Stops after the turn ends, the player surrenders or the game is won. At
/// most `max_actions` attacks are made before the turn is ended by force.
///
/// # Errors
///
/// Returns a `GameError` if the engine rejects a proposed move, which means
/// the AI and the rules disagree.
pub fn take_turn(state: &mut GameState, max_actions: usize) -> Result<TurnReport, GameError> {
    let player = state.active;
    let mut report = TurnReport::default();

    while !state.is_over() && state.active == player {
        let mut rng = state.take_rng();
        let mv = choose_move(state, player, &mut rng);
        state.restore_rng(rng);

        let mv = if report.actions.len() >= max_actions && matches!(mv, AiMove::Attack { .. }) {
            warn!(player, max_actions, "ai action limit reached, ending turn");
            report.stalled = true;
            AiMove::EndTurn
        } else {
            mv
        };
        let action = mv.into_action(player);
        let outcome = state.apply(action)?;
        report.actions.push(action);
        report.outcomes.push(outcome);

        if !matches!(mv, AiMove::Attack { .. }) {
            break;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{duel_board, line_board, two_player_state};
    use crate::game::{Personality, Phase};
    use crate::rng::{GameRng, ScriptedRng};

    #[test]
    fn test_strategy_selection() {
        let civ = Player::new(0, false, Personality::Normal);
        let horde = Player::barbarian(1);
        assert_eq!(Strategy::for_player(&civ, Difficulty::Hard), Strategy::Hoarding);
        assert_eq!(
            Strategy::for_player(&civ, Difficulty::Easy),
            Strategy::Standard(Tier::Easy)
        );
        assert_eq!(Strategy::for_player(&horde, Difficulty::Hard), Strategy::Barbarian);
    }

    #[test]
    fn test_choose_move_attacks_good_odds() {
        let state = two_player_state(duel_board());
        let mut rng = ScriptedRng::new(vec![0.5]);
        // Cell 1 (5 dice) against cell 2 (2 dice)
        assert_eq!(
            choose_move(&state, 0, &mut rng),
            AiMove::Attack { from: 1, to: 2 }
        );
    }

    #[test]
    fn test_choose_move_ends_turn_without_options() {
        let mut board = line_board(2);
        for cell in board.cells_mut() {
            cell.owner = Some(u8::try_from(cell.id).unwrap());
            cell.dice = 1;
        }
        let state = two_player_state(board);
        let mut rng = ScriptedRng::new(vec![0.5]);
        assert_eq!(choose_move(&state, 0, &mut rng), AiMove::EndTurn);
    }

    #[test]
    fn test_choose_move_is_read_only_and_deterministic() {
        let state = two_player_state(duel_board());
        let mut a = GameRng::new("x");
        let mut b = GameRng::new("x");
        let before = state.board.clone();
        assert_eq!(choose_move(&state, 0, &mut a), choose_move(&state, 0, &mut b));
        assert_eq!(state.board, before);
    }

    #[test]
    fn test_take_turn_passes_control() {
        let mut state = two_player_state(duel_board());
        let report = take_turn(&mut state, 50).unwrap();

        assert!(!report.actions.is_empty());
        assert!(!report.stalled);
        let last = report.actions.last().unwrap();
        assert!(state.is_over() || *last == Action::EndTurn);
        if state.phase == Phase::Play {
            assert_eq!(state.active, 1);
        }
    }

    #[test]
    fn test_take_turn_action_limit() {
        let mut state = two_player_state(duel_board());
        let report = take_turn(&mut state, 0).unwrap();
        assert!(report.stalled);
        assert_eq!(report.actions, vec![Action::EndTurn]);
    }
}

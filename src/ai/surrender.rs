//! When to give up.

use crate::game::{GameMode, GameState, Player, PlayerId};

/// Rounds before an AI will consider surrendering.
const AI_MIN_TURN: f64 = 20.0;

/// Cell share of the leader below which an AI gives up.
const AI_CELL_RATIO: f64 = 0.15;

/// Dice share of the leader below which an AI gives up.
const AI_DICE_RATIO: f64 = 0.2;

/// Cell and dice share below which a human is offered surrender.
const PROMPT_RATIO: f64 = 0.2;

/// Conquest games do not prompt before this round.
const CONQUEST_GRACE_ROUNDS: u32 = 5;

fn ratio(mine: usize, theirs: usize) -> f64 {
    if theirs == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let r = mine as f64 / theirs as f64;
    r
}

fn dice_ratio(me: &Player, leader: &Player) -> f64 {
    if leader.total_dice == 0 {
        return 1.0;
    }
    f64::from(me.total_dice) / f64::from(leader.total_dice)
}

/// The leader an AI should surrender to, if its position is hopeless.
///
/// Requires a long game with more than two civilizations left and someone
/// else far ahead on both cells and dice.
#[must_use]
pub fn surrender_target(state: &GameState, player: PlayerId) -> Option<PlayerId> {
    if state.turn <= AI_MIN_TURN || state.alive_civilizations().count() <= 2 {
        return None;
    }
    let me = state.player(player).filter(|p| p.alive && p.is_civilization())?;
    let leader = state.leader().filter(|l| l.id != player)?;

    let hopeless = ratio(me.cell_count(), leader.cell_count()) < AI_CELL_RATIO
        && dice_ratio(me, leader) < AI_DICE_RATIO;
    hopeless.then_some(leader.id)
}

/// The leader to offer a human surrender to, once per game.
///
/// Suppressed early in conquest games while everyone is still expanding
/// out of a single starting cell.
#[must_use]
pub fn surrender_prompt_due(state: &GameState, player: PlayerId) -> Option<PlayerId> {
    let me = state
        .player(player)
        .filter(|p| p.alive && !p.surrender_prompted && p.cell_count() > 0)?;
    if state.alive_civilizations().count() <= 1 {
        return None;
    }
    if state.mode == GameMode::Conquest && state.round() < CONQUEST_GRACE_ROUNDS {
        return None;
    }
    let leader = state.leader().filter(|l| l.id != player)?;

    let behind = ratio(me.cell_count(), leader.cell_count()) < PROMPT_RATIO
        && dice_ratio(me, leader) < PROMPT_RATIO;
    behind.then_some(leader.id)
}

/// Record that `player` has seen the surrender offer.
pub fn mark_prompted(state: &mut GameState, player: PlayerId) {
    if let Some(p) = state.player_mut(player) {
        p.surrender_prompted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::line_board;
    use crate::game::{Personality, Player};

    /// P0 owns one 1-die cell, P1 and P2 split the rest with full stacks.
    fn lopsided(turn: f64) -> GameState {
        let mut board = line_board(20);
        for cell in board.cells_mut() {
            let (owner, dice) = match cell.id {
                0 => (0, 1),
                1..11 => (1, 8),
                _ => (2, 8),
            };
            cell.owner = Some(owner);
            cell.dice = dice;
        }
        let players = (0..3)
            .map(|id| Player::new(id, id == 0, Personality::Normal))
            .collect();
        let mut state = GameState::new(board, players, 0, "surrender");
        state.turn = turn;
        state
    }

    #[test]
    fn test_ai_surrenders_late_when_crushed() {
        assert_eq!(surrender_target(&lopsided(25.0), 0), Some(1));
        assert_eq!(surrender_target(&lopsided(10.0), 0), None);
        assert_eq!(surrender_target(&lopsided(25.0), 1), None, "leader never gives up");
        assert_eq!(surrender_target(&lopsided(25.0), 2), None);
    }

    #[test]
    fn test_ai_fights_on_in_a_duel() {
        let mut state = lopsided(25.0);
        state.players[2].eliminate();
        for cell in state.board.cells_mut() {
            if cell.owner == Some(2) {
                cell.owner = Some(1);
            }
        }
        state.rebuild_cell_sets();
        assert_eq!(surrender_target(&state, 0), None);
    }

    #[test]
    fn test_prompt_once() {
        let mut state = lopsided(2.0);
        assert_eq!(surrender_prompt_due(&state, 0), Some(1));
        mark_prompted(&mut state, 0);
        assert_eq!(surrender_prompt_due(&state, 0), None);
    }

    #[test]
    fn test_prompt_suppressed_early_in_conquest() {
        let mut state = lopsided(2.0);
        state.mode = GameMode::Conquest;
        assert_eq!(surrender_prompt_due(&state, 0), None);
        state.turn = 6.0;
        assert_eq!(surrender_prompt_due(&state, 0), Some(1));
    }
}

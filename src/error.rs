//! Error types for rule validation.
//!
//! A `GameError` means the requested action was rejected and the game state
//! was left untouched.

use thiserror::Error;

use crate::game::{CellId, PlayerId};

/// A rejected game action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    /// The game has reached victory; no further mutations are accepted.
    #[error("game is over")]
    GameOver,
    /// Cell id outside the board.
    #[error("unknown cell {0}")]
    UnknownCell(CellId),
    /// Player id outside the roster.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// The acting player does not hold the turn.
    #[error("player {player} cannot act, it is player {active}'s turn")]
    NotYourTurn {
        /// Player that tried to act.
        player: PlayerId,
        /// Player holding the turn.
        active: PlayerId,
    },
    /// Source cell belongs to someone else.
    #[error("cell {cell} is not owned by player {player}")]
    NotOwner {
        /// Offending cell.
        cell: CellId,
        /// Acting player.
        player: PlayerId,
    },
    /// Attacks need at least two dice on the source cell.
    #[error("cell {cell} has {dice} dice, an attack needs at least 2")]
    InsufficientDice {
        /// Source cell.
        cell: CellId,
        /// Dice on it.
        dice: u8,
    },
    /// Attack target does not border the source.
    #[error("cells {from} and {to} are not adjacent")]
    NotAdjacent {
        /// Source cell.
        from: CellId,
        /// Target cell.
        to: CellId,
    },
    /// Attack target already belongs to the attacker.
    #[error("cell {0} already belongs to the attacker")]
    OwnTarget(CellId),
    /// Not enough reserve dice for a paratroop drop.
    #[error("paratroop needs {needed} reserve dice, player has {available}")]
    InsufficientReserve {
        /// Reserve required.
        needed: u32,
        /// Reserve held.
        available: u32,
    },
    /// Paratroop target too far from the largest region.
    #[error("cell {0} is out of paratroop range")]
    OutOfRange(CellId),
    /// The player has already been eliminated.
    #[error("player {0} is no longer alive")]
    PlayerNotAlive(PlayerId),
    /// Surrender recipient is dead, unknown, or the surrendering player.
    #[error("player {0} cannot receive a surrender")]
    InvalidSurrenderTarget(PlayerId),
    /// `resolve_pending` or `cancel_attack` without a declared attack.
    #[error("no attack is pending")]
    NoPendingAttack,
    /// A declared attack must be resolved or cancelled first.
    #[error("an attack is already pending")]
    AttackPending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GameError::InsufficientDice { cell: 4, dice: 1 };
        assert_eq!(err.to_string(), "cell 4 has 1 dice, an attack needs at least 2");
        assert_eq!(GameError::GameOver.to_string(), "game is over");
    }
}

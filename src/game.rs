//! Game layer for hexdice.
//!
//! Implements the rules on top of a fixed hex board:
//! - Board of cells with owners and dice stacks
//! - Players with reserves, alliances, grudges and betrayal windows
//! - Regions and the reserve cap
//! - Attack and paratroop resolution
//! - End-of-turn reinforcement and turn rotation
//! - Surrender

pub mod combat;
mod events;
mod hex;
pub mod invariants;
mod map;
mod player;
pub mod region;
pub mod reinforce;
mod state;
pub mod surrender;

pub use combat::AttackOutcome;
pub use events::GameEvent;
pub use hex::Hex;
pub use map::{Board, Cell, CellId, MAX_DICE};
pub use player::{BARBARIAN_COLOR, PLAYER_COLORS, Personality, Player, PlayerId, RollStats};
pub use region::Region;
pub use reinforce::TurnSummary;
pub use state::{
    Action, Alliances, AttackRef, DiceDisplay, Difficulty, GameMode, GameOptions, GameState,
    MAX_PLAYERS, Outcome, Phase,
};
pub use surrender::SurrenderSummary;

// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! hexdice: a deterministic hex-grid dice conquest engine.
//!
//! Players own hex cells stacked with dice, attack neighbors by rolling one
//! die per die on the cell, and are reinforced by the size of their largest
//! connected region. This crate provides:
//! - Seeded map generation with water carving
//! - The authoritative rules engine with a single validated action path
//! - Heuristic AI opponents, including a capacity-aware hard mode
//! - Save/restore, custom maps, recordings and headless batch runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI · Tournament · Replay         │
//! ├─────────────────────────────────────┤
//! │   AI decision engine                │
//! ├─────────────────────────────────────┤
//! │   Turn & combat engine              │
//! ├─────────────────────────────────────┤
//! │   Game state & regions · Map gen    │
//! ├─────────────────────────────────────┤
//! │   Deterministic RNG                 │
//! └─────────────────────────────────────┘
//! ```
//!
//! Two independent seeded streams drive a game: the map stream for layout,
//! ownership and personalities, and the gameplay stream for dice. Same seeds
//! plus same actions always give the same game.

pub mod ai;
pub mod config;
pub mod custom_map;
pub mod error;
pub mod game;
pub mod mapgen;
pub mod persistence;
pub mod replay;
pub mod rng;
pub mod setup;
pub mod tournament;

pub use ai::{AiMove, Strategy, choose_move};
pub use config::GameSettings;
pub use error::GameError;
pub use setup::new_game;

// Re-export key game types at crate root for convenience
pub use game::{Action, Board, Cell, CellId, GameEvent, GameState, Outcome, Player, PlayerId};
pub use rng::{GameRng, GameSeeds, RandomSource};

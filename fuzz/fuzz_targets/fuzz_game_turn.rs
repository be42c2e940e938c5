#![no_main]

//! Full game turn fuzzer.
//!
//! Starts a generated game and interleaves arbitrary moves with AI turns:
//! 1. Apply fuzzer moves for the active player
//! 2. Let the AI finish the turn
//! 3. Check invariants after every accepted move
//!
//! This catches integration bugs that individual component fuzzers miss.

use arbitrary::Arbitrary;
use hexdice::ai;
use hexdice::config::GameSettings;
use hexdice::game::invariants::check_invariants;
use hexdice::game::{Action, GameMode};
use hexdice::rng::GameSeeds;
use hexdice::setup::new_game;
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated move.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzMove {
    Attack { from: u8, to: u8 },
    Paratroop { target: u8 },
    EndTurn,
    Surrender { player: u8, to: Option<u8> },
}

impl FuzzMove {
    fn into_action(self) -> Action {
        match self {
            Self::Attack { from, to } => Action::Attack {
                from: usize::from(from),
                to: usize::from(to),
            },
            Self::Paratroop { target } => Action::Paratroop {
                target: usize::from(target),
            },
            Self::EndTurn => Action::EndTurn,
            Self::Surrender { player, to } => Action::Surrender {
                player: player % 9,
                to: to.map(|t| t % 9),
            },
        }
    }
}

/// Structured input for full game fuzzing.
#[derive(Arbitrary, Debug)]
struct GameTurnInput {
    /// Civilizations, reduced to 2..=8.
    players: u8,
    /// Land cells, reduced to 20..=99.
    cells: u8,
    /// Play conquest rules with barbarians.
    conquest: bool,
    /// Lose dice placed outside the largest region.
    corruption: bool,
    /// Map and gameplay seed.
    seed: u64,
    /// Moves tried before each AI turn.
    moves: Vec<FuzzMove>,
    /// Number of AI turns to simulate.
    turns: u8,
}

fuzz_target!(|input: GameTurnInput| {
    let settings = GameSettings {
        players: usize::from(input.players % 7) + 2,
        cell_count: usize::from(input.cells % 80) + 20,
        mode: if input.conquest {
            GameMode::Conquest
        } else {
            GameMode::Classic
        },
        corruption: input.corruption,
        ..GameSettings::default()
    };
    let Ok(mut state) = new_game(&settings, &GameSeeds::from_number(input.seed)) else {
        return;
    };

    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "invariants violated at setup: {violations:?}");

    let turns = (input.turns % 20).max(1);
    let mut moves = input.moves.iter().take(200).copied();

    for _ in 0..turns {
        if state.is_over() {
            break;
        }

        for fuzz_move in moves.by_ref().take(5) {
            if state.apply(fuzz_move.into_action()).is_ok() {
                let violations = check_invariants(&state);
                assert!(violations.is_empty(), "invariants violated after {fuzz_move:?}: {violations:?}");
            }
            if state.is_over() {
                break;
            }
        }

        if state.is_over() {
            break;
        }
        let report = ai::take_turn(&mut state, 200).expect("AI turn failed");
        assert!(report.actions.len() <= 201);

        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "invariants violated after AI turn: {violations:?}");
        for player in state.alive_players() {
            assert!(player.reserve <= player.largest_region_size());
        }
    }

    if state.is_over() {
        assert!(state.apply(Action::EndTurn).is_err());
    }
});

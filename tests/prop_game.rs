//! Property-based tests for game mechanics.
//!
//! These tests check combat conservation, the reserve cap, map generation
//! and determinism over random inputs.
//! Run with: `cargo test --release prop_game`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use hexdice::ai;
use hexdice::config::GameSettings;
use hexdice::game::invariants::check_invariants;
use hexdice::game::{Action, Board, GameState, Hex, MAX_DICE, Outcome, Personality, Player};
use hexdice::mapgen::{MapGenConfig, connected_components, generate_layout};
use hexdice::rng::{GameRng, GameSeeds};
use hexdice::setup::new_game;
use hexdice::tournament::{MatchConfig, run_game};

/// P0 holds cell 0, P1 holds cells 1 and 2, all in a row.
fn skirmish(attacker: u8, defender: u8, seed: &str) -> GameState {
    let hexes: Vec<Hex> = (0..3).map(|q| Hex::new(q, 0)).collect();
    let mut board = Board::from_hexes(&hexes);
    for (cell, (owner, dice)) in board
        .cells_mut()
        .iter_mut()
        .zip([(0, attacker), (1, defender), (1, 1)])
    {
        cell.owner = Some(owner);
        cell.dice = dice;
    }
    let players = vec![
        Player::new(0, false, Personality::Normal),
        Player::new(1, false, Personality::Normal),
    ];
    GameState::new(board, players, 0, seed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// A won attack removes exactly the defender's dice from the board; a
    /// lost one removes all but one of the attacker's.
    #[test]
    fn prop_attack_conserves_dice(
        attacker in 2u8..=MAX_DICE,
        defender in 1u8..=MAX_DICE,
        seed in "[a-z]{1,8}"
    ) {
        let mut state = skirmish(attacker, defender, &seed);
        let before = state.board.dice_on_board();

        let Outcome::Attack(outcome) = state.apply(Action::Attack { from: 0, to: 1 }).unwrap() else {
            panic!("attack produced a non-attack outcome");
        };
        let after = state.board.dice_on_board();

        prop_assert_eq!(state.board.get(0).unwrap().dice, 1);
        if outcome.captured {
            prop_assert!(outcome.attack.total > outcome.defense.total);
            prop_assert_eq!(before - after, u32::from(defender));
            prop_assert_eq!(state.board.get(1).unwrap().owner, Some(0));
            prop_assert_eq!(state.board.get(1).unwrap().dice, attacker - 1);
        } else {
            prop_assert!(outcome.attack.total <= outcome.defense.total);
            prop_assert_eq!(before - after, u32::from(attacker - 1));
            prop_assert_eq!(state.board.get(1).unwrap().owner, Some(1));
            prop_assert_eq!(state.board.get(1).unwrap().dice, defender);
        }
        prop_assert!(check_invariants(&state).is_empty());
    }

    /// Rolls stay inside 1..=6 per die and count the dice thrown.
    #[test]
    fn prop_roll_faces_in_range(dice in 1u8..=MAX_DICE, seed in "[a-z0-9]{1,12}") {
        use hexdice::rng::RandomSource;
        let mut rng = GameRng::new(&seed);
        let roll = rng.roll_dice(dice);
        prop_assert_eq!(roll.count(), u32::from(dice));
        prop_assert!(roll.faces.iter().all(|f| (1..=6).contains(f)));
        let sum: u32 = roll.faces.iter().map(|&f| u32::from(f)).sum();
        prop_assert_eq!(roll.total, sum);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Generated boards have symmetric adjacency and one landmass.
    #[test]
    fn prop_generated_board_is_consistent(
        cells in 10usize..200,
        water in 0.0f64..0.6,
        players in 2usize..=8,
        seed in "[a-z]{1,8}"
    ) {
        prop_assume!(cells >= players);
        let config = MapGenConfig { cell_count: cells, water_level: water, players };
        let board = generate_layout(&config, &mut GameRng::new(&seed)).unwrap();

        for cell in board.iter() {
            prop_assert!(!cell.neighbors.contains(&cell.id));
            for &n in &cell.neighbors {
                prop_assert!(n < board.len());
                prop_assert!(board.are_adjacent(n, cell.id));
            }
        }
        prop_assert_eq!(connected_components(board.cells()).len(), 1);
    }

    /// Setup hands every civilization at least one cell and stays valid.
    #[test]
    fn prop_new_game_is_valid(
        players in 2usize..=8,
        cells in 30usize..120,
        seed in any::<u64>()
    ) {
        let settings = GameSettings { players, cell_count: cells, ..GameSettings::default() };
        let state = new_game(&settings, &GameSeeds::from_number(seed)).unwrap();
        prop_assert_eq!(state.players.len(), players);
        for player in &state.players {
            prop_assert!(player.cell_count() > 0);
        }
        prop_assert!(state.board.iter().all(|c| c.owner.is_some() && c.dice >= 1));
        prop_assert!(check_invariants(&state).is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// The reserve never exceeds the largest region after any AI turn.
    #[test]
    fn prop_reserve_capped_by_region(seed in any::<u64>(), players in 2usize..=5) {
        let settings = GameSettings { players, cell_count: 60, ..GameSettings::default() };
        let mut state = new_game(&settings, &GameSeeds::from_number(seed)).unwrap();
        for _ in 0..60 {
            if state.is_over() {
                break;
            }
            ai::take_turn(&mut state, 200).unwrap();
            for player in &state.players {
                prop_assert!(
                    player.reserve <= player.largest_region_size(),
                    "player {} holds {} reserve with a region of {}",
                    player.id,
                    player.reserve,
                    player.largest_region_size()
                );
            }
        }
    }

    /// The same seeds always play out the same game.
    #[test]
    fn prop_games_are_deterministic(seed in any::<u64>()) {
        let config = MatchConfig {
            settings: GameSettings { players: 3, cell_count: 40, ..GameSettings::default() },
            max_rounds: 80,
            ..MatchConfig::default()
        };
        let seeds = GameSeeds::from_number(seed);
        let a = run_game(&seeds, &config).unwrap();
        let b = run_game(&seeds, &config).unwrap();
        prop_assert_eq!(a, b);
    }
}

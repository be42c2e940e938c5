//! Multi-turn integration tests.
//!
//! These tests play whole games through the public API and check that they
//! finish, stay consistent and can be saved and resumed mid-game.
//!
//! Run with: `cargo test --release game_integration`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use hexdice::ai;
use hexdice::config::GameSettings;
use hexdice::game::invariants::check_invariants;
use hexdice::game::{Action, Difficulty, GameMode};
use hexdice::persistence;
use hexdice::rng::GameSeeds;
use hexdice::setup::new_game;
use hexdice::tournament::{MatchConfig, run_game};

fn settings(players: usize, cells: usize) -> GameSettings {
    GameSettings {
        players,
        cell_count: cells,
        ..GameSettings::default()
    }
}

#[test]
fn test_classic_games_finish() {
    for seed in 0..5 {
        let config = MatchConfig {
            settings: settings(4, 60),
            ..MatchConfig::default()
        };
        let result = run_game(&GameSeeds::from_number(seed), &config).unwrap();
        assert!(result.rounds <= config.max_rounds + 1);
        if let Some(winner) = result.winner {
            assert!(result.player_stats[usize::from(winner)].final_cells > 0);
        }
    }
}

#[test]
fn test_every_difficulty_plays() {
    for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
        let mut s = settings(3, 50);
        s.difficulty = difficulty;
        let config = MatchConfig {
            settings: s,
            max_rounds: 150,
            ..MatchConfig::default()
        };
        let result = run_game(&GameSeeds::from_number(9), &config).unwrap();
        let attacks: u32 = result.player_stats.iter().map(|p| p.attacks).sum();
        assert!(attacks > 0, "{difficulty:?} never attacked");
    }
}

#[test]
fn test_conquest_game_with_barbarians() {
    let mut s = settings(3, 80);
    s.mode = GameMode::Conquest;
    let config = MatchConfig {
        settings: s,
        max_rounds: 200,
        ..MatchConfig::default()
    };
    let result = run_game(&GameSeeds::from_number(21), &config).unwrap();
    assert_eq!(result.player_stats.len(), 4);
    assert!(result.player_stats[3].barbarian);
    if let Some(winner) = result.winner {
        assert!(!result.player_stats[usize::from(winner)].barbarian);
    }
}

#[test]
fn test_invariants_hold_every_turn() {
    let mut state = new_game(&settings(4, 80), &GameSeeds::new("inv-map", "inv-play")).unwrap();
    for _ in 0..200 {
        if state.is_over() {
            break;
        }
        ai::take_turn(&mut state, 200).unwrap();
        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "{violations:?}");
        for player in state.alive_players() {
            assert!(player.reserve <= player.largest_region_size());
        }
    }
}

#[test]
fn test_save_and_resume_mid_game() {
    let seeds = GameSeeds::new("resume-map", "resume-play");
    let mut original = new_game(&settings(3, 50), &seeds).unwrap();
    for _ in 0..10 {
        ai::take_turn(&mut original, 200).unwrap();
    }

    let mut restored = persistence::from_json(&persistence::to_json(&original).unwrap()).unwrap();
    for _ in 0..10 {
        if original.is_over() {
            break;
        }
        let a = ai::take_turn(&mut original, 200).unwrap();
        let b = ai::take_turn(&mut restored, 200).unwrap();
        assert_eq!(a.actions, b.actions);
    }
    assert_eq!(original.board, restored.board);
    assert_eq!(original.log, restored.log);
}

#[test]
fn test_surrender_to_leader() {
    let mut state = new_game(&settings(3, 40), &GameSeeds::new("sur-map", "sur-play")).unwrap();
    let leader = state.leader().unwrap().id;
    let quitter = (0..3).find(|&p| p != leader).unwrap();
    let leader_cells = state.player(leader).unwrap().cell_count();
    let quitter_cells = state.player(quitter).unwrap().cell_count();

    state
        .apply(Action::Surrender {
            player: quitter,
            to: Some(leader),
        })
        .unwrap();

    assert!(!state.player(quitter).unwrap().alive);
    assert_eq!(
        state.player(leader).unwrap().cell_count(),
        leader_cells + quitter_cells
    );
    assert!(check_invariants(&state).is_empty());
}

#[test]
fn test_moves_after_victory_rejected() {
    let config = MatchConfig {
        settings: settings(2, 20),
        ..MatchConfig::default()
    };
    let seeds = GameSeeds::from_number(4);
    let (result, actions) = hexdice::tournament::run_recorded(&seeds, &config).unwrap();
    if result.winner.is_none() {
        return;
    }
    let recording = hexdice::replay::Recording::new(config.settings, seeds, actions);
    let len = recording.actions.len();
    let mut engine = hexdice::replay::ReplayEngine::new_at(recording, len).unwrap();
    assert!(engine.state().is_over());
    assert!(engine.step_forward().is_err());
}

//! Random action sequences against the rules engine.
//!
//! Run with: `PROPTEST_CASES=100000 cargo test --release fuzz_actions`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use hexdice::config::GameSettings;
use hexdice::custom_map::CustomMap;
use hexdice::game::invariants::check_invariants;
use hexdice::game::Action;
use hexdice::persistence;
use hexdice::rng::GameSeeds;
use hexdice::setup::new_game;

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        6 => (0usize..70, 0usize..70).prop_map(|(from, to)| Action::Attack { from, to }),
        1 => (0usize..70).prop_map(|target| Action::Paratroop { target }),
        2 => Just(Action::EndTurn),
        1 => (0u8..5, proptest::option::of(0u8..5))
            .prop_map(|(player, to)| Action::Surrender { player, to }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Arbitrary actions never panic; rejected ones leave the state alone
    /// and accepted ones keep it consistent.
    #[test]
    fn fuzz_random_actions(
        seed in any::<u64>(),
        actions in proptest::collection::vec(action_strategy(), 1..120)
    ) {
        let settings = GameSettings { players: 4, cell_count: 50, ..GameSettings::default() };
        let mut state = new_game(&settings, &GameSeeds::from_number(seed)).unwrap();

        for action in actions {
            let before = persistence::to_json(&state).unwrap();
            match state.apply(action) {
                Ok(_) => {
                    let violations = check_invariants(&state);
                    prop_assert!(violations.is_empty(), "{action:?}: {violations:?}");
                }
                Err(_) => {
                    prop_assert_eq!(before, persistence::to_json(&state).unwrap());
                }
            }
            if state.is_over() {
                prop_assert!(state.apply(Action::EndTurn).is_err());
                break;
            }
        }
    }

    /// Garbage never panics the custom map or saved game loaders.
    #[test]
    fn fuzz_loaders_reject_garbage(input in ".{0,200}") {
        let _ = CustomMap::from_json(&input);
        let _ = persistence::from_json(&input);
    }

    /// Truncated saves are rejected rather than half-loaded.
    #[test]
    fn fuzz_truncated_save(seed in any::<u64>(), per_mille in 0usize..990) {
        let settings = GameSettings { players: 3, cell_count: 30, ..GameSettings::default() };
        let state = new_game(&settings, &GameSeeds::from_number(seed)).unwrap();
        let json = persistence::to_json(&state).unwrap();
        let end = json.len() * per_mille / 1000;
        let truncated: String = json.chars().take(end).collect();
        prop_assert!(persistence::from_json(&truncated).is_err());
    }
}

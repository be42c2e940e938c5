#![no_main]

use arbitrary::Arbitrary;
use hexdice::game::invariants::check_invariants;
use hexdice::game::{Action, Board, GameState, Hex, MAX_DICE, Outcome, Personality, Player};
use libfuzzer_sys::fuzz_target;

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Dice on the attacking cell.
    attacker_dice: u8,
    /// Dice on the defending cell.
    defender_dice: u8,
    /// Reserve held by the attacker.
    reserve: u8,
    /// Whether the two players are allied.
    allied: bool,
    /// Drop paratroopers instead of attacking from a cell.
    paratroop: bool,
    /// Gameplay seed.
    seed: String,
}

fuzz_target!(|input: CombatInput| {
    let attacker_dice = input.attacker_dice % MAX_DICE + 1;
    let defender_dice = input.defender_dice % MAX_DICE + 1;

    // P0 holds 0..=9, P1 holds 10 and 11, all in a row
    let hexes: Vec<Hex> = (0..12).map(|q| Hex::new(q, 0)).collect();
    let mut board = Board::from_hexes(&hexes);
    for cell in board.cells_mut() {
        let (owner, dice) = match cell.id {
            9 => (0, attacker_dice),
            10 => (1, defender_dice),
            11 => (1, 1),
            _ => (0, 1),
        };
        cell.owner = Some(owner);
        cell.dice = dice;
    }
    let mut players = vec![
        Player::new(0, false, Personality::Normal),
        Player::new(1, false, Personality::Normal),
    ];
    players[0].reserve = u32::from(input.reserve % 11);
    if input.allied {
        players[0].allies.insert(1);
        players[1].allies.insert(0);
    }
    let mut state = GameState::new(board, players, 0, &input.seed);

    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "invariants violated before combat: {violations:?}");

    let before = state.board.dice_on_board();
    let action = if input.paratroop {
        Action::Paratroop { target: 10 }
    } else {
        Action::Attack { from: 9, to: 10 }
    };

    let outcome = match state.apply(action) {
        Ok(Outcome::Attack(outcome)) => outcome,
        Ok(other) => panic!("attack produced {other:?}"),
        Err(_) => {
            // Only a short reserve or a dice-less source may be rejected
            assert!(input.paratroop || attacker_dice < 2);
            return;
        }
    };
    let after = state.board.dice_on_board();
    let target = state.board.get(10).unwrap();

    assert_eq!(outcome.captured, outcome.attack.total > outcome.defense.total);
    if outcome.captured {
        assert_eq!(target.owner, Some(0));
    } else {
        assert_eq!(target.owner, Some(1));
        assert_eq!(target.dice, defender_dice);
    }
    if !input.paratroop {
        assert_eq!(state.board.get(9).unwrap().dice, 1);
        let lost = if outcome.captured {
            u32::from(defender_dice)
        } else {
            u32::from(attacker_dice - 1)
        };
        assert_eq!(before - after, lost, "dice conservation violated");
    }
    if input.allied {
        assert!(state.players[1].was_betrayed_by(0));
    }
    assert!(state.players[1].grudge_against(0) >= 1);

    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "invariants violated after combat: {violations:?}");
});

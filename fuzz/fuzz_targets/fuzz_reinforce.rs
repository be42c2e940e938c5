#![no_main]

//! Reinforcement fuzzer.
//!
//! Random ownership, stacks and reserves on a small grid, then one end of
//! turn. Checks the dice accounting and the reserve cap.

use arbitrary::Arbitrary;
use hexdice::game::invariants::check_invariants;
use hexdice::game::{Action, Board, GameState, Hex, MAX_DICE, Outcome, Personality, Player};
use libfuzzer_sys::fuzz_target;

/// Structured input for reinforcement fuzzing.
#[derive(Arbitrary, Debug)]
struct ReinforceInput {
    /// Owner (mod 3) and dice per cell of a 6x6 grid.
    cells: [(u8, u8); 36],
    /// Reserve of each player before the turn ends.
    reserves: [u8; 3],
    /// Lose dice placed outside the largest region.
    corruption: bool,
    /// Player 2 is a barbarian.
    barbarian: bool,
    /// Gameplay seed.
    seed: u64,
}

fuzz_target!(|input: ReinforceInput| {
    let hexes: Vec<Hex> = (0..6)
        .flat_map(|r| (0..6).map(move |q| Hex::new(q, r)))
        .collect();
    let mut board = Board::from_hexes(&hexes);
    for (cell, &(owner, dice)) in board.cells_mut().iter_mut().zip(&input.cells) {
        cell.owner = Some(owner % 3);
        cell.dice = dice % MAX_DICE + 1;
    }
    let mut players = vec![
        Player::new(0, false, Personality::Normal),
        Player::new(1, false, Personality::Normal),
        if input.barbarian {
            Player::barbarian(2)
        } else {
            Player::new(2, false, Personality::Normal)
        },
    ];
    for (player, &reserve) in players.iter_mut().zip(&input.reserves) {
        player.reserve = u32::from(reserve);
    }
    let mut state = GameState::new(board, players, 0, &input.seed.to_string());
    state.options.corruption = input.corruption;
    if state.is_over() || !state.players[0].alive {
        return;
    }

    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "invariants violated before reinforcement: {violations:?}");

    let before_board = state.board.dice_on_board();
    let before_reserve = state.players[0].reserve;
    let summary = match state.apply(Action::EndTurn) {
        Ok(Outcome::TurnEnded(summary)) => summary,
        other => panic!("end of turn failed: {other:?}"),
    };

    let player = &state.players[0];
    assert_eq!(summary.player, 0);
    assert_eq!(summary.income, player.largest_region_size());
    assert_eq!(
        summary.income + before_reserve,
        summary.placed + summary.corrupted + summary.stored + summary.burned,
        "reinforcement pool not accounted for"
    );
    assert_eq!(state.board.dice_on_board(), before_board + summary.placed);
    assert_eq!(player.reserve, summary.stored);
    assert!(player.reserve <= player.largest_region_size());
    if !input.corruption {
        assert_eq!(summary.corrupted, 0);
    }
    assert!(state.board.iter().all(|c| (1..=MAX_DICE).contains(&c.dice)));

    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "invariants violated after reinforcement: {violations:?}");
});

//! Combat resolution.
//!
//! Both sides roll one die per die on their cell. The attacker must beat the
//! defender's sum outright; ties go to the defender. Either way the source
//! cell is left with a single die.
//!
//! Paratroop drops are funded from the reserve and roll a fixed strength
//! against any cell within a few hexes of the attacker's largest region.

use tracing::debug;

use crate::error::GameError;
use crate::game::{AttackRef, CellId, GameEvent, GameState, PlayerId};
use crate::rng::{DiceRoll, RandomSource};

/// Reserve dice spent on one paratroop drop.
pub const PARATROOP_COST: u32 = 8;

/// Dice rolled by a paratroop drop.
pub const PARATROOP_STRENGTH: u8 = 7;

/// Dice left on a cell captured by paratroopers.
pub const PARATROOP_GARRISON: u8 = 6;

/// Maximum hex distance from the largest region to a paratroop target.
pub const PARATROOP_RANGE: u32 = 4;

/// Turns an ally may retaliate after being betrayed.
pub const BETRAYAL_WINDOW: u8 = 2;

/// Result of one attack or paratroop drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Attacking player.
    pub player: PlayerId,
    /// Source cell, `None` for a paratroop drop.
    pub from: Option<CellId>,
    /// Target cell.
    pub to: CellId,
    /// Owner of the target before the attack.
    pub defender: Option<PlayerId>,
    /// Attacker's dice.
    pub attack: DiceRoll,
    /// Defender's dice.
    pub defense: DiceRoll,
    /// Whether the target changed hands.
    pub captured: bool,
}

impl AttackOutcome {
    /// Whether this was a paratroop drop.
    #[must_use]
    pub const fn is_paratroop(&self) -> bool {
        self.from.is_none()
    }
}

/// Check that the active player may attack `to` from `from`.
///
/// # Errors
///
/// Returns the first rule the attack breaks.
pub fn validate_attack(state: &GameState, from: CellId, to: CellId) -> Result<(), GameError> {
    state.ensure_playing()?;
    let source = state.board.get(from).ok_or(GameError::UnknownCell(from))?;
    let target = state.board.get(to).ok_or(GameError::UnknownCell(to))?;
    let player = state.active;

    if !source.is_owned_by(player) {
        return Err(GameError::NotOwner { cell: from, player });
    }
    if source.dice < 2 {
        return Err(GameError::InsufficientDice {
            cell: from,
            dice: source.dice,
        });
    }
    if !source.is_adjacent(to) {
        return Err(GameError::NotAdjacent { from, to });
    }
    if target.is_owned_by(player) {
        return Err(GameError::OwnTarget(to));
    }
    Ok(())
}

/// Resolve a regular attack by the active player.
///
/// # Errors
///
/// Returns a `GameError` if the attack is illegal; the state is unchanged.
pub fn resolve_attack<R: RandomSource>(
    state: &mut GameState,
    from: CellId,
    to: CellId,
    rng: &mut R,
) -> Result<AttackOutcome, GameError> {
    validate_attack(state, from, to)?;
    let player = state.active;
    let (attack_dice, defender, defense_dice) = {
        let source = state.board.get(from).ok_or(GameError::UnknownCell(from))?;
        let target = state.board.get(to).ok_or(GameError::UnknownCell(to))?;
        (source.dice, target.owner, target.dice)
    };

    record_aggression(state, player, defender);

    let attack = rng.roll_dice(attack_dice);
    let defense = rng.roll_dice(defense_dice);
    record_rolls(state, player, defender, &attack, &defense);

    let captured = attack.total > defense.total;
    if captured {
        state.transfer_cell(to, Some(player), attack_dice - 1);
    }
    if let Some(source) = state.board.get_mut(from) {
        source.dice = 1;
    }

    debug!(
        player,
        from,
        to,
        attack = attack.total,
        defense = defense.total,
        captured,
        "attack resolved"
    );
    state.push_event(GameEvent::Attack {
        player,
        from,
        to,
        attack: attack.total,
        attack_dice: attack.count(),
        defense: defense.total,
        defense_dice: defense.count(),
        captured,
    });
    state.last_attack = Some(AttackRef { from, to });
    state.settle();

    Ok(AttackOutcome {
        player,
        from: Some(from),
        to,
        defender,
        attack,
        defense,
        captured,
    })
}

/// Cells `player` could drop paratroopers on, in ascending id order.
///
/// A target is any cell not owned by `player` within range of its largest
/// region. Reserve is not checked.
#[must_use]
pub fn paratroop_targets(state: &GameState, player: PlayerId) -> Vec<CellId> {
    let Some(p) = state.player(player) else {
        return Vec::new();
    };
    let region: Vec<_> = p
        .largest_region
        .iter()
        .filter_map(|&c| state.board.get(c).map(|cell| cell.hex))
        .collect();
    if region.is_empty() {
        return Vec::new();
    }

    state
        .board
        .iter()
        .filter(|c| !c.is_owned_by(player))
        .filter(|c| region.iter().any(|h| h.distance(c.hex) <= PARATROOP_RANGE))
        .map(|c| c.id)
        .collect()
}

/// Resolve a paratroop drop by the active player.
///
/// # Errors
///
/// Returns a `GameError` if the reserve is short, the target is the
/// player's own, or out of range; the state is unchanged.
pub fn resolve_paratroop<R: RandomSource>(
    state: &mut GameState,
    target: CellId,
    rng: &mut R,
) -> Result<AttackOutcome, GameError> {
    state.ensure_playing()?;
    let player = state.active;
    let cell = state.board.get(target).ok_or(GameError::UnknownCell(target))?;
    if cell.is_owned_by(player) {
        return Err(GameError::OwnTarget(target));
    }
    let (defender, defense_dice) = (cell.owner, cell.dice);

    let available = state.player(player).map_or(0, |p| p.reserve);
    if available < PARATROOP_COST {
        return Err(GameError::InsufficientReserve {
            needed: PARATROOP_COST,
            available,
        });
    }
    if !paratroop_targets(state, player).contains(&target) {
        return Err(GameError::OutOfRange(target));
    }

    if let Some(p) = state.player_mut(player) {
        p.reserve -= PARATROOP_COST;
    }
    record_aggression(state, player, defender);

    let attack = rng.roll_dice(PARATROOP_STRENGTH);
    let defense = rng.roll_dice(defense_dice);
    record_rolls(state, player, defender, &attack, &defense);

    let captured = attack.total > defense.total;
    if captured {
        state.transfer_cell(target, Some(player), PARATROOP_GARRISON);
    }

    debug!(player, target, captured, "paratroop resolved");
    state.push_event(GameEvent::Paratroop {
        player,
        to: target,
        attack: attack.total,
        defense: defense.total,
        captured,
    });
    state.settle();

    Ok(AttackOutcome {
        player,
        from: None,
        to: target,
        defender,
        attack,
        defense,
        captured,
    })
}

/// Update grudges and betrayal windows before the dice are rolled.
fn record_aggression(state: &mut GameState, attacker: PlayerId, defender: Option<PlayerId>) {
    let Some(defender) = defender else {
        return;
    };
    let betrayal = state
        .player(attacker)
        .is_some_and(|p| p.is_allied_with(defender));

    if let Some(victim) = state.player_mut(defender) {
        *victim.grudges.entry(attacker).or_insert(0) += 1;
        if betrayal {
            victim.betrayals.insert(attacker, BETRAYAL_WINDOW);
        }
    }
    if betrayal {
        state.push_event(GameEvent::Betrayal {
            traitor: attacker,
            victim: defender,
        });
    }
}

fn record_rolls(
    state: &mut GameState,
    attacker: PlayerId,
    defender: Option<PlayerId>,
    attack: &DiceRoll,
    defense: &DiceRoll,
) {
    if let Some(p) = state.player_mut(attacker) {
        p.stats.my_rolls += attack.count();
        p.stats.my_roll_sum += attack.total;
        p.stats.opponent_rolls += defense.count();
        p.stats.opponent_roll_sum += defense.total;
        p.stats.turn_rolls += attack.count();
        p.stats.turn_roll_sum += attack.total;
    }
    if let Some(p) = defender.and_then(|d| state.player_mut(d)) {
        p.stats.my_rolls += defense.count();
        p.stats.my_roll_sum += defense.total;
        p.stats.opponent_rolls += attack.count();
        p.stats.opponent_roll_sum += attack.total;
    }
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use crate::game::MAX_DICE;

    /// A capture moves `dice - 1` onto the target, which stays in range.
    #[kani::proof]
    fn prove_capture_dice_in_range() {
        let dice: u8 = kani::any();
        kani::assume(dice >= 2 && dice <= MAX_DICE);
        let moved = dice - 1;
        assert!(moved >= 1 && moved < MAX_DICE);
    }

    /// Roll sums never overflow for any legal stack.
    #[kani::proof]
    fn prove_roll_sum_no_overflow() {
        let dice: u8 = kani::any();
        kani::assume(dice <= MAX_DICE);
        let max_sum = u32::from(dice) * 6;
        assert!(max_sum <= 48);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{duel_board, two_player_state};
    use crate::game::{Action, Board, Hex, Outcome};
    use crate::rng::ScriptedRng;

    #[test]
    fn test_attacker_captures_on_higher_sum() {
        let mut state = two_player_state(duel_board());
        // Cell 1 holds 5 dice, cell 2 holds 2
        let mut rng = ScriptedRng::faces(&[4, 4, 4, 4, 4, 3, 2]);

        let outcome = resolve_attack(&mut state, 1, 2, &mut rng).unwrap();

        assert!(outcome.captured);
        assert_eq!(outcome.attack.total, 20);
        assert_eq!(outcome.defense.total, 5);
        assert_eq!(state.board.get(2).unwrap().owner, Some(0));
        assert_eq!(state.board.get(2).unwrap().dice, 4);
        assert_eq!(state.board.get(1).unwrap().dice, 1);
        assert!(state.player(0).unwrap().cells.contains(&2));
    }

    #[test]
    fn test_tie_goes_to_defender() {
        let mut state = two_player_state(duel_board());
        // 5 dice summing to 10 vs 2 dice summing to 10
        let mut rng = ScriptedRng::faces(&[2, 2, 2, 2, 2, 5, 5]);

        let outcome = resolve_attack(&mut state, 1, 2, &mut rng).unwrap();

        assert!(!outcome.captured);
        assert_eq!(state.board.get(2).unwrap().owner, Some(1));
        assert_eq!(state.board.get(2).unwrap().dice, 2);
        assert_eq!(state.board.get(1).unwrap().dice, 1);
    }

    #[test]
    fn test_attack_rejections() {
        let state = two_player_state(duel_board());
        assert_eq!(
            validate_attack(&state, 0, 1),
            Err(GameError::OwnTarget(1)),
            "own cell must be rejected"
        );
        assert_eq!(
            validate_attack(&state, 0, 3),
            Err(GameError::NotAdjacent { from: 0, to: 3 })
        );
        assert_eq!(
            validate_attack(&state, 2, 1),
            Err(GameError::NotOwner { cell: 2, player: 0 })
        );
        assert_eq!(validate_attack(&state, 1, 99), Err(GameError::UnknownCell(99)));
    }

    #[test]
    fn test_single_die_cannot_attack() {
        let mut state = two_player_state(duel_board());
        state.board.get_mut(1).unwrap().dice = 1;
        assert_eq!(
            validate_attack(&state, 1, 2),
            Err(GameError::InsufficientDice { cell: 1, dice: 1 })
        );
    }

    #[test]
    fn test_grudge_and_betrayal_recorded() {
        let mut state = two_player_state(duel_board());
        state.players[0].allies.insert(1);
        state.players[1].allies.insert(0);
        let mut rng = ScriptedRng::faces(&[1]);

        resolve_attack(&mut state, 1, 2, &mut rng).unwrap();

        let victim = state.player(1).unwrap();
        assert_eq!(victim.grudge_against(0), 1);
        assert_eq!(victim.betrayals.get(&0), Some(&BETRAYAL_WINDOW));
        assert!(state.log.contains(&GameEvent::Betrayal { traitor: 0, victim: 1 }));
    }

    #[test]
    fn test_roll_stats_updated() {
        let mut state = two_player_state(duel_board());
        let mut rng = ScriptedRng::faces(&[3]);
        resolve_attack(&mut state, 1, 2, &mut rng).unwrap();

        let attacker = state.player(0).unwrap().stats;
        assert_eq!(attacker.my_rolls, 5);
        assert_eq!(attacker.turn_roll_sum, 15);
        assert_eq!(attacker.opponent_rolls, 2);
        let defender = state.player(1).unwrap().stats;
        assert_eq!(defender.my_rolls, 2);
        assert_eq!(defender.opponent_roll_sum, 15);
    }

    #[test]
    fn test_capture_of_last_cell_ends_game() {
        let hexes = vec![Hex::new(0, 0), Hex::new(1, 0)];
        let mut board = Board::from_hexes(&hexes);
        board.get_mut(0).unwrap().owner = Some(0);
        board.get_mut(0).unwrap().dice = 8;
        board.get_mut(1).unwrap().owner = Some(1);
        board.get_mut(1).unwrap().dice = 1;
        let mut state = two_player_state(board);

        let mut rng = ScriptedRng::faces(&[6, 6, 6, 6, 6, 6, 6, 6, 1]);
        let outcome = state.apply_with(Action::Attack { from: 0, to: 1 }, &mut rng).unwrap();

        assert!(matches!(outcome, Outcome::Attack(ref o) if o.captured));
        assert!(state.is_over());
        assert_eq!(state.winner(), Some(0));
        assert_eq!(state.board.get(1).unwrap().dice, 7);
    }

    #[test]
    fn test_paratroop_requires_reserve() {
        let mut state = two_player_state(duel_board());
        state.players[0].reserve = 2;
        let mut rng = ScriptedRng::faces(&[6]);
        assert_eq!(
            resolve_paratroop(&mut state, 3, &mut rng),
            Err(GameError::InsufficientReserve {
                needed: PARATROOP_COST,
                available: 2
            })
        );
    }

    #[test]
    fn test_paratroop_captures_with_garrison() {
        let hexes: Vec<Hex> = (0..12).map(|q| Hex::new(q, 0)).collect();
        let mut board = Board::from_hexes(&hexes);
        for cell in board.cells_mut() {
            cell.owner = Some(if cell.id < 9 { 0 } else { 1 });
            cell.dice = 1;
        }
        let mut state = two_player_state(board);
        state.players[0].reserve = 9;

        // Cell 11 is 3 hexes from cell 8
        assert!(paratroop_targets(&state, 0).contains(&11));
        let mut rng = ScriptedRng::faces(&[6, 6, 6, 6, 6, 6, 6, 1]);
        let outcome = resolve_paratroop(&mut state, 11, &mut rng).unwrap();

        assert!(outcome.captured);
        assert!(outcome.is_paratroop());
        assert_eq!(state.board.get(11).unwrap().dice, PARATROOP_GARRISON);
        assert_eq!(state.player(0).unwrap().reserve, 1);
        assert_eq!(state.player(1).unwrap().grudge_against(0), 1);
    }

    #[test]
    fn test_paratroop_out_of_range() {
        let hexes: Vec<Hex> = (0..20).map(|q| Hex::new(q, 0)).collect();
        let mut board = Board::from_hexes(&hexes);
        for cell in board.cells_mut() {
            cell.owner = Some(u8::from(cell.id > 8));
            cell.dice = 1;
        }
        let mut state = two_player_state(board);
        state.players[0].reserve = 8;

        let targets = paratroop_targets(&state, 0);
        assert!(targets.contains(&12), "distance 4 is in range");
        assert!(!targets.contains(&13));

        let mut rng = ScriptedRng::faces(&[6]);
        assert_eq!(
            resolve_paratroop(&mut state, 15, &mut rng),
            Err(GameError::OutOfRange(15))
        );
        assert_eq!(state.player(0).unwrap().reserve, 8);
    }
}

//! Initial ownership and starting dice.

use tracing::warn;

use crate::game::{Board, CellId, GameEvent, MAX_DICE, Player, PlayerId};
use crate::rng::RandomSource;

const STARTING_DICE_GUARD: u32 = 5_000;
const BONUS_GUARD: u32 = 500;
const CONQUEST_SAMPLE: usize = 100;

/// Split every cell among `players` civilizations.
///
/// Each player gets one random seed cell, then players take turns claiming
/// either a cell bordering their territory (with probability `compactness`)
/// or any random unowned cell.
pub fn assign_owners<R: RandomSource>(
    board: &mut Board,
    players: usize,
    compactness: f64,
    rng: &mut R,
) {
    if players == 0 {
        return;
    }
    for cell in board.cells_mut() {
        cell.owner = None;
    }

    let mut unowned: Vec<CellId> = (0..board.len()).collect();
    rng.shuffle(&mut unowned);

    for player in 0..players {
        let Some(id) = unowned.pop() else {
            break;
        };
        set_owner(board, id, player);
    }

    let mut current = 0usize;
    while !unowned.is_empty() {
        let mut found = false;

        if rng.next_f64() < compactness {
            let mut own: Vec<CellId> = board.owned_by(to_id(current)).map(|c| c.id).collect();
            rng.shuffle(&mut own);
            // Duplicates weight cells touching several owned cells
            let frontier: Vec<CellId> = own
                .iter()
                .filter_map(|&c| board.get(c))
                .flat_map(|c| c.neighbors.iter().copied())
                .filter(|&n| board.get(n).is_some_and(|c| c.owner.is_none()))
                .collect();
            if let Some(&target) = rng.choice(&frontier) {
                set_owner(board, target, current);
                unowned.retain(|&c| c != target);
                found = true;
            }
        }

        if !found && let Some(id) = unowned.pop() {
            set_owner(board, id, current);
        }
        current = (current + 1) % players;
    }
}

fn to_id(player: usize) -> PlayerId {
    PlayerId::try_from(player).unwrap_or(PlayerId::MAX)
}

fn set_owner(board: &mut Board, cell: CellId, player: usize) {
    if let Some(c) = board.get_mut(cell) {
        c.owner = Some(to_id(player));
    }
}

/// One die on every owned cell, then as many extra dice as cells per player.
pub fn distribute_starting_dice<R: RandomSource>(board: &mut Board, players: usize, rng: &mut R) {
    for cell in board.cells_mut() {
        cell.dice = u8::from(cell.owner.is_some());
    }

    for player in 0..players {
        let owned: Vec<CellId> = board.owned_by(to_id(player)).map(|c| c.id).collect();
        let mut pool = owned.len();
        let mut safe = 0;
        while pool > 0 && safe < STARTING_DICE_GUARD {
            safe += 1;
            let Some(&id) = rng.choice(&owned) else {
                break;
            };
            if let Some(cell) = board.get_mut(id)
                && cell.dice < MAX_DICE
            {
                cell.dice += 1;
                pool -= 1;
            }
        }
        if pool > 0 {
            warn!(player, pool, "starting dice left unplaced");
        }
    }
}

/// Conquest layout: spread-out strongholds for `civs`, barbarians elsewhere.
///
/// Starts are chosen greedily, each maximizing its distance to the nearest
/// earlier start over a sample of at most 100 candidates.
pub fn place_conquest<R: RandomSource>(
    board: &mut Board,
    civs: &[PlayerId],
    barbarian: PlayerId,
    rng: &mut R,
) {
    let mut starts: Vec<CellId> = Vec::with_capacity(civs.len());
    let mut potential: Vec<CellId> = (0..board.len()).collect();
    rng.shuffle(&mut potential);
    if let Some(first) = potential.pop() {
        starts.push(first);
    }

    for _ in 1..civs.len() {
        if potential.is_empty() {
            break;
        }
        let candidates = if potential.len() > CONQUEST_SAMPLE {
            let mut sample = potential.clone();
            rng.shuffle(&mut sample);
            sample.truncate(CONQUEST_SAMPLE);
            sample
        } else {
            potential.clone()
        };

        let mut best: Option<(CellId, u32)> = None;
        for &candidate in &candidates {
            let Some(hex) = board.get(candidate).map(|c| c.hex) else {
                continue;
            };
            let nearest = starts
                .iter()
                .filter_map(|&s| board.get(s))
                .map(|s| s.hex.distance(hex))
                .min()
                .unwrap_or(u32::MAX);
            if best.is_none_or(|(_, d)| nearest > d) {
                best = Some((candidate, nearest));
            }
        }
        if let Some((cell, _)) = best {
            starts.push(cell);
            potential.retain(|&c| c != cell);
        }
    }

    for cell in board.cells_mut() {
        cell.owner = Some(barbarian);
        cell.dice = u8::try_from(rng.rand_int(1, 3)).unwrap_or(1);
    }
    for (&cell, &civ) in starts.iter().zip(civs) {
        if let Some(c) = board.get_mut(cell) {
            c.owner = Some(civ);
            c.dice = MAX_DICE;
        }
    }
}

/// Bonus dice per turn position for a board of `cells` cells.
#[must_use]
pub fn turn_order_base(cells: usize) -> u32 {
    match cells {
        0..100 => 1,
        100..200 => 2,
        200..300 => 3,
        _ => 4,
    }
}

/// Give later movers `position * base` extra dice.
///
/// `players` must hold the civilizations first, indexed by id. Dice that do
/// not fit go to the player's reserve. Returns the events to log.
pub fn apply_turn_order_bonus<R: RandomSource>(
    board: &mut Board,
    players: &mut [Player],
    first: PlayerId,
    civ_count: usize,
    rng: &mut R,
) -> Vec<GameEvent> {
    let base = turn_order_base(board.len());
    let mut events = Vec::new();

    for position in 1..civ_count {
        let bonus = u32::try_from(position).unwrap_or(u32::MAX) * base;
        let idx = (usize::from(first) + position) % civ_count;
        let player = to_id(idx);
        events.push(GameEvent::BonusDice {
            player,
            dice: bonus,
        });

        let mut remaining = bonus;
        let mut safe = 0;
        while remaining > 0 && safe < BONUS_GUARD {
            safe += 1;
            let targets: Vec<CellId> = board
                .owned_by(player)
                .filter(|c| c.dice < MAX_DICE)
                .map(|c| c.id)
                .collect();
            let Some(&target) = rng.choice(&targets) else {
                break;
            };
            if let Some(cell) = board.get_mut(target) {
                cell.dice += 1;
            }
            remaining -= 1;
        }
        if remaining > 0
            && let Some(p) = players.get_mut(idx)
        {
            p.reserve += remaining;
        }
    }

    if !events.is_empty() {
        events.insert(0, GameEvent::TurnOrderBonus { base });
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Hex, Personality};
    use crate::rng::GameRng;

    fn grid(w: i32, h: i32) -> Board {
        let mut hexes = Vec::new();
        for r in 0..h {
            for q in 0..w {
                hexes.push(Hex::new(q, r));
            }
        }
        Board::from_hexes(&hexes)
    }

    #[test]
    fn test_assign_owners_covers_board() {
        let mut board = grid(8, 8);
        assign_owners(&mut board, 4, 0.5, &mut GameRng::new("owners"));

        assert!(board.iter().all(|c| c.owner.is_some()));
        let counts: Vec<usize> = (0..4).map(|p| board.count_owned(p)).collect();
        assert_eq!(counts.iter().sum::<usize>(), 64);
        assert!(counts.iter().all(|&n| n == 16), "round robin splits evenly: {counts:?}");
    }

    #[test]
    fn test_starting_dice_double_territory() {
        let mut board = grid(6, 6);
        let mut rng = GameRng::new("dice");
        assign_owners(&mut board, 3, 0.7, &mut rng);
        distribute_starting_dice(&mut board, 3, &mut rng);

        for p in 0..3 {
            let cells = u32::try_from(board.count_owned(p)).unwrap();
            assert_eq!(board.total_dice(p), cells * 2);
        }
        assert!(board.iter().all(|c| (1..=MAX_DICE).contains(&c.dice)));
    }

    #[test]
    fn test_conquest_layout() {
        let mut board = grid(10, 10);
        place_conquest(&mut board, &[0, 1, 2], 3, &mut GameRng::new("conquest"));

        for civ in 0..3 {
            let owned: Vec<_> = board.owned_by(civ).collect();
            assert_eq!(owned.len(), 1);
            assert_eq!(owned[0].dice, MAX_DICE);
        }
        assert_eq!(board.count_owned(3), 97);
        assert!(board.owned_by(3).all(|c| (1..=3).contains(&c.dice)));
    }

    #[test]
    fn test_turn_order_base() {
        assert_eq!(turn_order_base(99), 1);
        assert_eq!(turn_order_base(100), 2);
        assert_eq!(turn_order_base(250), 3);
        assert_eq!(turn_order_base(300), 4);
    }

    #[test]
    fn test_turn_order_bonus_overflows_to_reserve() {
        let mut board = grid(3, 1);
        board.get_mut(0).unwrap().owner = Some(0);
        board.get_mut(1).unwrap().owner = Some(1);
        board.get_mut(2).unwrap().owner = Some(2);
        for cell in board.cells_mut() {
            cell.dice = 7;
        }
        let mut players: Vec<Player> =
            (0..3).map(|id| Player::new(id, false, Personality::Normal)).collect();

        let events = apply_turn_order_bonus(&mut board, &mut players, 2, 3, &mut GameRng::new("b"));

        assert_eq!(events[0], GameEvent::TurnOrderBonus { base: 1 });
        assert_eq!(events[1], GameEvent::BonusDice { player: 0, dice: 1 });
        assert_eq!(events[2], GameEvent::BonusDice { player: 1, dice: 2 });
        assert_eq!(board.get(0).unwrap().dice, 8);
        assert_eq!(board.get(1).unwrap().dice, 8);
        assert_eq!(players[1].reserve, 1);
        assert_eq!(players[2].reserve, 0);
    }
}

//! End-of-turn reinforcement.
//!
//! Income equals the size of the player's largest region (barbarians get one
//! die per eight cells). Income plus reserve is dropped one die at a time on
//! random cells below the cap; whatever cannot be placed returns to the
//! reserve, which is capped at the largest region size.

use tracing::{debug, warn};

use crate::error::GameError;
use crate::game::{CellId, GameEvent, GameState, MAX_DICE, PlayerId};
use crate::rng::RandomSource;

/// Dice cap for barbarian cells during reinforcement.
pub const BARBARIAN_MAX_DICE: u8 = 3;

/// Cells per income die for barbarians.
pub const BARBARIAN_INCOME_DIVISOR: u32 = 8;

/// Chance that a die placed outside the largest region is lost.
pub const CORRUPTION_CHANCE: f64 = 0.5;

const PLACEMENT_GUARD: u32 = 5_000;

/// What happened during one end-of-turn step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSummary {
    /// Player whose turn ended.
    pub player: PlayerId,
    /// Territory income.
    pub income: u32,
    /// Dice placed on the board.
    pub placed: u32,
    /// Dice lost to corruption.
    pub corrupted: u32,
    /// Dice kept in reserve.
    pub stored: u32,
    /// Dice destroyed by the reserve cap.
    pub burned: u32,
    /// Player holding the turn afterwards.
    pub next: PlayerId,
}

/// Territory income for `player`.
#[must_use]
pub fn income(state: &GameState, player: PlayerId) -> u32 {
    state.player(player).map_or(0, |p| {
        if p.barbarian {
            u32::try_from(p.cell_count()).unwrap_or(u32::MAX) / BARBARIAN_INCOME_DIVISOR
        } else {
            p.largest_region_size()
        }
    })
}

/// End the active player's turn: betrayal windows, reinforcement, rotation.
///
/// # Errors
///
/// Returns `GameOver` once the game has ended, or `AttackPending` while a
/// declared attack awaits resolution.
pub fn end_turn<R: RandomSource>(
    state: &mut GameState,
    rng: &mut R,
) -> Result<TurnSummary, GameError> {
    state.ensure_playing()?;
    if state.pending.is_some() {
        return Err(GameError::AttackPending);
    }
    let player = state.active;
    if state.player(player).is_none() {
        return Err(GameError::UnknownPlayer(player));
    }

    tick_betrayals(state, player);

    if let Some(average) = state.player(player).and_then(|p| p.stats.turn_average()) {
        state.push_event(GameEvent::TurnAverage { player, average });
    }
    if let Some(p) = state.player_mut(player) {
        p.stats.reset_turn();
    }

    let income = income(state, player);
    let reserve = state.player(player).map_or(0, |p| p.reserve);
    if income > 0 || reserve > 0 {
        state.push_event(GameEvent::Reinforcements {
            player,
            income,
            reserve,
        });
    }
    if let Some(p) = state.player_mut(player) {
        p.reserve = 0;
    }

    let Placement {
        placed,
        corrupted,
        leftover: pool,
    } = place_dice(state, player, income + reserve, PLACEMENT_GUARD, rng);

    let region = state.player(player).map_or(0, |p| p.largest_region_size());
    let (stored, burned) = if pool > region {
        (region, pool - region)
    } else {
        (pool, 0)
    };
    if let Some(p) = state.player_mut(player) {
        p.reserve = stored;
    }
    if burned > 0 {
        state.push_event(GameEvent::ReserveBurned {
            player,
            dice: burned,
        });
    } else if stored > 0 {
        state.push_event(GameEvent::ReserveStored {
            player,
            dice: stored,
        });
    }

    state.settle();
    state.pass_turn();
    let alive = u32::try_from(state.alive_players().count().max(1)).unwrap_or(u32::MAX);
    state.turn += 1.0 / f64::from(alive);

    debug!(player, income, placed, corrupted, stored, burned, next = state.active, "turn ended");
    Ok(TurnSummary {
        player,
        income,
        placed,
        corrupted,
        stored,
        burned,
        next: state.active,
    })
}

/// Result of dropping a pool of dice onto a player's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    placed: u32,
    corrupted: u32,
    leftover: u32,
}

/// Drop `pool` dice one at a time on random cells below the cap, stopping
/// when every cell is full or after `limit` draws.
fn place_dice<R: RandomSource>(
    state: &mut GameState,
    player: PlayerId,
    mut pool: u32,
    limit: u32,
    rng: &mut R,
) -> Placement {
    let barbarian = state.player(player).is_some_and(|p| p.barbarian);
    let cap = if barbarian { BARBARIAN_MAX_DICE } else { MAX_DICE };
    let mut placed = 0;
    let mut corrupted = 0;
    let mut guard = 0;
    while pool > 0 {
        if guard >= limit {
            warn!(player, pool, limit, "dice placement hit its iteration limit");
            break;
        }
        guard += 1;
        let eligible: Vec<CellId> = state.player(player).map_or_else(Vec::new, |p| {
            p.cells
                .iter()
                .copied()
                .filter(|&c| state.board.get(c).is_some_and(|cell| cell.dice < cap))
                .collect()
        });
        let Some(&cell) = rng.choice(&eligible) else {
            break;
        };

        let off_region = state
            .player(player)
            .is_some_and(|p| !p.largest_region.contains(&cell));
        if state.options.corruption
            && !barbarian
            && off_region
            && rng.next_f64() < CORRUPTION_CHANCE
        {
            pool -= 1;
            corrupted += 1;
            state.push_event(GameEvent::Corruption { player, cell });
            continue;
        }

        if let Some(target) = state.board.get_mut(cell) {
            target.dice += 1;
        }
        pool -= 1;
        placed += 1;
    }
    Placement {
        placed,
        corrupted,
        leftover: pool,
    }
}

/// Age betrayal windows held by `player`, forgiving expired ones.
fn tick_betrayals(state: &mut GameState, player: PlayerId) {
    let Some(p) = state.player_mut(player) else {
        return;
    };
    let mut forgiven = Vec::new();
    p.betrayals.retain(|&traitor, turns| {
        if *turns > 1 {
            *turns -= 1;
            true
        } else {
            forgiven.push(traitor);
            false
        }
    });
    for traitor in forgiven {
        state.push_event(GameEvent::Forgiven {
            victim: player,
            traitor,
        });
    }
}

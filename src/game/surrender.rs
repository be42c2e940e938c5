//! Surrender and territory hand-over.
//!
//! A targeted surrender gives every cell to one civilization and rebalances
//! each cell to that civilization's average stack. An undirected surrender
//! hands each cell, dice intact, to the neighbor it touches most.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::GameError;
use crate::game::{CellId, GameEvent, GameState, PlayerId};
use crate::rng::RandomSource;

/// What happened to a surrendering player's territory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurrenderSummary {
    /// Surrendering player.
    pub player: PlayerId,
    /// Recipient of a targeted surrender.
    pub to: Option<PlayerId>,
    /// Each cell and its new owner.
    pub transfers: Vec<(CellId, Option<PlayerId>)>,
}

/// Remove `player` from the game, giving its cells away.
///
/// # Errors
///
/// Returns `GameOver` once the game has ended, `PlayerNotAlive` if the
/// surrendering player is already out, or `InvalidSurrenderTarget` if the
/// recipient is the player itself, a barbarian, or not alive.
pub fn surrender<R: RandomSource>(
    state: &mut GameState,
    player: PlayerId,
    to: Option<PlayerId>,
    rng: &mut R,
) -> Result<SurrenderSummary, GameError> {
    state.ensure_playing()?;
    let surrendering = state.player(player).ok_or(GameError::UnknownPlayer(player))?;
    if !surrendering.alive {
        return Err(GameError::PlayerNotAlive(player));
    }
    if let Some(target) = to {
        let valid = target != player
            && state
                .player(target)
                .is_some_and(|p| p.alive && p.is_civilization());
        if !valid {
            return Err(GameError::InvalidSurrenderTarget(target));
        }
    }

    if state.active == player {
        state.pending = None;
    }

    let transfers = match to {
        Some(target) => hand_over(state, player, target),
        None => split_among_neighbors(state, player, rng),
    };

    if let Some(p) = state.player_mut(player) {
        p.eliminate();
    }
    info!(player, ?to, cells = transfers.len(), "player surrendered");
    state.push_event(GameEvent::Surrendered { player, to });
    state.settle();

    if state.active == player && !state.is_over() {
        state.pass_turn();
    }

    Ok(SurrenderSummary {
        player,
        to,
        transfers,
    })
}

fn hand_over(
    state: &mut GameState,
    player: PlayerId,
    target: PlayerId,
) -> Vec<(CellId, Option<PlayerId>)> {
    let (count, dice) = state.player(target).map_or((0, 0), |p| {
        let dice: u32 = p
            .cells
            .iter()
            .filter_map(|&c| state.board.get(c))
            .map(|c| u32::from(c.dice))
            .sum();
        (u32::try_from(p.cell_count()).unwrap_or(u32::MAX), dice)
    });
    let average = rounded_average(dice, count);

    let cells: Vec<CellId> = state
        .player(player)
        .map(|p| p.cells.iter().copied().collect())
        .unwrap_or_default();
    for &cell in &cells {
        state.transfer_cell(cell, Some(target), average);
    }
    cells.into_iter().map(|c| (c, Some(target))).collect()
}

/// Recipient's average stack, at least one die.
fn rounded_average(dice: u32, count: u32) -> u8 {
    let avg = (f64::from(dice) / f64::from(count.max(1))).round();
    // Stacks never exceed 8, so the average fits
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let avg = avg.clamp(1.0, f64::from(u8::MAX)) as u8;
    avg.max(1)
}

fn split_among_neighbors<R: RandomSource>(
    state: &mut GameState,
    player: PlayerId,
    rng: &mut R,
) -> Vec<(CellId, Option<PlayerId>)> {
    let strongest = state
        .alive_civilizations()
        .filter(|p| p.id != player)
        .fold(None, |best: Option<(PlayerId, usize)>, p| match best {
            Some((_, n)) if n >= p.cell_count() => best,
            _ => Some((p.id, p.cell_count())),
        })
        .map(|(id, _)| id);

    let cells: Vec<CellId> = state
        .player(player)
        .map(|p| p.cells.iter().copied().collect())
        .unwrap_or_default();
    let mut transfers = Vec::with_capacity(cells.len());

    for cell in cells {
        let Some(current) = state.board.get(cell) else {
            continue;
        };
        let dice = current.dice;

        // Neighbor owners in first-seen order
        let mut tally: BTreeMap<PlayerId, (usize, u32)> = BTreeMap::new();
        let mut seen = 0usize;
        for &n in &current.neighbors {
            let Some(owner) = state.board.get(n).and_then(|c| c.owner) else {
                continue;
            };
            let eligible = owner != player
                && state
                    .player(owner)
                    .is_some_and(|p| p.alive && p.is_civilization());
            if eligible {
                tally
                    .entry(owner)
                    .or_insert_with(|| {
                        seen += 1;
                        (seen, 0)
                    })
                    .1 += 1;
            }
        }

        let recipient = if tally.is_empty() {
            strongest
        } else {
            let best = tally.values().map(|&(_, count)| count).max().unwrap_or(0);
            let mut candidates: Vec<(usize, PlayerId)> = tally
                .iter()
                .filter(|entry| entry.1.1 == best)
                .map(|(&owner, &(order, _))| (order, owner))
                .collect();
            candidates.sort_unstable();
            let pick = rng.index(candidates.len());
            candidates.get(pick).map(|&(_, owner)| owner)
        };

        match recipient {
            Some(owner) => state.transfer_cell(cell, Some(owner), dice),
            None => state.transfer_cell(cell, None, 1),
        }
        transfers.push((cell, recipient));
    }

    transfers
}

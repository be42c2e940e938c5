//! Connected regions of same-owner cells.
//!
//! A player's income and reserve cap both come from the size of its largest
//! region, so regions are recomputed after every mutation.

use std::collections::BTreeSet;

use crate::game::{Board, CellId, GameEvent, GameState, PlayerId};

/// A maximal connected set of cells with one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Member cells.
    pub cells: BTreeSet<CellId>,
    /// Dice across all members.
    pub total_dice: u32,
}

impl Region {
    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the region has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// All regions of `player`, seeded in ascending cell order.
#[must_use]
pub fn find_regions(board: &Board, player: PlayerId) -> Vec<Region> {
    let mut visited = vec![false; board.len()];
    let mut regions = Vec::new();

    for seed in board.owned_by(player) {
        if visited[seed.id] {
            continue;
        }
        visited[seed.id] = true;

        let mut cells = BTreeSet::new();
        let mut total_dice = 0u32;
        let mut stack = vec![seed.id];
        while let Some(id) = stack.pop() {
            let Some(cell) = board.get(id) else {
                continue;
            };
            cells.insert(id);
            total_dice += u32::from(cell.dice);
            for &n in &cell.neighbors {
                if n < visited.len()
                    && !visited[n]
                    && board.get(n).is_some_and(|c| c.is_owned_by(player))
                {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }
        regions.push(Region { cells, total_dice });
    }

    regions
}

/// The largest region: most cells, then most dice, then first found.
#[must_use]
pub fn largest_region(board: &Board, player: PlayerId) -> Option<Region> {
    let mut best: Option<Region> = None;
    for region in find_regions(board, player) {
        let better = match &best {
            None => true,
            Some(b) => {
                region.len() > b.len() || (region.len() == b.len() && region.total_dice > b.total_dice)
            }
        };
        if better {
            best = Some(region);
        }
    }
    best
}

/// Whether `a` and `b` are joined by a path of cells owned by `player`.
#[must_use]
pub fn are_connected(board: &Board, player: PlayerId, a: CellId, b: CellId) -> bool {
    if a == b {
        return true;
    }
    let mut visited = vec![false; board.len()];
    let mut stack = vec![a];
    if a < visited.len() {
        visited[a] = true;
    }
    while let Some(id) = stack.pop() {
        if id == b {
            return true;
        }
        let Some(cell) = board.get(id) else {
            continue;
        };
        for &n in &cell.neighbors {
            if n < visited.len()
                && !visited[n]
                && board.get(n).is_some_and(|c| c.is_owned_by(player))
            {
                visited[n] = true;
                stack.push(n);
            }
        }
    }
    false
}

/// Recompute every player's largest region and enforce the reserve cap.
///
/// Alive players whose reserve exceeds their largest region lose the excess
/// with a `ReserveBurned` event. Dead players are cleared.
pub fn recompute_all_regions(state: &mut GameState) {
    let mut burned = Vec::new();

    for idx in 0..state.players.len() {
        let (id, alive) = {
            let p = &state.players[idx];
            (p.id, p.alive)
        };
        if !alive {
            let player = &mut state.players[idx];
            player.largest_region.clear();
            player.reserve = 0;
            continue;
        }

        let region = largest_region(&state.board, id).map(|r| r.cells).unwrap_or_default();
        let player = &mut state.players[idx];
        player.largest_region = region;
        let cap = player.largest_region_size();
        if player.reserve > cap {
            burned.push((id, player.reserve - cap));
            player.reserve = cap;
        }
    }

    for (player, dice) in burned {
        state.push_event(GameEvent::ReserveBurned { player, dice });
    }
}

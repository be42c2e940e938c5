//! Deterministic hex map generation.
//!
//! A landmass grows outward from the origin, preferring frontier hexes that
//! touch several placed cells, which keeps the coastline compact. Water is
//! then carved as random lakes and only the largest remaining landmass is
//! kept, so every generated board is connected.

// Map generation uses intentional casts for the sizing formulas
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

mod ownership;

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;
use tracing::debug;

use crate::game::{Board, Cell, CellId, Hex};
use crate::rng::RandomSource;

pub use ownership::{
    apply_turn_order_bonus, assign_owners, distribute_starting_dice, place_conquest,
    turn_order_base,
};

/// Frontier candidates with this many placed neighbors end the scan early.
const GOOD_ENOUGH_SCORE: usize = 2;

/// Error type for map generation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MapGenError {
    /// No cells were requested.
    #[error("map generation error: cell count must be positive")]
    NoCells,
    /// Fewer cells than players.
    #[error("map generation error: {cells} cells cannot seat {players} players")]
    TooFewCells {
        /// Requested cells.
        cells: usize,
        /// Requested players.
        players: usize,
    },
    /// Water level outside `[0, 1]`.
    #[error("map generation error: water level {0} is outside [0, 1]")]
    WaterLevel(f64),
}

/// Inputs to layout generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapGenConfig {
    /// Target number of land cells.
    pub cell_count: usize,
    /// Fraction of land to flood, `0.0..=1.0`.
    pub water_level: f64,
    /// Players that must fit on the map.
    pub players: usize,
}

impl MapGenConfig {
    /// Check the configuration before generating.
    ///
    /// # Errors
    ///
    /// Returns a `MapGenError` naming the first invalid field.
    pub fn validate(&self) -> Result<(), MapGenError> {
        if self.cell_count == 0 {
            return Err(MapGenError::NoCells);
        }
        if self.cell_count < self.players {
            return Err(MapGenError::TooFewCells {
                cells: self.cell_count,
                players: self.players,
            });
        }
        if !(0.0..=1.0).contains(&self.water_level) {
            return Err(MapGenError::WaterLevel(self.water_level));
        }
        Ok(())
    }

    /// Cells grown before water is carved.
    #[must_use]
    pub fn inflated_count(&self) -> usize {
        (self.cell_count as f64 * (1.0 + self.water_level * 1.5)).ceil() as usize
    }
}

/// Generate an unowned, connected board.
///
/// # Errors
///
/// Returns a `MapGenError` if the configuration is invalid.
pub fn generate_layout<R: RandomSource>(
    config: &MapGenConfig,
    rng: &mut R,
) -> Result<Board, MapGenError> {
    config.validate()?;

    let hexes = grow_landmass(config.inflated_count(), rng);
    let board = Board::from_hexes(&hexes);
    debug!(cells = board.len(), "landmass grown");

    if config.water_level > 0.0 {
        let board = add_water(board, config.water_level, config.players, rng);
        debug!(cells = board.len(), "water carved");
        return Ok(board);
    }
    Ok(board)
}

/// Grow `target` hexes from the origin. Hexes are returned in placement order.
fn grow_landmass<R: RandomSource>(target: usize, rng: &mut R) -> Vec<Hex> {
    let mut placed: Vec<Hex> = Vec::with_capacity(target);
    let mut placed_set: HashSet<Hex> = HashSet::with_capacity(target);
    // Insertion-ordered frontier
    let mut frontier: Vec<Hex> = vec![Hex::ORIGIN];
    let mut in_frontier: HashSet<Hex> = HashSet::from([Hex::ORIGIN]);

    while placed.len() < target && !frontier.is_empty() {
        let mut candidates = frontier.clone();
        rng.shuffle(&mut candidates);

        let mut best = candidates[0];
        let mut best_score = None;
        for &hex in &candidates {
            let score = hex.neighbors().filter(|n| placed_set.contains(n)).count();
            if best_score.is_none_or(|b| score > b) {
                best_score = Some(score);
                best = hex;
            }
            if score >= GOOD_ENOUGH_SCORE {
                break;
            }
        }

        frontier.retain(|&h| h != best);
        in_frontier.remove(&best);
        placed.push(best);
        placed_set.insert(best);

        for n in best.neighbors() {
            if !placed_set.contains(&n) && in_frontier.insert(n) {
                frontier.push(n);
            }
        }
    }

    placed
}

/// Carve lakes and keep the largest landmass.
///
/// Returns the board unchanged if too little land would remain.
fn add_water<R: RandomSource>(
    board: Board,
    water_level: f64,
    players: usize,
    rng: &mut R,
) -> Board {
    let count = board.len();
    let to_remove = (count as f64 * water_level * 0.4).floor() as usize;
    if to_remove == 0 {
        return board;
    }

    let max_lake = (water_level * 20.0).ceil() as i64;
    let ids: Vec<CellId> = (0..count).collect();
    let mut removed: HashSet<CellId> = HashSet::new();
    let mut attempts = 0;

    while removed.len() < to_remove && attempts < count {
        attempts += 1;
        let Some(&start) = rng.choice(&ids) else {
            break;
        };
        if removed.contains(&start) {
            continue;
        }

        let lake_size = rng.rand_int(1, max_lake.max(1)) as usize;
        let mut lake: Vec<CellId> = Vec::with_capacity(lake_size);
        let mut queue = VecDeque::from([start]);
        let mut visited: HashSet<CellId> = HashSet::from([start]);

        while lake.len() < lake_size {
            let Some(current) = queue.pop_front() else {
                break;
            };
            lake.push(current);
            let mut neighbors = board.get(current).map(|c| c.neighbors.clone()).unwrap_or_default();
            rng.shuffle(&mut neighbors);
            for n in neighbors {
                if lake.len() >= lake_size {
                    break;
                }
                if !visited.contains(&n) && !removed.contains(&n) {
                    visited.insert(n);
                    queue.push_back(n);
                }
            }
        }

        removed.extend(lake);
    }

    let remaining: Vec<Cell> = board
        .iter()
        .filter(|c| !removed.contains(&c.id))
        .cloned()
        .collect();
    let components = connected_components(&remaining);

    let Some(largest) = components
        .iter()
        .fold(None, |best: Option<&Vec<CellId>>, c| match best {
            Some(b) if b.len() >= c.len() => Some(b),
            _ => Some(c),
        })
    else {
        return board;
    };
    if (largest.len() as f64) < count as f64 / 4.0 || largest.len() < players {
        debug!(kept = largest.len(), count, "too much water, keeping dry land");
        return board;
    }

    let keep: HashSet<CellId> = largest.iter().copied().collect();
    renumber(&board, &keep)
}

/// Keep only `keep`, renumbering densely in original order.
fn renumber(board: &Board, keep: &HashSet<CellId>) -> Board {
    let mut remap: HashMap<CellId, CellId> = HashMap::with_capacity(keep.len());
    for cell in board.iter().filter(|c| keep.contains(&c.id)) {
        let next = remap.len();
        remap.insert(cell.id, next);
    }

    let cells = board
        .iter()
        .filter(|c| keep.contains(&c.id))
        .map(|c| {
            let mut cell = c.clone();
            cell.id = remap.get(&c.id).copied().unwrap_or(c.id);
            cell.neighbors = c.neighbors.iter().filter_map(|n| remap.get(n).copied()).collect();
            cell
        })
        .collect();
    Board::from_cells(cells)
}

/// Connected components of `cells` (breadth-first, in cell order).
///
/// Neighbors outside `cells` are ignored.
#[must_use]
pub fn connected_components(cells: &[Cell]) -> Vec<Vec<CellId>> {
    let by_id: HashMap<CellId, &Cell> = cells.iter().map(|c| (c.id, c)).collect();
    let mut visited: HashSet<CellId> = HashSet::with_capacity(cells.len());
    let mut components = Vec::new();

    for cell in cells {
        if !visited.insert(cell.id) {
            continue;
        }
        let mut component = vec![cell.id];
        let mut queue = VecDeque::from([cell.id]);
        while let Some(id) = queue.pop_front() {
            let Some(current) = by_id.get(&id) else {
                continue;
            };
            for &n in &current.neighbors {
                if by_id.contains_key(&n) && visited.insert(n) {
                    component.push(n);
                    queue.push_back(n);
                }
            }
        }
        components.push(component);
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::GameRng;

    fn config(cells: usize, water: f64) -> MapGenConfig {
        MapGenConfig {
            cell_count: cells,
            water_level: water,
            players: 4,
        }
    }

    fn assert_symmetric(board: &Board) {
        for cell in board.iter() {
            for &n in &cell.neighbors {
                assert!(n < board.len(), "neighbor {n} out of range");
                assert!(board.are_adjacent(n, cell.id), "{} -> {n} not mirrored", cell.id);
            }
        }
    }

    #[test]
    fn test_dry_map_has_exact_count() {
        let board = generate_layout(&config(50, 0.0), &mut GameRng::new("dry")).unwrap();
        assert_eq!(board.len(), 50);
        assert_eq!(board.get(0).unwrap().hex, Hex::ORIGIN);
        assert_symmetric(&board);
        assert_eq!(connected_components(board.cells()).len(), 1);
    }

    #[test]
    fn test_layout_determinism() {
        let a = generate_layout(&config(120, 0.3), &mut GameRng::new("same")).unwrap();
        let b = generate_layout(&config(120, 0.3), &mut GameRng::new("same")).unwrap();
        assert_eq!(a, b);

        let c = generate_layout(&config(120, 0.3), &mut GameRng::new("other")).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_full_water_keeps_one_landmass() {
        for seed in ["w1", "w2", "w3", "w4"] {
            let board = generate_layout(&config(100, 1.0), &mut GameRng::new(seed)).unwrap();
            assert!(board.len() >= 25, "seed {seed}: only {} cells", board.len());
            assert_eq!(connected_components(board.cells()).len(), 1, "seed {seed}");
            assert_symmetric(&board);
            for (i, cell) in board.iter().enumerate() {
                assert_eq!(cell.id, i);
            }
        }
    }

    #[test]
    fn test_invalid_configs() {
        let mut rng = GameRng::new("bad");
        assert_eq!(generate_layout(&config(0, 0.0), &mut rng), Err(MapGenError::NoCells));
        assert_eq!(
            generate_layout(&config(3, 0.0), &mut rng),
            Err(MapGenError::TooFewCells { cells: 3, players: 4 })
        );
        assert_eq!(
            generate_layout(&config(10, 1.5), &mut rng),
            Err(MapGenError::WaterLevel(1.5))
        );
    }

    #[test]
    fn test_inflated_count() {
        assert_eq!(config(100, 0.0).inflated_count(), 100);
        assert_eq!(config(100, 1.0).inflated_count(), 250);
        assert_eq!(config(10, 0.5).inflated_count(), 18);
    }

    #[test]
    fn test_connected_components_splits() {
        let hexes = vec![Hex::new(0, 0), Hex::new(1, 0), Hex::new(5, 5), Hex::new(6, 5), Hex::new(7, 5)];
        let board = Board::from_hexes(&hexes);
        let components = connected_components(board.cells());
        assert_eq!(components, vec![vec![0, 1], vec![2, 3, 4]]);
    }
}

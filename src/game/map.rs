//! Board and cell types.
//!
//! The board is an arena of cells addressed by dense ids. Topology is fixed
//! once the board is built; only owners and dice change during play.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::{Hex, PlayerId};

/// Dense cell index into the board arena.
pub type CellId = usize;

/// Dice cap for a civilization cell.
pub const MAX_DICE: u8 = 8;

/// One hex territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Position in the board arena.
    pub id: CellId,
    /// Axial coordinate.
    pub hex: Hex,
    /// Owning player, `None` when unowned.
    pub owner: Option<PlayerId>,
    /// Dice stacked on the cell.
    pub dice: u8,
    /// Adjacent cell ids, in hex-direction order.
    pub neighbors: Vec<CellId>,
}

impl Cell {
    /// Create an unowned, empty cell with no neighbors.
    #[must_use]
    pub const fn new(id: CellId, hex: Hex) -> Self {
        Self {
            id,
            hex,
            owner: None,
            dice: 0,
            neighbors: Vec::new(),
        }
    }

    /// Check whether `other` borders this cell.
    #[must_use]
    pub fn is_adjacent(&self, other: CellId) -> bool {
        self.neighbors.contains(&other)
    }

    /// Check whether the cell belongs to `player`.
    #[inline]
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }
}

/// The cell arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Board {
    /// Wrap prepared cells. Ids must equal their positions.
    #[must_use]
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Build a board from coordinates, deriving adjacency from hex geometry.
    ///
    /// Cell ids follow the order of `hexes`; duplicates keep the first id.
    #[must_use]
    pub fn from_hexes(hexes: &[Hex]) -> Self {
        let mut index: HashMap<Hex, CellId> = HashMap::with_capacity(hexes.len());
        for (id, &hex) in hexes.iter().enumerate() {
            index.entry(hex).or_insert(id);
        }

        let cells = hexes
            .iter()
            .enumerate()
            .map(|(id, &hex)| {
                let mut cell = Cell::new(id, hex);
                cell.neighbors = hex
                    .neighbors()
                    .filter_map(|n| index.get(&n).copied())
                    .filter(|&n| n != id)
                    .collect();
                cell
            })
            .collect();

        Self { cells }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the board has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in id order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access to all cells.
    ///
    /// Callers must not change `id` or `neighbors`.
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Get a cell by id.
    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Get a mutable cell by id.
    #[must_use]
    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id)
    }

    /// Iterate over all cells.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells owned by `player`, in id order.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.is_owned_by(player))
    }

    /// Number of cells owned by `player`.
    #[must_use]
    pub fn count_owned(&self, player: PlayerId) -> usize {
        self.owned_by(player).count()
    }

    /// Total dice on cells owned by `player`.
    #[must_use]
    pub fn total_dice(&self, player: PlayerId) -> u32 {
        self.owned_by(player).map(|c| u32::from(c.dice)).sum()
    }

    /// Total dice on every cell, owned or not.
    #[must_use]
    pub fn dice_on_board(&self) -> u32 {
        self.cells.iter().map(|c| u32::from(c.dice)).sum()
    }

    /// Whether cells `a` and `b` border each other.
    #[must_use]
    pub fn are_adjacent(&self, a: CellId, b: CellId) -> bool {
        self.get(a).is_some_and(|c| c.is_adjacent(b))
    }

    /// Map from coordinate to cell id.
    #[must_use]
    pub fn hex_index(&self) -> HashMap<Hex, CellId> {
        self.cells.iter().map(|c| (c.hex, c.id)).collect()
    }
}

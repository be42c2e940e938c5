//! Player state management.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::game::CellId;

/// Unique identifier for a player. Equal to the player's roster index.
pub type PlayerId = u8;

/// Display colors for civilizations, indexed by player id.
pub const PLAYER_COLORS: [&str; 8] = [
    "#e53935", "#1e88e5", "#43a047", "#fdd835", "#8e24aa", "#00acc1", "#fb8c00", "#ec407a",
];

/// Display color of the barbarian faction.
pub const BARBARIAN_COLOR: &str = "#808080";

/// AI temperament. Biases target selection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Takes riskier fights.
    Aggressive,
    /// No bias.
    Normal,
    /// Avoids marginal fights.
    Kind,
}

impl Personality {
    /// All personalities, in selection order.
    pub const ALL: [Personality; 3] = [Self::Aggressive, Self::Normal, Self::Kind];
}

/// Running dice statistics. Reporting and AI only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollStats {
    /// Dice this player has rolled.
    pub my_rolls: u32,
    /// Sum of faces this player has rolled.
    pub my_roll_sum: u32,
    /// Dice rolled against this player.
    pub opponent_rolls: u32,
    /// Sum of faces rolled against this player.
    pub opponent_roll_sum: u32,
    /// Dice rolled as attacker during the current turn.
    pub turn_rolls: u32,
    /// Sum of faces rolled as attacker during the current turn.
    pub turn_roll_sum: u32,
}

impl RollStats {
    /// Average face this player has rolled.
    #[must_use]
    pub fn my_average(&self) -> Option<f64> {
        average(self.my_roll_sum, self.my_rolls)
    }

    /// Average face rolled against this player.
    #[must_use]
    pub fn opponent_average(&self) -> Option<f64> {
        average(self.opponent_roll_sum, self.opponent_rolls)
    }

    /// Average attacking face during the current turn.
    #[must_use]
    pub fn turn_average(&self) -> Option<f64> {
        average(self.turn_roll_sum, self.turn_rolls)
    }

    /// Clear the per-turn counters.
    pub fn reset_turn(&mut self) {
        self.turn_rolls = 0;
        self.turn_roll_sum = 0;
    }
}

fn average(sum: u32, count: u32) -> Option<f64> {
    (count > 0).then(|| f64::from(sum) / f64::from(count))
}

/// State for a single player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier for this player.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Controlled by a person rather than the AI.
    pub human: bool,
    /// Whether the player is still in the game.
    pub alive: bool,
    /// Member of the barbarian faction.
    pub barbarian: bool,
    /// AI temperament.
    pub personality: Personality,
    /// Owned cells.
    pub cells: BTreeSet<CellId>,
    /// Dice held back from reinforcement.
    pub reserve: u32,
    /// Dice on owned cells plus reserve, refreshed after every mutation.
    pub total_dice: u32,
    /// Attacks suffered, per attacker.
    pub grudges: BTreeMap<PlayerId, u32>,
    /// Allies that attacked this player, with turns left to retaliate.
    pub betrayals: BTreeMap<PlayerId, u8>,
    /// Allied players.
    pub allies: BTreeSet<PlayerId>,
    /// Cells of the largest connected region.
    pub largest_region: BTreeSet<CellId>,
    /// The one-time surrender suggestion has been issued.
    #[serde(default)]
    pub surrender_prompted: bool,
    /// Dice statistics.
    #[serde(default)]
    pub stats: RollStats,
}

impl Player {
    /// Create a civilization player.
    #[must_use]
    pub fn new(id: PlayerId, human: bool, personality: Personality) -> Self {
        let name = if human {
            format!("Player {}", u32::from(id) + 1)
        } else {
            format!("AI {}", u32::from(id) + 1)
        };
        Self {
            id,
            name,
            color: PLAYER_COLORS[usize::from(id) % PLAYER_COLORS.len()].to_string(),
            human,
            alive: true,
            barbarian: false,
            personality,
            cells: BTreeSet::new(),
            reserve: 0,
            total_dice: 0,
            grudges: BTreeMap::new(),
            betrayals: BTreeMap::new(),
            allies: BTreeSet::new(),
            largest_region: BTreeSet::new(),
            surrender_prompted: false,
            stats: RollStats::default(),
        }
    }

    /// Create the barbarian faction.
    #[must_use]
    pub fn barbarian(id: PlayerId) -> Self {
        Self {
            name: "Barbarians".to_string(),
            color: BARBARIAN_COLOR.to_string(),
            barbarian: true,
            ..Self::new(id, false, Personality::Aggressive)
        }
    }

    /// Size of the largest connected region.
    #[must_use]
    pub fn largest_region_size(&self) -> u32 {
        u32::try_from(self.largest_region.len()).unwrap_or(u32::MAX)
    }

    /// Number of owned cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether `other` is an ally.
    #[must_use]
    pub fn is_allied_with(&self, other: PlayerId) -> bool {
        self.allies.contains(&other)
    }

    /// Whether this player may retaliate against `traitor`.
    #[must_use]
    pub fn was_betrayed_by(&self, traitor: PlayerId) -> bool {
        self.betrayals.contains_key(&traitor)
    }

    /// Attacks suffered from `attacker`.
    #[must_use]
    pub fn grudge_against(&self, attacker: PlayerId) -> u32 {
        self.grudges.get(&attacker).copied().unwrap_or(0)
    }

    /// Whether this player counts toward victory.
    #[must_use]
    pub const fn is_civilization(&self) -> bool {
        !self.barbarian
    }

    /// Remove this player from the game.
    pub fn eliminate(&mut self) {
        self.alive = false;
        self.cells.clear();
        self.largest_region.clear();
        self.reserve = 0;
        self.total_dice = 0;
    }
}

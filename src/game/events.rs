//! In-game event log entries.
//!
//! Events are part of the game state and persist with it. They carry ids,
//! not names; `Display` renders a short line for terminal logs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{CellId, PlayerId};

/// Something that happened during play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// A game began.
    GameStarted {
        /// Custom map name, if any.
        map_name: Option<String>,
        /// Conquest mode.
        conquest: bool,
    },
    /// Later movers received starting dice.
    TurnOrderBonus {
        /// Dice per turn position.
        base: u32,
    },
    /// One player's share of the turn-order bonus.
    BonusDice {
        /// Recipient.
        player: PlayerId,
        /// Dice granted.
        dice: u32,
    },
    /// Alliance groups were configured.
    AlliancesForged,
    /// A regular attack was resolved.
    Attack {
        /// Attacker.
        player: PlayerId,
        /// Source cell.
        from: CellId,
        /// Target cell.
        to: CellId,
        /// Attacker's sum.
        attack: u32,
        /// Attacker's dice count.
        attack_dice: u32,
        /// Defender's sum.
        defense: u32,
        /// Defender's dice count.
        defense_dice: u32,
        /// Target changed hands.
        captured: bool,
    },
    /// A paratroop drop was resolved.
    Paratroop {
        /// Attacker.
        player: PlayerId,
        /// Target cell.
        to: CellId,
        /// Attacker's sum.
        attack: u32,
        /// Defender's sum.
        defense: u32,
        /// Target changed hands.
        captured: bool,
    },
    /// An ally attacked.
    Betrayal {
        /// Attacking ally.
        traitor: PlayerId,
        /// Attacked ally.
        victim: PlayerId,
    },
    /// A retaliation window expired.
    Forgiven {
        /// Player that was betrayed.
        victim: PlayerId,
        /// Former traitor.
        traitor: PlayerId,
    },
    /// Average attack roll over the ending turn.
    TurnAverage {
        /// Player whose turn ended.
        player: PlayerId,
        /// Mean face value.
        average: f64,
    },
    /// Reinforcement pool at end of turn.
    Reinforcements {
        /// Recipient.
        player: PlayerId,
        /// Territory income.
        income: u32,
        /// Reserve carried in.
        reserve: u32,
    },
    /// A reinforcement die was lost off the main region.
    Corruption {
        /// Affected player.
        player: PlayerId,
        /// Cell the die was headed for.
        cell: CellId,
    },
    /// Reserve exceeded the largest region and was cut.
    ReserveBurned {
        /// Affected player.
        player: PlayerId,
        /// Dice destroyed.
        dice: u32,
    },
    /// Unplaced dice were kept in reserve.
    ReserveStored {
        /// Affected player.
        player: PlayerId,
        /// Dice stored.
        dice: u32,
    },
    /// A player lost its last cell.
    Eliminated {
        /// Eliminated player.
        player: PlayerId,
    },
    /// A player gave up.
    Surrendered {
        /// Surrendering player.
        player: PlayerId,
        /// Recipient, `None` when cells went to neighbors.
        to: Option<PlayerId>,
    },
    /// The game ended.
    Victory {
        /// Last civilization standing, `None` if all fell.
        winner: Option<PlayerId>,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameStarted { map_name: Some(name), .. } => {
                write!(f, "Game started on map: {name}")
            }
            Self::GameStarted { conquest: true, .. } => write!(f, "Conquest has begun!"),
            Self::GameStarted { .. } => write!(f, "New game has started!"),
            Self::TurnOrderBonus { base } => write!(f, "Turn order bonus awarded (base {base})"),
            Self::BonusDice { player, dice } => write!(f, "P{player} gets +{dice} bonus dice"),
            Self::AlliancesForged => write!(f, "Alliances have been forged"),
            Self::Attack {
                player,
                from,
                to,
                attack,
                attack_dice,
                defense,
                defense_dice,
                captured,
            } => {
                let result = if *captured {
                    "attack successful"
                } else if attack == defense {
                    "draw, defender wins"
                } else {
                    "attack failed"
                };
                write!(
                    f,
                    "P{player}: {from}->{to} | {attack} ({}) vs {defense} ({}), {result}",
                    mean(*attack, *attack_dice),
                    mean(*defense, *defense_dice)
                )
            }
            Self::Paratroop {
                player,
                to,
                attack,
                defense,
                captured,
            } => {
                let result = if *captured { "victory" } else { "failed" };
                write!(f, "P{player} paratroop onto {to} | {attack} vs {defense}, {result}")
            }
            Self::Betrayal { traitor, victim } => write!(f, "P{traitor} betrayed ally P{victim}"),
            Self::Forgiven { victim, traitor } => write!(f, "P{victim} has forgiven P{traitor}"),
            Self::TurnAverage { player, average } => {
                write!(f, "P{player} turn avg roll: {average:.2}")
            }
            Self::Reinforcements {
                player,
                income,
                reserve,
            } => write!(
                f,
                "Reinforcements for P{player}: +{income} (territory) +{reserve} (reserve) = {}",
                income + reserve
            ),
            Self::Corruption { player, cell } => {
                write!(f, "-1 die for P{player} lost to corruption at {cell}")
            }
            Self::ReserveBurned { player, dice } => {
                write!(f, "P{player} had too many reserves, {dice} dice burned")
            }
            Self::ReserveStored { player, dice } => {
                write!(f, "P{player} stored {dice} dice in reserve")
            }
            Self::Eliminated { player } => write!(f, "P{player} has been eliminated"),
            Self::Surrendered { player, to: Some(to) } => {
                write!(f, "P{player} surrenders to P{to}")
            }
            Self::Surrendered { player, to: None } => {
                write!(f, "P{player} surrendered, territories go to neighbors")
            }
            Self::Victory { winner: Some(winner) } => write!(f, "P{winner} has won the war"),
            Self::Victory { winner: None } => write!(f, "All civilizations have been defeated"),
        }
    }
}

fn mean(sum: u32, count: u32) -> String {
    if count == 0 {
        return "-".to_string();
    }
    format!("{:.2}", f64::from(sum) / f64::from(count))
}

//! Game setup.
//!
//! Everything before the first move draws from the map stream, so a map seed
//! reproduces the same board, personalities and first mover. Dice rolls use
//! the separate gameplay stream.

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{AllianceTag, ConfigError, GameSettings};
use crate::custom_map::{CustomMap, FirstTurn, MapFormatError};
use crate::game::{
    Alliances, Board, GameEvent, GameMode, GameState, Personality, Player, PlayerId,
};
use crate::mapgen::{self, MapGenConfig, MapGenError};
use crate::rng::{GameRng, GameSeeds, RandomSource};

/// Errors while starting a game.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Settings are out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Layout generation failed.
    #[error(transparent)]
    MapGen(#[from] MapGenError),
    /// The custom map is invalid.
    #[error(transparent)]
    MapFormat(#[from] MapFormatError),
}

/// Start a new game.
///
/// # Errors
///
/// Returns a `SetupError` if the settings, the generator inputs or the custom
/// map are invalid.
pub fn new_game(settings: &GameSettings, seeds: &GameSeeds) -> Result<GameState, SetupError> {
    settings.validate()?;
    let mut map_rng = GameRng::new(&seeds.map);

    let (board, mut players, active, mut log) = match &settings.custom_map {
        Some(map) => custom_setup(map, &mut map_rng)?,
        None => generated_setup(settings, &mut map_rng)?,
    };

    let alliances = forge_alliances(settings, &mut players);
    if !alliances.is_empty() {
        log.push(GameEvent::AlliancesForged);
    }

    let mut state = GameState::new(board, players, active, &seeds.gameplay);
    // A custom map may leave the chosen seat without cells
    if state.player(active).is_some_and(|p| !p.alive)
        && let Some(next) = state.next_alive_after(active)
    {
        debug!(seat = active, next, "first seat holds no cells, passing the turn");
        state.active = next;
    }
    state.map_seed.clone_from(&seeds.map);
    state.mode = if settings.custom_map.is_some() {
        GameMode::Classic
    } else {
        settings.mode
    };
    state.difficulty = settings
        .custom_map
        .as_ref()
        .map_or(settings.difficulty, |m| m.ai_difficulty);
    state.map_name = settings.custom_map.as_ref().map(|m| m.map_name.clone());
    state.options = settings.options();
    state.alliances = alliances;
    // Setup events come before anything settle() logged
    log.append(&mut state.log);
    state.log = log;

    info!(
        cells = state.board.len(),
        players = state.players.len(),
        active = state.active,
        mode = ?state.mode,
        "game started"
    );
    Ok(state)
}

type Prepared = (Board, Vec<Player>, PlayerId, Vec<GameEvent>);

fn create_players<R: RandomSource>(count: usize, humans: impl Fn(usize) -> bool, rng: &mut R) -> Vec<Player> {
    (0..count)
        .filter_map(|i| {
            let personality = rng.choice(&Personality::ALL).copied()?;
            let id = PlayerId::try_from(i).ok()?;
            Some(Player::new(id, humans(i), personality))
        })
        .collect()
}

fn random_seat<R: RandomSource>(count: usize, rng: &mut R) -> PlayerId {
    let max = i64::try_from(count).unwrap_or(1) - 1;
    PlayerId::try_from(rng.rand_int(0, max.max(0))).unwrap_or(0)
}

fn custom_setup<R: RandomSource>(map: &CustomMap, rng: &mut R) -> Result<Prepared, SetupError> {
    map.validate()?;
    let players = create_players(map.player_count, |i| map.is_human(i), rng);
    let board = map.to_board();
    let active = match map.first_turn {
        FirstTurn::Fixed(first) => first,
        FirstTurn::Random(_) => random_seat(map.player_count, rng),
    };
    let log = vec![GameEvent::GameStarted {
        map_name: Some(map.map_name.clone()),
        conquest: false,
    }];
    Ok((board, players, active, log))
}

fn generated_setup<R: RandomSource>(
    settings: &GameSettings,
    rng: &mut R,
) -> Result<Prepared, SetupError> {
    let civs = settings.players;
    let mut players = create_players(civs, |i| i < settings.humans, rng);

    let config = MapGenConfig {
        cell_count: settings.cell_count,
        water_level: settings.water_level,
        players: civs,
    };
    let mut board = mapgen::generate_layout(&config, rng)?;

    let conquest = settings.mode == GameMode::Conquest;
    if conquest {
        let barbarian_id = PlayerId::try_from(civs).unwrap_or(PlayerId::MAX);
        // The barbarian draws a personality like everyone else, then ignores it
        let _barbarian_personality = rng.choice(&Personality::ALL);
        players.push(Player::barbarian(barbarian_id));
        let civ_ids: Vec<PlayerId> = players
            .iter()
            .filter(|p| p.is_civilization())
            .map(|p| p.id)
            .collect();
        mapgen::place_conquest(&mut board, &civ_ids, barbarian_id, rng);
    } else {
        mapgen::assign_owners(&mut board, civs, settings.compactness, rng);
        mapgen::distribute_starting_dice(&mut board, civs, rng);
    }

    let active = random_seat(civs, rng);
    let mut log = vec![GameEvent::GameStarted {
        map_name: None,
        conquest,
    }];
    if !conquest {
        log.extend(mapgen::apply_turn_order_bonus(
            &mut board,
            &mut players,
            active,
            civs,
            rng,
        ));
    }
    Ok((board, players, active, log))
}

/// Make players sharing a tag mutual allies and record the groups.
fn forge_alliances(settings: &GameSettings, players: &mut [Player]) -> Alliances {
    let mut alliances = Alliances::default();
    if settings.alliances.is_empty() {
        return alliances;
    }

    let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    for (i, &a) in ids.iter().enumerate() {
        let tags_a = settings.tags_of(a);
        for &b in &ids[i + 1..] {
            let tags_b = settings.tags_of(b);
            if tags_a.iter().any(|t| tags_b.contains(t)) {
                players[usize::from(a)].allies.insert(b);
                players[usize::from(b)].allies.insert(a);
            }
        }
    }
    for membership in &settings.alliances {
        for tag in &membership.tags {
            match tag {
                AllianceTag::A => alliances.a.insert(membership.player),
                AllianceTag::B => alliances.b.insert(membership.player),
            };
        }
    }
    alliances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllianceMembership;
    use crate::game::invariants::check_invariants;
    use crate::game::MAX_DICE;

    fn settings(mode: GameMode) -> GameSettings {
        GameSettings {
            players: 4,
            cell_count: 60,
            water_level: 0.2,
            mode,
            ..GameSettings::default()
        }
    }

    #[test]
    fn test_classic_setup() {
        let state = new_game(&settings(GameMode::Classic), &GameSeeds::new("m", "g")).unwrap();

        assert_eq!(state.players.len(), 4);
        assert!(check_invariants(&state).is_empty());
        assert!(state.board.iter().all(|c| c.owner.is_some()));
        assert!(usize::from(state.active) < 4);
        assert!(matches!(state.log[0], GameEvent::GameStarted { conquest: false, .. }));
        assert!(state.log.iter().any(|e| matches!(e, GameEvent::TurnOrderBonus { base: 1 })));
        assert_eq!(state.rng().draws(), 0);
    }

    #[test]
    fn test_same_map_seed_same_board() {
        let a = new_game(&settings(GameMode::Classic), &GameSeeds::new("m", "g1")).unwrap();
        let b = new_game(&settings(GameMode::Classic), &GameSeeds::new("m", "g2")).unwrap();
        assert_eq!(a.board, b.board);
        assert_eq!(a.active, b.active);
        let personalities = |s: &GameState| s.players.iter().map(|p| p.personality).collect::<Vec<_>>();
        assert_eq!(personalities(&a), personalities(&b));
    }

    #[test]
    fn test_conquest_setup() {
        let state = new_game(&settings(GameMode::Conquest), &GameSeeds::new("cq", "g")).unwrap();

        assert_eq!(state.players.len(), 5);
        let barbarian = state.player(4).unwrap();
        assert!(barbarian.barbarian);
        for civ in 0..4 {
            let p = state.player(civ).unwrap();
            assert_eq!(p.cell_count(), 1);
            let cell = *p.cells.iter().next().unwrap();
            assert_eq!(state.board.get(cell).unwrap().dice, MAX_DICE);
        }
        assert!(!state.log.iter().any(|e| matches!(e, GameEvent::TurnOrderBonus { .. })));
    }

    #[test]
    fn test_alliances_forged() {
        let mut s = settings(GameMode::Classic);
        s.alliances = vec![
            AllianceMembership { player: 0, tags: vec![AllianceTag::A] },
            AllianceMembership { player: 2, tags: vec![AllianceTag::A, AllianceTag::B] },
            AllianceMembership { player: 3, tags: vec![AllianceTag::B] },
        ];
        let state = new_game(&s, &GameSeeds::new("al", "g")).unwrap();

        assert!(state.player(0).unwrap().is_allied_with(2));
        assert!(state.player(3).unwrap().is_allied_with(2));
        assert!(!state.player(0).unwrap().is_allied_with(3));
        assert!(state.alliances.is_double_member(2));
        assert!(state.log.contains(&GameEvent::AlliancesForged));
    }

    #[test]
    fn test_custom_map_setup() {
        let map = CustomMap::from_json(
            r#"{"mapName": "Strip", "playerCount": 2,
                "cells": [{"q":0,"r":0,"owner":0,"dice":2},{"q":1,"r":0,"owner":1,"dice":2}],
                "playerTypes": ["ai", "ai"], "aiDifficulty": "easy", "firstTurn": 1}"#,
        )
        .unwrap();
        let s = GameSettings {
            custom_map: Some(map),
            ..GameSettings::default()
        };
        let state = new_game(&s, &GameSeeds::new("c", "g")).unwrap();

        assert_eq!(state.active, 1);
        assert_eq!(state.map_name.as_deref(), Some("Strip"));
        assert_eq!(state.difficulty, crate::game::Difficulty::Easy);
        assert!(state.board.are_adjacent(0, 1));
    }

    #[test]
    fn test_custom_map_skips_empty_first_seat() {
        let map = CustomMap::from_json(
            r#"{"mapName": "Gap", "playerCount": 3,
                "cells": [{"q":0,"r":0,"owner":0,"dice":2},{"q":1,"r":0,"owner":1,"dice":2}],
                "playerTypes": ["ai", "ai", "ai"], "aiDifficulty": "normal", "firstTurn": 2}"#,
        )
        .unwrap();
        let s = GameSettings {
            custom_map: Some(map),
            ..GameSettings::default()
        };
        let state = new_game(&s, &GameSeeds::new("gap", "g")).unwrap();

        assert!(!state.player(2).unwrap().alive);
        assert_eq!(state.active, 0);
        assert!(check_invariants(&state).is_empty());
    }

    #[test]
    fn test_conquest_civs_draw_classic_personalities() {
        let seeds = GameSeeds::new("draws", "g");
        let classic = new_game(&settings(GameMode::Classic), &seeds).unwrap();
        let conquest = new_game(&settings(GameMode::Conquest), &seeds).unwrap();

        for civ in 0..4 {
            assert_eq!(
                classic.player(civ).unwrap().personality,
                conquest.player(civ).unwrap().personality
            );
        }
        assert!(conquest.player(4).unwrap().barbarian);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let s = GameSettings {
            players: 1,
            ..GameSettings::default()
        };
        assert!(matches!(
            new_game(&s, &GameSeeds::new("x", "y")),
            Err(SetupError::Config(_))
        ));
    }
}

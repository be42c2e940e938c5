//! Headless match runner.
//!
//! Provides a pure function interface: `(seeds, config) -> GameResult`.
//!
//! Every seat is played by the AI, including seats the settings mark as
//! human. Games are independent, so batches run in parallel with rayon,
//! each worker folding results into its own [`TournamentStats`].

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai;
use crate::config::GameSettings;
use crate::error::GameError;
use crate::game::{Action, GameState, Outcome, PlayerId, RollStats};
use crate::rng::GameSeeds;
use crate::setup::{self, SetupError};

/// Configuration for headless games.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Game settings.
    pub settings: GameSettings,
    /// Rounds before the game is called a draw.
    pub max_rounds: u32,
    /// Attacks allowed in one turn before it is ended by force.
    pub max_actions_per_turn: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            settings: GameSettings::default(),
            max_rounds: 500,
            max_actions_per_turn: 200,
        }
    }
}

/// Statistics for a single player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerStats {
    /// Player identifier.
    pub player_id: PlayerId,
    /// Barbarian seat.
    pub barbarian: bool,
    /// Cells held at the end.
    pub final_cells: usize,
    /// Dice on the board and in reserve at the end.
    pub final_dice: u32,
    /// Attacks made, drops included.
    pub attacks: u32,
    /// Attacks that captured their target.
    pub captures: u32,
    /// Round the player was eliminated (None if survived).
    pub eliminated_round: Option<u32>,
    /// Dice statistics.
    pub rolls: RollStats,
}

/// Final result of a game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    /// The winning civilization (None if the round limit was hit).
    pub winner: Option<PlayerId>,
    /// Rounds played.
    pub rounds: u32,
    /// Actions applied.
    pub actions: usize,
    /// Turns ended by the action limit.
    pub stalled_turns: u32,
    /// Per-player statistics.
    pub player_stats: Vec<PlayerStats>,
    /// Elimination order (first eliminated is index 0).
    pub elimination_order: Vec<PlayerId>,
    /// Seeds used for this game.
    pub seeds: GameSeeds,
}

/// Error type for tournament operations.
#[derive(Debug, Error)]
pub enum TournamentError {
    /// The game could not be set up.
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    /// The engine rejected an AI move.
    #[error("engine rejected ai move: {0}")]
    Engine(#[from] GameError),
}

/// Run a complete game.
///
/// # Determinism
///
/// Given the same seeds and config, this function always produces the same
/// `GameResult`.
///
/// # Errors
///
/// Returns an error if setup fails or the engine rejects an AI move.
pub fn run_game(seeds: &GameSeeds, config: &MatchConfig) -> Result<GameResult, TournamentError> {
    let mut runner = GameRunner::new(seeds, config)?;
    runner.run()?;
    Ok(runner.build_result())
}

/// Run a complete game and return the actions taken, for recordings.
///
/// # Errors
///
/// As [`run_game`].
pub fn run_recorded(
    seeds: &GameSeeds,
    config: &MatchConfig,
) -> Result<(GameResult, Vec<Action>), TournamentError> {
    let mut runner = GameRunner::new(seeds, config)?;
    runner.run()?;
    let result = runner.build_result();
    Ok((result, runner.actions))
}

/// Drives one game with the AI on every seat.
struct GameRunner {
    /// Game state.
    state: GameState,
    /// Limits.
    config: MatchConfig,
    /// Seeds used.
    seeds: GameSeeds,
    /// Every applied action.
    actions: Vec<Action>,
    /// Attack and capture counts per seat.
    attacks: Vec<(u32, u32)>,
    /// Round each seat died in.
    eliminated_round: Vec<Option<u32>>,
    /// Elimination order tracking.
    elimination_order: Vec<PlayerId>,
    /// Turns ended by the action limit.
    stalled_turns: u32,
}

impl GameRunner {
    fn new(seeds: &GameSeeds, config: &MatchConfig) -> Result<Self, TournamentError> {
        let state = setup::new_game(&config.settings, seeds)?;
        let seats = state.players.len();
        let mut runner = Self {
            state,
            config: config.clone(),
            seeds: seeds.clone(),
            actions: Vec::new(),
            attacks: vec![(0, 0); seats],
            eliminated_round: vec![None; seats],
            elimination_order: Vec::new(),
            stalled_turns: 0,
        };
        runner.update_eliminations();
        Ok(runner)
    }

    /// Play turns until someone wins or the round limit is reached.
    fn run(&mut self) -> Result<(), TournamentError> {
        // Each turn ends or removes a player, so this bounds a stuck game
        let seats = u64::try_from(self.state.players.len()).unwrap_or(u64::MAX);
        let turn_cap = u64::from(self.config.max_rounds)
            .saturating_add(1)
            .saturating_mul(seats);
        let mut turns = 0_u64;

        while !self.state.is_over() && self.state.round() <= self.config.max_rounds {
            if turns >= turn_cap {
                warn!(turns, "turn cap reached");
                break;
            }
            turns += 1;

            let report = ai::take_turn(&mut self.state, self.config.max_actions_per_turn)?;
            if report.stalled {
                self.stalled_turns += 1;
            }
            for outcome in &report.outcomes {
                if let Outcome::Attack(attack) = outcome
                    && let Some(entry) = self.attacks.get_mut(usize::from(attack.player))
                {
                    entry.0 += 1;
                    entry.1 += u32::from(attack.captured);
                }
            }
            self.actions.extend(report.actions);
            self.update_eliminations();
        }

        debug!(
            rounds = self.state.round(),
            actions = self.actions.len(),
            winner = ?self.state.winner(),
            "game finished"
        );
        Ok(())
    }

    /// Update elimination tracking after game state changes.
    fn update_eliminations(&mut self) {
        let round = self.state.round();
        for player in &self.state.players {
            let slot = &mut self.eliminated_round[usize::from(player.id)];
            if !player.alive && slot.is_none() {
                *slot = Some(round);
                self.elimination_order.push(player.id);
            }
        }
    }

    /// Build the final game result.
    fn build_result(&self) -> GameResult {
        let player_stats = self
            .state
            .players
            .iter()
            .map(|p| {
                let (attacks, captures) = self.attacks[usize::from(p.id)];
                PlayerStats {
                    player_id: p.id,
                    barbarian: p.barbarian,
                    final_cells: p.cell_count(),
                    final_dice: p.total_dice,
                    attacks,
                    captures,
                    eliminated_round: self.eliminated_round[usize::from(p.id)],
                    rolls: p.stats,
                }
            })
            .collect();

        GameResult {
            winner: self.state.winner(),
            rounds: self.state.round(),
            actions: self.actions.len(),
            stalled_turns: self.stalled_turns,
            player_stats,
            elimination_order: self.elimination_order.clone(),
            seeds: self.seeds.clone(),
        }
    }
}

/// Aggregated results over many games.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TournamentStats {
    /// Games completed.
    pub games_played: u64,
    /// Games that failed to run.
    pub errors: u64,
    /// Win count per seat.
    pub wins: Vec<u64>,
    /// Games that hit the round limit.
    pub draws: u64,
    /// Final cells per seat, summed.
    total_cells: Vec<f64>,
    /// Sum of squared final cells, for the standard deviation.
    cell_sq_sums: Vec<f64>,
    /// Captures per seat, summed.
    total_captures: Vec<u64>,
    /// Rounds across all games.
    total_rounds: u64,
}

impl TournamentStats {
    /// Create new stats for `seats` players.
    #[must_use]
    pub fn new(seats: usize) -> Self {
        Self {
            wins: vec![0; seats],
            total_cells: vec![0.0; seats],
            cell_sq_sums: vec![0.0; seats],
            total_captures: vec![0; seats],
            ..Self::default()
        }
    }

    /// Seats tracked.
    #[must_use]
    pub fn seats(&self) -> usize {
        self.wins.len()
    }

    /// Add a game result to the stats.
    pub fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_rounds += u64::from(result.rounds);

        match result.winner.map(usize::from) {
            Some(idx) if idx < self.wins.len() => self.wins[idx] += 1,
            Some(_) => {}
            None => self.draws += 1,
        }

        for stats in &result.player_stats {
            let i = usize::from(stats.player_id);
            if i < self.total_cells.len() {
                #[allow(clippy::cast_precision_loss)]
                let cells = stats.final_cells as f64;
                self.total_cells[i] += cells;
                self.cell_sq_sums[i] += cells * cells;
                self.total_captures[i] += u64::from(stats.captures);
            }
        }
    }

    /// Merge another worker's stats into this one.
    pub fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.errors += other.errors;
        self.draws += other.draws;
        self.total_rounds += other.total_rounds;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for (a, b) in self.total_cells.iter_mut().zip(&other.total_cells) {
            *a += b;
        }
        for (a, b) in self.cell_sq_sums.iter_mut().zip(&other.cell_sq_sums) {
            *a += b;
        }
        for (a, b) in self.total_captures.iter_mut().zip(&other.total_captures) {
            *a += b;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn per_game(&self, total: f64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        total / self.games_played as f64
    }

    /// Win rate for a seat (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self, seat: usize) -> f64 {
        self.per_game(self.wins.get(seat).copied().unwrap_or(0) as f64)
    }

    /// Draw rate (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn draw_rate(&self) -> f64 {
        self.per_game(self.draws as f64)
    }

    /// Average final cells for a seat.
    #[must_use]
    pub fn avg_cells(&self, seat: usize) -> f64 {
        self.per_game(self.total_cells.get(seat).copied().unwrap_or(0.0))
    }

    /// Standard deviation of final cells for a seat.
    #[must_use]
    pub fn cells_std_dev(&self, seat: usize) -> f64 {
        let mean = self.avg_cells(seat);
        let sq = self.per_game(self.cell_sq_sums.get(seat).copied().unwrap_or(0.0));
        (sq - mean * mean).max(0.0).sqrt()
    }

    /// Average captures per game for a seat.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_captures(&self, seat: usize) -> f64 {
        self.per_game(self.total_captures.get(seat).copied().unwrap_or(0) as f64)
    }

    /// Average game length in rounds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_rounds(&self) -> f64 {
        self.per_game(self.total_rounds as f64)
    }
}

/// Run `games` games in parallel, seeding game `i` from `base_seed + i`.
///
/// `on_game` is called once per finished game, from worker threads.
#[must_use]
pub fn run_tournament<F>(
    base_seed: u64,
    games: u64,
    config: &MatchConfig,
    on_game: F,
) -> TournamentStats
where
    F: Fn() + Sync,
{
    // Barbarians occupy the seat after the last civilization
    let seats = config.settings.seat_count() + 1;
    info!(games, base_seed, "tournament started");

    (0..games)
        .into_par_iter()
        .fold(
            || TournamentStats::new(seats),
            |mut local, i| {
                let seeds = GameSeeds::from_number(base_seed.wrapping_add(i));
                match run_game(&seeds, config) {
                    Ok(result) => local.add_result(&result),
                    Err(e) => {
                        warn!(map_seed = %seeds.map, error = %e, "game failed");
                        local.errors += 1;
                    }
                }
                on_game();
                local
            },
        )
        .reduce(
            || TournamentStats::new(seats),
            |mut a, b| {
                a.merge(&b);
                a
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MatchConfig {
        MatchConfig {
            settings: GameSettings {
                players: 3,
                cell_count: 30,
                ..GameSettings::default()
            },
            max_rounds: 200,
            max_actions_per_turn: 100,
        }
    }

    #[test]
    fn test_config_default() {
        let config = MatchConfig::default();
        assert_eq!(config.max_rounds, 500);
        assert_eq!(config.settings.players, 4);
    }

    #[test]
    fn test_run_game_deterministic() {
        let seeds = GameSeeds::from_number(7);
        let a = run_game(&seeds, &small_config()).unwrap();
        let b = run_game(&seeds, &small_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_game_tracks_eliminations() {
        let result = run_game(&GameSeeds::from_number(3), &small_config()).unwrap();
        assert_eq!(result.player_stats.len(), 3);
        if let Some(winner) = result.winner {
            assert_eq!(result.elimination_order.len(), 2);
            assert!(!result.elimination_order.contains(&winner));
            assert!(result.player_stats[usize::from(winner)].final_cells > 0);
        }
        for id in &result.elimination_order {
            let stats = &result.player_stats[usize::from(*id)];
            assert_eq!(stats.final_cells, 0);
            assert!(stats.eliminated_round.is_some());
        }
    }

    #[test]
    fn test_recorded_actions_match_count() {
        let (result, actions) = run_recorded(&GameSeeds::from_number(5), &small_config()).unwrap();
        assert_eq!(result.actions, actions.len());
        assert!(actions.contains(&Action::EndTurn));
    }

    #[test]
    fn test_setup_error_reported() {
        let mut config = small_config();
        config.settings.players = 1;
        assert!(matches!(
            run_game(&GameSeeds::from_number(1), &config),
            Err(TournamentError::Setup(_))
        ));
    }

    #[test]
    fn test_stats_merge() {
        let config = small_config();
        let mut total = TournamentStats::new(4);
        let mut other = TournamentStats::new(4);
        for seed in 0..2 {
            total.add_result(&run_game(&GameSeeds::from_number(seed), &config).unwrap());
        }
        other.add_result(&run_game(&GameSeeds::from_number(2), &config).unwrap());
        total.merge(&other);

        assert_eq!(total.games_played, 3);
        assert_eq!(total.wins.iter().sum::<u64>() + total.draws, 3);
        assert!(total.avg_rounds() > 0.0);
    }

    #[test]
    fn test_run_tournament_counts_games() {
        let stats = run_tournament(100, 4, &small_config(), || {});
        assert_eq!(stats.games_played + stats.errors, 4);
        assert_eq!(stats.seats(), 4);
    }
}

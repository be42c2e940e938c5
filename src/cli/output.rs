//! Output formatting utilities for CLI.

use std::fmt::Write as _;

use hexdice::tournament::{GameResult, TournamentStats};
use serde::Serialize;

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Game Result (map seed: {}, gameplay seed: {})",
        result.seeds.map, result.seeds.gameplay
    );
    match result.winner {
        Some(winner) => {
            let _ = writeln!(output, "  Winner: Player {winner}");
        }
        None => output.push_str("  Winner: none (round limit)\n"),
    }
    let _ = writeln!(output, "  Rounds: {}  Actions: {}", result.rounds, result.actions);
    if result.stalled_turns > 0 {
        let _ = writeln!(output, "  Stalled turns: {}", result.stalled_turns);
    }
    output.push('\n');

    for stats in &result.player_stats {
        let label = if stats.barbarian { " (barbarians)" } else { "" };
        let _ = write!(
            output,
            "  Player {}{label}: {} cells, {} dice, {}/{} attacks won",
            stats.player_id, stats.final_cells, stats.final_dice, stats.captures, stats.attacks
        );
        if let Some(round) = stats.eliminated_round {
            let _ = write!(output, " [eliminated round {round}]");
        }
        output.push('\n');
    }

    output
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Games that failed.
    errors: u64,
    /// Per-seat statistics.
    players: Vec<JsonTournamentPlayer>,
    /// Games that hit the round limit.
    draws: u64,
    /// Average game length in rounds.
    avg_rounds: f64,
}

/// JSON-serializable per-seat tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentPlayer {
    /// Seat index (0-based).
    player: usize,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average final cells.
    avg_cells: f64,
    /// Final cells standard deviation.
    cells_std_dev: f64,
    /// Average captures per game.
    avg_captures: f64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats) -> Self {
        let players = (0..stats.seats())
            .map(|i| JsonTournamentPlayer {
                player: i,
                wins: stats.wins.get(i).copied().unwrap_or(0),
                win_rate: stats.win_rate(i),
                avg_cells: stats.avg_cells(i),
                cells_std_dev: stats.cells_std_dev(i),
                avg_captures: stats.avg_captures(i),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            errors: stats.errors,
            players,
            draws: stats.draws,
            avg_rounds: stats.avg_rounds(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Tournament Results ({} games)", stats.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for i in 0..stats.seats() {
        let wins = stats.wins.get(i).copied().unwrap_or(0);
        let _ = writeln!(
            output,
            "  Player {i}: {:.1}% ({wins} wins)",
            stats.win_rate(i) * 100.0
        );
    }
    let _ = writeln!(
        output,
        "  Draws: {} ({:.1}%)\n",
        stats.draws,
        stats.draw_rate() * 100.0
    );

    output.push_str("Average Final Cells:\n");
    for i in 0..stats.seats() {
        let _ = writeln!(
            output,
            "  Player {i}: {:.1} (+/- {:.1}), {:.1} captures/game",
            stats.avg_cells(i),
            stats.cells_std_dev(i),
            stats.avg_captures(i)
        );
    }

    let _ = writeln!(output, "\nAverage Game Length: {:.0} rounds", stats.avg_rounds());
    if stats.errors > 0 {
        let _ = writeln!(output, "Failed games: {}", stats.errors);
    }

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats) -> String {
    let mut output = String::from("player,wins,win_rate,avg_cells,cells_std_dev,avg_captures\n");

    for i in 0..stats.seats() {
        let _ = writeln!(
            output,
            "{i},{},{:.4},{:.2},{:.2},{:.2}",
            stats.wins.get(i).copied().unwrap_or(0),
            stats.win_rate(i),
            stats.avg_cells(i),
            stats.cells_std_dev(i),
            stats.avg_captures(i)
        );
    }

    output
}

//! Structured text output.
//!
//! This format is optimized for machine readability while remaining
//! human-parseable: plain lines, no colors, stable field order.

use std::fmt::Write as _;

use crate::game::{GameEvent, GameState};

/// Events shown at the bottom of a status report.
const RECENT_EVENTS: usize = 10;

/// Render game state as a structured status report.
///
/// Output format:
/// ```text
/// === ROUND 4 ===
/// Active: P2
///
/// PLAYER 0 (Red, aggressive):
/// - Cells: 12 (largest region 9)
/// - Dice: 41 (reserve 3)
/// ...
/// RECENT EVENTS:
/// - P0 attacked cell 7 ...
/// ```
#[must_use]
pub fn render_text(state: &GameState) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "=== ROUND {} ===", state.round());
    match state.winner() {
        Some(winner) => {
            let _ = writeln!(output, "Winner: P{winner}");
        }
        None => {
            let _ = writeln!(output, "Active: P{}", state.active);
        }
    }
    if let Some(name) = &state.map_name {
        let _ = writeln!(output, "Map: {name}");
    }
    let _ = writeln!(
        output,
        "Board: {} cells, {} dice",
        state.board.len(),
        state.board.dice_on_board()
    );
    output.push('\n');

    for player in &state.players {
        let kind = if player.barbarian {
            "barbarian".to_string()
        } else {
            format!("{:?}", player.personality).to_lowercase()
        };
        let _ = writeln!(output, "PLAYER {} ({}, {kind}):", player.id, player.name);
        if !player.alive {
            output.push_str("- Eliminated\n\n");
            continue;
        }
        let _ = writeln!(
            output,
            "- Cells: {} (largest region {})",
            player.cell_count(),
            player.largest_region_size()
        );
        let _ = writeln!(output, "- Dice: {} (reserve {})", player.total_dice, player.reserve);
        if !player.allies.is_empty() {
            let allies: Vec<String> = player.allies.iter().map(|a| format!("P{a}")).collect();
            let _ = writeln!(output, "- Allies: {}", allies.join(", "));
        }
        if let Some(avg) = player.stats.my_average() {
            let _ = writeln!(output, "- Average roll: {avg:.2}");
        }
        output.push('\n');
    }

    let start = state.log.len().saturating_sub(RECENT_EVENTS);
    if start < state.log.len() {
        output.push_str("RECENT EVENTS:\n");
        output.push_str(&render_log(&state.log[start..]));
    }
    output
}

/// One line per event.
#[must_use]
pub fn render_log(events: &[GameEvent]) -> String {
    let mut output = String::new();
    for event in events {
        let _ = writeln!(output, "- {event}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Action;
    use crate::game::testing::{duel_board, two_player_state};

    #[test]
    fn test_status_report() {
        let mut state = two_player_state(duel_board());
        state.apply(Action::EndTurn).unwrap();
        let out = render_text(&state);

        assert!(out.starts_with("=== ROUND 1 ==="));
        assert!(out.contains("Active: P1"));
        assert!(out.contains("PLAYER 0"));
        assert!(out.contains("- Cells: 2 (largest region 2)"));
        assert!(out.contains("RECENT EVENTS:"));
    }

    #[test]
    fn test_log_lines() {
        let state = two_player_state(duel_board());
        let out = render_log(&state.log);
        assert_eq!(out.lines().count(), state.log.len());
    }
}

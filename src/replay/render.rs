//! ASCII renderer for terminal viewing with ANSI colors.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::game::{Cell, GameState, PlayerId};

/// ANSI color codes for players.
const PLAYER_COLORS: [&str; 8] = [
    "\x1b[31m", // Player 0: Red
    "\x1b[34m", // Player 1: Blue
    "\x1b[32m", // Player 2: Green
    "\x1b[33m", // Player 3: Yellow
    "\x1b[35m", // Player 4: Magenta
    "\x1b[36m", // Player 5: Cyan
    "\x1b[91m", // Player 6: Bright Red
    "\x1b[94m", // Player 7: Bright Blue
];

const BARBARIAN: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Render game state to ASCII, optionally with ANSI colors.
///
/// Cells are laid out in doubled-width hex rows. Each cell shows its owner
/// (`B` for barbarians, `.` when unowned) followed by its dice:
/// ```text
/// Round 3  P1 to move
///  04  13  13
///    07  .0  B2
/// ```
#[must_use]
pub fn render_ascii(state: &GameState, color: bool) -> String {
    let mut output = String::new();
    render_header(&mut output, state, color);
    render_map(&mut output, state, color);
    output.push('\n');
    render_player_stats(&mut output, state, color);
    output
}

fn player_color(state: &GameState, player: PlayerId) -> &'static str {
    if state.player(player).is_some_and(|p| p.barbarian) {
        return BARBARIAN;
    }
    PLAYER_COLORS[usize::from(player) % PLAYER_COLORS.len()]
}

fn render_header(output: &mut String, state: &GameState, color: bool) {
    let _ = write!(output, "Round {}", state.round());
    if let Some(winner) = state.winner() {
        let _ = writeln!(output, "  P{winner} wins");
        return;
    }
    if color {
        let c = player_color(state, state.active);
        let _ = writeln!(output, "  {c}{BOLD}P{} to move{RESET}", state.active);
    } else {
        let _ = writeln!(output, "  P{} to move", state.active);
    }
}

/// Owner glyph for a cell.
fn owner_glyph(state: &GameState, cell: &Cell) -> char {
    match cell.owner {
        None => '.',
        Some(o) if state.player(o).is_some_and(|p| p.barbarian) => 'B',
        Some(o) => char::from_digit(u32::from(o), 10).unwrap_or('?'),
    }
}

fn render_map(output: &mut String, state: &GameState, color: bool) {
    if state.board.is_empty() {
        output.push_str("(empty board)\n");
        return;
    }
    // Doubled coordinates: x = 2q + r keeps neighbors in a row two apart
    let mut rows: BTreeMap<i32, BTreeMap<i32, &Cell>> = BTreeMap::new();
    for cell in state.board.iter() {
        rows.entry(cell.hex.r)
            .or_default()
            .insert(2 * cell.hex.q + cell.hex.r, cell);
    }
    let min_x = rows
        .values()
        .filter_map(|row| row.keys().next())
        .min()
        .copied()
        .unwrap_or(0);

    let highlighted = |id| {
        state
            .last_attack
            .iter()
            .chain(state.pending.iter())
            .any(|a| a.from == id || a.to == id)
    };

    for row in rows.values() {
        let mut x = min_x;
        for (&cx, cell) in row {
            while x < cx {
                output.push_str("  ");
                x += 1;
            }
            let glyph = owner_glyph(state, cell);
            match (color, cell.owner) {
                (true, Some(o)) => {
                    let c = player_color(state, o);
                    let weight = if highlighted(cell.id) { BOLD } else { "" };
                    let _ = write!(output, "{c}{weight}{glyph}{}{RESET}", cell.dice);
                }
                (true, None) => {
                    let _ = write!(output, "{DIM}{glyph}{}{RESET}", cell.dice);
                }
                (false, _) => {
                    let _ = write!(output, "{glyph}{}", cell.dice);
                }
            }
            x += 1;
        }
        output.push('\n');
    }
}

fn render_player_stats(output: &mut String, state: &GameState, color: bool) {
    for player in &state.players {
        let (c, reset) = if color {
            (player_color(state, player.id), RESET)
        } else {
            ("", "")
        };
        let _ = write!(output, "{c}P{} {}{reset}", player.id, player.name);
        if !player.alive {
            output.push_str("  eliminated\n");
            continue;
        }
        let _ = writeln!(
            output,
            "  cells {}  dice {}  reserve {}  region {}",
            player.cell_count(),
            player.total_dice,
            player.reserve,
            player.largest_region_size()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{duel_board, two_player_state};

    #[test]
    fn test_plain_render() {
        let state = two_player_state(duel_board());
        let out = render_ascii(&state, false);
        assert!(out.starts_with("Round 1  P0 to move"));
        assert!(out.contains("03  05  12  13"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_colored_render() {
        let state = two_player_state(duel_board());
        let out = render_ascii(&state, true);
        assert!(out.contains(PLAYER_COLORS[0]));
        assert!(out.contains(PLAYER_COLORS[1]));
        assert!(out.contains(RESET));
    }
}

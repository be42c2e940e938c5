//! Validate command implementation.

use std::fs;
use std::path::Path;

use hexdice::config::GameSettings;
use hexdice::custom_map::CustomMap;
use hexdice::persistence::{self, PersistError};

use super::CliError;

/// Execute the validate command.
///
/// `.toml` files are checked as settings. Anything else is tried as a
/// custom map, then as a saved game.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub(crate) fn execute(file: &Path) -> Result<(), CliError> {
    println!("Validating: {}", file.display());
    println!();

    if file.extension().is_some_and(|e| e == "toml") {
        let settings = GameSettings::from_file(file)?;
        print_check("Settings parse and range checks", true);
        println!();
        println!("Summary:");
        println!("  Players:  {}", settings.seat_count());
        println!("  Cells:    {}", settings.cell_count);
        println!("  Mode:     {:?}", settings.mode);
        println!();
        println!("Validation successful!");
        return Ok(());
    }

    let json = fs::read_to_string(file)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", file.display())))?;

    match CustomMap::from_json(&json) {
        Ok(map) => {
            print_check("Custom map document", true);
            let board = map.to_board();
            let isolated = board.iter().filter(|c| c.neighbors.is_empty()).count();
            print_check("Every cell has a neighbor", isolated == 0);
            println!();
            println!("Summary:");
            println!("  Name:     {}", map.map_name);
            println!("  Players:  {}", map.player_count);
            println!("  Cells:    {}", board.len());
            println!();
            println!("Validation successful!");
            return Ok(());
        }
        Err(map_err) => {
            print_check("Custom map document", false);
            println!("    {map_err}");
        }
    }

    let state = match persistence::from_json(&json) {
        Ok(state) => state,
        Err(PersistError::Invalid(violations)) => {
            print_check("Saved game", true);
            print_check("Game invariants", false);
            for v in &violations {
                println!("    {v}");
            }
            return Err(CliError::new(format!(
                "{} invariant violation(s)",
                violations.len()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    print_check("Saved game", true);
    print_check("Game invariants", true);

    println!();
    println!("Summary:");
    println!("  Round:    {}", state.round());
    println!("  Players:  {}", state.alive_players().count());
    println!("  Cells:    {}", state.board.len());
    println!();
    println!("Validation successful!");
    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}

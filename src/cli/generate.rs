//! Generate command implementation.

use std::path::Path;

use hexdice::custom_map::CustomMap;
use hexdice::new_game;
use hexdice::replay::render_ascii;

use super::{CliError, GameArgs, color_stdout, seeds_from};

/// Execute the generate command: build a starting position and show it.
///
/// # Errors
///
/// Returns an error if setup fails or the export cannot be written.
pub(crate) fn execute(
    game: &GameArgs,
    seed: Option<u64>,
    export: Option<&Path>,
    name: &str,
) -> Result<(), CliError> {
    let settings = game.settings()?;
    let seeds = seeds_from(seed);
    let state = new_game(&settings, &seeds)?;

    println!("Map seed: {}", seeds.map);
    println!(
        "Cells: {}  Players: {}  First to move: P{}",
        state.board.len(),
        state.players.len(),
        state.active
    );
    println!();
    print!("{}", render_ascii(&state, color_stdout()));

    if let Some(path) = export {
        let map = CustomMap::from_state(&state, name);
        std::fs::write(path, map.to_json()?)?;
        println!();
        println!("Map exported to: {}", path.display());
    }
    Ok(())
}

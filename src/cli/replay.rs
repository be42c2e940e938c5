//! Replay command implementation.

use std::path::Path;

use hexdice::game::Action;
use hexdice::replay::{Recording, ReplayEngine, render_ascii, render_log, render_text};

use super::{CliError, ReplayFormat, color_stdout};

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or replayed.
pub(crate) fn execute(
    recording_path: &Path,
    format: ReplayFormat,
    action: Option<usize>,
) -> Result<(), CliError> {
    let recording = Recording::load(recording_path).map_err(|e| {
        CliError::new(format!(
            "Failed to load recording {}: {e}",
            recording_path.display()
        ))
    })?;

    match (format, action) {
        (ReplayFormat::Board, None) => print_board_replay(ReplayEngine::new(recording)?),
        (ReplayFormat::Board, Some(target)) => {
            let engine = ReplayEngine::new_at(recording, target)?;
            println!("=== After action {} of {} ===", engine.position(), engine.len());
            print!("{}", engine.render_ascii(color_stdout()));
            Ok(())
        }
        (ReplayFormat::Text, target) => {
            let engine = at_target(recording, target)?;
            print!("{}", render_text(engine.state()));
            Ok(())
        }
        (ReplayFormat::Log, target) => {
            let engine = at_target(recording, target)?;
            print!("{}", render_log(&engine.state().log));
            Ok(())
        }
    }
}

/// Engine after `target` actions, or at the end.
fn at_target(recording: Recording, target: Option<usize>) -> Result<ReplayEngine, CliError> {
    let target = target.unwrap_or(recording.actions.len());
    Ok(ReplayEngine::new_at(recording, target)?)
}

/// Print the board at the start and after every completed turn.
fn print_board_replay(mut engine: ReplayEngine) -> Result<(), CliError> {
    let seeds = &engine.recording().seeds;
    println!(
        "Replay of game (map seed: {}, gameplay seed: {})",
        seeds.map, seeds.gameplay
    );
    println!("Actions: {}", engine.len());
    println!();

    let color = color_stdout();
    println!("=== Start ===");
    print!("{}", render_ascii(engine.state(), color));
    println!();

    while !engine.is_finished() {
        let index = engine.position();
        let action = engine.recording().actions[index];
        engine.step_forward()?;
        let turn_over = matches!(action, Action::EndTurn | Action::Surrender { .. });
        if turn_over || engine.is_finished() {
            println!("=== After action {} ===", index + 1);
            print!("{}", render_ascii(engine.state(), color));
            println!();
        }
    }

    if engine.state().is_over() {
        println!("=== GAME OVER ===");
    }
    Ok(())
}

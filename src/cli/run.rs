//! Run command implementation.

use std::path::Path;

use hexdice::persistence;
use hexdice::replay::{Recording, ReplayEngine, render_ascii, render_log};
use hexdice::tournament::{MatchConfig, run_recorded};

use super::output::format_text;
use super::{CliError, GameArgs, OutputFormat, color_stdout, seeds_from};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game fails to run or an output file cannot be
/// written.
pub(crate) fn execute(
    game: &GameArgs,
    seed: Option<u64>,
    max_rounds: u32,
    format: OutputFormat,
    save: Option<&Path>,
    save_state: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = game.settings()?;
    let seeds = seeds_from(seed);
    let config = MatchConfig {
        settings,
        max_rounds,
        ..MatchConfig::default()
    };

    if !quiet && format == OutputFormat::Text {
        println!(
            "Running game (map seed {}, gameplay seed {})...",
            seeds.map, seeds.gameplay
        );
        println!();
    }

    let (result, actions) = run_recorded(&seeds, &config)?;
    let recording = Recording::new(config.settings, seeds, actions);

    if let Some(save_path) = save {
        recording
            .save(save_path)
            .map_err(|e| CliError::new(format!("Failed to save recording: {e}")))?;
        if !quiet && format == OutputFormat::Text {
            println!("Recording saved to: {}", save_path.display());
            println!();
        }
    }

    // The final state is rebuilt from the recording
    let needs_state = save_state.is_some() || format != OutputFormat::Json;
    let engine = if needs_state {
        let len = recording.actions.len();
        Some(ReplayEngine::new_at(recording, len)?)
    } else {
        None
    };

    if let (Some(path), Some(engine)) = (save_state, &engine) {
        persistence::save_game(engine.state(), path)?;
    }

    match format {
        OutputFormat::Text => {
            if let Some(engine) = &engine {
                print!("{}", render_ascii(engine.state(), color_stdout()));
                println!();
            }
            print!("{}", format_text(&result));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        OutputFormat::Log => {
            if let Some(engine) = &engine {
                print!("{}", render_log(&engine.state().log));
            }
        }
    }

    Ok(())
}

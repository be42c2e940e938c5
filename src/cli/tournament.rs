//! Tournament command implementation.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use hexdice::tournament::{MatchConfig, run_tournament};
use indicatif::{ProgressBar, ProgressStyle};

use super::output::{JsonTournamentResult, format_tournament_csv, format_tournament_text};
use super::{CliError, GameArgs, TournamentFormat};

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the settings are invalid or output fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    game: &GameArgs,
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    max_rounds: Option<u32>,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    let mut config = MatchConfig {
        settings: game.settings()?,
        ..MatchConfig::default()
    };
    if let Some(rounds) = max_rounds {
        config.max_rounds = rounds;
    }

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(42, |d| u64::try_from(d.as_nanos()).unwrap_or(42))
    });

    let pb = if progress {
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})",
            )
            .map_err(|e| CliError::new(format!("Bad progress template: {e}")))?
            .progress_chars("=>-");
        let pb = ProgressBar::new(games);
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let stats = run_tournament(base_seed, games, &config, || {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    });
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    let duration = start.elapsed();

    #[allow(clippy::cast_precision_loss)]
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats));
            println!();
            println!("Base seed: {base_seed}");
            println!(
                "Duration: {:.2}s ({games_per_sec:.0} games/sec)",
                duration.as_secs_f64()
            );
        }
        TournamentFormat::Json => {
            let json_result = JsonTournamentResult::from_stats(&stats);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats));
        }
    }

    Ok(())
}

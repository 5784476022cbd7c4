//! Rate command implementation: preview the rating change for a result.

use noise_before_defeat::rating::{elo_delta, expected_score, streak_factor};
use serde::Serialize;

use super::{CliError, OutputFormat};

/// JSON-serializable rating preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RatingPreview {
    expected: f64,
    streak_factor: f64,
    delta: u32,
    winner_elo_after: u32,
    loser_elo_after: u32,
}

/// Execute the rate command.
///
/// # Errors
///
/// Returns an error if JSON output cannot be produced.
pub(crate) fn execute(
    winner_elo: u32,
    loser_elo: u32,
    loser_streak: u32,
    format: OutputFormat,
) -> Result<(), CliError> {
    let delta = elo_delta(winner_elo, loser_elo, loser_streak);
    let preview = RatingPreview {
        expected: expected_score(winner_elo, loser_elo),
        streak_factor: streak_factor(loser_streak),
        delta,
        winner_elo_after: winner_elo.saturating_add(delta),
        loser_elo_after: loser_elo.saturating_sub(delta),
    };

    match format {
        OutputFormat::Text => {
            println!("Expected score: {:.3}", preview.expected);
            println!("Streak factor:  {:.1}", preview.streak_factor);
            println!("Rating change:  {delta}");
            println!("Winner: {winner_elo} -> {}", preview.winner_elo_after);
            println!("Loser:  {loser_elo} -> {}", preview.loser_elo_after);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
    }
    Ok(())
}

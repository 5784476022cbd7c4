//! Play command implementation.
//!
//! Drives a match from a JSON script of intents, one step per element:
//!
//! ```json
//! [
//!   { "player": "p1", "intent": { "type": "selectAction", "action": "move" } },
//!   { "player": "p1", "intent": { "type": "clickCell", "x": 0, "y": -2 } },
//!   { "wait": 45 }
//! ]
//! ```
//!
//! A `wait` step advances the turn clock when the match has a turn timer.

use std::fs;
use std::path::Path;
use std::time::Duration;

use noise_before_defeat::game::TurnClock;
use noise_before_defeat::{handle_intent, Intent, MatchConfig, MatchRecord, PlayerSlot};
use serde::Deserialize;
use tracing::{info, warn};

use super::output::{format_game, PlayedStep, PlayReport};
use super::{CliError, OutputFormat};

/// One scripted step.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptStep {
    Intent { player: PlayerSlot, intent: Intent },
    Wait { wait: u64 },
}

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the script or config cannot be read, or the record
/// cannot be saved.
pub(crate) fn execute(
    script: &Path,
    config: Option<&Path>,
    format: OutputFormat,
    save: Option<&Path>,
) -> Result<(), CliError> {
    let config = match config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    let text = fs::read_to_string(script)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", script.display())))?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&text)?;

    let mut game = config.new_game();
    let mut clock = config.turn_limit().map(TurnClock::new);
    let mut played = Vec::with_capacity(steps.len());

    for step in steps {
        match step {
            ScriptStep::Intent { player, intent } => {
                let entry = match handle_intent(&mut game, player, intent) {
                    Ok(outcome) => PlayedStep::accepted(player, intent, outcome),
                    Err(refusal) => {
                        warn!(%player, %refusal, "intent refused");
                        PlayedStep::refused(player, intent, &refusal)
                    }
                };
                played.push(entry);
            }
            ScriptStep::Wait { wait } => {
                let Some(clock) = clock.as_mut() else {
                    warn!(seconds = wait, "wait step ignored: match has no turn timer");
                    continue;
                };
                let expired_for = game.active_player;
                if let Some(outcome) = clock.tick(&mut game, Duration::from_secs(wait)) {
                    played.push(PlayedStep::timed_out(expired_for, outcome));
                }
            }
        }
    }
    info!(steps = played.len(), turn = game.turn, "script finished");

    if let Some(path) = save {
        let record = MatchRecord::from_game(&game, config.game_id.clone())?;
        record.save(path)?;
        info!(path = %path.display(), "record saved");
    }

    match format {
        OutputFormat::Text => {
            for step in &played {
                println!("{step}");
            }
            println!();
            print!("{}", format_game(&game));
        }
        OutputFormat::Json => {
            let report = PlayReport {
                steps: &played,
                state: &game,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

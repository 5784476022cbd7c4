//! Completed-match records.
//!
//! A [`MatchRecord`] captures who played, how their ratings moved, the
//! grades, and the full game log. Records are stored as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::game::{GameState, PlayerSlot};
use crate::rating::MatchResult;

/// One side of a recorded match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPlayer {
    /// Display name.
    pub username: String,
    /// Rating before the match.
    pub elo_before: u32,
    /// Rating after the match.
    pub elo_after: u32,
}

/// A finished match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Replication identifier, if the match had one.
    pub game_id: Option<String>,
    /// First seat.
    pub p1: RecordedPlayer,
    /// Second seat.
    pub p2: RecordedPlayer,
    /// Rating outcome.
    pub result: MatchResult,
    /// The full game log.
    pub log: Vec<String>,
}

impl MatchRecord {
    /// Build a record from a finished, rated match.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Unfinished`] if the match has not been rated yet.
    pub fn from_game(state: &GameState, game_id: Option<String>) -> Result<Self, RecordError> {
        let result = state.result.ok_or(RecordError::Unfinished)?;
        let side = |slot: PlayerSlot| {
            let (before, after) = if slot == result.winner {
                (result.winner_elo_before, result.winner_elo_after)
            } else {
                (result.loser_elo_before, result.loser_elo_after)
            };
            RecordedPlayer {
                username: state.player(slot).username.clone(),
                elo_before: before,
                elo_after: after,
            }
        };
        Ok(Self {
            game_id,
            p1: side(PlayerSlot::P1),
            p2: side(PlayerSlot::P2),
            result,
            log: state.game_log.clone(),
        })
    }

    /// Seat's entry in the record.
    #[must_use]
    pub const fn player(&self, slot: PlayerSlot) -> &RecordedPlayer {
        match slot {
            PlayerSlot::P1 => &self.p1,
            PlayerSlot::P2 => &self.p2,
        }
    }

    /// Username of the winner.
    #[must_use]
    pub fn winner_name(&self) -> &str {
        &self.player(self.result.winner).username
    }

    /// Write the record to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a record from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a record.
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{handle_intent, Grade, Intent};

    fn forfeited_game() -> GameState {
        let mut game = GameState::new("alice", "bob");
        handle_intent(&mut game, PlayerSlot::P2, Intent::ExitGame).unwrap();
        game
    }

    #[test]
    fn test_record_from_finished_game() {
        let game = forfeited_game();
        let record = MatchRecord::from_game(&game, Some("g1".into())).unwrap();

        assert_eq!(record.winner_name(), "alice");
        assert_eq!(record.p1.elo_before, 500);
        assert_eq!(record.p1.elo_after, 515);
        assert_eq!(record.p2.elo_after, 485);
        assert_eq!(record.result.loser_grade, Grade::F);
        assert_eq!(record.log.last().map(String::as_str), Some("Game over: alice wins!"));
    }

    #[test]
    fn test_unfinished_game_has_no_record() {
        let game = GameState::new("alice", "bob");
        assert!(matches!(
            MatchRecord::from_game(&game, None),
            Err(RecordError::Unfinished)
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = MatchRecord::from_game(&forfeited_game(), None).unwrap();

        record.save(&path).unwrap();
        let loaded = MatchRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(MatchRecord::load(&path), Err(RecordError::Format(_))));
    }
}

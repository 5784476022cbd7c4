//! Error types.
//!
//! A [`Refusal`] is the engine's answer to an intent whose preconditions do
//! not hold. It is never fatal and never leaves a partial mutation behind.
//! The remaining types cover the I/O edges: configuration, match records, and
//! snapshot replication.

use std::io;

use thiserror::Error;

use crate::game::{PlayerSlot, HACK_COST};

/// Why an intent was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Refusal {
    /// The match is over.
    #[error("the game is over")]
    GameOver,
    /// Turn-end effects are still being applied.
    #[error("turn is being resolved")]
    NotPlanning,
    /// Only the active player may act.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerSlot),
    /// The active player already signalled ready.
    #[error("player is already ready")]
    AlreadyReady,
    /// The per-turn action budget is spent.
    #[error("no actions left this turn")]
    BudgetExhausted,
    /// The clicked cell is off the board.
    #[error("cell is off the board")]
    OffBoard,
    /// The referenced unit does not exist.
    #[error("no such unit")]
    NoSuchUnit,
    /// The unit has no HP left.
    #[error("unit is out of action")]
    UnitDisabled,
    /// Nothing is selected for this step.
    #[error("nothing selected")]
    NothingSelected,
    /// The destination is not one of the unit's valid moves.
    #[error("destination is not a valid move")]
    InvalidDestination,
    /// Units on the center square may not attack or hack.
    #[error("Units on the center square cannot act")]
    FromCenterSquare,
    /// The selected unit has nothing within reach.
    #[error("Attack failed: No targets in range")]
    NoTargetsInRange,
    /// The target is beyond the attacker's reach.
    #[error("Attack failed: Target out of range")]
    OutOfRange,
    /// No opponent entity stands on the cell.
    #[error("no target on that cell")]
    NoTarget,
    /// Hacks only work on installations.
    #[error("hack target is not an installation")]
    NotAnInstallation,
    /// Not enough Intel Points to hack.
    #[error("Hack failed: Not enough Intel Points ({have}/{HACK_COST})")]
    InsufficientIntel {
        /// Intel Points the player holds.
        have: u32,
    },
    /// The player's research lab is down.
    #[error("Hack failed: R&D lab is offline")]
    LabOffline,
    /// The unit is too small or too worn down to split.
    #[error("unit is too small or too damaged to split")]
    CannotSplit,
    /// The split amount is outside the allowed range.
    #[error("Split failed: amount must be between {min} and {max}")]
    InvalidSplitAmount {
        /// Smallest allowed amount.
        min: u32,
        /// Largest allowed amount.
        max: u32,
    },
    /// No free cell next to the unit for the split-off half.
    #[error("Split failed: no free cell next to the unit")]
    NoRoomToSplit,
    /// A surround attack needs at least two attackers in range.
    #[error("Surround attack needs at least 2 units in range ({found} available)")]
    TooFewAttackers {
        /// Eligible attackers found.
        found: usize,
    },
    /// The same unit was committed twice to a surround attack.
    #[error("unit already committed to the surround attack")]
    DuplicateAttacker,
}

impl Refusal {
    /// Game-log line for refusals the player is told about.
    ///
    /// Other refusals are dropped without a trace in the game log.
    #[must_use]
    pub fn log_line(&self) -> Option<String> {
        match self {
            Self::FromCenterSquare
            | Self::NoTargetsInRange
            | Self::OutOfRange
            | Self::InsufficientIntel { .. }
            | Self::LabOffline
            | Self::InvalidSplitAmount { .. }
            | Self::NoRoomToSplit
            | Self::TooFewAttackers { .. } => Some(self.to_string()),
            _ => None,
        }
    }
}

/// Failure loading a match configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid TOML for a match configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure saving or loading a match record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// File access failed.
    #[error("record I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The record is not valid JSON.
    #[error("record format error: {0}")]
    Format(#[from] serde_json::Error),
    /// The match has not finished.
    #[error("match is still in progress")]
    Unfinished,
}

/// Failure replicating a snapshot.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The snapshot could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    /// The snapshot belongs to another game.
    #[error("snapshot for game {found} delivered to game {expected}")]
    WrongGame {
        /// Game this adapter replicates.
        expected: String,
        /// Game named in the snapshot.
        found: String,
    },
    /// Nobody is listening on the other end.
    #[error("subscriber channel closed")]
    Disconnected,
    /// The local intent was refused.
    #[error("intent refused: {0}")]
    Refused(#[from] Refusal),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_display() {
        let err = Refusal::InsufficientIntel { have: 30 };
        assert_eq!(err.to_string(), "Hack failed: Not enough Intel Points (30/40)");

        let err = Refusal::TooFewAttackers { found: 1 };
        assert!(err.to_string().contains("at least 2"));

        // Covers hacks and surround contributions too
        assert_eq!(
            Refusal::FromCenterSquare.to_string(),
            "Units on the center square cannot act"
        );
    }

    #[test]
    fn test_refusal_log_lines() {
        assert_eq!(
            Refusal::OutOfRange.log_line().as_deref(),
            Some("Attack failed: Target out of range")
        );
        assert!(Refusal::BudgetExhausted.log_line().is_none());
        assert!(Refusal::NotYourTurn(PlayerSlot::P2).log_line().is_none());
    }
}

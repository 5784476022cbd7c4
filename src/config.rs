//! Match configuration, loaded from TOML.
//!
//! ```toml
//! game_id = "lobby-42"
//! mode = "flash"
//!
//! [p1]
//! username = "alice"
//! elo = 620
//!
//! [p2]
//! username = "bob"
//! consecutive_losses = 2
//! ```
//!
//! Rule constants are fixed; only who plays, their standing, and the
//! pacing of the match are configurable.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{GameState, Player, PlayerSlot, Players, DEFAULT_ELO};

/// Turn timer used by flash matches unless overridden.
pub const FLASH_TURN_SECONDS: u64 = 40;

/// Match pacing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// No turn timer unless one is configured.
    #[default]
    Standard,
    /// Timed turns.
    Flash,
}

/// One seat's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Display name.
    pub username: String,
    /// Rating going into the match.
    pub elo: u32,
    /// Loss streak going into the match.
    pub consecutive_losses: u32,
}

impl PlayerConfig {
    fn named(username: &str) -> Self {
        Self {
            username: username.to_string(),
            elo: DEFAULT_ELO,
            consecutive_losses: 0,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::named("player")
    }
}

/// Everything needed to set up a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Identifier the snapshot is replicated under.
    pub game_id: Option<String>,
    /// Match pacing.
    pub mode: GameMode,
    /// Turn timer override, in seconds.
    pub turn_seconds: Option<u64>,
    /// First seat.
    pub p1: PlayerConfig,
    /// Second seat.
    pub p2: PlayerConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            game_id: None,
            mode: GameMode::Standard,
            turn_seconds: None,
            p1: PlayerConfig::named("player1"),
            p2: PlayerConfig::named("player2"),
        }
    }
}

impl MatchConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for a configuration,
    /// or a value is unusable.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (slot, player) in [(PlayerSlot::P1, &self.p1), (PlayerSlot::P2, &self.p2)] {
            if player.username.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{slot} username is empty")));
            }
        }
        if self.p1.username == self.p2.username {
            return Err(ConfigError::Invalid(
                "both players have the same username".to_string(),
            ));
        }
        if self.turn_seconds == Some(0) {
            return Err(ConfigError::Invalid(
                "turn_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Turn timer for this match, if any.
    #[must_use]
    pub fn turn_limit(&self) -> Option<Duration> {
        match (self.turn_seconds, self.mode) {
            (Some(secs), _) => Some(Duration::from_secs(secs)),
            (None, GameMode::Flash) => Some(Duration::from_secs(FLASH_TURN_SECONDS)),
            (None, GameMode::Standard) => None,
        }
    }

    /// Set up a fresh match with the configured players and standings.
    #[must_use]
    pub fn new_game(&self) -> GameState {
        let seat = |slot: PlayerSlot, cfg: &PlayerConfig| {
            let mut player = Player::new(slot, cfg.username.clone());
            player.elo = cfg.elo;
            player.consecutive_losses = cfg.consecutive_losses;
            player
        };
        GameState::with_players(Players {
            p1: seat(PlayerSlot::P1, &self.p1),
            p2: seat(PlayerSlot::P2, &self.p2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = MatchConfig::from_toml(
            r#"
            game_id = "lobby-42"
            mode = "flash"

            [p1]
            username = "alice"
            elo = 620

            [p2]
            username = "bob"
            consecutive_losses = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.game_id.as_deref(), Some("lobby-42"));
        assert_eq!(config.mode, GameMode::Flash);
        assert_eq!(config.p1.elo, 620);
        assert_eq!(config.p2.elo, DEFAULT_ELO);
        assert_eq!(config.p2.consecutive_losses, 2);
        assert_eq!(config.turn_limit(), Some(Duration::from_secs(40)));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MatchConfig::from_toml("").unwrap();
        assert_eq!(config, MatchConfig::default());
        assert_eq!(config.turn_limit(), None);
    }

    #[test]
    fn test_turn_seconds_override() {
        let config = MatchConfig::from_toml("turn_seconds = 90").unwrap();
        assert_eq!(config.turn_limit(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = MatchConfig::from_toml(
            r#"
            [p1]
            username = "sam"
            [p2]
            username = "sam"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let err = MatchConfig::from_toml(r#"mode = "blitz""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_new_game_carries_standing() {
        let config = MatchConfig::from_toml(
            r#"
            [p1]
            username = "alice"
            elo = 700
            [p2]
            username = "bob"
            "#,
        )
        .unwrap();
        let game = config.new_game();
        assert_eq!(game.players.p1.username, "alice");
        assert_eq!(game.players.p1.elo, 700);
        assert_eq!(game.players.p2.elo, DEFAULT_ELO);
        assert_eq!(game.game_log[0], "Game started: alice vs bob");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.toml");
        fs::write(&path, "mode = \"standard\"\n[p1]\nusername = \"x\"\n").unwrap();
        let config = MatchConfig::load(&path).unwrap();
        assert_eq!(config.p1.username, "x");
        assert_eq!(config.p2.username, "player2");
    }
}

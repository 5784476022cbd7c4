// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Noise Before Defeat: the rules engine for a two-player grid strategy game.
//!
//! Players command infantry groups and a long-range unit on a diamond board,
//! trying to destroy the opposing core while defending their own core, comms,
//! and research installations. Holding the center square earns Intel Points,
//! which pay for hacks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI  ·  match records  ·  config  │
//! ├─────────────────────────────────────┤
//! │  Sync adapter (snapshot replication)│
//! ├─────────────────────────────────────┤
//! │  Turn controller  ·  rating engine  │
//! ├─────────────────────────────────────┤
//! │  Action resolvers                   │
//! ├─────────────────────────────────────┤
//! │  Geometry · damage · entity model   │
//! └─────────────────────────────────────┘
//! ```
//!
//! Everything flows through [`GameState`]: a serializable snapshot that the
//! turn controller mutates in response to [`Intent`]s.

pub mod config;
pub mod error;
pub mod game;
pub mod rating;
pub mod record;
pub mod sync;

pub use config::MatchConfig;
pub use error::{ConfigError, RecordError, Refusal, SyncError};

// Re-export key game types at crate root for convenience
pub use game::{handle_intent, GameState, Intent, Outcome, PlayerSlot, Position};
pub use rating::MatchResult;
pub use record::MatchRecord;

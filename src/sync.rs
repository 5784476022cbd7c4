//! Snapshot replication between two copies of a match.
//!
//! Each client owns a [`SyncAdapter`] that applies its player's intents
//! locally and publishes the resulting snapshot to a shared
//! [`SnapshotStore`], keyed by game identifier. Snapshots carry a sequence
//! number and the seat that wrote them; [`compare`] decides deterministically
//! which copy wins, so two clients that publish at the same time converge on
//! the same state instead of silently overwriting each other.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::game::{handle_intent, GameState, Intent, Outcome, PlayerSlot};

/// Seat whose snapshot wins when both sides publish the same sequence.
pub const TIE_BREAK_SEAT: PlayerSlot = PlayerSlot::P1;

/// A game snapshot stamped for replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedSnapshot {
    /// Game the snapshot belongs to.
    pub game_id: String,
    /// Monotonic version; bumped on every local change.
    pub sequence: u64,
    /// Seat whose client wrote this version.
    pub author: PlayerSlot,
    /// The game state.
    pub state: GameState,
}

/// What to do with an incoming snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Newer than ours; replace local state.
    Applied,
    /// Older than ours, or our own echo; ignore.
    Stale,
    /// Same version from the other seat, and theirs wins the tie.
    ConflictAccepted,
    /// Same version from the other seat, and ours wins the tie.
    ConflictRejected,
}

impl Acceptance {
    /// Whether the incoming snapshot replaces local state.
    #[must_use]
    pub const fn replaces_local(self) -> bool {
        matches!(self, Self::Applied | Self::ConflictAccepted)
    }
}

/// Decide what to do with a snapshot at `incoming` when ours is at `local`.
///
/// Higher sequences win. Equal sequences from the same author are echoes;
/// from different authors they are a conflict won by [`TIE_BREAK_SEAT`].
#[must_use]
pub fn compare(local: (u64, PlayerSlot), incoming: (u64, PlayerSlot)) -> Acceptance {
    match incoming.0.cmp(&local.0) {
        Ordering::Greater => Acceptance::Applied,
        Ordering::Less => Acceptance::Stale,
        Ordering::Equal if incoming.1 == local.1 => Acceptance::Stale,
        Ordering::Equal if incoming.1 == TIE_BREAK_SEAT => Acceptance::ConflictAccepted,
        Ordering::Equal => Acceptance::ConflictRejected,
    }
}

/// Shared storage for snapshots, keyed by game identifier.
pub trait SnapshotStore: fmt::Debug + Send + Sync {
    /// Write a snapshot and notify subscribers of its game.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded.
    fn set(&self, snapshot: &VersionedSnapshot) -> Result<(), SyncError>;

    /// Receive every snapshot written for `game_id` from now on, starting
    /// with the current one if there is one.
    fn subscribe(&self, game_id: &str) -> Subscription;
}

/// Stream of snapshots for one game.
#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<String>,
}

impl Subscription {
    /// Next delivered snapshot, if one is waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the store went away or a delivery is corrupt.
    pub fn try_next(&self) -> Result<Option<VersionedSnapshot>, SyncError> {
        match self.rx.try_recv() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SyncError::Disconnected),
        }
    }
}

#[derive(Debug, Default)]
struct Channel {
    latest: Option<String>,
    subscribers: Vec<Sender<String>>,
}

/// In-process store holding snapshots as JSON, as a remote store would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: Mutex<HashMap<String, Channel>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot written for `game_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be decoded.
    pub fn get(&self, game_id: &str) -> Result<Option<VersionedSnapshot>, SyncError> {
        let games = self.games.lock().unwrap_or_else(PoisonError::into_inner);
        games
            .get(game_id)
            .and_then(|c| c.latest.as_deref())
            .map(serde_json::from_str)
            .transpose()
            .map_err(SyncError::from)
    }
}

impl SnapshotStore for MemoryStore {
    fn set(&self, snapshot: &VersionedSnapshot) -> Result<(), SyncError> {
        let json = serde_json::to_string(snapshot)?;
        let mut games = self.games.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = games.entry(snapshot.game_id.clone()).or_default();
        entry.subscribers.retain(|tx| tx.send(json.clone()).is_ok());
        entry.latest = Some(json);
        Ok(())
    }

    fn subscribe(&self, game_id: &str) -> Subscription {
        let (tx, rx) = channel();
        let mut games = self.games.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = games.entry(game_id.to_string()).or_default();
        if let Some(latest) = &entry.latest {
            // The receiver is still in scope, so this cannot fail
            let _ = tx.send(latest.clone());
        }
        entry.subscribers.push(tx);
        Subscription { rx }
    }
}

/// One client's view of a replicated match.
#[derive(Debug)]
pub struct SyncAdapter {
    store: Arc<dyn SnapshotStore>,
    subscription: Subscription,
    game_id: String,
    seat: PlayerSlot,
    sequence: u64,
    author: PlayerSlot,
    state: GameState,
}

impl SyncAdapter {
    /// Join `game_id` as `seat`, starting from `state`.
    ///
    /// Any snapshot already in the store is picked up by the first
    /// [`SyncAdapter::poll`].
    #[must_use]
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        game_id: impl Into<String>,
        seat: PlayerSlot,
        state: GameState,
    ) -> Self {
        let game_id = game_id.into();
        let subscription = store.subscribe(&game_id);
        Self {
            store,
            subscription,
            game_id,
            seat,
            sequence: 0,
            author: seat,
            state,
        }
    }

    /// Current local state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Current local version.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Seat this client plays.
    #[must_use]
    pub const fn seat(&self) -> PlayerSlot {
        self.seat
    }

    /// Publish the local state as a new version.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the snapshot.
    pub fn publish(&mut self) -> Result<(), SyncError> {
        self.sequence += 1;
        self.author = self.seat;
        let snapshot = VersionedSnapshot {
            game_id: self.game_id.clone(),
            sequence: self.sequence,
            author: self.seat,
            state: self.state.clone(),
        };
        debug!(game = %self.game_id, sequence = self.sequence, seat = %self.seat, "publish");
        self.store.set(&snapshot)
    }

    /// Apply this client's intent locally and publish the result.
    ///
    /// A refused intent is published too when it added a log line.
    ///
    /// # Errors
    ///
    /// Returns the refusal, or an error if publishing failed.
    pub fn submit(&mut self, intent: Intent) -> Result<Outcome, SyncError> {
        let log_len = self.state.game_log.len();
        let result = handle_intent(&mut self.state, self.seat, intent);
        if result.is_ok() || self.state.game_log.len() != log_len {
            self.publish()?;
        }
        result.map_err(SyncError::from)
    }

    /// Consider an incoming snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot belongs to another game.
    pub fn accept(&mut self, incoming: VersionedSnapshot) -> Result<Acceptance, SyncError> {
        if incoming.game_id != self.game_id {
            return Err(SyncError::WrongGame {
                expected: self.game_id.clone(),
                found: incoming.game_id,
            });
        }

        let verdict = compare(
            (self.sequence, self.author),
            (incoming.sequence, incoming.author),
        );
        match verdict {
            Acceptance::ConflictAccepted | Acceptance::ConflictRejected => warn!(
                game = %self.game_id,
                sequence = incoming.sequence,
                local = %self.author,
                remote = %incoming.author,
                ?verdict,
                "replication conflict"
            ),
            Acceptance::Applied | Acceptance::Stale => {}
        }
        if verdict.replaces_local() {
            self.sequence = incoming.sequence;
            self.author = incoming.author;
            self.state = incoming.state;
        }
        Ok(verdict)
    }

    /// Drain pending deliveries; returns how many replaced local state.
    ///
    /// # Errors
    ///
    /// Returns an error if a delivery is corrupt, or for another game.
    pub fn poll(&mut self) -> Result<usize, SyncError> {
        let mut applied = 0;
        while let Some(snapshot) = self.subscription.try_next()? {
            if self.accept(snapshot)?.replaces_local() {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

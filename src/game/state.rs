//! Game state management.
//!
//! [`GameState`] is the single snapshot the engine owns: both players, turn
//! bookkeeping, the game log, and the interaction scratch fields that track a
//! half-finished action between clicks. It serializes to the shape the
//! synchronization collaborator mirrors between clients.

use serde::{Deserialize, Serialize};

use crate::game::{
    DefenderKind, NodeKind, Player, PlayerSlot, Position, Unit, UnitKind, UnitRef,
};
use crate::rating::MatchResult;

/// Actions a player may take per turn.
pub const MOVES_PER_TURN: u32 = 2;

/// Where the match is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// The active player is choosing actions.
    Planning,
    /// Turn-end effects are being applied.
    Executing,
    /// A core fell or a player left; no further actions.
    GameOver,
}

/// Which action the active player has picked from the action bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Relocate a unit one step.
    Move,
    /// Strike one target with one unit.
    Attack,
    /// Spend Intel Points against an installation.
    Hack,
    /// Divide a unit in two.
    Split,
    /// Strike one target with several units at once.
    SurroundAttack,
}

/// Per-player flag: who currently holds the center square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterControl {
    /// First player holds the center.
    pub p1: bool,
    /// Second player holds the center.
    pub p2: bool,
}

impl CenterControl {
    /// Whether `slot` holds the center.
    #[must_use]
    pub const fn get(&self, slot: PlayerSlot) -> bool {
        match slot {
            PlayerSlot::P1 => self.p1,
            PlayerSlot::P2 => self.p2,
        }
    }

    /// Set whether `slot` holds the center.
    pub fn set(&mut self, slot: PlayerSlot, value: bool) {
        match slot {
            PlayerSlot::P1 => self.p1 = value,
            PlayerSlot::P2 => self.p2 = value,
        }
    }
}

/// Both players, keyed the way the snapshot stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Players {
    /// First player.
    pub p1: Player,
    /// Second player.
    pub p2: Player,
}

impl Players {
    /// Player in `slot`.
    #[must_use]
    pub const fn get(&self, slot: PlayerSlot) -> &Player {
        match slot {
            PlayerSlot::P1 => &self.p1,
            PlayerSlot::P2 => &self.p2,
        }
    }

    /// Mutable player in `slot`.
    #[must_use]
    pub fn get_mut(&mut self, slot: PlayerSlot) -> &mut Player {
        match slot {
            PlayerSlot::P1 => &mut self.p1,
            PlayerSlot::P2 => &mut self.p2,
        }
    }

    /// Player in `slot` and their opponent, both mutable.
    #[must_use]
    pub fn split_mut(&mut self, slot: PlayerSlot) -> (&mut Player, &mut Player) {
        match slot {
            PlayerSlot::P1 => (&mut self.p1, &mut self.p2),
            PlayerSlot::P2 => (&mut self.p2, &mut self.p1),
        }
    }
}

/// Target picked for a surround attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurroundTarget {
    /// Cell under attack.
    pub position: Position,
    /// What stands there.
    #[serde(rename = "type")]
    pub kind: DefenderKind,
}

/// An opponent entity located on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A live unit.
    Unit(UnitRef),
    /// An installation.
    Node(NodeKind),
}

impl Target {
    /// Damage-model classification of this target.
    #[must_use]
    pub const fn defender_kind(&self) -> DefenderKind {
        match self {
            Self::Unit(unit) => DefenderKind::unit(unit.kind),
            Self::Node(kind) => DefenderKind::node(*kind),
        }
    }
}

/// Complete game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Current turn number, starting at 1.
    pub turn: u32,
    /// Life-cycle phase.
    pub phase: Phase,
    /// Seat whose turn it is.
    pub active_player: PlayerSlot,
    /// Actions taken by the active player this turn.
    pub current_turn_moves: u32,
    /// Who holds the center square.
    pub center_controllers: CenterControl,
    /// Winner once the match is over.
    pub winner: Option<PlayerSlot>,
    /// Both players.
    pub players: Players,
    /// Human-readable history, append-only.
    pub game_log: Vec<String>,

    /// Action picked from the action bar.
    pub selected_action: Option<ActionKind>,
    /// Unit picked for a move.
    pub selected_piece: Option<UnitRef>,
    /// Destinations for the selected move or split.
    pub valid_moves: Vec<Position>,
    /// Unit picked as the source of an attack or hack.
    pub attack_source: Option<UnitRef>,
    /// Cells the attack source can strike.
    pub attack_targets: Vec<Position>,
    /// Unit picked to be split.
    pub split_piece: Option<UnitRef>,
    /// Confirmed split amount, once chosen.
    pub split_amount: Option<u32>,
    /// Whether a surround attack is being assembled.
    pub surround_attack_mode: bool,
    /// Units committed to the surround attack.
    pub surround_attack_sources: Vec<UnitRef>,
    /// Target of the surround attack.
    pub surround_attack_target: Option<SurroundTarget>,

    /// Suffix counter for identifiers of units created by splits.
    pub next_unit_serial: u32,
    /// Rating outcome, recorded once when the match ends.
    pub result: Option<MatchResult>,
    /// Set once a player has left the finished match.
    pub closed: bool,
}

impl GameState {
    /// Start a new match between two fresh players.
    #[must_use]
    pub fn new(p1_name: impl Into<String>, p2_name: impl Into<String>) -> Self {
        Self::with_players(Players {
            p1: Player::new(PlayerSlot::P1, p1_name),
            p2: Player::new(PlayerSlot::P2, p2_name),
        })
    }

    /// Start a new match with the given players.
    ///
    /// The players should already be on their starting layout.
    #[must_use]
    pub fn with_players(players: Players) -> Self {
        let opening = format!(
            "Game started: {} vs {}",
            players.p1.username, players.p2.username
        );
        Self {
            turn: 1,
            phase: Phase::Planning,
            active_player: PlayerSlot::P1,
            current_turn_moves: 0,
            center_controllers: CenterControl::default(),
            winner: None,
            players,
            game_log: vec![opening],
            selected_action: None,
            selected_piece: None,
            valid_moves: Vec::new(),
            attack_source: None,
            attack_targets: Vec::new(),
            split_piece: None,
            split_amount: None,
            surround_attack_mode: false,
            surround_attack_sources: Vec::new(),
            surround_attack_target: None,
            next_unit_serial: 3,
            result: None,
            closed: false,
        }
    }

    /// A fresh board for the same two players, keeping their standing.
    #[must_use]
    pub fn rematch(&self) -> Self {
        Self::with_players(Players {
            p1: self.players.p1.rematch(PlayerSlot::P1),
            p2: self.players.p2.rematch(PlayerSlot::P2),
        })
    }

    /// Player in `slot`.
    #[must_use]
    pub const fn player(&self, slot: PlayerSlot) -> &Player {
        self.players.get(slot)
    }

    /// Mutable player in `slot`.
    #[must_use]
    pub fn player_mut(&mut self, slot: PlayerSlot) -> &mut Player {
        self.players.get_mut(slot)
    }

    /// Whether the match has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Append a line to the game log.
    pub fn log(&mut self, line: impl Into<String>) {
        self.game_log.push(line.into());
    }

    /// Whether any unit or installation of either player stands on `pos`.
    #[must_use]
    pub fn is_cell_occupied(&self, pos: Position) -> bool {
        PlayerSlot::ALL
            .iter()
            .any(|&slot| self.player(slot).occupies(pos))
    }

    /// Cells a unit standing on `pos` may step to: on-board, unoccupied king moves.
    #[must_use]
    pub fn valid_moves(&self, pos: Position) -> Vec<Position> {
        pos.neighbors()
            .filter(|&p| !self.is_cell_occupied(p))
            .collect()
    }

    /// The live unit of `slot`'s that stands on `pos`.
    #[must_use]
    pub fn unit_at(&self, slot: PlayerSlot, pos: Position) -> Option<&Unit> {
        self.player(slot).unit_at(pos)
    }

    /// What of `owner`'s can be struck on `pos`: a live unit, else an installation.
    #[must_use]
    pub fn target_at(&self, owner: PlayerSlot, pos: Position) -> Option<Target> {
        let player = self.player(owner);
        if let Some(unit) = player.unit_at(pos) {
            return Some(Target::Unit(unit.unit_ref()));
        }
        player.nodes.at(pos).map(|node| Target::Node(node.kind))
    }

    /// Recompute who holds the center from who stands on it.
    ///
    /// Returns the seat that newly gained control, if any.
    pub fn refresh_center_control(&mut self) -> Option<PlayerSlot> {
        let mut gained = None;
        for slot in PlayerSlot::ALL {
            let holds = self
                .player(slot)
                .units()
                .any(|u| u.is_alive() && u.position.is_center());
            if holds && !self.center_controllers.get(slot) {
                gained = Some(slot);
            }
            self.center_controllers.set(slot, holds);
        }
        gained
    }

    /// Clear every in-progress selection.
    pub fn clear_interaction(&mut self) {
        self.selected_action = None;
        self.selected_piece = None;
        self.valid_moves.clear();
        self.attack_source = None;
        self.attack_targets.clear();
        self.split_piece = None;
        self.split_amount = None;
        self.surround_attack_mode = false;
        self.surround_attack_sources.clear();
        self.surround_attack_target = None;
    }

    /// Next identifier for a unit split off by `slot`.
    pub fn allocate_unit_id(&mut self, slot: PlayerSlot, kind: UnitKind) -> String {
        let serial = self.next_unit_serial;
        self.next_unit_serial += 1;
        let prefix = match kind {
            UnitKind::Infantry => "inf",
            UnitKind::LongRange => "lr",
        };
        format!("{slot}-{prefix}-{serial}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::CENTER;

    fn create_test_game() -> GameState {
        GameState::new("alice", "bob")
    }

    #[test]
    fn test_game_state_creation() {
        let game = create_test_game();
        assert_eq!(game.turn, 1);
        assert_eq!(game.phase, Phase::Planning);
        assert_eq!(game.active_player, PlayerSlot::P1);
        assert_eq!(game.current_turn_moves, 0);
        assert!(game.winner.is_none());
        assert_eq!(game.game_log, vec!["Game started: alice vs bob".to_string()]);
    }

    #[test]
    fn test_occupancy_covers_units_and_nodes() {
        let game = create_test_game();
        assert!(game.is_cell_occupied(Position::new(0, -4)));
        assert!(game.is_cell_occupied(Position::new(-1, -2)));
        assert!(game.is_cell_occupied(Position::new(0, 2)));
        assert!(!game.is_cell_occupied(CENTER));
    }

    #[test]
    fn test_valid_moves_skip_occupied() {
        let game = create_test_game();
        // Long-range at (0,-2) is flanked by both infantry and the comms/rd nodes
        let moves = game.valid_moves(Position::new(0, -2));
        assert_eq!(moves.len(), 4);
        assert!(moves.contains(&Position::new(0, -1)));
        assert!(moves.contains(&Position::new(0, -3)));
        assert!(moves.contains(&Position::new(1, -1)));
        assert!(moves.contains(&Position::new(-1, -1)));
    }

    #[test]
    fn test_target_prefers_units_over_nodes() {
        let game = create_test_game();
        assert_eq!(
            game.target_at(PlayerSlot::P2, Position::new(0, 4)),
            Some(Target::Node(NodeKind::Core))
        );
        let target = game.target_at(PlayerSlot::P2, Position::new(1, 2)).unwrap();
        assert_eq!(target.defender_kind(), DefenderKind::Infantry);
        assert!(game.target_at(PlayerSlot::P1, Position::new(1, 2)).is_none());
    }

    #[test]
    fn test_center_control_follows_occupant() {
        let mut game = create_test_game();
        game.players.p1.infantry[0].position = CENTER;
        assert_eq!(game.refresh_center_control(), Some(PlayerSlot::P1));
        assert!(game.center_controllers.p1);
        assert_eq!(game.refresh_center_control(), None);

        game.players.p1.infantry[0].position = Position::new(0, -1);
        game.refresh_center_control();
        assert!(!game.center_controllers.p1);
    }

    #[test]
    fn test_allocate_unit_id_unique() {
        let mut game = create_test_game();
        let a = game.allocate_unit_id(PlayerSlot::P1, UnitKind::Infantry);
        let b = game.allocate_unit_id(PlayerSlot::P2, UnitKind::LongRange);
        assert_eq!(a, "p1-inf-3");
        assert_eq!(b, "p2-lr-4");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let game = create_test_game();
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["activePlayer"], "p1");
        assert_eq!(json["phase"], "planning");
        assert_eq!(json["currentTurnMoves"], 0);
        assert_eq!(json["players"]["p1"]["intelPoints"], 100);
        assert_eq!(json["players"]["p2"]["nodes"]["core"]["type"], "core");
        assert_eq!(json["players"]["p1"]["infantry"][0]["maxHp"], 90.0);

        let back: GameState = serde_json::from_value(json).unwrap();
        assert_eq!(back, game);
    }
}

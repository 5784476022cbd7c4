//! Player state: installations, units, and the player's standing record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{apply_damage, Position};

/// Intel Points each player starts with.
pub const STARTING_INTEL_POINTS: u32 = 100;

/// Starting and maximum HP of every installation.
pub const NODE_HP: f64 = 50.0;

/// Troop count of each starting infantry group.
pub const STARTING_INFANTRY_COUNT: u32 = 45;

/// Largest troop count an infantry group may hold.
pub const MAX_INFANTRY_COUNT: u32 = 90;

/// Smallest infantry group a split may leave behind or create.
pub const MIN_GROUP_SIZE: u32 = 10;

/// Piece count of the starting long-range unit.
pub const STARTING_LONG_RANGE_COUNT: u32 = 5;

/// HP carried by each troop or piece.
pub const HP_PER_TROOP: f64 = 2.0;

/// Rating a new player starts with.
pub const DEFAULT_ELO: u32 = 500;

/// One of the two seats at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSlot {
    /// First player; moves first.
    P1,
    /// Second player.
    P2,
}

impl PlayerSlot {
    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::P1 => Self::P2,
            Self::P2 => Self::P1,
        }
    }

    /// Both seats, in turn order.
    pub const ALL: [Self; 2] = [Self::P1, Self::P2];
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::P1 => "p1",
            Self::P2 => "p2",
        })
    }
}

/// Kind of installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Losing it ends the game.
    Core,
    /// Can be disabled outright by a hack.
    Comms,
    /// Research lab; hacking needs it online.
    Rd,
}

impl NodeKind {
    /// All installation kinds.
    pub const ALL: [Self; 3] = [Self::Core, Self::Comms, Self::Rd];
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Core => "core",
            Self::Comms => "comms",
            Self::Rd => "rd",
        })
    }
}

/// A fixed installation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Which installation this is.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Where it stands. Installations never move.
    pub position: Position,
    /// Current HP.
    pub hp: f64,
    /// Maximum HP.
    pub max_hp: f64,
}

impl Node {
    /// Create an installation at full health.
    #[must_use]
    pub const fn new(kind: NodeKind, position: Position) -> Self {
        Self {
            kind,
            position,
            hp: NODE_HP,
            max_hp: NODE_HP,
        }
    }

    /// Whether the installation still has HP.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.hp > 0.0
    }

    /// Fraction of HP remaining.
    #[must_use]
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp > 0.0 {
            self.hp / self.max_hp
        } else {
            0.0
        }
    }
}

/// A player's three installations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nodes {
    /// The core.
    pub core: Node,
    /// The comms installation.
    pub comms: Node,
    /// The research lab.
    pub rd: Node,
}

impl Nodes {
    /// Lay out installations for a player whose core sits at `core`.
    ///
    /// Comms and research flank the core one step toward the center.
    #[must_use]
    pub fn around(core: Position) -> Self {
        let inward = -core.y.signum();
        Self {
            core: Node::new(NodeKind::Core, core),
            comms: Node::new(NodeKind::Comms, Position::new(core.x - inward, core.y + inward)),
            rd: Node::new(NodeKind::Rd, Position::new(core.x + inward, core.y + inward)),
        }
    }

    /// Installation of the given kind.
    #[must_use]
    pub const fn get(&self, kind: NodeKind) -> &Node {
        match kind {
            NodeKind::Core => &self.core,
            NodeKind::Comms => &self.comms,
            NodeKind::Rd => &self.rd,
        }
    }

    /// Mutable installation of the given kind.
    #[must_use]
    pub fn get_mut(&mut self, kind: NodeKind) -> &mut Node {
        match kind {
            NodeKind::Core => &mut self.core,
            NodeKind::Comms => &mut self.comms,
            NodeKind::Rd => &mut self.rd,
        }
    }

    /// All three installations.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        [&self.core, &self.comms, &self.rd].into_iter()
    }

    /// Installation standing on `pos`, if any.
    #[must_use]
    pub fn at(&self, pos: Position) -> Option<&Node> {
        self.iter().find(|n| n.position == pos)
    }

    /// Combined HP over combined maximum HP.
    #[must_use]
    pub fn combined_hp_ratio(&self) -> f64 {
        let (hp, max) = self
            .iter()
            .fold((0.0, 0.0), |(hp, max), n| (hp + n.hp, max + n.max_hp));
        if max > 0.0 { hp / max } else { 0.0 }
    }
}

/// Kind of mobile unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Infantry group: strikes adjacent cells.
    #[serde(rename = "infantry")]
    Infantry,
    /// Long-range unit: strikes within Manhattan distance 3.
    #[serde(rename = "longrange")]
    LongRange,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Infantry => "infantry",
            Self::LongRange => "long-range unit",
        })
    }
}

/// A mobile unit: an infantry group or a long-range unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Identifier, unique within the match.
    pub id: String,
    /// Infantry or long-range.
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// Current cell.
    pub position: Position,
    /// Troop or piece count; drives damage output.
    pub count: u32,
    /// Current HP.
    pub hp: f64,
    /// Maximum HP, `count * 2`.
    pub max_hp: f64,
}

impl Unit {
    /// Create a unit at full health.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: UnitKind, position: Position, count: u32) -> Self {
        let max_hp = f64::from(count) * HP_PER_TROOP;
        Self {
            id: id.into(),
            kind,
            position,
            count,
            hp: max_hp,
            max_hp,
        }
    }

    /// Whether the unit can still act and be targeted.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Reference to this unit for selection bookkeeping.
    #[must_use]
    pub fn unit_ref(&self) -> UnitRef {
        UnitRef {
            id: self.id.clone(),
            kind: self.kind,
        }
    }

    /// Take damage, flooring HP at zero.
    pub fn take_damage(&mut self, damage: f64) {
        self.hp = apply_damage(self.hp, damage);
    }

    /// Split `amount` troops off into a new unit with id `new_id` at `to`.
    ///
    /// HP is shared in proportion to the troop counts and both halves get
    /// `max_hp = count * 2`. The caller validates `amount`.
    pub fn split_off(&mut self, amount: u32, new_id: String, to: Position) -> Unit {
        let (kept_hp, moved_hp) = self.split_hp(amount);
        let remaining = self.count - amount;

        let mut spawned = Unit::new(new_id, self.kind, to, amount);
        spawned.hp = moved_hp;

        self.count = remaining;
        self.max_hp = f64::from(remaining) * HP_PER_TROOP;
        self.hp = kept_hp;

        spawned
    }

    /// HP each half would hold after splitting off `amount` troops, as
    /// `(kept, moved)`. The moved share is rounded to a whole point.
    #[must_use]
    pub fn split_hp(&self, amount: u32) -> (f64, f64) {
        let moved = (f64::from(amount) / f64::from(self.count) * self.hp).round();
        let kept_max = f64::from(self.count.saturating_sub(amount)) * HP_PER_TROOP;
        let kept = (self.hp - moved).clamp(0.0, kept_max);
        (kept, moved.min(f64::from(amount) * HP_PER_TROOP))
    }
}

/// Identifies a unit without borrowing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRef {
    /// Unit identifier.
    pub id: String,
    /// Unit kind.
    #[serde(rename = "type")]
    pub kind: UnitKind,
}

/// Letter grade for one side's play in a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// Won with more than 80% installation HP left.
    A,
    /// Won with more than 50% installation HP left.
    B,
    /// Won otherwise.
    C,
    /// Lost a close game.
    D,
    /// Lost.
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        })
    }
}

/// Win/loss record and the grade of the most recent match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// Grade earned in the last finished match.
    pub grade: Option<Grade>,
}

/// State for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Display name.
    pub username: String,
    /// Spendable resource.
    pub intel_points: u32,
    /// The three installations.
    pub nodes: Nodes,
    /// Infantry groups in play. Destroyed groups are removed.
    pub infantry: Vec<Unit>,
    /// Long-range units. The first is the starting unit; splits append
    /// auxiliaries. Units at 0 HP stay on the board as wrecks.
    pub long_range: Vec<Unit>,
    /// Whether the player has signalled the end of their turn.
    pub ready: bool,
    /// Rating.
    pub elo: u32,
    /// Losses in a row before this match.
    pub consecutive_losses: u32,
    /// Standing record.
    pub performance: Performance,
    /// Lowest core HP ratio seen this match.
    pub lowest_core_ratio: f64,
}

impl Player {
    /// Create a player with a fresh record and the standard layout for `slot`.
    ///
    /// The second seat is the first seat reflected through the center square.
    #[must_use]
    pub fn new(slot: PlayerSlot, username: impl Into<String>) -> Self {
        let flip = |p: Position| match slot {
            PlayerSlot::P1 => p,
            PlayerSlot::P2 => p.mirrored(),
        };

        let nodes = Nodes::around(flip(Position::new(0, -4)));
        let infantry = vec![
            Unit::new(
                format!("{slot}-inf-1"),
                UnitKind::Infantry,
                flip(Position::new(-1, -2)),
                STARTING_INFANTRY_COUNT,
            ),
            Unit::new(
                format!("{slot}-inf-2"),
                UnitKind::Infantry,
                flip(Position::new(1, -2)),
                STARTING_INFANTRY_COUNT,
            ),
        ];
        let long_range = vec![Unit::new(
            format!("{slot}-lr"),
            UnitKind::LongRange,
            flip(Position::new(0, -2)),
            STARTING_LONG_RANGE_COUNT,
        )];

        Self {
            username: username.into(),
            intel_points: STARTING_INTEL_POINTS,
            nodes,
            infantry,
            long_range,
            ready: false,
            elo: DEFAULT_ELO,
            consecutive_losses: 0,
            performance: Performance::default(),
            lowest_core_ratio: 1.0,
        }
    }

    /// Same player with the same standing, on a fresh board.
    #[must_use]
    pub fn rematch(&self, slot: PlayerSlot) -> Self {
        Self {
            elo: self.elo,
            consecutive_losses: self.consecutive_losses,
            performance: self.performance,
            ..Self::new(slot, self.username.clone())
        }
    }

    /// All units, infantry first.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.infantry.iter().chain(self.long_range.iter())
    }

    /// Live unit standing on `pos`, if any.
    #[must_use]
    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.units().find(|u| u.position == pos && u.is_alive())
    }

    /// Unit with the given id.
    #[must_use]
    pub fn unit(&self, unit: &UnitRef) -> Option<&Unit> {
        let list = match unit.kind {
            UnitKind::Infantry => &self.infantry,
            UnitKind::LongRange => &self.long_range,
        };
        list.iter().find(|u| u.id == unit.id)
    }

    /// Mutable unit with the given id.
    #[must_use]
    pub fn unit_mut(&mut self, unit: &UnitRef) -> Option<&mut Unit> {
        let list = match unit.kind {
            UnitKind::Infantry => &mut self.infantry,
            UnitKind::LongRange => &mut self.long_range,
        };
        list.iter_mut().find(|u| u.id == unit.id)
    }

    /// Whether anything of this player's, wreck or not, stands on `pos`.
    #[must_use]
    pub fn occupies(&self, pos: Position) -> bool {
        self.nodes.at(pos).is_some() || self.units().any(|u| u.position == pos)
    }

    /// Whether the core still stands.
    #[must_use]
    pub fn is_core_alive(&self) -> bool {
        self.nodes.core.is_online()
    }

    /// Note the core's current HP ratio if it is a new low.
    pub fn track_core_ratio(&mut self) {
        self.lowest_core_ratio = self.lowest_core_ratio.min(self.nodes.core.hp_ratio());
    }

    /// Drop infantry groups that reached 0 HP.
    pub fn remove_destroyed_infantry(&mut self) {
        self.infantry.retain(Unit::is_alive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_layout_p1() {
        let player = Player::new(PlayerSlot::P1, "alice");
        assert_eq!(player.nodes.core.position, Position::new(0, -4));
        assert_eq!(player.nodes.comms.position, Position::new(-1, -3));
        assert_eq!(player.nodes.rd.position, Position::new(1, -3));
        assert_eq!(player.infantry.len(), 2);
        assert_eq!(player.infantry[0].position, Position::new(-1, -2));
        assert_eq!(player.infantry[1].position, Position::new(1, -2));
        assert_eq!(player.long_range[0].position, Position::new(0, -2));
        assert_eq!(player.intel_points, 100);
        assert_eq!(player.elo, DEFAULT_ELO);
    }

    #[test]
    fn test_player_layout_mirrored() {
        let p1 = Player::new(PlayerSlot::P1, "alice");
        let p2 = Player::new(PlayerSlot::P2, "bob");
        assert_eq!(p2.nodes.core.position, p1.nodes.core.position.mirrored());
        assert_eq!(p2.nodes.comms.position, Position::new(1, 3));
        assert_eq!(p2.nodes.rd.position, Position::new(-1, 3));
        for (a, b) in p1.units().zip(p2.units()) {
            assert_eq!(b.position, a.position.mirrored());
        }
        assert_eq!(p2.infantry[0].id, "p2-inf-1");
        assert_eq!(p2.long_range[0].id, "p2-lr");
    }

    #[test]
    fn test_unit_hp_from_count() {
        let unit = Unit::new("x", UnitKind::Infantry, Position::new(0, 0), 45);
        assert!((unit.hp - 90.0).abs() < f64::EPSILON);
        assert!((unit.max_hp - 90.0).abs() < f64::EPSILON);

        let lr = Unit::new("y", UnitKind::LongRange, Position::new(0, 0), 5);
        assert!((lr.max_hp - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_split_off_proportional() {
        let mut unit = Unit::new("x", UnitKind::Infantry, Position::new(1, 1), 45);
        let spawned = unit.split_off(15, "y".into(), Position::new(2, 1));

        assert_eq!(unit.count, 30);
        assert_eq!(spawned.count, 15);
        assert!((spawned.hp - 30.0).abs() < f64::EPSILON);
        assert!((unit.hp - 60.0).abs() < f64::EPSILON);
        assert!((unit.max_hp - 60.0).abs() < f64::EPSILON);
        assert!((spawned.max_hp - 30.0).abs() < f64::EPSILON);
        assert_eq!(spawned.position, Position::new(2, 1));
    }

    #[test]
    fn test_split_off_damaged_unit_rounds() {
        let mut unit = Unit::new("x", UnitKind::Infantry, Position::new(1, 1), 45);
        unit.hp = 75.0;
        let spawned = unit.split_off(10, "y".into(), Position::new(2, 1));

        // round(10 / 45 * 75) = round(16.67) = 17
        assert!((spawned.hp - 17.0).abs() < f64::EPSILON);
        assert!((unit.hp - 58.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_combined_hp_ratio() {
        let mut nodes = Nodes::around(Position::new(0, -4));
        assert!((nodes.combined_hp_ratio() - 1.0).abs() < f64::EPSILON);
        nodes.core.hp = 0.0;
        nodes.comms.hp = 25.0;
        assert!((nodes.combined_hp_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rematch_keeps_standing() {
        let mut player = Player::new(PlayerSlot::P2, "bob");
        player.elo = 515;
        player.consecutive_losses = 2;
        player.performance.wins = 3;
        player.intel_points = 7;
        player.infantry.clear();

        let fresh = player.rematch(PlayerSlot::P2);
        assert_eq!(fresh.elo, 515);
        assert_eq!(fresh.consecutive_losses, 2);
        assert_eq!(fresh.performance.wins, 3);
        assert_eq!(fresh.intel_points, STARTING_INTEL_POINTS);
        assert_eq!(fresh.infantry.len(), 2);
    }
}

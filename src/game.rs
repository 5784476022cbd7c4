//! Game layer for Noise Before Defeat.
//!
//! Implements the rules engine:
//! - Diamond board geometry and attack ranges
//! - Damage model
//! - Players, installations, and units
//! - Action resolvers (move, attack, hack, split, surround attack)
//! - Turn controller, center-square income, and turn timer
//! - Invariant checks for tests and fuzzing

mod actions;
mod combat;
mod geometry;
mod invariants;
mod player;
mod state;
mod turn;

pub use actions::{
    apply_action, check_can_act, check_split, find_attack_targets, find_surrounding_attackers,
    split_bounds, Action, ActionReport, HACK_COST, HACK_DAMAGE,
};
pub use combat::{apply_damage, calculate_damage, format_amount, DefenderKind};
pub use geometry::{
    all_positions, is_center_square, is_in_attack_range, is_valid_position, Position, CENTER,
    GRID_SIZE, LONG_RANGE_REACH,
};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use player::{
    Grade, Node, NodeKind, Nodes, Performance, Player, PlayerSlot, Unit, UnitKind, UnitRef,
    DEFAULT_ELO, HP_PER_TROOP, MAX_INFANTRY_COUNT, MIN_GROUP_SIZE, NODE_HP,
    STARTING_INFANTRY_COUNT, STARTING_INTEL_POINTS, STARTING_LONG_RANGE_COUNT,
};
pub use state::{
    ActionKind, CenterControl, GameState, Phase, Players, SurroundTarget, Target, MOVES_PER_TURN,
};
pub use turn::{end_turn, handle_intent, Intent, Outcome, TurnClock, IP_GAIN_CENTER_SQUARE};

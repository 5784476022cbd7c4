//! Game invariants - sanity checks that detect bugs.
//!
//! A snapshot produced by the turn controller should never trip any of
//! these. Fuzz targets and property tests run them after every intent.

use std::collections::HashSet;

use thiserror::Error;

use crate::game::{
    GameState, Phase, PlayerSlot, Position, UnitKind, HP_PER_TROOP, MAX_INFANTRY_COUNT,
    MOVES_PER_TURN,
};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Check all game invariants.
///
/// Returns every violation found, or an empty list if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut cells: HashSet<Position> = HashSet::new();
    let mut ids: HashSet<&str> = HashSet::new();

    for slot in PlayerSlot::ALL {
        let player = state.player(slot);

        for node in player.nodes.iter() {
            if !(0.0..=node.max_hp).contains(&node.hp) {
                violations.push(InvariantViolation::new(format!(
                    "{slot} {} has HP {} outside 0..={}",
                    node.kind, node.hp, node.max_hp
                )));
            }
            if !cells.insert(node.position) {
                violations.push(InvariantViolation::new(format!(
                    "Cell {} is occupied twice",
                    node.position
                )));
            }
        }

        for unit in player.units() {
            if !ids.insert(unit.id.as_str()) {
                violations.push(InvariantViolation::new(format!(
                    "Unit id {} is not unique",
                    unit.id
                )));
            }
            if !(0.0..=unit.max_hp).contains(&unit.hp) {
                violations.push(InvariantViolation::new(format!(
                    "Unit {} has HP {} outside 0..={}",
                    unit.id, unit.hp, unit.max_hp
                )));
            }
            if (unit.max_hp - f64::from(unit.count) * HP_PER_TROOP).abs() > f64::EPSILON {
                violations.push(InvariantViolation::new(format!(
                    "Unit {} has max HP {} for count {}",
                    unit.id, unit.max_hp, unit.count
                )));
            }
            if unit.kind == UnitKind::Infantry {
                if !unit.is_alive() {
                    violations.push(InvariantViolation::new(format!(
                        "Destroyed infantry {} is still on the board",
                        unit.id
                    )));
                }
                if unit.count > MAX_INFANTRY_COUNT {
                    violations.push(InvariantViolation::new(format!(
                        "Infantry {} has count {} > {MAX_INFANTRY_COUNT}",
                        unit.id, unit.count
                    )));
                }
            }
            if !unit.position.is_valid() {
                violations.push(InvariantViolation::new(format!(
                    "Unit {} is off the board at {}",
                    unit.id, unit.position
                )));
            }
            if !cells.insert(unit.position) {
                violations.push(InvariantViolation::new(format!(
                    "Cell {} is occupied twice",
                    unit.position
                )));
            }
        }

        let holds = player
            .units()
            .any(|u| u.is_alive() && u.position.is_center());
        if holds != state.center_controllers.get(slot) {
            violations.push(InvariantViolation::new(format!(
                "Center control flag for {slot} is {} but occupancy says {holds}",
                state.center_controllers.get(slot)
            )));
        }
    }

    if state.current_turn_moves > MOVES_PER_TURN {
        violations.push(InvariantViolation::new(format!(
            "Turn budget overspent: {} > {MOVES_PER_TURN}",
            state.current_turn_moves
        )));
    }

    let in_progress = [
        state.selected_piece.is_some(),
        state.split_piece.is_some(),
        state.surround_attack_target.is_some(),
    ]
    .into_iter()
    .filter(|&b| b)
    .count();
    if in_progress > 1 {
        violations.push(InvariantViolation::new(
            "More than one selection in progress",
        ));
    }

    // Game-over consistency
    let over = state.phase == Phase::GameOver;
    if over != state.winner.is_some() {
        violations.push(InvariantViolation::new(format!(
            "Phase {:?} with winner {:?}",
            state.phase, state.winner
        )));
    }
    for slot in PlayerSlot::ALL {
        if !state.player(slot).is_core_alive() && !over {
            violations.push(InvariantViolation::new(format!(
                "{slot} core destroyed but the game is still running"
            )));
        }
    }
    if state.result.is_some() && !over {
        violations.push(InvariantViolation::new(
            "Match rated before it ended",
        ));
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

//! Action resolvers.
//!
//! Every resolver reads the live state, checks its preconditions, and then
//! either mutates the state, appends its log line, and spends one action from
//! the turn budget, or returns a [`Refusal`] having touched nothing. The
//! click-driven controller in the turn module builds [`Action`]s from the
//! interaction scratch fields; callers that already know what they want can
//! hand an [`Action`] to [`apply_action`] directly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Refusal;
use crate::game::{
    apply_damage, calculate_damage, format_amount, is_in_attack_range, ActionKind,
    GameState, NodeKind, Phase, PlayerSlot, Position, Target, Unit, UnitKind, UnitRef,
    MIN_GROUP_SIZE, MOVES_PER_TURN,
};

/// Intel Points a hack costs.
pub const HACK_COST: u32 = 40;

/// HP a hack strips from a core or research lab.
pub const HACK_DAMAGE: f64 = 15.0;

/// A fully specified action for the active player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Step `unit` to `to`.
    Move {
        /// Unit to move.
        unit: UnitRef,
        /// Destination cell.
        to: Position,
    },
    /// Strike whatever the opponent has on `target` with `source`.
    Attack {
        /// Attacking unit.
        source: UnitRef,
        /// Cell under attack.
        target: Position,
    },
    /// Hack the opponent installation on `target`, launched from `source`.
    Hack {
        /// Unit launching the hack.
        source: UnitRef,
        /// Cell of the installation.
        target: Position,
    },
    /// Detach `amount` from `unit` into a new unit on `to`.
    Split {
        /// Unit to divide.
        unit: UnitRef,
        /// Troops or pieces to detach.
        amount: u32,
        /// Cell for the detached unit.
        to: Position,
    },
    /// Strike `target` with every unit in `sources` at once.
    SurroundAttack {
        /// Committed attackers.
        sources: Vec<UnitRef>,
        /// Cell under attack.
        target: Position,
    },
}

impl Action {
    /// Action-bar kind of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Move { .. } => ActionKind::Move,
            Self::Attack { .. } => ActionKind::Attack,
            Self::Hack { .. } => ActionKind::Hack,
            Self::Split { .. } => ActionKind::Split,
            Self::SurroundAttack { .. } => ActionKind::SurroundAttack,
        }
    }
}

/// What a resolved action did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReport {
    /// Kind of action resolved.
    pub kind: ActionKind,
    /// Damage dealt, for attacks and hacks.
    pub damage: Option<f64>,
    /// Identifier of the unit a split created.
    pub spawned: Option<String>,
    /// Whether this action destroyed the opposing core.
    pub ended_match: bool,
}

impl ActionReport {
    const fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            damage: None,
            spawned: None,
            ended_match: false,
        }
    }
}

/// Resolve `action` for `actor`.
///
/// On a refusal nothing changes; if the refusal is one players are told
/// about, its line is appended to the game log.
///
/// # Errors
///
/// Returns a [`Refusal`] if the match is not accepting actions from `actor`
/// or the action's own preconditions fail.
pub fn apply_action(
    state: &mut GameState,
    actor: PlayerSlot,
    action: Action,
) -> Result<ActionReport, Refusal> {
    resolve(state, actor, action).inspect_err(|refusal| note_refusal(state, actor, refusal))
}

/// [`apply_action`] without recording refusals.
pub(crate) fn resolve(
    state: &mut GameState,
    actor: PlayerSlot,
    action: Action,
) -> Result<ActionReport, Refusal> {
    check_can_act(state, actor)?;
    let report = match action {
        Action::Move { unit, to } => resolve_move(state, actor, &unit, to),
        Action::Attack { source, target } => resolve_attack(state, actor, &source, target),
        Action::Hack { source, target } => resolve_hack(state, actor, &source, target),
        Action::Split { unit, amount, to } => resolve_split(state, actor, &unit, amount, to),
        Action::SurroundAttack { sources, target } => {
            resolve_surround_attack(state, actor, &sources, target)
        }
    }?;

    state.current_turn_moves += 1;
    debug!(
        player = %actor,
        kind = ?report.kind,
        moves = state.current_turn_moves,
        "action resolved"
    );
    Ok(report)
}

/// Record a refusal: debug trace always, game log when players should see it.
pub(crate) fn note_refusal(state: &mut GameState, actor: PlayerSlot, refusal: &Refusal) {
    debug!(player = %actor, %refusal, "intent refused");
    if let Some(line) = refusal.log_line() {
        state.log(line);
    }
}

/// Whether `actor` may spend an action right now.
///
/// # Errors
///
/// Returns the first failed turn-level precondition.
pub fn check_can_act(state: &GameState, actor: PlayerSlot) -> Result<(), Refusal> {
    match state.phase {
        Phase::GameOver => return Err(Refusal::GameOver),
        Phase::Executing => return Err(Refusal::NotPlanning),
        Phase::Planning => {}
    }
    if actor != state.active_player {
        return Err(Refusal::NotYourTurn(actor));
    }
    if state.player(actor).ready {
        return Err(Refusal::AlreadyReady);
    }
    if state.current_turn_moves >= MOVES_PER_TURN {
        return Err(Refusal::BudgetExhausted);
    }
    Ok(())
}

/// A live unit of `owner`'s, or why it cannot act.
fn live_unit<'a>(
    state: &'a GameState,
    owner: PlayerSlot,
    unit: &UnitRef,
) -> Result<&'a Unit, Refusal> {
    let found = state.player(owner).unit(unit).ok_or(Refusal::NoSuchUnit)?;
    if !found.is_alive() {
        return Err(Refusal::UnitDisabled);
    }
    Ok(found)
}

/// A live unit that may strike from where it stands.
fn firing_unit<'a>(
    state: &'a GameState,
    owner: PlayerSlot,
    unit: &UnitRef,
) -> Result<&'a Unit, Refusal> {
    let found = live_unit(state, owner, unit)?;
    if found.position.is_center() {
        return Err(Refusal::FromCenterSquare);
    }
    Ok(found)
}

/// Cells holding opponent targets that `unit` can strike from where it stands.
#[must_use]
pub fn find_attack_targets(state: &GameState, owner: PlayerSlot, unit: &Unit) -> Vec<Position> {
    let opponent = state.player(owner.opponent());
    let unit_cells = opponent.units().filter(|u| u.is_alive()).map(|u| u.position);
    let node_cells = opponent.nodes.iter().map(|n| n.position);
    unit_cells
        .chain(node_cells)
        .filter(|&cell| is_in_attack_range(unit.position, cell, unit.kind))
        .collect()
}

/// Live units of `owner`'s, off the center square, that can strike `target`.
#[must_use]
pub fn find_surrounding_attackers(
    state: &GameState,
    owner: PlayerSlot,
    target: Position,
) -> Vec<UnitRef> {
    state
        .player(owner)
        .units()
        .filter(|u| u.is_alive() && !u.position.is_center())
        .filter(|u| is_in_attack_range(u.position, target, u.kind))
        .map(Unit::unit_ref)
        .collect()
}

/// Inclusive bounds on how much may be split off `unit`, if it may split at all.
///
/// Infantry may split once they hold more than twice [`MIN_GROUP_SIZE`] and
/// must keep at least that many on both sides. Long-range units need two
/// pieces and keep at least one on both sides.
#[must_use]
pub const fn split_bounds(unit: &Unit) -> Option<(u32, u32)> {
    let (floor, eligible) = match unit.kind {
        UnitKind::Infantry => (MIN_GROUP_SIZE, unit.count > 2 * MIN_GROUP_SIZE),
        UnitKind::LongRange => (1, unit.count > 1),
    };
    if eligible {
        Some((floor, unit.count - floor))
    } else {
        None
    }
}

/// Refuse a split of `amount` troops that is out of bounds or would leave
/// either half with no HP.
///
/// # Errors
///
/// [`Refusal::CannotSplit`] when the unit is too small or too worn down,
/// [`Refusal::InvalidSplitAmount`] when `amount` is out of bounds.
pub fn check_split(unit: &Unit, amount: u32) -> Result<(), Refusal> {
    let (min, max) = split_bounds(unit).ok_or(Refusal::CannotSplit)?;
    if !(min..=max).contains(&amount) {
        return Err(Refusal::InvalidSplitAmount { min, max });
    }
    let (kept, moved) = unit.split_hp(amount);
    if kept <= 0.0 || moved <= 0.0 {
        return Err(Refusal::CannotSplit);
    }
    Ok(())
}

fn resolve_move(
    state: &mut GameState,
    actor: PlayerSlot,
    unit: &UnitRef,
    to: Position,
) -> Result<ActionReport, Refusal> {
    let from = live_unit(state, actor, unit)?.position;
    if !state.valid_moves(from).contains(&to) {
        return Err(Refusal::InvalidDestination);
    }

    if let Some(moving) = state.player_mut(actor).unit_mut(unit) {
        moving.position = to;
    }
    let name = state.player(actor).username.clone();
    state.log(format!("{name} moved {} from {from} to {to}", unit.kind));

    if state.refresh_center_control() == Some(actor) {
        state.log(format!("{name} took control of the center square"));
    }
    Ok(ActionReport::new(ActionKind::Move))
}

fn resolve_attack(
    state: &mut GameState,
    actor: PlayerSlot,
    source: &UnitRef,
    target_pos: Position,
) -> Result<ActionReport, Refusal> {
    let attacker = firing_unit(state, actor, source)?;
    let (attacker_pos, kind, strength) = (attacker.position, attacker.kind, attacker.count);

    let target = state
        .target_at(actor.opponent(), target_pos)
        .ok_or(Refusal::NoTarget)?;
    if !is_in_attack_range(attacker_pos, target_pos, kind) {
        return Err(Refusal::OutOfRange);
    }

    let defender = target.defender_kind();
    let damage = calculate_damage(kind, strength, defender);
    let ended_match = strike(state, actor, &target, damage);

    let (own, opp) = names(state, actor);
    state.log(format!(
        "{own} attacked {opp}'s {defender} for {} damage",
        format_amount(damage)
    ));
    Ok(ActionReport {
        damage: Some(damage),
        ended_match,
        ..ActionReport::new(ActionKind::Attack)
    })
}

fn resolve_hack(
    state: &mut GameState,
    actor: PlayerSlot,
    source: &UnitRef,
    target_pos: Position,
) -> Result<ActionReport, Refusal> {
    firing_unit(state, actor, source)?;
    let target = state
        .player(actor.opponent())
        .nodes
        .at(target_pos)
        .map(|n| n.kind)
        .ok_or(Refusal::NotAnInstallation)?;

    let player = state.player(actor);
    if player.intel_points < HACK_COST {
        return Err(Refusal::InsufficientIntel {
            have: player.intel_points,
        });
    }
    if !player.nodes.rd.is_online() {
        return Err(Refusal::LabOffline);
    }

    state.player_mut(actor).intel_points -= HACK_COST;
    let (damage, ended_match) = {
        let victim = state.player_mut(actor.opponent());
        let node = victim.nodes.get_mut(target);
        let before = node.hp;
        node.hp = match target {
            NodeKind::Comms => 0.0,
            NodeKind::Core | NodeKind::Rd => apply_damage(node.hp, HACK_DAMAGE),
        };
        let dealt = before - node.hp;
        victim.track_core_ratio();
        (dealt, target == NodeKind::Core && !victim.is_core_alive())
    };
    if ended_match {
        declare_winner(state, actor);
    }

    let (own, opp) = names(state, actor);
    state.log(format!("{own} hacked {opp}'s {target} node"));
    Ok(ActionReport {
        damage: Some(damage),
        ended_match,
        ..ActionReport::new(ActionKind::Hack)
    })
}

fn resolve_split(
    state: &mut GameState,
    actor: PlayerSlot,
    unit: &UnitRef,
    amount: u32,
    to: Position,
) -> Result<ActionReport, Refusal> {
    let source = live_unit(state, actor, unit)?;
    let from = source.position;
    check_split(source, amount)?;
    if !state.valid_moves(from).contains(&to) {
        return Err(Refusal::InvalidDestination);
    }

    let new_id = state.allocate_unit_id(actor, unit.kind);
    let player = state.player_mut(actor);
    let spawned = match player.unit_mut(unit) {
        Some(source) => source.split_off(amount, new_id.clone(), to),
        None => return Err(Refusal::NoSuchUnit),
    };
    match unit.kind {
        UnitKind::Infantry => player.infantry.push(spawned),
        UnitKind::LongRange => player.long_range.push(spawned),
    }

    let name = state.player(actor).username.clone();
    state.log(format!(
        "{name} split {amount} from {} at {from} to {to}",
        unit.kind
    ));
    if state.refresh_center_control() == Some(actor) {
        state.log(format!("{name} took control of the center square"));
    }
    Ok(ActionReport {
        spawned: Some(new_id),
        ..ActionReport::new(ActionKind::Split)
    })
}

fn resolve_surround_attack(
    state: &mut GameState,
    actor: PlayerSlot,
    sources: &[UnitRef],
    target_pos: Position,
) -> Result<ActionReport, Refusal> {
    let target = state
        .target_at(actor.opponent(), target_pos)
        .ok_or(Refusal::NoTarget)?;
    if sources.len() < 2 {
        return Err(Refusal::TooFewAttackers {
            found: sources.len(),
        });
    }

    let defender = target.defender_kind();
    let mut total = 0.0;
    for (i, source) in sources.iter().enumerate() {
        if sources[..i].contains(source) {
            return Err(Refusal::DuplicateAttacker);
        }
        let attacker = firing_unit(state, actor, source)?;
        if !is_in_attack_range(attacker.position, target_pos, attacker.kind) {
            return Err(Refusal::OutOfRange);
        }
        total += calculate_damage(attacker.kind, attacker.count, defender);
    }

    let ended_match = strike(state, actor, &target, total);

    let own = state.player(actor).username.clone();
    state.log(format!(
        "{own} performed a surrounding attack with {} units for {} damage",
        sources.len(),
        format_amount(total)
    ));
    Ok(ActionReport {
        damage: Some(total),
        ended_match,
        ..ActionReport::new(ActionKind::SurroundAttack)
    })
}

/// Apply `damage` to an opponent target and settle the consequences.
///
/// Infantry at 0 HP leave the board; long-range units and installations stay.
/// Returns whether the opposing core fell.
fn strike(state: &mut GameState, actor: PlayerSlot, target: &Target, damage: f64) -> bool {
    let victim = state.player_mut(actor.opponent());
    let core_fell = match target {
        Target::Unit(unit) => {
            if let Some(hit) = victim.unit_mut(unit) {
                hit.take_damage(damage);
            }
            if unit.kind == UnitKind::Infantry {
                victim.remove_destroyed_infantry();
            }
            false
        }
        Target::Node(kind) => {
            let node = victim.nodes.get_mut(*kind);
            node.hp = apply_damage(node.hp, damage);
            victim.track_core_ratio();
            *kind == NodeKind::Core && !victim.is_core_alive()
        }
    };

    // A destroyed occupant no longer holds the center.
    state.refresh_center_control();
    if core_fell {
        declare_winner(state, actor);
    }
    core_fell
}

fn declare_winner(state: &mut GameState, winner: PlayerSlot) {
    state.phase = Phase::GameOver;
    state.winner = Some(winner);
    debug!(%winner, "core destroyed");
}

fn names(state: &GameState, actor: PlayerSlot) -> (String, String) {
    (
        state.player(actor).username.clone(),
        state.player(actor.opponent()).username.clone(),
    )
}

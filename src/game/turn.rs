//! Turn controller.
//!
//! Turns externally triggered intents into selections or resolved actions,
//! spends the move budget, and runs the end-of-turn and end-of-match effects.
//!
//! # Turn life cycle
//!
//! Only the active player acts. A turn ends when the active player has spent
//! [`MOVES_PER_TURN`] actions or signals ready. Turn end applies the center
//! square income, resets the budget and both ready flags, advances the turn
//! counter, and hands play to the other seat. Destroying a core or leaving a
//! live match ends it; the rating engine then runs exactly once.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Refusal;
use crate::game::actions::{self, note_refusal};
use crate::game::{
    assert_invariants, check_can_act, check_split, find_attack_targets,
    find_surrounding_attackers, is_in_attack_range, split_bounds, Action, ActionKind, ActionReport, GameState, Phase,
    PlayerSlot, Position, SurroundTarget, Unit, MOVES_PER_TURN,
};
use crate::rating;

/// Intel Points earned at turn end by a player holding the center square.
pub const IP_GAIN_CENTER_SQUARE: u32 = 10;

/// Something a player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    /// Pick an action from the action bar; picking the same one again drops it.
    SelectAction {
        /// Chosen action.
        action: ActionKind,
    },
    /// Click a board cell.
    ClickCell {
        /// Cell column.
        x: i32,
        /// Cell row.
        y: i32,
    },
    /// Choose how much to split off the selected unit.
    ConfirmSplit {
        /// Troops or pieces to detach.
        amount: u32,
    },
    /// Abandon the split in progress.
    CancelSplit,
    /// End the turn, or flag readiness while waiting.
    SetReady,
    /// Leave the match.
    ExitGame,
}

/// What handling an intent did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    /// A selection changed; nothing resolved yet.
    Pending,
    /// An action resolved.
    Resolved {
        /// What the action did.
        report: ActionReport,
        /// Whether it spent the last action of the turn.
        #[serde(rename = "turnEnded")]
        turn_ended: bool,
    },
    /// The waiting player flagged ready.
    ReadyNoted,
    /// The turn ended without an action.
    TurnEnded,
    /// The match ended.
    MatchOver {
        /// Winning seat.
        winner: PlayerSlot,
    },
    /// The finished match was closed.
    Closed,
}

/// Handle one intent from `actor`.
///
/// Refusals leave the state untouched apart from the game-log line for the
/// refusals players are told about.
///
/// # Errors
///
/// Returns a [`Refusal`] when the intent is not acceptable right now.
pub fn handle_intent(
    state: &mut GameState,
    actor: PlayerSlot,
    intent: Intent,
) -> Result<Outcome, Refusal> {
    debug!(player = %actor, ?intent, "intent");
    if state.is_game_over() {
        return match intent {
            Intent::ExitGame => {
                state.closed = true;
                debug!(player = %actor, "match closed");
                Ok(Outcome::Closed)
            }
            _ => Err(Refusal::GameOver),
        };
    }

    let result = match intent {
        Intent::ExitGame => Ok(forfeit(state, actor)),
        Intent::SetReady => set_ready(state, actor),
        Intent::SelectAction { action } => select_action(state, actor, action),
        Intent::ClickCell { x, y } => click_cell(state, actor, Position::new(x, y)),
        Intent::ConfirmSplit { amount } => confirm_split(state, actor, amount),
        Intent::CancelSplit => cancel_split(state, actor),
    };
    result.inspect_err(|refusal| note_refusal(state, actor, refusal))
}

/// Apply turn-end effects and hand play to the other seat.
pub fn end_turn(state: &mut GameState) {
    state.phase = Phase::Executing;

    for slot in PlayerSlot::ALL {
        if state.center_controllers.get(slot) {
            let player = state.player_mut(slot);
            player.intel_points = player.intel_points.saturating_add(IP_GAIN_CENTER_SQUARE);
            let line = format!(
                "{} gained {IP_GAIN_CENTER_SQUARE} Intel Points for holding the center square",
                player.username
            );
            state.log(line);
        }
    }

    state.current_turn_moves = 0;
    for slot in PlayerSlot::ALL {
        state.player_mut(slot).ready = false;
    }
    state.turn += 1;
    state.active_player = state.active_player.opponent();
    state.clear_interaction();
    state.phase = Phase::Planning;

    info!(turn = state.turn, active = %state.active_player, "turn ended");
    assert_invariants(state);
}

fn forfeit(state: &mut GameState, actor: PlayerSlot) -> Outcome {
    let name = state.player(actor).username.clone();
    state.log(format!("{name} left the game"));
    let winner = actor.opponent();
    state.phase = Phase::GameOver;
    state.winner = Some(winner);
    state.clear_interaction();
    finish_match(state);
    Outcome::MatchOver { winner }
}

fn finish_match(state: &mut GameState) {
    let Some(winner) = state.winner else {
        return;
    };
    if state.result.is_some() {
        return;
    }
    let name = state.player(winner).username.clone();
    state.log(format!("Game over: {name} wins!"));
    info!(%winner, turn = state.turn, "game over");
    rating::settle_match(state);
}

fn set_ready(state: &mut GameState, actor: PlayerSlot) -> Result<Outcome, Refusal> {
    if state.phase != Phase::Planning {
        return Err(Refusal::NotPlanning);
    }
    if state.player(actor).ready {
        return Err(Refusal::AlreadyReady);
    }
    state.player_mut(actor).ready = true;

    if actor != state.active_player {
        debug!(player = %actor, "ready while waiting");
        return Ok(Outcome::ReadyNoted);
    }
    end_turn(state);
    Ok(Outcome::TurnEnded)
}

fn select_action(
    state: &mut GameState,
    actor: PlayerSlot,
    kind: ActionKind,
) -> Result<Outcome, Refusal> {
    check_can_act(state, actor)?;
    let toggled_off = state.selected_action == Some(kind);
    state.clear_interaction();
    if !toggled_off {
        state.selected_action = Some(kind);
        state.surround_attack_mode = kind == ActionKind::SurroundAttack;
    }
    Ok(Outcome::Pending)
}

fn confirm_split(state: &mut GameState, actor: PlayerSlot, amount: u32) -> Result<Outcome, Refusal> {
    check_can_act(state, actor)?;
    let piece = state.split_piece.clone().ok_or(Refusal::NothingSelected)?;
    let unit = state
        .player(actor)
        .unit(&piece)
        .filter(|u| u.is_alive())
        .ok_or(Refusal::NoSuchUnit)?;

    check_split(unit, amount)?;
    let destinations = state.valid_moves(unit.position);
    if destinations.is_empty() {
        return Err(Refusal::NoRoomToSplit);
    }

    state.split_amount = Some(amount);
    state.valid_moves = destinations;
    Ok(Outcome::Pending)
}

fn cancel_split(state: &mut GameState, actor: PlayerSlot) -> Result<Outcome, Refusal> {
    check_can_act(state, actor)?;
    if state.split_piece.take().is_some() {
        state.split_amount = None;
        state.valid_moves.clear();
    }
    Ok(Outcome::Pending)
}

fn click_cell(state: &mut GameState, actor: PlayerSlot, pos: Position) -> Result<Outcome, Refusal> {
    check_can_act(state, actor)?;
    if !pos.is_valid() {
        return Err(Refusal::OffBoard);
    }

    let action = match state.selected_action {
        None | Some(ActionKind::Move) => click_move(state, actor, pos),
        Some(ActionKind::Attack) => click_attack(state, actor, pos)?,
        Some(ActionKind::Hack) => click_hack(state, actor, pos)?,
        Some(ActionKind::Split) => click_split(state, actor, pos)?,
        Some(ActionKind::SurroundAttack) => click_surround(state, actor, pos)?,
    };
    match action {
        Some(action) => complete(state, actor, action),
        None => Ok(Outcome::Pending),
    }
}

/// Resolve a fully assembled action and settle what follows from it.
fn complete(state: &mut GameState, actor: PlayerSlot, action: Action) -> Result<Outcome, Refusal> {
    let report = actions::resolve(state, actor, action)?;
    state.clear_interaction();

    if state.is_game_over() {
        finish_match(state);
        let winner = state.winner.unwrap_or(actor);
        return Ok(Outcome::MatchOver { winner });
    }

    let turn_ended = state.current_turn_moves >= MOVES_PER_TURN;
    if turn_ended {
        end_turn(state);
    }
    Ok(Outcome::Resolved { report, turn_ended })
}

fn click_move(state: &mut GameState, actor: PlayerSlot, pos: Position) -> Option<Action> {
    if let Some(unit) = state.selected_piece.clone() {
        if state.valid_moves.contains(&pos) {
            return Some(Action::Move { unit, to: pos });
        }
    }

    let picked = state.unit_at(actor, pos).map(Unit::unit_ref);
    state.clear_interaction();
    state.selected_action = Some(ActionKind::Move);
    if let Some(unit) = picked {
        state.valid_moves = state.valid_moves(pos);
        state.selected_piece = Some(unit);
    }
    None
}

fn click_attack(
    state: &mut GameState,
    actor: PlayerSlot,
    pos: Position,
) -> Result<Option<Action>, Refusal> {
    if let Some(source) = state.attack_source.clone() {
        if state.target_at(actor.opponent(), pos).is_some() {
            return Ok(Some(Action::Attack {
                source,
                target: pos,
            }));
        }
    }

    let unit = state.unit_at(actor, pos).ok_or(Refusal::NoTarget)?;
    if pos.is_center() {
        return Err(Refusal::FromCenterSquare);
    }
    let targets = find_attack_targets(state, actor, unit);
    if targets.is_empty() {
        return Err(Refusal::NoTargetsInRange);
    }
    let source = unit.unit_ref();
    state.attack_source = Some(source);
    state.attack_targets = targets;
    Ok(None)
}

fn click_hack(
    state: &mut GameState,
    actor: PlayerSlot,
    pos: Position,
) -> Result<Option<Action>, Refusal> {
    if let Some(unit) = state.unit_at(actor, pos) {
        if pos.is_center() {
            return Err(Refusal::FromCenterSquare);
        }
        let source = unit.unit_ref();
        let installations = state
            .player(actor.opponent())
            .nodes
            .iter()
            .map(|n| n.position)
            .collect::<Vec<_>>();
        state.attack_source = Some(source);
        state.attack_targets = installations;
        return Ok(None);
    }

    let source = state.attack_source.clone().ok_or(Refusal::NothingSelected)?;
    Ok(Some(Action::Hack {
        source,
        target: pos,
    }))
}

fn click_split(
    state: &mut GameState,
    actor: PlayerSlot,
    pos: Position,
) -> Result<Option<Action>, Refusal> {
    if let (Some(unit), Some(amount)) = (state.split_piece.clone(), state.split_amount) {
        if state.valid_moves.contains(&pos) {
            return Ok(Some(Action::Split {
                unit,
                amount,
                to: pos,
            }));
        }
    }

    let unit = state.unit_at(actor, pos).ok_or(Refusal::NothingSelected)?;
    split_bounds(unit).ok_or(Refusal::CannotSplit)?;
    let piece = unit.unit_ref();
    state.split_piece = Some(piece);
    state.split_amount = None;
    state.valid_moves.clear();
    Ok(None)
}

fn click_surround(
    state: &mut GameState,
    actor: PlayerSlot,
    pos: Position,
) -> Result<Option<Action>, Refusal> {
    let Some(target) = state.surround_attack_target else {
        let found = state
            .target_at(actor.opponent(), pos)
            .ok_or(Refusal::NoTarget)?;
        let available = find_surrounding_attackers(state, actor, pos).len();
        if available < 2 {
            return Err(Refusal::TooFewAttackers { found: available });
        }
        state.surround_attack_target = Some(SurroundTarget {
            position: pos,
            kind: found.defender_kind(),
        });
        state.surround_attack_sources.clear();
        return Ok(None);
    };

    if pos == target.position {
        let committed = state.surround_attack_sources.len();
        if committed < 2 {
            return Err(Refusal::TooFewAttackers { found: committed });
        }
        return Ok(Some(Action::SurroundAttack {
            sources: state.surround_attack_sources.clone(),
            target: pos,
        }));
    }

    let unit = state.unit_at(actor, pos).ok_or(Refusal::NoTarget)?;
    if pos.is_center() {
        return Err(Refusal::FromCenterSquare);
    }
    if !is_in_attack_range(unit.position, target.position, unit.kind) {
        return Err(Refusal::OutOfRange);
    }
    let source = unit.unit_ref();
    let sources = &mut state.surround_attack_sources;
    match sources.iter().position(|s| *s == source) {
        Some(i) => {
            sources.remove(i);
        }
        None => sources.push(source),
    }
    Ok(None)
}

/// Countdown for the active player's turn.
///
/// When it runs out the active player is made ready, which ends the turn
/// exactly like a voluntary ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnClock {
    limit: Duration,
    remaining: Duration,
    turn: u32,
    active: PlayerSlot,
}

impl TurnClock {
    /// A clock allowing `limit` per turn.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self {
            limit,
            remaining: limit,
            turn: 1,
            active: PlayerSlot::P1,
        }
    }

    /// Time allowed per turn.
    #[must_use]
    pub const fn limit(&self) -> Duration {
        self.limit
    }

    /// Time left in the current turn.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Advance the clock by `elapsed`; on expiry force the turn to end.
    ///
    /// The countdown restarts whenever the turn has moved on since the
    /// last tick. Returns the outcome of the forced ready, if one happened.
    pub fn tick(&mut self, state: &mut GameState, elapsed: Duration) -> Option<Outcome> {
        if state.is_game_over() {
            return None;
        }
        self.follow(state);
        self.remaining = self.remaining.saturating_sub(elapsed);
        if !self.remaining.is_zero() {
            return None;
        }

        let actor = state.active_player;
        let name = state.player(actor).username.clone();
        state.log(format!("Time expired for {name}"));
        info!(player = %actor, turn = state.turn, "turn timer expired");

        let outcome = handle_intent(state, actor, Intent::SetReady).ok();
        self.follow(state);
        outcome
    }

    fn follow(&mut self, state: &GameState) {
        if (self.turn, self.active) != (state.turn, state.active_player) {
            self.turn = state.turn;
            self.active = state.active_player;
            self.remaining = self.limit;
        }
    }
}

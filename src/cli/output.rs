//! Output formatting utilities for CLI.

use std::fmt;

use noise_before_defeat::game::{NodeKind, UnitKind, GRID_SIZE};
use noise_before_defeat::{GameState, Intent, MatchRecord, Outcome, PlayerSlot, Position, Refusal};
use serde::Serialize;

/// Log lines shown at the end of a text report.
const LOG_TAIL: usize = 12;

/// One executed script step.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlayedStep {
    /// Seat that acted, or whose clock ran out.
    player: PlayerSlot,
    /// Intent handled; absent for clock expiry.
    intent: Option<Intent>,
    /// What happened when accepted.
    outcome: Option<Outcome>,
    /// Why it was refused.
    refusal: Option<String>,
}

impl PlayedStep {
    pub(super) fn accepted(player: PlayerSlot, intent: Intent, outcome: Outcome) -> Self {
        Self {
            player,
            intent: Some(intent),
            outcome: Some(outcome),
            refusal: None,
        }
    }

    pub(super) fn refused(player: PlayerSlot, intent: Intent, refusal: &Refusal) -> Self {
        Self {
            player,
            intent: Some(intent),
            outcome: None,
            refusal: Some(refusal.to_string()),
        }
    }

    pub(super) fn timed_out(player: PlayerSlot, outcome: Outcome) -> Self {
        Self {
            player,
            intent: None,
            outcome: Some(outcome),
            refusal: None,
        }
    }
}

impl fmt::Display for PlayedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.intent {
            Some(intent) => write!(f, "[{}] {}", self.player, describe_intent(intent))?,
            None => write!(f, "[{}] turn timer expired", self.player)?,
        }
        match (&self.outcome, &self.refusal) {
            (_, Some(refusal)) => write!(f, " -> refused: {refusal}"),
            (Some(outcome), None) => write!(f, " -> {}", describe_outcome(outcome)),
            (None, None) => Ok(()),
        }
    }
}

/// JSON report for the play command.
#[derive(Debug, Serialize)]
pub(super) struct PlayReport<'a> {
    /// Every step, in order.
    pub(super) steps: &'a [PlayedStep],
    /// Final snapshot.
    pub(super) state: &'a GameState,
}

fn describe_intent(intent: Intent) -> String {
    match intent {
        Intent::SelectAction { action } => format!("select {action:?}"),
        Intent::ClickCell { x, y } => format!("click {}", Position::new(x, y)),
        Intent::ConfirmSplit { amount } => format!("split {amount}"),
        Intent::CancelSplit => "cancel split".to_string(),
        Intent::SetReady => "ready".to_string(),
        Intent::ExitGame => "exit".to_string(),
    }
}

fn describe_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Pending => "ok".to_string(),
        Outcome::Resolved { report, turn_ended } => {
            let mut text = format!("{:?}", report.kind);
            if let Some(damage) = report.damage {
                text.push_str(&format!(" for {damage:.1}"));
            }
            if let Some(id) = &report.spawned {
                text.push_str(&format!(" (new unit {id})"));
            }
            if *turn_ended {
                text.push_str(", turn over");
            }
            text
        }
        Outcome::ReadyNoted => "ready noted".to_string(),
        Outcome::TurnEnded => "turn over".to_string(),
        Outcome::MatchOver { winner } => format!("match over, {winner} wins"),
        Outcome::Closed => "closed".to_string(),
    }
}

/// Board glyph for a cell: upper case for the first seat, lower case for the second.
fn glyph(state: &GameState, pos: Position) -> char {
    for slot in PlayerSlot::ALL {
        let player = state.player(slot);
        let symbol = if let Some(node) = player.nodes.at(pos) {
            match node.kind {
                NodeKind::Core => 'C',
                NodeKind::Comms => 'M',
                NodeKind::Rd => 'R',
            }
        } else if let Some(unit) = player.unit_at(pos) {
            match unit.kind {
                UnitKind::Infantry => 'I',
                UnitKind::LongRange => 'L',
            }
        } else {
            continue;
        };
        return match slot {
            PlayerSlot::P1 => symbol,
            PlayerSlot::P2 => symbol.to_ascii_lowercase(),
        };
    }
    if pos.is_center() { '+' } else { '.' }
}

/// Render the diamond board, top rank first.
fn format_board(state: &GameState) -> String {
    let mut output = String::new();
    for y in -GRID_SIZE..=GRID_SIZE {
        let rank = GRID_SIZE - y + 1;
        output.push_str(&format!("{rank:>3} "));
        for x in -GRID_SIZE..=GRID_SIZE {
            let pos = Position::new(x, y);
            output.push(if pos.is_valid() { glyph(state, pos) } else { ' ' });
            output.push(' ');
        }
        output.truncate(output.trim_end().len());
        output.push('\n');
    }
    output.push_str("    ");
    for file in 'a'..='q' {
        output.push(file);
        output.push(' ');
    }
    output.truncate(output.trim_end().len());
    output.push('\n');
    output
}

/// Format a snapshot as human-readable text.
pub(super) fn format_game(state: &GameState) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Turn {} ({:?}), {} to act, {} action(s) used\n\n",
        state.turn, state.phase, state.active_player, state.current_turn_moves
    ));
    output.push_str(&format_board(state));
    output.push('\n');

    for slot in PlayerSlot::ALL {
        let player = state.player(slot);
        output.push_str(&format!(
            "  {slot} {} (Elo {}): {} IP{}\n",
            player.username,
            player.elo,
            player.intel_points,
            if state.center_controllers.get(slot) { ", holds center" } else { "" }
        ));
        for node in player.nodes.iter() {
            output.push_str(&format!(
                "    {:<5} {} HP {:.1}/{:.0}\n",
                node.kind.to_string(),
                node.position,
                node.hp,
                node.max_hp
            ));
        }
        for unit in player.units() {
            output.push_str(&format!(
                "    {:<10} {} x{} HP {:.1}/{:.0}\n",
                unit.id, unit.position, unit.count, unit.hp, unit.max_hp
            ));
        }
    }

    if let Some(result) = &state.result {
        output.push_str(&format!(
            "\n  Winner: {} (grade {}), loser grade {}, Elo change {}\n",
            state.player(result.winner).username,
            result.winner_grade,
            result.loser_grade,
            result.elo_delta
        ));
    }

    output.push_str("\nLog:\n");
    let skip = state.game_log.len().saturating_sub(LOG_TAIL);
    for line in &state.game_log[skip..] {
        output.push_str(&format!("  {line}\n"));
    }
    output
}

/// Format a saved record as human-readable text.
pub(super) fn format_record(record: &MatchRecord) -> String {
    let mut output = String::new();

    if let Some(id) = &record.game_id {
        output.push_str(&format!("Match {id}\n"));
    }
    output.push_str(&format!(
        "  Winner: {} after {} turn(s)\n",
        record.winner_name(),
        record.result.turns
    ));
    for slot in PlayerSlot::ALL {
        let player = record.player(slot);
        let grade = if slot == record.result.winner {
            record.result.winner_grade
        } else {
            record.result.loser_grade
        };
        output.push_str(&format!(
            "  {slot} {}: Elo {} -> {}, grade {grade}\n",
            player.username, player.elo_before, player.elo_after
        ));
    }
    output.push_str("\nLog:\n");
    for line in &record.log {
        output.push_str(&format!("  {line}\n"));
    }
    output
}

//! Rating engine: Elo adjustment and letter grades for a finished match.
//!
//! # Elo
//!
//! ```text
//! expected = 1 / (1 + 10^((loser - winner) / 400))
//! delta    = 25 * (1 - expected) * streak_factor
//! streak_factor = 1 + 0.2 * min(loser_streak, 5)   (1.0 with no streak)
//! ```
//!
//! The delta is clamped to `15..=100` and rounded. The winner gains it, the
//! loser loses it (never dropping below zero).
//!
//! # Grades
//!
//! The winner earns A, B, or C by how much of their installations' combined
//! HP survived. The loser earns D if the winner's core was ever pushed below
//! 30% during the match, F otherwise.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game::{GameState, Grade, Nodes, PlayerSlot};

/// Base Elo step.
pub const K_FACTOR: f64 = 25.0;

/// Smallest rating change a match can produce.
pub const MIN_ELO_CHANGE: f64 = 15.0;

/// Largest rating change a match can produce.
pub const MAX_ELO_CHANGE: f64 = 100.0;

/// Loss streak length beyond which the bonus stops growing.
const MAX_STREAK_STEPS: u32 = 5;

/// Bonus per lost match in the loser's streak.
const STREAK_BONUS: f64 = 0.2;

/// Combined installation HP ratio above which the winner earns an A.
const GRADE_A_RATIO: f64 = 0.8;

/// Combined installation HP ratio above which the winner earns a B.
const GRADE_B_RATIO: f64 = 0.5;

/// Winner core ratio below which the loser's defeat counts as close.
const CLOSE_GAME_CORE_RATIO: f64 = 0.3;

/// Rating and grading outcome of one match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Winning seat.
    pub winner: PlayerSlot,
    /// Losing seat.
    pub loser: PlayerSlot,
    /// Rating points moved from loser to winner.
    pub elo_delta: u32,
    /// Winner's rating before the match.
    pub winner_elo_before: u32,
    /// Winner's rating after the match.
    pub winner_elo_after: u32,
    /// Loser's rating before the match.
    pub loser_elo_before: u32,
    /// Loser's rating after the match.
    pub loser_elo_after: u32,
    /// Winner's grade.
    pub winner_grade: Grade,
    /// Loser's grade.
    pub loser_grade: Grade,
    /// Turn on which the match ended.
    pub turns: u32,
}

/// Winner's expected score against the loser.
#[must_use]
pub fn expected_score(winner_elo: u32, loser_elo: u32) -> f64 {
    let gap = f64::from(loser_elo) - f64::from(winner_elo);
    1.0 / (1.0 + 10f64.powf(gap / 400.0))
}

/// Multiplier applied when the loser arrives on a losing streak.
#[must_use]
pub fn streak_factor(loser_streak: u32) -> f64 {
    if loser_streak == 0 {
        1.0
    } else {
        1.0 + STREAK_BONUS * f64::from(loser_streak.min(MAX_STREAK_STEPS))
    }
}

/// Rating points the winner takes from the loser.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn elo_delta(winner_elo: u32, loser_elo: u32, loser_streak: u32) -> u32 {
    let raw = K_FACTOR * (1.0 - expected_score(winner_elo, loser_elo)) * streak_factor(loser_streak);
    // Clamped to 15..=100 before the cast
    raw.clamp(MIN_ELO_CHANGE, MAX_ELO_CHANGE).round() as u32
}

/// Winner's grade from what is left of their installations.
#[must_use]
pub fn winner_grade(nodes: &Nodes) -> Grade {
    let ratio = nodes.combined_hp_ratio();
    if ratio > GRADE_A_RATIO {
        Grade::A
    } else if ratio > GRADE_B_RATIO {
        Grade::B
    } else {
        Grade::C
    }
}

/// Loser's grade from the lowest the winner's core ever fell.
#[must_use]
pub fn loser_grade(winner_lowest_core_ratio: f64) -> Grade {
    if winner_lowest_core_ratio < CLOSE_GAME_CORE_RATIO {
        Grade::D
    } else {
        Grade::F
    }
}

/// Apply ratings, streaks, and grades for a finished match.
///
/// Does nothing and returns `None` if the match has no winner yet or has
/// already been settled; the result is stored on the state otherwise.
pub fn settle_match(state: &mut GameState) -> Option<MatchResult> {
    let winner = state.winner?;
    if state.result.is_some() {
        return None;
    }
    let loser = winner.opponent();

    let (w, l) = state.players.split_mut(winner);
    let delta = elo_delta(w.elo, l.elo, l.consecutive_losses);
    let result = MatchResult {
        winner,
        loser,
        elo_delta: delta,
        winner_elo_before: w.elo,
        winner_elo_after: w.elo.saturating_add(delta),
        loser_elo_before: l.elo,
        loser_elo_after: l.elo.saturating_sub(delta),
        winner_grade: winner_grade(&w.nodes),
        loser_grade: loser_grade(w.lowest_core_ratio),
        turns: state.turn,
    };

    w.elo = result.winner_elo_after;
    w.consecutive_losses = 0;
    w.performance.wins += 1;
    w.performance.grade = Some(result.winner_grade);

    l.elo = result.loser_elo_after;
    l.consecutive_losses += 1;
    l.performance.losses += 1;
    l.performance.grade = Some(result.loser_grade);

    info!(
        %winner,
        delta,
        winner_grade = %result.winner_grade,
        loser_grade = %result.loser_grade,
        "match rated"
    );
    state.result = Some(result);
    Some(result)
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Prove the rating change always lands inside its clamp.
    #[kani::proof]
    fn prove_elo_delta_bounded() {
        let winner: u32 = kani::any();
        let loser: u32 = kani::any();
        let streak: u32 = kani::any();
        kani::assume(winner <= 5000 && loser <= 5000);
        let delta = elo_delta(winner, loser, streak);
        assert!((15..=100).contains(&delta));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_game(winner: PlayerSlot) -> GameState {
        let mut game = GameState::new("alice", "bob");
        game.phase = crate::game::Phase::GameOver;
        game.winner = Some(winner);
        game
    }

    #[test]
    fn test_even_match_hits_floor() {
        // 25 * 0.5 = 12.5, clamped up to 15
        assert_eq!(elo_delta(500, 500, 0), 15);
    }

    #[test]
    fn test_upset_pays_more() {
        // expected = 1 / (1 + 10^(400/400)) = 1/11; 25 * 10/11 = 22.7
        assert_eq!(elo_delta(500, 900, 0), 23);
        assert_eq!(elo_delta(900, 500, 0), 15);
    }

    #[test]
    fn test_loss_streak_multiplier() {
        assert!((streak_factor(0) - 1.0).abs() < f64::EPSILON);
        assert!((streak_factor(1) - 1.2).abs() < 1e-9);
        assert!((streak_factor(5) - 2.0).abs() < 1e-9);
        assert!((streak_factor(12) - 2.0).abs() < 1e-9);
        // 22.73 * 2.0 = 45.45
        assert_eq!(elo_delta(500, 900, 7), 45);
    }

    #[test]
    fn test_delta_with_long_streak() {
        assert_eq!(elo_delta(0, 3000, 5), 50);
        assert!(elo_delta(0, 100_000, 5) <= 100);
    }

    #[test]
    fn test_winner_grades() {
        let mut nodes = Nodes::around(crate::game::Position::new(0, -4));
        assert_eq!(winner_grade(&nodes), Grade::A);
        nodes.core.hp = 20.0;
        // (20 + 50 + 50) / 150 = 0.8, not above
        assert_eq!(winner_grade(&nodes), Grade::B);
        nodes.comms.hp = 0.0;
        // 70 / 150 = 0.47
        assert_eq!(winner_grade(&nodes), Grade::C);
    }

    #[test]
    fn test_loser_grades() {
        assert_eq!(loser_grade(0.29), Grade::D);
        assert_eq!(loser_grade(0.3), Grade::F);
        assert_eq!(loser_grade(1.0), Grade::F);
    }

    #[test]
    fn test_settle_match_updates_players() {
        let mut game = finished_game(PlayerSlot::P1);
        game.players.p1.consecutive_losses = 3;
        let result = settle_match(&mut game).unwrap();

        assert_eq!(result.elo_delta, 15);
        assert_eq!(game.players.p1.elo, 515);
        assert_eq!(game.players.p2.elo, 485);
        assert_eq!(game.players.p1.consecutive_losses, 0);
        assert_eq!(game.players.p2.consecutive_losses, 1);
        assert_eq!(game.players.p1.performance.wins, 1);
        assert_eq!(game.players.p2.performance.losses, 1);
        assert_eq!(game.players.p1.performance.grade, Some(Grade::A));
        assert_eq!(game.players.p2.performance.grade, Some(Grade::F));
        assert_eq!(game.result, Some(result));
    }

    #[test]
    fn test_settle_match_runs_once() {
        let mut game = finished_game(PlayerSlot::P2);
        assert!(settle_match(&mut game).is_some());
        assert!(settle_match(&mut game).is_none());
        assert_eq!(game.players.p2.elo, 515);
    }

    #[test]
    fn test_loser_elo_floors_at_zero() {
        let mut game = finished_game(PlayerSlot::P1);
        game.players.p2.elo = 5;
        settle_match(&mut game);
        assert_eq!(game.players.p2.elo, 0);
    }

    #[test]
    fn test_unfinished_match_not_settled() {
        let mut game = GameState::new("alice", "bob");
        assert!(settle_match(&mut game).is_none());
        assert_eq!(game.players.p1.elo, 500);
    }
}

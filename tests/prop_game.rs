//! Property-based tests for game mechanics.
//!
//! These tests verify properties of geometry, combat, splitting, and the
//! turn controller under arbitrary intent streams.
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use noise_before_defeat::game::{
    all_positions, calculate_damage, check_invariants, check_split, is_in_attack_range,
    is_valid_position, split_bounds, ActionKind, DefenderKind, Position, Unit, UnitKind, GRID_SIZE, HP_PER_TROOP,
};
use noise_before_defeat::rating::elo_delta;
use noise_before_defeat::{handle_intent, GameState, Intent, PlayerSlot};

fn unit_kind() -> impl Strategy<Value = UnitKind> {
    prop_oneof![Just(UnitKind::Infantry), Just(UnitKind::LongRange)]
}

fn defender_kind() -> impl Strategy<Value = DefenderKind> {
    prop_oneof![
        Just(DefenderKind::Infantry),
        Just(DefenderKind::LongRange),
        Just(DefenderKind::Core),
        Just(DefenderKind::Comms),
        Just(DefenderKind::Rd),
    ]
}

fn action_kind() -> impl Strategy<Value = ActionKind> {
    prop_oneof![
        Just(ActionKind::Move),
        Just(ActionKind::Attack),
        Just(ActionKind::Hack),
        Just(ActionKind::Split),
        Just(ActionKind::SurroundAttack),
    ]
}

fn cell() -> impl Strategy<Value = (i32, i32)> {
    (-GRID_SIZE - 1..=GRID_SIZE + 1, -GRID_SIZE - 1..=GRID_SIZE + 1)
}

fn intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        3 => action_kind().prop_map(|action| Intent::SelectAction { action }),
        8 => cell().prop_map(|(x, y)| Intent::ClickCell { x, y }),
        1 => (0u32..50).prop_map(|amount| Intent::ConfirmSplit { amount }),
        1 => Just(Intent::CancelSplit),
        1 => Just(Intent::SetReady),
    ]
}

fn seat() -> impl Strategy<Value = PlayerSlot> {
    prop_oneof![Just(PlayerSlot::P1), Just(PlayerSlot::P2)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Attack range does not depend on which end you measure from.
    #[test]
    fn prop_attack_range_symmetric(
        a in cell(),
        b in cell(),
        kind in unit_kind()
    ) {
        let (a, b) = (Position::new(a.0, a.1), Position::new(b.0, b.1));
        prop_assert_eq!(is_in_attack_range(a, b, kind), is_in_attack_range(b, a, kind));
    }

    /// Mirroring through the center keeps cells on the board.
    #[test]
    fn prop_mirror_preserves_validity(x in -12i32..=12, y in -12i32..=12) {
        let pos = Position::new(x, y);
        prop_assert_eq!(pos.is_valid(), pos.mirrored().is_valid());
        prop_assert_eq!(pos.is_valid(), is_valid_position(x, y));
    }

    /// Every on-board cell has a label that parses back to it.
    #[test]
    fn prop_labels_identify_cells(index in 0usize..145) {
        let pos = all_positions().nth(index).unwrap();
        let label = pos.label().unwrap();
        prop_assert_eq!(Position::from_label(&label), Some(pos));
    }

    /// Damage is finite and non-negative for every attacker and defender.
    #[test]
    fn prop_damage_non_negative(
        kind in unit_kind(),
        strength in 0u32..=1000,
        defender in defender_kind()
    ) {
        let damage = calculate_damage(kind, strength, defender);
        prop_assert!(damage.is_finite());
        prop_assert!(damage >= 0.0);
    }

    /// Infantry damage never exceeds its cap, however large the group.
    #[test]
    fn prop_infantry_damage_capped(strength in 0u32..=10_000, defender in defender_kind()) {
        prop_assert!(calculate_damage(UnitKind::Infantry, strength, defender) <= 20.0);
    }

    /// Splitting conserves troops and keeps both halves consistent and alive,
    /// however worn the unit is.
    #[test]
    fn prop_split_conserves_count(
        kind in unit_kind(),
        count in 1u32..=90,
        pick in any::<u32>(),
        health in 0.0f64..=1.0
    ) {
        let mut unit = Unit::new("u", kind, Position::new(0, -2), count);
        let Some((min, max)) = split_bounds(&unit) else {
            return Ok(());
        };
        prop_assert!(min <= max);
        let amount = min + pick % (max - min + 1);
        unit.hp = (unit.max_hp * health).max(0.1);
        let hp_before = unit.hp;
        if check_split(&unit, amount).is_err() {
            return Ok(());
        }

        let spawned = unit.split_off(amount, "v".to_string(), Position::new(1, -2));
        prop_assert_eq!(unit.count + spawned.count, count);
        prop_assert!(unit.count >= min);
        prop_assert!(spawned.count >= min);
        prop_assert!((unit.max_hp - f64::from(unit.count) * HP_PER_TROOP).abs() < 1e-9);
        prop_assert!((spawned.max_hp - f64::from(spawned.count) * HP_PER_TROOP).abs() < 1e-9);
        prop_assert!(unit.hp > 0.0 && spawned.hp > 0.0);
        prop_assert!(unit.hp <= unit.max_hp && spawned.hp <= spawned.max_hp);
        prop_assert!(unit.hp + spawned.hp <= hp_before + 1e-9);
    }

    /// Rating changes stay inside their clamp.
    #[test]
    fn prop_elo_delta_clamped(
        winner in 0u32..4000,
        loser in 0u32..4000,
        streak in 0u32..20
    ) {
        let delta = elo_delta(winner, loser, streak);
        prop_assert!((15..=100).contains(&delta));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// No stream of intents, legal or not, breaks a game invariant.
    #[test]
    fn prop_random_intents_keep_invariants(
        steps in prop::collection::vec((seat(), intent()), 1..200)
    ) {
        let mut game = GameState::new("alice", "bob");
        for (actor, intent) in steps {
            let moves_before = game.current_turn_moves;
            let turn_before = game.turn;
            let result = handle_intent(&mut game, actor, intent);

            let violations = check_invariants(&game);
            prop_assert!(violations.is_empty(), "{:?} after {:?}", violations, intent);

            // Refusals never spend the budget or advance the turn
            if result.is_err() {
                prop_assert_eq!(game.current_turn_moves, moves_before);
                prop_assert_eq!(game.turn, turn_before);
            }
            if game.is_game_over() {
                prop_assert!(game.result.is_some());
                break;
            }
        }
    }

    /// A unit on the center square is always refused as an attacker.
    #[test]
    fn prop_center_square_cannot_attack(kind in unit_kind(), action in prop_oneof![
        Just(ActionKind::Attack),
        Just(ActionKind::Hack),
    ]) {
        let mut game = GameState::new("alice", "bob");
        let unit = match kind {
            UnitKind::Infantry => &mut game.players.p1.infantry[0],
            UnitKind::LongRange => &mut game.players.p1.long_range[0],
        };
        unit.position = Position::new(0, 0);
        game.refresh_center_control();

        handle_intent(&mut game, PlayerSlot::P1, Intent::SelectAction { action }).unwrap();
        let result = handle_intent(&mut game, PlayerSlot::P1, Intent::ClickCell { x: 0, y: 0 });
        prop_assert_eq!(result, Err(noise_before_defeat::Refusal::FromCenterSquare));
        prop_assert!(game.attack_source.is_none());
    }
}

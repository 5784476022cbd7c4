#![no_main]

//! Damage and split fuzzer.
//!
//! Damage must stay finite, non-negative, and within the per-kind caps;
//! splitting must conserve troops and keep HP proportional to the count.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use noise_before_defeat::game::{
    apply_damage, calculate_damage, split_bounds, DefenderKind, Position, Unit, UnitKind,
};

#[derive(Arbitrary, Debug)]
struct CombatInput {
    long_range: bool,
    strength: u32,
    defender: u8,
    hp: u16,
    split_pick: u32,
}

fuzz_target!(|input: CombatInput| {
    let kind = if input.long_range {
        UnitKind::LongRange
    } else {
        UnitKind::Infantry
    };
    let defender = match input.defender % 5 {
        0 => DefenderKind::Infantry,
        1 => DefenderKind::LongRange,
        2 => DefenderKind::Core,
        3 => DefenderKind::Comms,
        _ => DefenderKind::Rd,
    };

    let damage = calculate_damage(kind, input.strength, defender);
    assert!(damage.is_finite() && damage >= 0.0, "bad damage {damage}");
    if kind == UnitKind::Infantry {
        assert!(damage <= 20.0, "infantry damage {damage} above cap");
    }

    let hp = f64::from(input.hp);
    let left = apply_damage(hp, damage);
    assert!((0.0..=hp).contains(&left));

    let count = input.strength % 200;
    let mut unit = Unit::new("u", kind, Position::new(0, -2), count);
    if let Some((min, max)) = split_bounds(&unit) {
        let amount = min + input.split_pick % (max - min + 1);
        let spawned = unit.split_off(amount, "v".to_string(), Position::new(1, -2));
        assert_eq!(unit.count + spawned.count, count);
        assert!(unit.count >= min && spawned.count >= min);
        assert!((unit.max_hp + spawned.max_hp - f64::from(count) * 2.0).abs() < 1e-9);
    }
});

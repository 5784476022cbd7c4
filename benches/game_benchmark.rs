//! Benchmarks for the intent loop and the work around it.
//!
//! The turn controller runs on every click, and snapshots are encoded on
//! every published change, so those are the hot paths.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use noise_before_defeat::game::{
    ActionKind, DefenderKind, UnitKind, calculate_damage, check_invariants,
};
use noise_before_defeat::rating::elo_delta;
use noise_before_defeat::{GameState, Intent, PlayerSlot, handle_intent};

/// Both sides shuffle their long-range unit back and forth for `turns` turns.
fn shuffle_match(turns: u32) -> GameState {
    let mut game = GameState::new("alice", "bob");
    for turn in 0..turns {
        let actor = game.active_player;
        let forward = turn % 4 < 2;
        let (from, to) = match (actor, forward) {
            (PlayerSlot::P1, true) => ((0, -2), (0, -1)),
            (PlayerSlot::P1, false) => ((0, -1), (0, -2)),
            (PlayerSlot::P2, true) => ((0, 2), (0, 1)),
            (PlayerSlot::P2, false) => ((0, 1), (0, 2)),
        };
        let steps = [
            Intent::SelectAction {
                action: ActionKind::Move,
            },
            Intent::ClickCell {
                x: from.0,
                y: from.1,
            },
            Intent::ClickCell { x: to.0, y: to.1 },
            Intent::SetReady,
        ];
        for intent in steps {
            let _ = handle_intent(&mut game, actor, intent);
        }
    }
    game
}

fn bench_intent_loop(c: &mut Criterion) {
    c.bench_function("100_turn_shuffle", |b| {
        b.iter(|| black_box(shuffle_match(black_box(100))));
    });
}

fn bench_attack_targeting(c: &mut Criterion) {
    let game = GameState::new("alice", "bob");

    c.bench_function("select_attack_source", |b| {
        b.iter(|| {
            let mut game = game.clone();
            let _ = handle_intent(
                &mut game,
                PlayerSlot::P1,
                Intent::SelectAction {
                    action: ActionKind::Attack,
                },
            );
            let result = handle_intent(&mut game, PlayerSlot::P1, Intent::ClickCell { x: 0, y: -2 });
            black_box(result)
        });
    });
}

fn bench_damage_table(c: &mut Criterion) {
    let defenders = [
        DefenderKind::Infantry,
        DefenderKind::LongRange,
        DefenderKind::Core,
        DefenderKind::Comms,
        DefenderKind::Rd,
    ];

    c.bench_function("damage_table", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for strength in 0..=90u32 {
                for defender in defenders {
                    total += calculate_damage(UnitKind::Infantry, black_box(strength), defender);
                    total += calculate_damage(UnitKind::LongRange, black_box(strength), defender);
                }
            }
            black_box(total)
        });
    });

    c.bench_function("elo_delta", |b| {
        b.iter(|| elo_delta(black_box(500), black_box(640), black_box(3)));
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let game = shuffle_match(40);

    c.bench_function("check_invariants", |b| {
        b.iter(|| black_box(check_invariants(black_box(&game))));
    });

    c.bench_function("snapshot_encode", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(&game)).unwrap()));
    });

    let json = serde_json::to_string(&game).unwrap();
    c.bench_function("snapshot_decode", |b| {
        b.iter(|| black_box(serde_json::from_str::<GameState>(black_box(&json)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_intent_loop,
    bench_attack_targeting,
    bench_damage_table,
    bench_snapshot
);
criterion_main!(benches);

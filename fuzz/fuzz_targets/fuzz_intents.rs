#![no_main]

//! Intent stream fuzzer.
//!
//! Feeds arbitrary intents from both seats into the turn controller and
//! checks every invariant after each one. Refusals are expected; panics and
//! broken invariants are not.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use noise_before_defeat::game::{check_invariants, ActionKind};
use noise_before_defeat::{handle_intent, GameState, Intent, PlayerSlot};

/// A fuzzer-generated intent.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzIntent {
    Select(u8),
    Click { x: i8, y: i8 },
    ConfirmSplit(u8),
    CancelSplit,
    Ready,
    Exit,
}

impl FuzzIntent {
    fn into_intent(self) -> Intent {
        match self {
            Self::Select(n) => Intent::SelectAction {
                action: match n % 5 {
                    0 => ActionKind::Move,
                    1 => ActionKind::Attack,
                    2 => ActionKind::Hack,
                    3 => ActionKind::Split,
                    _ => ActionKind::SurroundAttack,
                },
            },
            // Mostly on the board, sometimes just off it
            Self::Click { x, y } => Intent::ClickCell {
                x: i32::from(x % 10),
                y: i32::from(y % 10),
            },
            Self::ConfirmSplit(amount) => Intent::ConfirmSplit {
                amount: u32::from(amount),
            },
            Self::CancelSplit => Intent::CancelSplit,
            Self::Ready => Intent::SetReady,
            Self::Exit => Intent::ExitGame,
        }
    }
}

#[derive(Arbitrary, Debug)]
struct IntentStream {
    steps: Vec<(bool, FuzzIntent)>,
}

fuzz_target!(|input: IntentStream| {
    let mut game = GameState::new("alice", "bob");

    for (second_seat, step) in input.steps.into_iter().take(500) {
        let actor = if second_seat { PlayerSlot::P2 } else { PlayerSlot::P1 };
        let turn_before = game.turn;
        let result = handle_intent(&mut game, actor, step.into_intent());

        let violations = check_invariants(&game);
        assert!(
            violations.is_empty(),
            "Invariant violations after {step:?}: {violations:?}"
        );
        if result.is_err() {
            assert_eq!(game.turn, turn_before, "refused intent advanced the turn");
        }
        if game.closed {
            break;
        }
    }
});

#![no_main]

//! Snapshot decoding fuzzer.
//!
//! Replicated snapshots arrive from the network; decoding arbitrary bytes
//! must fail cleanly, and any consistent snapshot must survive the turn
//! controller.

use libfuzzer_sys::fuzz_target;
use noise_before_defeat::game::check_invariants;
use noise_before_defeat::sync::VersionedSnapshot;
use noise_before_defeat::{handle_intent, Intent, PlayerSlot};

fuzz_target!(|data: &[u8]| {
    let Ok(mut snapshot) = serde_json::from_slice::<VersionedSnapshot>(data) else {
        return;
    };
    if !check_invariants(&snapshot.state).is_empty() || snapshot.state.turn > 1_000_000 {
        return;
    }
    for actor in PlayerSlot::ALL {
        let _ = handle_intent(&mut snapshot.state, actor, Intent::SetReady);
        let _ = handle_intent(&mut snapshot.state, actor, Intent::ClickCell { x: 0, y: 0 });
    }
});

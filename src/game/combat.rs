//! Damage model.
//!
//! Damage depends only on the attacker's kind and troop count and on what is
//! being hit. Infantry scale with their count up to a per-target cap. Long-range
//! units scale linearly against infantry but fire a fixed charge at
//! installations once at least two pieces are in the group.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{NodeKind, UnitKind};

/// Infantry damage cap against infantry.
const INFANTRY_VS_INFANTRY_CAP: f64 = 15.0;
/// Infantry damage cap against a core.
const INFANTRY_VS_CORE_CAP: f64 = 20.0;
/// Infantry damage cap against other installations.
const INFANTRY_VS_NODE_CAP: f64 = 10.0;

/// Long-range pieces needed for a full charge against installations.
const LONG_RANGE_CHARGE_THRESHOLD: u32 = 2;
/// Long-range full charge against a core.
const LONG_RANGE_CORE_CHARGE: f64 = 35.0;
/// Long-range full charge against other installations.
const LONG_RANGE_NODE_CHARGE: f64 = 5.0;
/// Long-range damage below the charge threshold.
const LONG_RANGE_WEAK_SHOT: f64 = 1.0;

/// What is on the receiving end of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefenderKind {
    /// An infantry group.
    Infantry,
    /// A long-range unit.
    LongRange,
    /// A core installation.
    Core,
    /// A comms installation.
    Comms,
    /// A research installation.
    Rd,
}

impl DefenderKind {
    /// The defender kind of a unit.
    #[must_use]
    pub const fn unit(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Infantry => Self::Infantry,
            UnitKind::LongRange => Self::LongRange,
        }
    }

    /// The defender kind of an installation.
    #[must_use]
    pub const fn node(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Core => Self::Core,
            NodeKind::Comms => Self::Comms,
            NodeKind::Rd => Self::Rd,
        }
    }
}

impl fmt::Display for DefenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Infantry => "infantry",
            Self::LongRange => "longrange",
            Self::Core => "core",
            Self::Comms => "comms",
            Self::Rd => "rd",
        })
    }
}

/// Damage dealt by an attacker of `kind` with `strength` troops against `defender`.
///
/// A long-range unit hitting another long-range unit uses the installation
/// charge: anything that is neither infantry nor a core takes that branch.
#[must_use]
pub fn calculate_damage(kind: UnitKind, strength: u32, defender: DefenderKind) -> f64 {
    let count = f64::from(strength);
    match (kind, defender) {
        (UnitKind::Infantry, DefenderKind::Infantry) => INFANTRY_VS_INFANTRY_CAP.min(count / 3.0),
        (UnitKind::Infantry, DefenderKind::Core) => INFANTRY_VS_CORE_CAP.min(count / 2.0),
        (UnitKind::Infantry, _) => INFANTRY_VS_NODE_CAP.min(count / 4.0),
        (UnitKind::LongRange, DefenderKind::Infantry) => count * 2.0,
        (UnitKind::LongRange, DefenderKind::Core) => {
            if strength >= LONG_RANGE_CHARGE_THRESHOLD {
                LONG_RANGE_CORE_CHARGE
            } else {
                LONG_RANGE_WEAK_SHOT
            }
        }
        (UnitKind::LongRange, _) => {
            if strength >= LONG_RANGE_CHARGE_THRESHOLD {
                LONG_RANGE_NODE_CHARGE
            } else {
                LONG_RANGE_WEAK_SHOT
            }
        }
    }
}

/// HP left after taking `damage`, floored at zero.
#[must_use]
pub fn apply_damage(hp: f64, damage: f64) -> f64 {
    (hp - damage.max(0.0)).max(0.0)
}

/// Format a damage or HP amount for the game log: whole numbers print bare,
/// fractions keep two decimals.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Prove that no attacker ever deals negative damage.
    #[kani::proof]
    fn prove_damage_non_negative() {
        let strength: u32 = kani::any();
        let kind = if kani::any() { UnitKind::Infantry } else { UnitKind::LongRange };
        let damage = calculate_damage(kind, strength, DefenderKind::Infantry);
        assert!(damage >= 0.0);
    }
}

//! Health delta calculation for `HealthDelta` skill effects.

use crate::combatant::{Combatant, StatKind};
use crate::skill::DamageType;

/// Final HP delta a hit applies to `recipient`.
///
/// Damage (negative amounts) grows by the sender's adder for the damage type
/// and shrinks by the recipient's resistance, clamped to `[0, 1]`. Healing is
/// never resisted.
pub fn calculate_health_delta(
    amount: f32,
    damage_type: DamageType,
    sender: &Combatant,
    recipient: &Combatant,
) -> f32 {
    if amount >= 0.0 {
        return amount;
    }
    let (adder, resistance) = match damage_type {
        DamageType::None => return amount,
        DamageType::Physical => (StatKind::PhysicalAdder, StatKind::PhysicalResistance),
        DamageType::Magical => (StatKind::MagicalAdder, StatKind::MagicalResistance),
    };
    let magnitude = (-amount + sender.stat(adder)).max(0.0);
    let resistance = recipient.stat(resistance).clamp(0.0, 1.0);
    -(magnitude * (1.0 - resistance))
}

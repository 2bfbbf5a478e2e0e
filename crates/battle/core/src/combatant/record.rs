//! Save/restore pair for the three scalars the battle core persists.

use super::{Combatant, CombatantFlags};
use crate::error::{BattleError, Result};

/// Persisted HP/AP/alive state of a combatant.
///
/// The save format itself is owned by the embedder; this record only
/// carries the values across.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantRecord {
    pub hp: f32,
    pub ap: f32,
    pub is_alive: bool,
}

impl Combatant {
    pub fn record(&self) -> CombatantRecord {
        CombatantRecord {
            hp: self.target_hp,
            ap: self.ap,
            is_alive: self.is_alive(),
        }
    }

    /// Restores persisted values.
    ///
    /// Negative or non-finite values indicate corrupted data and are
    /// rejected. Values above the current maximum are clamped, and an alive
    /// record with no HP restores as dead.
    pub fn restore(&mut self, record: CombatantRecord) -> Result<()> {
        if !record.hp.is_finite() || record.hp < 0.0 {
            return Err(BattleError::InvalidRecord {
                combatant: self.id,
                reason: "hp must be finite and non-negative",
            });
        }
        if !record.ap.is_finite() || record.ap < 0.0 {
            return Err(BattleError::InvalidRecord {
                combatant: self.id,
                reason: "ap must be finite and non-negative",
            });
        }

        let alive = record.is_alive && record.hp > 0.0;
        self.hp = if alive {
            record.hp.min(self.max_hp())
        } else {
            0.0
        };
        self.target_hp = self.hp;
        self.scroll = None;
        self.ap = record.ap.min(self.max_ap());
        self.flags.set(CombatantFlags::ALIVE, alive);
        Ok(())
    }
}

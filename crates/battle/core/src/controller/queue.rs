//! Resolution queue entries and the in-flight resolution step.

use std::sync::Arc;

use crate::combatant::CombatantId;
use crate::skill::{Skill, SkillId};

/// One confirmed `(sender, recipient, skill)` entry. Resolved in FIFO order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleSequence {
    pub sender: CombatantId,
    pub recipient: CombatantId,
    pub skill: SkillId,
    /// Set on the first entry of an action; that entry pays the AP cost.
    pub pays_cost: bool,
}

impl BattleSequence {
    pub fn new(sender: CombatantId, recipient: CombatantId, skill: SkillId) -> Self {
        Self {
            sender,
            recipient,
            skill,
            pays_cost: true,
        }
    }
}

/// The dequeued entry currently holding the halt flag.
///
/// `delay` counts down between hits, and once more after the last hit
/// before the next entry may be dequeued.
#[derive(Clone, Debug)]
pub(super) struct Resolution {
    pub sequence: BattleSequence,
    pub skill: Arc<Skill>,
    pub hits_done: u32,
    pub delay: f32,
}

impl Resolution {
    pub fn new(sequence: BattleSequence, skill: Arc<Skill>) -> Self {
        Self {
            sequence,
            skill,
            hits_done: 0,
            delay: 0.0,
        }
    }

    pub fn hits_remaining(&self) -> u32 {
        self.skill.hits().saturating_sub(self.hits_done)
    }
}

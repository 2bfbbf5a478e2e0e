//! Encounter roster definitions.

use std::sync::Arc;

use battle_core::{
    BattleAi, BattleRow, Combatant, CombatantId, Side, SkillBook, SkillId, StatSheet,
    TransitionKind,
};
use serde::{Deserialize, Serialize};

/// One participant as written in `roster.ron`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatantSpec {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub stats: StatSheet,
    #[serde(default)]
    pub skills: Vec<SkillId>,
    /// Preferred mat row; only meaningful for enemies.
    #[serde(default)]
    pub row: BattleRow,
    /// `None` leaves the combatant under player control.
    #[serde(default)]
    pub ai: Option<BattleAi>,
}

impl CombatantSpec {
    pub fn to_combatant(&self) -> Combatant {
        Combatant::new(self.id, self.name.clone(), self.side, Arc::new(self.stats.clone()))
            .with_skills(self.skills.iter().cloned())
    }

    /// Skills this combatant (or its AI) names that `book` does not define.
    pub fn unknown_skills(&self, book: &SkillBook) -> Vec<SkillId> {
        let mut unknown: Vec<SkillId> = self
            .skills
            .iter()
            .filter(|s| !book.contains(s))
            .cloned()
            .collect();
        if let Some(ai) = &self.ai {
            unknown.extend(ai.unknown_skills(book));
        }
        unknown.sort();
        unknown.dedup();
        unknown
    }
}

/// Both sides of an encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosterSpec {
    /// Party members and assists.
    pub allies: Vec<CombatantSpec>,
    pub enemies: Vec<CombatantSpec>,
    #[serde(default)]
    pub transition: TransitionKind,
}

impl RosterSpec {
    pub fn combatants(&self) -> impl Iterator<Item = &CombatantSpec> {
        self.allies.iter().chain(self.enemies.iter())
    }

    pub fn get(&self, id: CombatantId) -> Option<&CombatantSpec> {
        self.combatants().find(|c| c.id == id)
    }

    /// Ids listed more than once across both sides.
    pub fn duplicate_ids(&self) -> Vec<CombatantId> {
        let mut ids: Vec<CombatantId> = self.combatants().map(|c| c.id).collect();
        ids.sort();
        let mut duplicates: Vec<CombatantId> = ids
            .windows(2)
            .filter(|pair| pair[0] == pair[1])
            .map(|pair| pair[0])
            .collect();
        duplicates.dedup();
        duplicates
    }

    pub fn allies(&self) -> Vec<Combatant> {
        self.allies.iter().map(CombatantSpec::to_combatant).collect()
    }

    pub fn enemies(&self) -> Vec<(Combatant, BattleRow)> {
        self.enemies
            .iter()
            .map(|spec| (spec.to_combatant(), spec.row))
            .collect()
    }

    /// True when the roster has at least one party member and one enemy.
    pub fn is_playable(&self) -> bool {
        self.allies.iter().any(|c| c.side == Side::Ally) && !self.enemies.is_empty()
    }
}

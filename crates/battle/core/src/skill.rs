//! Static skill definitions.
//!
//! Skills are immutable once loaded. The controller stores them in a
//! [`SkillBook`] and hands out `Arc<Skill>` references; the AI and the
//! player selection refer to them, never own them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::combatant::Combatant;
use crate::status::StatusTemplate;
use crate::targeting::{FilterChain, FilterStrategy, ParticipantType, TargetingStrategy};

/// Stable skill identifier, as written in content files.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SkillId(pub String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SkillId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which sender stat adds to damage and which recipient resistance absorbs it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageType {
    #[default]
    None,
    Physical,
    Magical,
}

/// One effect applied to the recipient per hit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillEffect {
    /// Negative values damage, positive values heal (and revive dead targets).
    HealthDelta { amount: f32 },
    ApDelta { amount: f32 },
    ApplyStatus(StatusTemplate),
}

/// Static skill definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ap_cost: f32,
    /// Base cooldown in seconds, scaled by the sender's cooldown multiplier.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_hits"))]
    pub number_of_hits: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type: DamageType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<SkillEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub participant: ParticipantType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: TargetingStrategy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub filters: FilterChain,
}

#[cfg(feature = "serde")]
fn default_hits() -> u32 {
    1
}

impl Skill {
    /// A free, single-hit, single-target skill against living opponents.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: SkillId::new(id),
            name: name.into(),
            ap_cost: 0.0,
            cooldown: 0.0,
            number_of_hits: 1,
            damage_type: DamageType::None,
            effects: Vec::new(),
            participant: ParticipantType::Opposing,
            targeting: TargetingStrategy::Single,
            filters: FilterChain::standard(),
        }
    }

    #[must_use]
    pub fn with_cost(mut self, ap_cost: f32) -> Self {
        self.ap_cost = ap_cost;
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn with_hits(mut self, hits: u32) -> Self {
        self.number_of_hits = hits;
        self
    }

    #[must_use]
    pub fn with_damage_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = damage_type;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: SkillEffect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_targeting(mut self, participant: ParticipantType, targeting: TargetingStrategy) -> Self {
        self.participant = participant;
        self.targeting = targeting;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Hits per resolution; zero is treated as one.
    pub fn hits(&self) -> u32 {
        self.number_of_hits.max(1)
    }

    /// Skills that can only land on the fallen (revives).
    pub fn targets_dead(&self) -> bool {
        self.filters.contains(&FilterStrategy::Dead)
    }

    /// Alive, knows the skill, and can pay for it.
    pub fn is_usable_by(&self, combatant: &Combatant) -> bool {
        combatant.is_alive() && combatant.knows(&self.id) && combatant.ap() >= self.ap_cost
    }
}

/// Registry of every skill available in a battle.
#[derive(Clone, Debug, Default)]
pub struct SkillBook {
    skills: HashMap<SkillId, Arc<Skill>>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a skill, returning the definition it replaced.
    pub fn insert(&mut self, skill: Skill) -> Option<Arc<Skill>> {
        self.skills.insert(skill.id.clone(), Arc::new(skill))
    }

    pub fn get(&self, id: &SkillId) -> Option<Arc<Skill>> {
        self.skills.get(id).cloned()
    }

    pub fn contains(&self, id: &SkillId) -> bool {
        self.skills.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skills the combatant can use right now, in the combatant's own order.
    pub fn usable_by(&self, combatant: &Combatant) -> Vec<Arc<Skill>> {
        combatant
            .skills()
            .iter()
            .filter_map(|id| self.skills.get(id))
            .filter(|skill| skill.is_usable_by(combatant))
            .cloned()
            .collect()
    }
}

impl FromIterator<Skill> for SkillBook {
    fn from_iter<I: IntoIterator<Item = Skill>>(iter: I) -> Self {
        let mut book = SkillBook::new();
        for skill in iter {
            book.insert(skill);
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Side;
    use crate::combatant::tests::combatant;

    #[test]
    fn usable_skills_respect_ap_and_knowledge() {
        let book: SkillBook = [
            Skill::new("cheap", "Cheap").with_cost(5.0),
            Skill::new("pricey", "Pricey").with_cost(50.0),
            Skill::new("unknown", "Unknown"),
        ]
        .into_iter()
        .collect();

        let unit = combatant(1, Side::Ally).with_skills(["cheap".into(), "pricey".into()]);
        let usable: Vec<_> = book.usable_by(&unit).iter().map(|s| s.id.clone()).collect();
        assert_eq!(usable, vec![SkillId::from("cheap")]);
    }

    #[test]
    fn zero_hits_counts_as_one() {
        assert_eq!(Skill::new("a", "A").with_hits(0).hits(), 1);
        assert_eq!(Skill::new("a", "A").with_hits(3).hits(), 3);
    }
}

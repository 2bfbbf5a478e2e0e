//! Battle AI: ordered priorities with a random fallback.
//!
//! Priorities are tried in list order. A priority whose chosen skill yields
//! no targets excludes that skill for the rest of the turn and the whole
//! selection restarts; the excluded set only grows, so the loop is bounded by
//! the skill pool.

mod condition;
mod priority;
mod skill_tree;

pub use condition::{
    AiContext, BattlePredicate, Condition, Conjunction, Disjunction, PredicateClause,
};
pub use priority::{
    AiDecision, AiPriority, PriorityOutcome, TargetOrder, TargetPriority, random_targets,
};
pub use skill_tree::SkillTree;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::skill::{SkillBook, SkillId};

/// Per-combatant AI configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleAi {
    pub priorities: Vec<AiPriority>,
    /// Pick a random usable skill when no priority decides.
    pub random_fallback: bool,
    pub probability_to_traverse_skill_tree: f32,
    pub skill_tree: Option<SkillTree>,
}

impl Default for BattleAi {
    fn default() -> Self {
        Self {
            priorities: Vec::new(),
            random_fallback: true,
            probability_to_traverse_skill_tree: Self::DEFAULT_TRAVERSE_PROBABILITY,
            skill_tree: None,
        }
    }
}

impl BattleAi {
    pub const DEFAULT_TRAVERSE_PROBABILITY: f32 = 0.5;

    /// Purely random behaviour.
    pub fn random() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_priority(mut self, priority: AiPriority) -> Self {
        self.priorities.push(priority);
        self
    }

    #[must_use]
    pub fn with_skill_tree(mut self, tree: SkillTree, probability: f32) -> Self {
        self.skill_tree = Some(tree);
        self.probability_to_traverse_skill_tree = probability;
        self
    }

    #[must_use]
    pub fn without_random_fallback(mut self) -> Self {
        self.random_fallback = false;
        self
    }

    /// Skill ids referenced by priorities that the book does not define.
    pub fn unknown_skills(&self, book: &SkillBook) -> Vec<SkillId> {
        let mut unknown: Vec<SkillId> = self
            .priorities
            .iter()
            .flat_map(|p| p.skills.iter())
            .filter(|id| !book.contains(id))
            .cloned()
            .collect();
        unknown.sort();
        unknown.dedup();
        unknown
    }

    /// Chooses a skill and its targets for the context's sender.
    pub fn choose_skill_and_target(
        &self,
        ctx: &mut AiContext<'_>,
        book: &SkillBook,
    ) -> Option<AiDecision> {
        let sender = ctx.sender.id();
        let usable = book.usable_by(ctx.sender.combatant());
        if usable.is_empty() {
            debug!(target: "battle::ai", %sender, "no usable skills");
            return None;
        }
        let mut excluded: HashSet<SkillId> = HashSet::new();

        'selection: loop {
            for (index, priority) in self.priorities.iter().enumerate() {
                match priority.evaluate(ctx, &usable, &excluded) {
                    PriorityOutcome::Decision(decision) => {
                        debug!(
                            target: "battle::ai",
                            %sender,
                            priority = index,
                            skill = %decision.skill.id,
                            targets = decision.action.target_count(),
                            "priority decided"
                        );
                        return Some(decision);
                    }
                    PriorityOutcome::NoTargets(skill) => {
                        debug!(target: "battle::ai", %sender, %skill, "no targets, excluding");
                        excluded.insert(skill);
                        continue 'selection;
                    }
                    PriorityOutcome::Skip => {}
                }
            }

            if !self.random_fallback {
                return None;
            }
            let available: HashSet<SkillId> = usable
                .iter()
                .map(|skill| skill.id.clone())
                .filter(|id| !excluded.contains(id))
                .collect();
            if available.is_empty() {
                return None;
            }

            let id = match &self.skill_tree {
                Some(tree) => {
                    tree.traverse(self.probability_to_traverse_skill_tree, &available, ctx.rng)
                }
                None => skill_tree::uniform_pick(&available, ctx.rng),
            }?;
            let Some(skill) = book.get(&id) else {
                warn!(target: "battle::ai", %sender, skill = %id, "picked unknown skill");
                excluded.insert(id);
                continue;
            };

            let action = random_targets(&skill, ctx);
            if action.has_targets() {
                debug!(target: "battle::ai", %sender, skill = %skill.id, "random fallback decided");
                return Some(AiDecision { skill, action });
            }
            excluded.insert(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::combatant::tests::combatant;
    use crate::combatant::{CombatantId, Side};
    use crate::entity::{BattleEntity, BattleRow};
    use crate::skill::Skill;
    use crate::targeting::{FilterChain, FilterStrategy, ParticipantType, TargetingStrategy};

    fn book() -> SkillBook {
        [
            Skill::new("bite", "Bite"),
            Skill::new("raise", "Raise")
                .with_targeting(ParticipantType::Friendly, TargetingStrategy::Single)
                .with_filters(FilterChain::new(vec![FilterStrategy::Dead])),
        ]
        .into_iter()
        .collect()
    }

    fn enemy_with(skills: &[&str]) -> BattleEntity {
        let unit = combatant(10, Side::Enemy).with_skills(skills.iter().map(|s| SkillId::from(*s)));
        BattleEntity::new(unit, BattleRow::Middle, 2)
    }

    #[test]
    fn skill_without_targets_is_excluded_and_selection_retries() {
        let allies = vec![BattleEntity::new(combatant(1, Side::Ally), BattleRow::Any, 0)];
        let enemies = vec![enemy_with(&["raise", "bite"])];
        let mut rng = StdRng::seed_from_u64(2);
        let mut ctx = AiContext::new(CombatantId(10), &allies, &enemies, &mut rng).unwrap();

        // Raise has nobody dead to target; bite must win eventually.
        let ai = BattleAi::default()
            .with_priority(AiPriority::new(["raise".into()]).with_random_fallback())
            .without_random_fallback()
            .with_priority(AiPriority::new(["bite".into()]).with_random_fallback());
        let decision = ai.choose_skill_and_target(&mut ctx, &book()).unwrap();
        assert_eq!(decision.skill.id, SkillId::from("bite"));
        assert_eq!(decision.action.targets(), &[CombatantId(1)]);
    }

    #[test]
    fn random_fallback_terminates_without_targets() {
        let mut dead = BattleEntity::new(combatant(1, Side::Ally), BattleRow::Any, 0);
        dead.combatant_mut().adjust_hp(-1000.0, false);
        let allies = vec![dead];
        let enemies = vec![enemy_with(&["bite"])];
        let mut rng = StdRng::seed_from_u64(2);
        let mut ctx = AiContext::new(CombatantId(10), &allies, &enemies, &mut rng).unwrap();

        assert!(BattleAi::random().choose_skill_and_target(&mut ctx, &book()).is_none());
    }

    #[test]
    fn unknown_priority_skills_are_reported() {
        let ai = BattleAi::default().with_priority(AiPriority::new(["bite".into(), "nope".into()]));
        assert_eq!(ai.unknown_skills(&book()), vec![SkillId::from("nope")]);
    }
}

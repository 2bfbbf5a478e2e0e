//! Rule-driven skill and target choice.

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;

use super::condition::{AiContext, Condition, Conjunction};
use crate::combatant::CombatantId;
use crate::entity::BattleEntity;
use crate::skill::{Skill, SkillId};
use crate::targeting::{
    BattleActionData, FilterChain, NavigationDirection, ParticipantType, TargetingStrategy,
};

/// A skill paired with the targets it will be queued against.
#[derive(Clone, Debug)]
pub struct AiDecision {
    pub skill: Arc<Skill>,
    pub action: BattleActionData,
}

/// Ordering used by a target priority to pick its focal target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetOrder {
    #[default]
    First,
    LowestHpFraction,
    HighestHpFraction,
    LowestAp,
    HighestAp,
    Random,
}

/// One rule for assigning a focal target.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetPriority {
    #[cfg_attr(feature = "serde", serde(default))]
    pub participant: ParticipantType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub filters: FilterChain,
    #[cfg_attr(feature = "serde", serde(default))]
    pub order: TargetOrder,
}

impl TargetPriority {
    pub fn new(participant: ParticipantType, order: TargetOrder) -> Self {
        Self {
            participant,
            filters: FilterChain::standard(),
            order,
        }
    }

    /// Focal target chosen by this rule, if any candidate qualifies.
    pub fn pick(&self, ctx: &mut AiContext<'_>) -> Option<CombatantId> {
        let (allies, enemies) = ctx.pools();
        let sender = ctx.sender.id();
        let pool = self.filters.apply(
            sender,
            self.participant.pool(ctx.sender.side(), allies, enemies),
        );

        let by = |key: fn(&BattleEntity) -> f32, highest: bool| {
            let cmp = |a: &&&BattleEntity, b: &&&BattleEntity| key(a).total_cmp(&key(b));
            let best = if highest {
                pool.iter().max_by(cmp)
            } else {
                pool.iter().min_by(cmp)
            };
            best.map(|e| e.id())
        };
        let hp = |e: &BattleEntity| e.combatant().hp_fraction();
        let ap = |e: &BattleEntity| e.combatant().ap();

        match self.order {
            TargetOrder::First => pool.first().map(|e| e.id()),
            TargetOrder::LowestHpFraction => by(hp, false),
            TargetOrder::HighestHpFraction => by(hp, true),
            TargetOrder::LowestAp => by(ap, false),
            TargetOrder::HighestAp => by(ap, true),
            TargetOrder::Random => pool.choose(ctx.rng).map(|e| e.id()),
        }
    }
}

/// Result of evaluating one priority.
#[derive(Clone, Debug)]
pub enum PriorityOutcome {
    Decision(AiDecision),
    /// The chosen skill produced no targets; exclude it and retry.
    NoTargets(SkillId),
    /// Nothing to offer; try the next priority.
    Skip,
}

/// Whitelisted skills gated by a condition tree, with target rules.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AiPriority {
    pub skills: Vec<SkillId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub condition: Conjunction,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target_priorities: Vec<TargetPriority>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_random_target_fallback: bool,
}

impl AiPriority {
    pub fn new(skills: impl IntoIterator<Item = SkillId>) -> Self {
        Self {
            skills: skills.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Conjunction) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetPriority) -> Self {
        self.target_priorities.push(target);
        self
    }

    #[must_use]
    pub fn with_random_fallback(mut self) -> Self {
        self.use_random_target_fallback = true;
        self
    }

    pub fn evaluate(
        &self,
        ctx: &mut AiContext<'_>,
        usable: &[Arc<Skill>],
        excluded: &HashSet<SkillId>,
    ) -> PriorityOutcome {
        let options: Vec<&Arc<Skill>> = usable
            .iter()
            .filter(|skill| self.skills.contains(&skill.id) && !excluded.contains(&skill.id))
            .collect();
        if options.is_empty() {
            return PriorityOutcome::Skip;
        }
        if !self.condition.evaluate(ctx) {
            return PriorityOutcome::Skip;
        }
        let Some(skill) = options.choose(ctx.rng).map(|s| Arc::clone(s)) else {
            return PriorityOutcome::Skip;
        };

        let (allies, enemies) = ctx.pools();
        for rule in &self.target_priorities {
            let Some(focal) = rule.pick(ctx) else {
                continue;
            };
            let mut action = BattleActionData::new(ctx.sender.id());
            action.set_focal_target(Some(focal));
            if skill.targeting.select(
                NavigationDirection::None,
                &mut action,
                skill.participant,
                &skill.filters,
                allies,
                enemies,
            ) {
                return PriorityOutcome::Decision(AiDecision { skill, action });
            }
        }

        if self.use_random_target_fallback {
            let action = random_targets(&skill, ctx);
            if action.has_targets() {
                return PriorityOutcome::Decision(AiDecision { skill, action });
            }
        }
        PriorityOutcome::NoTargets(skill.id.clone())
    }
}

/// Shuffles the candidate pool, then navigates forward once.
pub fn random_targets(skill: &Skill, ctx: &mut AiContext<'_>) -> BattleActionData {
    let (allies, enemies) = ctx.pools();
    let sender = ctx.sender.id();
    let mut action = BattleActionData::new(sender);

    if skill.targeting == TargetingStrategy::SelfOnly {
        skill.targeting.select(
            NavigationDirection::Forward,
            &mut action,
            skill.participant,
            &skill.filters,
            allies,
            enemies,
        );
        return action;
    }

    let mut pool = skill.participant.pool(ctx.sender.side(), allies, enemies);
    pool.shuffle(ctx.rng);
    let candidates = skill.filters.apply(sender, pool);
    skill
        .targeting
        .select_from(NavigationDirection::Forward, &mut action, candidates);
    action
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::ai::condition::{BattlePredicate, PredicateClause};
    use crate::combatant::Side;
    use crate::combatant::tests::combatant;
    use crate::entity::BattleRow;

    fn entity(id: u32, side: Side) -> BattleEntity {
        BattleEntity::new(combatant(id, side), BattleRow::Middle, id as usize)
    }

    fn skills() -> Vec<Arc<Skill>> {
        vec![
            Arc::new(Skill::new("bite", "Bite")),
            Arc::new(
                Skill::new("mend", "Mend")
                    .with_targeting(ParticipantType::Friendly, TargetingStrategy::Single),
            ),
        ]
    }

    #[test]
    fn lowest_hp_rule_picks_the_weakest() {
        let mut allies = vec![entity(1, Side::Ally), entity(2, Side::Ally)];
        allies[1].combatant_mut().adjust_hp(-60.0, false);
        let enemies = vec![entity(10, Side::Enemy)];
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = AiContext::new(CombatantId(10), &allies, &enemies, &mut rng).unwrap();

        let priority = AiPriority::new(["bite".into()])
            .with_target(TargetPriority::new(ParticipantType::Opposing, TargetOrder::LowestHpFraction));
        let PriorityOutcome::Decision(decision) =
            priority.evaluate(&mut ctx, &skills(), &HashSet::new())
        else {
            panic!("expected a decision");
        };
        assert_eq!(decision.skill.id, SkillId::from("bite"));
        assert_eq!(decision.action.targets(), &[CombatantId(2)]);
    }

    #[test]
    fn failed_condition_and_exclusions_skip() {
        let allies = vec![entity(1, Side::Ally)];
        let enemies = vec![entity(10, Side::Enemy)];
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = AiContext::new(CombatantId(10), &allies, &enemies, &mut rng).unwrap();

        let gated = AiPriority::new(["bite".into()])
            .with_condition(Conjunction::when(PredicateClause::new(BattlePredicate::SenderHpBelow(0.5))))
            .with_random_fallback();
        assert!(matches!(gated.evaluate(&mut ctx, &skills(), &HashSet::new()), PriorityOutcome::Skip));

        let open = AiPriority::new(["bite".into()]).with_random_fallback();
        let excluded: HashSet<_> = [SkillId::from("bite")].into_iter().collect();
        assert!(matches!(open.evaluate(&mut ctx, &skills(), &excluded), PriorityOutcome::Skip));
    }

    #[test]
    fn no_rule_and_no_fallback_reports_no_targets() {
        let allies = vec![entity(1, Side::Ally)];
        let enemies = vec![entity(10, Side::Enemy)];
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = AiContext::new(CombatantId(10), &allies, &enemies, &mut rng).unwrap();

        let priority = AiPriority::new(["bite".into()]);
        assert!(matches!(
            priority.evaluate(&mut ctx, &skills(), &HashSet::new()),
            PriorityOutcome::NoTargets(id) if id == SkillId::from("bite")
        ));
    }

    #[test]
    fn random_fallback_targets_a_valid_candidate() {
        let allies = vec![entity(1, Side::Ally), entity(2, Side::Ally), entity(3, Side::Ally)];
        let enemies = vec![entity(10, Side::Enemy)];
        let mut rng = StdRng::seed_from_u64(11);
        let mut ctx = AiContext::new(CombatantId(10), &allies, &enemies, &mut rng).unwrap();

        let bite = Skill::new("bite", "Bite");
        for _ in 0..10 {
            let action = random_targets(&bite, &mut ctx);
            assert_eq!(action.target_count(), 1);
            assert!(allies.iter().any(|a| a.id() == action.targets()[0]));
        }
    }
}

//! Random skill-tree traversal used when no explicit priority fires.

use std::collections::HashSet;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::skill::SkillId;

/// Nested grouping of a combatant's skills.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillTree {
    Skill(SkillId),
    Branch(Vec<SkillTree>),
}

impl SkillTree {
    /// Every leaf skill under this node, depth first.
    pub fn leaves(&self) -> Vec<&SkillId> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a SkillId>) {
        match self {
            SkillTree::Skill(id) => out.push(id),
            SkillTree::Branch(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    pub fn has_available_leaf(&self, available: &HashSet<SkillId>) -> bool {
        match self {
            SkillTree::Skill(id) => available.contains(id),
            SkillTree::Branch(children) => children.iter().any(|c| c.has_available_leaf(available)),
        }
    }

    /// Picks one skill out of `available`.
    ///
    /// At each branch, a roll against `probability` decides whether to descend
    /// into a random child that still has an available leaf. A failed roll,
    /// or a branch with no viable child, falls back to a uniform pick over
    /// `available`.
    pub fn traverse(
        &self,
        probability: f32,
        available: &HashSet<SkillId>,
        rng: &mut StdRng,
    ) -> Option<SkillId> {
        match self {
            SkillTree::Skill(id) if available.contains(id) => return Some(id.clone()),
            SkillTree::Skill(_) => {}
            SkillTree::Branch(children) => {
                if rng.gen_bool(f64::from(probability.clamp(0.0, 1.0))) {
                    let viable: Vec<_> = children
                        .iter()
                        .filter(|c| c.has_available_leaf(available))
                        .collect();
                    if let Some(child) = viable.choose(rng) {
                        return child.traverse(probability, available, rng);
                    }
                }
            }
        }
        uniform_pick(available, rng)
    }
}

/// Uniform pick with a stable iteration order, so a seed reproduces.
pub(crate) fn uniform_pick(available: &HashSet<SkillId>, rng: &mut StdRng) -> Option<SkillId> {
    let mut sorted: Vec<_> = available.iter().collect();
    sorted.sort();
    sorted.choose(rng).map(|id| (*id).clone())
}

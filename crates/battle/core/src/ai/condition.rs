//! Boolean condition trees gating AI priorities.
//!
//! A [`Conjunction`] is an AND of [`Disjunction`]s, each an OR of negatable
//! [`PredicateClause`]s. Evaluation short-circuits left to right. Empty
//! nodes are vacuously satisfied, so a priority without conditions always
//! passes this step.

use rand::Rng;
use rand::rngs::StdRng;

use crate::combatant::CombatantId;
use crate::entity::{self, BattleEntity};

/// Battle state visible to AI decisions, relative to the acting combatant.
pub struct AiContext<'a> {
    pub sender: &'a BattleEntity,
    /// The sender's own side.
    pub friends: &'a [BattleEntity],
    pub foes: &'a [BattleEntity],
    pub rng: &'a mut StdRng,
}

impl<'a> AiContext<'a> {
    /// Orients the two pools around `sender`. `None` if it is in neither.
    pub fn new(
        sender: CombatantId,
        allies: &'a [BattleEntity],
        enemies: &'a [BattleEntity],
        rng: &'a mut StdRng,
    ) -> Option<Self> {
        let entity = entity::find(allies, sender).or_else(|| entity::find(enemies, sender))?;
        let (friends, foes) = if entity.side().is_friendly() {
            (allies, enemies)
        } else {
            (enemies, allies)
        };
        Some(Self {
            sender: entity,
            friends,
            foes,
            rng,
        })
    }

    /// Pools in ally/enemy order, as targeting expects them.
    pub fn pools(&self) -> (&'a [BattleEntity], &'a [BattleEntity]) {
        if self.sender.side().is_friendly() {
            (self.friends, self.foes)
        } else {
            (self.foes, self.friends)
        }
    }
}

/// Something an AI priority can test.
pub trait Condition: Send + Sync {
    fn evaluate(&self, ctx: &mut AiContext<'_>) -> bool;
}

/// Leaf test over the battle state. HP thresholds are fractions of max HP.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlePredicate {
    Always,
    SenderHpBelow(f32),
    SenderApBelow(f32),
    /// Some living friend (sender included) is below the threshold.
    FriendHpBelow(f32),
    FoeHpBelow(f32),
    FriendsAliveAtMost(usize),
    FoesAliveAtLeast(usize),
    /// Passes with the given probability.
    Chance(f32),
}

fn any_below(pool: &[BattleEntity], threshold: f32) -> bool {
    pool.iter()
        .any(|e| e.is_alive() && e.combatant().hp_fraction() < threshold)
}

fn alive(pool: &[BattleEntity]) -> usize {
    pool.iter().filter(|e| e.is_alive()).count()
}

impl Condition for BattlePredicate {
    fn evaluate(&self, ctx: &mut AiContext<'_>) -> bool {
        match self {
            BattlePredicate::Always => true,
            BattlePredicate::SenderHpBelow(t) => ctx.sender.combatant().hp_fraction() < *t,
            BattlePredicate::SenderApBelow(ap) => ctx.sender.combatant().ap() < *ap,
            BattlePredicate::FriendHpBelow(t) => any_below(ctx.friends, *t),
            BattlePredicate::FoeHpBelow(t) => any_below(ctx.foes, *t),
            BattlePredicate::FriendsAliveAtMost(n) => alive(ctx.friends) <= *n,
            BattlePredicate::FoesAliveAtLeast(n) => alive(ctx.foes) >= *n,
            BattlePredicate::Chance(p) => ctx.rng.gen_bool(f64::from(p.clamp(0.0, 1.0))),
        }
    }
}

/// Predicate plus an optional negation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredicateClause {
    pub predicate: BattlePredicate,
    #[cfg_attr(feature = "serde", serde(default))]
    pub negate: bool,
}

impl PredicateClause {
    pub fn new(predicate: BattlePredicate) -> Self {
        Self {
            predicate,
            negate: false,
        }
    }

    pub fn not(predicate: BattlePredicate) -> Self {
        Self {
            predicate,
            negate: true,
        }
    }
}

impl Condition for PredicateClause {
    fn evaluate(&self, ctx: &mut AiContext<'_>) -> bool {
        self.predicate.evaluate(ctx) != self.negate
    }
}

/// OR over clauses.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Disjunction(pub Vec<PredicateClause>);

impl Condition for Disjunction {
    fn evaluate(&self, ctx: &mut AiContext<'_>) -> bool {
        if self.0.is_empty() {
            return true;
        }
        self.0.iter().any(|clause| clause.evaluate(ctx))
    }
}

/// AND over disjunctions.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Conjunction(pub Vec<Disjunction>);

impl Conjunction {
    pub fn always() -> Self {
        Self::default()
    }

    /// Single-clause convenience constructor.
    pub fn when(clause: PredicateClause) -> Self {
        Self(vec![Disjunction(vec![clause])])
    }
}

impl Condition for Conjunction {
    fn evaluate(&self, ctx: &mut AiContext<'_>) -> bool {
        self.0.iter().all(|disjunction| disjunction.evaluate(ctx))
    }
}

//! Filter chain narrowing a raw candidate pool before targeting runs.
//!
//! Filters compose by sequential AND: a candidate must pass every filter in
//! the chain to remain eligible.

use crate::combatant::{CombatantId, Side};
use crate::entity::BattleEntity;

/// Which pool a skill draws candidates from, relative to the sender's side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParticipantType {
    /// Sender's side first, then the opposing side.
    Either,
    /// The sender's own side.
    Friendly,
    #[default]
    Opposing,
}

impl ParticipantType {
    /// Raw candidate pool in list order.
    pub fn pool<'a>(
        self,
        sender_side: Side,
        allies: &'a [BattleEntity],
        enemies: &'a [BattleEntity],
    ) -> Vec<&'a BattleEntity> {
        let (own, other) = if sender_side.is_friendly() {
            (allies, enemies)
        } else {
            (enemies, allies)
        };
        match self {
            ParticipantType::Either => own.iter().chain(other.iter()).collect(),
            ParticipantType::Friendly => own.iter().collect(),
            ParticipantType::Opposing => other.iter().collect(),
        }
    }
}

/// A single predicate over candidates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterStrategy {
    Alive,
    /// Only fallen candidates (revival skills).
    Dead,
    ExcludeSelf,
    /// Candidates whose HP fraction is strictly below the threshold.
    HpFractionBelow(f32),
    /// Candidates still missing some HP or AP.
    Wounded,
    OnSide(Side),
}

impl FilterStrategy {
    pub fn admits(&self, sender: CombatantId, candidate: &BattleEntity) -> bool {
        let combatant = candidate.combatant();
        match self {
            FilterStrategy::Alive => combatant.is_alive(),
            FilterStrategy::Dead => !combatant.is_alive(),
            FilterStrategy::ExcludeSelf => candidate.id() != sender,
            FilterStrategy::HpFractionBelow(threshold) => combatant.hp_fraction() < *threshold,
            FilterStrategy::Wounded => {
                combatant.target_hp() < combatant.max_hp() || combatant.ap() < combatant.max_ap()
            }
            FilterStrategy::OnSide(side) => candidate.side() == *side,
        }
    }
}

/// Ordered list of filters applied as a conjunction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FilterChain(Vec<FilterStrategy>);

impl FilterChain {
    pub fn new(filters: Vec<FilterStrategy>) -> Self {
        Self(filters)
    }

    /// No filtering at all.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// The usual chain: living candidates only.
    pub fn standard() -> Self {
        Self(vec![FilterStrategy::Alive])
    }

    #[must_use]
    pub fn with(mut self, filter: FilterStrategy) -> Self {
        self.0.push(filter);
        self
    }

    pub fn contains(&self, filter: &FilterStrategy) -> bool {
        self.0.contains(filter)
    }

    pub fn admits(&self, sender: CombatantId, candidate: &BattleEntity) -> bool {
        self.0.iter().all(|filter| filter.admits(sender, candidate))
    }

    /// Keeps the candidates passing every filter, preserving order.
    pub fn apply<'a>(
        &self,
        sender: CombatantId,
        pool: impl IntoIterator<Item = &'a BattleEntity>,
    ) -> Vec<&'a BattleEntity> {
        pool.into_iter()
            .filter(|candidate| self.admits(sender, candidate))
            .collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::tests::combatant;
    use crate::entity::BattleRow;

    fn entity(id: u32, side: Side) -> BattleEntity {
        BattleEntity::new(combatant(id, side), BattleRow::Any, id as usize)
    }

    #[test]
    fn pools_are_relative_to_the_sender() {
        let allies = vec![entity(1, Side::Ally), entity(2, Side::Assist)];
        let enemies = vec![entity(10, Side::Enemy)];

        let ids = |pool: Vec<&BattleEntity>| pool.iter().map(|e| e.id().0).collect::<Vec<_>>();

        assert_eq!(ids(ParticipantType::Opposing.pool(Side::Ally, &allies, &enemies)), vec![10]);
        assert_eq!(ids(ParticipantType::Opposing.pool(Side::Enemy, &allies, &enemies)), vec![1, 2]);
        assert_eq!(ids(ParticipantType::Friendly.pool(Side::Assist, &allies, &enemies)), vec![1, 2]);
        assert_eq!(ids(ParticipantType::Either.pool(Side::Enemy, &allies, &enemies)), vec![10, 1, 2]);
    }

    #[test]
    fn filters_compose_as_and() {
        let mut dead = entity(2, Side::Ally);
        dead.combatant_mut().adjust_hp(-1000.0, false);
        let pool = vec![entity(1, Side::Ally), dead, entity(3, Side::Ally)];

        let chain = FilterChain::standard().with(FilterStrategy::ExcludeSelf);
        let ids: Vec<_> = chain.apply(CombatantId(1), &pool).iter().map(|e| e.id().0).collect();
        assert_eq!(ids, vec![3]);

        let revive = FilterChain::new(vec![FilterStrategy::Dead]);
        let ids: Vec<_> = revive.apply(CombatantId(1), &pool).iter().map(|e| e.id().0).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn hp_threshold_filter() {
        let mut hurt = entity(1, Side::Enemy);
        hurt.combatant_mut().adjust_hp(-80.0, false);
        let pool = vec![hurt, entity(2, Side::Enemy)];
        let chain = FilterChain::new(vec![FilterStrategy::HpFractionBelow(0.5)]);
        let ids: Vec<_> = chain.apply(CombatantId(9), &pool).iter().map(|e| e.id().0).collect();
        assert_eq!(ids, vec![1]);
    }
}

//! Player-side selection state and input mapping.

use std::sync::Arc;

use crate::combatant::CombatantId;
use crate::skill::Skill;
use crate::targeting::{BattleActionData, NavigationDirection};

/// Directional input as delivered by the embedder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction4 {
    Up,
    Down,
    Left,
    Right,
}

impl From<Direction4> for NavigationDirection {
    fn from(direction: Direction4) -> Self {
        match direction {
            Direction4::Up | Direction4::Left => NavigationDirection::Backward,
            Direction4::Down | Direction4::Right => NavigationDirection::Forward,
        }
    }
}

/// Global battle input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleInput {
    Navigate(Direction4),
    Execute,
    Cancel,
}

/// What the player currently has selected.
#[derive(Clone, Debug, Default)]
pub struct PlayerSelection {
    combatant: Option<CombatantId>,
    skill: Option<Arc<Skill>>,
    action: Option<BattleActionData>,
}

impl PlayerSelection {
    pub fn combatant(&self) -> Option<CombatantId> {
        self.combatant
    }

    pub fn skill(&self) -> Option<&Arc<Skill>> {
        self.skill.as_ref()
    }

    pub fn action(&self) -> Option<&BattleActionData> {
        self.action.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.combatant.is_none() && self.skill.is_none()
    }

    pub fn references(&self, id: CombatantId) -> bool {
        self.combatant == Some(id)
    }

    pub(super) fn select_combatant(&mut self, id: CombatantId) {
        self.combatant = Some(id);
        self.skill = None;
        self.action = None;
    }

    pub(super) fn select_skill(&mut self, skill: Arc<Skill>, action: BattleActionData) {
        self.skill = Some(skill);
        self.action = Some(action);
    }

    pub(super) fn set_action(&mut self, action: BattleActionData) {
        self.action = Some(action);
    }

    pub(super) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_and_left_walk_backward() {
        assert_eq!(NavigationDirection::from(Direction4::Up), NavigationDirection::Backward);
        assert_eq!(NavigationDirection::from(Direction4::Left), NavigationDirection::Backward);
        assert_eq!(NavigationDirection::from(Direction4::Down), NavigationDirection::Forward);
        assert_eq!(NavigationDirection::from(Direction4::Right), NavigationDirection::Forward);
    }
}

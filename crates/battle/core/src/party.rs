//! Party roster with a leader and unremovable members.
//!
//! Members are compared by [`CombatantId`] everywhere.

use tracing::debug;

use crate::combatant::CombatantId;
use crate::error::{BattleError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Party {
    members: Vec<CombatantId>,
    leader: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    unremovable: Vec<CombatantId>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[CombatantId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.members.contains(&id)
    }

    pub fn leader(&self) -> Option<CombatantId> {
        self.members.get(self.leader).copied()
    }

    pub fn add(&mut self, id: CombatantId) -> Result<()> {
        if self.contains(id) {
            return Err(BattleError::DuplicateCombatant(id));
        }
        self.members.push(id);
        debug!(target: "battle::party", member = %id, size = self.members.len(), "member joined");
        Ok(())
    }

    /// Marks a member as impossible to remove (story characters).
    pub fn set_unremovable(&mut self, id: CombatantId, unremovable: bool) {
        if unremovable {
            if !self.unremovable.contains(&id) {
                self.unremovable.push(id);
            }
        } else {
            self.unremovable.retain(|member| *member != id);
        }
    }

    pub fn is_removable(&self, id: CombatantId) -> bool {
        self.contains(id) && !self.unremovable.contains(&id)
    }

    /// Removes a member. The last member and unremovable members stay.
    pub fn remove(&mut self, id: CombatantId) -> Result<bool> {
        let Some(index) = self.members.iter().position(|member| *member == id) else {
            return Err(BattleError::UnknownCombatant(id));
        };
        if self.members.len() <= 1 || !self.is_removable(id) {
            return Ok(false);
        }
        let leader = self.leader();
        self.members.remove(index);
        self.leader = leader
            .and_then(|l| self.members.iter().position(|member| *member == l))
            .unwrap_or(0);
        Ok(true)
    }

    pub fn change_leader(&mut self, id: CombatantId) -> Result<bool> {
        let Some(index) = self.members.iter().position(|member| *member == id) else {
            return Err(BattleError::UnknownCombatant(id));
        };
        if index == self.leader {
            return Ok(false);
        }
        self.leader = index;
        Ok(true)
    }

    /// Members that could become leader. Empty for a party of one.
    pub fn leader_options(&self) -> Vec<CombatantId> {
        if self.members.len() <= 1 {
            return Vec::new();
        }
        self.members
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.leader)
            .map(|(_, id)| *id)
            .collect()
    }

    /// Members that may be removed. Empty for a party of one.
    pub fn removal_options(&self) -> Vec<CombatantId> {
        if self.members.len() <= 1 {
            return Vec::new();
        }
        self.members
            .iter()
            .copied()
            .filter(|id| !self.unremovable.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(ids: &[u32]) -> Party {
        let mut party = Party::new();
        for id in ids {
            party.add(CombatantId(*id)).unwrap();
        }
        party
    }

    #[test]
    fn single_member_party_offers_no_options() {
        let mut solo = party(&[1]);
        assert!(solo.leader_options().is_empty());
        assert!(solo.removal_options().is_empty());
        assert!(!solo.remove(CombatantId(1)).unwrap());
        assert_eq!(solo.len(), 1);
    }

    #[test]
    fn duplicates_are_rejected_by_id() {
        let mut p = party(&[1, 2]);
        assert_eq!(p.add(CombatantId(2)), Err(BattleError::DuplicateCombatant(CombatantId(2))));
    }

    #[test]
    fn unremovable_members_are_excluded() {
        let mut p = party(&[1, 2, 3]);
        p.set_unremovable(CombatantId(1), true);
        assert_eq!(p.removal_options(), vec![CombatantId(2), CombatantId(3)]);
        assert!(!p.remove(CombatantId(1)).unwrap());
        assert!(p.remove(CombatantId(2)).unwrap());
        assert_eq!(p.members(), &[CombatantId(1), CombatantId(3)]);
    }

    #[test]
    fn leader_survives_removal_of_others() {
        let mut p = party(&[1, 2, 3]);
        assert!(p.change_leader(CombatantId(3)).unwrap());
        assert_eq!(p.leader_options(), vec![CombatantId(1), CombatantId(2)]);
        p.remove(CombatantId(1)).unwrap();
        assert_eq!(p.leader(), Some(CombatantId(3)));
        assert!(p.change_leader(CombatantId(9)).is_err());
    }
}

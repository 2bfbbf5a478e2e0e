//! Target selection: a navigation intent plus the candidate pools become a
//! concrete target set.
//!
//! Every strategy runs over the *filtered* pool (see [`FilterChain`]) and
//! mutates a [`BattleActionData`] in place. An empty filtered pool always
//! yields an empty target set; callers treat that as "not executable".
//!
//! Navigation walks the pool in list order. `Forward` starts just after the
//! current focal target and wraps; `Backward` is the same walk over the
//! reversed pool; `None` keeps the focal target if it is still eligible.

mod filter;

pub use filter::{FilterChain, FilterStrategy, ParticipantType};

use tracing::trace;

use crate::combatant::CombatantId;
use crate::entity::{self, BattleEntity};

/// Navigation intent for one selection step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavigationDirection {
    #[default]
    None,
    Forward,
    Backward,
}

/// Transient selection cart for one resolution attempt.
///
/// The target count is always the length of the target list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleActionData {
    sender: CombatantId,
    targets: Vec<CombatantId>,
    focal_target: Option<CombatantId>,
}

impl BattleActionData {
    pub fn new(sender: CombatantId) -> Self {
        Self {
            sender,
            targets: Vec::new(),
            focal_target: None,
        }
    }

    pub fn sender(&self) -> CombatantId {
        self.sender
    }

    pub fn targets(&self) -> &[CombatantId] {
        &self.targets
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn focal_target(&self) -> Option<CombatantId> {
        self.focal_target
    }

    /// Re-anchors navigation without touching the current target set.
    pub fn set_focal_target(&mut self, focal: Option<CombatantId>) {
        self.focal_target = focal;
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.focal_target = None;
    }

    /// Entity navigation is anchored to: the focal target, else the first target.
    pub fn anchor(&self) -> Option<CombatantId> {
        self.focal_target.or_else(|| self.targets.first().copied())
    }

    fn assign(&mut self, focal: Option<CombatantId>, targets: Vec<CombatantId>) {
        self.focal_target = focal;
        self.targets = targets;
    }
}

/// How a skill expands a focal target into a target set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetingStrategy {
    /// The sender itself; navigation is ignored.
    SelfOnly,
    #[default]
    Single,
    /// Every candidate sharing the focal target's row.
    Row,
    /// Every candidate sharing the focal target's column.
    Column,
    /// A wrapping window of `count` consecutive candidates.
    Multi {
        count: usize,
        #[cfg_attr(feature = "serde", serde(default))]
        hit_everything: bool,
    },
    All,
}

impl TargetingStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            TargetingStrategy::SelfOnly => "self",
            TargetingStrategy::Single => "single",
            TargetingStrategy::Row => "row",
            TargetingStrategy::Column => "column",
            TargetingStrategy::Multi { .. } => "multi",
            TargetingStrategy::All => "all",
        }
    }

    /// Builds the candidate pool for the sender and runs the strategy.
    ///
    /// Returns whether any target was selected. A sender missing from both
    /// pools clears the selection.
    pub fn select(
        &self,
        direction: NavigationDirection,
        data: &mut BattleActionData,
        participant: ParticipantType,
        filters: &FilterChain,
        allies: &[BattleEntity],
        enemies: &[BattleEntity],
    ) -> bool {
        let sender = data.sender();
        let Some(sender_entity) =
            entity::find(allies, sender).or_else(|| entity::find(enemies, sender))
        else {
            data.clear();
            return false;
        };

        if matches!(self, TargetingStrategy::SelfOnly) {
            if filters.admits(sender, sender_entity) {
                data.assign(Some(sender), vec![sender]);
            } else {
                data.clear();
            }
            return data.has_targets();
        }

        let raw = participant.pool(sender_entity.side(), allies, enemies);
        self.select_from(direction, data, filters.apply(sender, raw))
    }

    /// Runs the strategy over an already filtered candidate list.
    pub fn select_from(
        &self,
        direction: NavigationDirection,
        data: &mut BattleActionData,
        mut candidates: Vec<&BattleEntity>,
    ) -> bool {
        if candidates.is_empty() {
            trace!(target: "battle::targeting", strategy = self.name(), "no eligible candidates");
            data.clear();
            return false;
        }

        match self {
            TargetingStrategy::SelfOnly => {
                let sender = data.sender();
                if candidates.iter().any(|c| c.id() == sender) {
                    data.assign(Some(sender), vec![sender]);
                } else {
                    data.clear();
                }
            }
            TargetingStrategy::Single => match navigate(&candidates, data.anchor(), direction) {
                Some(index) => {
                    let id = candidates[index].id();
                    data.assign(Some(id), vec![id]);
                }
                None => data.clear(),
            },
            TargetingStrategy::Row | TargetingStrategy::Column => {
                let Some(index) = navigate(&candidates, data.anchor(), direction) else {
                    data.clear();
                    return false;
                };
                let focal = candidates[index];
                let same_line = |c: &BattleEntity| match self {
                    TargetingStrategy::Row => c.row() == focal.row(),
                    _ => c.column() == focal.column(),
                };
                let targets = candidates
                    .iter()
                    .filter(|c| same_line(c))
                    .map(|c| c.id())
                    .collect();
                data.assign(Some(focal.id()), targets);
            }
            TargetingStrategy::Multi {
                count,
                hit_everything,
            } => {
                let width = (*count).max(1);
                if *hit_everything || width >= candidates.len() {
                    let targets: Vec<_> = candidates.iter().map(|c| c.id()).collect();
                    let focal = data
                        .anchor()
                        .filter(|id| targets.contains(id))
                        .or_else(|| targets.first().copied());
                    data.assign(focal, targets);
                    return true;
                }
                if direction == NavigationDirection::Backward {
                    candidates.reverse();
                }
                let len = candidates.len();
                let anchor = data
                    .anchor()
                    .and_then(|id| candidates.iter().position(|c| c.id() == id));
                let start = match (direction, anchor) {
                    (NavigationDirection::None, Some(i)) => i,
                    (NavigationDirection::None, None) => {
                        data.clear();
                        return false;
                    }
                    (_, Some(i)) => (i + width) % len,
                    (_, None) => 0,
                };
                let targets: Vec<_> = (0..width)
                    .map(|offset| candidates[(start + offset) % len].id())
                    .collect();
                data.assign(targets.first().copied(), targets);
            }
            TargetingStrategy::All => {
                let targets: Vec<_> = candidates.iter().map(|c| c.id()).collect();
                let focal = data
                    .anchor()
                    .filter(|id| targets.contains(id))
                    .or_else(|| targets.first().copied());
                data.assign(focal, targets);
            }
        }
        data.has_targets()
    }
}

/// Index into `pool` of the next focal target, honouring direction and wrap.
fn navigate(
    pool: &[&BattleEntity],
    anchor: Option<CombatantId>,
    direction: NavigationDirection,
) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    let len = pool.len();
    let current = anchor.and_then(|id| pool.iter().position(|c| c.id() == id));
    match (direction, current) {
        (NavigationDirection::None, current) => current,
        (NavigationDirection::Forward, Some(i)) => Some((i + 1) % len),
        (NavigationDirection::Forward, None) => Some(0),
        (NavigationDirection::Backward, Some(i)) => Some((i + len - 1) % len),
        (NavigationDirection::Backward, None) => Some(len - 1),
    }
}

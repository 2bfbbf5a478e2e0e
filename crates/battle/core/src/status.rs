//! Persistent status effects.
//!
//! Each status walks `Inactive -> Active -> Expired`. A status is `Active`
//! only while the battle is in `Combat`, except statuses flagged
//! `persist_after_battle`, which stay active once the battle completes.
//! Remaining duration counts down only while active.
//!
//! The tracker does not touch combatants. It reports [`StatusChange`]s and the
//! controller applies their side effects (stat modifiers, cooldown pauses),
//! which keeps every mutation of the active pools inside the controller.

use rand::Rng;
use rand::rngs::StdRng;

use crate::combatant::{CombatantId, StatKind};

/// What a status does while active.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    /// Additive modifier on one stat.
    StatModifier { stat: StatKind, value: f32 },
    /// Freezes the owner's cooldown; taking damage may break it.
    CooldownLock { cancel_on_damage_chance: f32 },
    /// Fires its effect once per `period` seconds.
    Recurring { period: f32, effect: RecurringEffect },
}

impl StatusKind {
    /// Shortest recurring period; shorter periods are raised to it.
    pub const MIN_RECURRING_PERIOD: f32 = 0.05;
}

/// Payload of a recurring status tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecurringEffect {
    HealthDelta(f32),
    ApDelta(f32),
}

/// Status definition carried by a skill effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusTemplate {
    pub kind: StatusKind,
    /// Seconds of active time; `None` lasts until death or battle end.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub persist_after_battle: bool,
}

impl StatusTemplate {
    pub fn new(kind: StatusKind, duration: Option<f32>) -> Self {
        Self {
            kind,
            duration,
            persist_after_battle: false,
        }
    }

    #[must_use]
    pub fn persisting(mut self) -> Self {
        self.persist_after_battle = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum StatusPhase {
    Inactive,
    Active,
    Expired,
}

/// A status instance attached to one combatant.
#[derive(Clone, Debug)]
pub struct PersistentStatus {
    id: StatusId,
    owner: CombatantId,
    kind: StatusKind,
    remaining: Option<f32>,
    phase: StatusPhase,
    persist_after_battle: bool,
    tick_elapsed: f32,
    outside_combat: bool,
}

impl PersistentStatus {
    pub fn id(&self) -> StatusId {
        self.id
    }

    pub fn owner(&self) -> CombatantId {
        self.owner
    }

    pub fn kind(&self) -> &StatusKind {
        &self.kind
    }

    pub fn phase(&self) -> StatusPhase {
        self.phase
    }

    pub fn remaining(&self) -> Option<f32> {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.phase == StatusPhase::Active
    }

    pub fn persists_after_battle(&self) -> bool {
        self.persist_after_battle
    }
}

/// Phase transition the controller must react to.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusChange {
    Activated {
        id: StatusId,
        owner: CombatantId,
        kind: StatusKind,
    },
    Deactivated {
        id: StatusId,
        owner: CombatantId,
        kind: StatusKind,
    },
    Removed {
        id: StatusId,
        owner: CombatantId,
        kind: StatusKind,
        was_active: bool,
    },
}

/// Every live status in a battle.
#[derive(Clone, Debug, Default)]
pub struct StatusTracker {
    statuses: Vec<PersistentStatus>,
    next_id: u32,
    battle_active: bool,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn get(&self, id: StatusId) -> Option<&PersistentStatus> {
        self.statuses.iter().find(|s| s.id == id)
    }

    pub fn for_owner(&self, owner: CombatantId) -> impl Iterator<Item = &PersistentStatus> {
        self.statuses.iter().filter(move |s| s.owner == owner)
    }

    /// Attaches a status, active immediately when the battle is in combat.
    pub fn attach(
        &mut self,
        owner: CombatantId,
        template: &StatusTemplate,
    ) -> (StatusId, Option<StatusChange>) {
        let id = StatusId(self.next_id);
        self.next_id += 1;

        let remaining = template.duration.map(|d| if d.is_nan() { 0.0 } else { d.max(0.0) });
        let mut status = PersistentStatus {
            id,
            owner,
            kind: template.kind.clone(),
            remaining,
            phase: StatusPhase::Inactive,
            persist_after_battle: template.persist_after_battle,
            tick_elapsed: 0.0,
            outside_combat: false,
        };

        let change = if self.battle_active {
            status.phase = StatusPhase::Active;
            Some(StatusChange::Activated {
                id,
                owner,
                kind: status.kind.clone(),
            })
        } else {
            None
        };
        self.statuses.push(status);
        (id, change)
    }

    /// Follows the battle entering or leaving `Combat`.
    pub fn set_battle_active(&mut self, active: bool) -> Vec<StatusChange> {
        self.battle_active = active;
        let mut changes = Vec::new();
        for status in self.statuses.iter_mut().filter(|s| !s.outside_combat) {
            match (active, status.phase) {
                (true, StatusPhase::Inactive) => {
                    status.phase = StatusPhase::Active;
                    changes.push(StatusChange::Activated {
                        id: status.id,
                        owner: status.owner,
                        kind: status.kind.clone(),
                    });
                }
                (false, StatusPhase::Active) => {
                    status.phase = StatusPhase::Inactive;
                    changes.push(StatusChange::Deactivated {
                        id: status.id,
                        owner: status.owner,
                        kind: status.kind.clone(),
                    });
                }
                _ => {}
            }
        }
        changes
    }

    /// Counts active durations down and fires recurring ticks.
    ///
    /// `on_tick` receives the owner and payload of every recurring tick, in
    /// attach order. Expired statuses are removed.
    pub fn advance(
        &mut self,
        dt: f32,
        mut on_tick: impl FnMut(CombatantId, RecurringEffect),
    ) -> Vec<StatusChange> {
        for status in self.statuses.iter_mut().filter(|s| s.is_active()) {
            if let StatusKind::Recurring { period, effect } = status.kind {
                let period = period.max(StatusKind::MIN_RECURRING_PERIOD);
                status.tick_elapsed += dt;
                while status.tick_elapsed >= period {
                    status.tick_elapsed -= period;
                    on_tick(status.owner, effect);
                }
            }
            if let Some(remaining) = status.remaining.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    status.phase = StatusPhase::Expired;
                }
            }
        }
        self.drain(|s| s.phase == StatusPhase::Expired)
    }

    /// Owner death destroys every status it carries.
    pub fn owner_died(&mut self, owner: CombatantId) -> Vec<StatusChange> {
        self.drain(|s| s.owner == owner)
    }

    /// Drops everything except persisting statuses, which stay active.
    pub fn battle_complete(&mut self) -> Vec<StatusChange> {
        self.battle_active = false;
        let mut changes = self.drain(|s| !s.persist_after_battle);
        for status in &mut self.statuses {
            status.outside_combat = true;
            if status.phase != StatusPhase::Active {
                status.phase = StatusPhase::Active;
                changes.push(StatusChange::Activated {
                    id: status.id,
                    owner: status.owner,
                    kind: status.kind.clone(),
                });
            }
        }
        changes
    }

    /// Rolls every active cooldown lock on a damaged owner for cancellation.
    pub fn owner_damaged(&mut self, owner: CombatantId, rng: &mut StdRng) -> Vec<StatusChange> {
        for status in self
            .statuses
            .iter_mut()
            .filter(|s| s.owner == owner && s.is_active())
        {
            if let StatusKind::CooldownLock {
                cancel_on_damage_chance,
            } = status.kind
                && rng.gen_bool(f64::from(cancel_on_damage_chance.clamp(0.0, 1.0)))
            {
                status.phase = StatusPhase::Expired;
            }
        }
        self.drain(|s| s.phase == StatusPhase::Expired)
    }

    fn drain(&mut self, mut remove: impl FnMut(&PersistentStatus) -> bool) -> Vec<StatusChange> {
        let mut changes = Vec::new();
        self.statuses.retain(|status| {
            if !remove(status) {
                return true;
            }
            changes.push(StatusChange::Removed {
                id: status.id,
                owner: status.owner,
                kind: status.kind.clone(),
                // Expired statuses were active on the tick they ran out.
                was_active: status.phase != StatusPhase::Inactive,
            });
            false
        });
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn buff(duration: Option<f32>) -> StatusTemplate {
        StatusTemplate::new(
            StatusKind::StatModifier {
                stat: StatKind::PhysicalAdder,
                value: 5.0,
            },
            duration,
        )
    }

    #[test]
    fn duration_counts_only_while_active() {
        let mut tracker = StatusTracker::new();
        let (id, change) = tracker.attach(CombatantId(1), &buff(Some(2.0)));
        assert!(change.is_none());

        assert!(tracker.advance(5.0, |_, _| {}).is_empty());
        assert_eq!(tracker.get(id).unwrap().remaining(), Some(2.0));

        let changes = tracker.set_battle_active(true);
        assert!(matches!(changes[0], StatusChange::Activated { .. }));

        assert!(tracker.advance(1.5, |_, _| {}).is_empty());
        let removed = tracker.advance(0.5, |_, _| {});
        assert!(matches!(
            removed[0],
            StatusChange::Removed {
                was_active: true,
                ..
            }
        ));
        assert!(tracker.is_empty());
    }

    #[test]
    fn recurring_fires_once_per_period() {
        let mut tracker = StatusTracker::new();
        tracker.set_battle_active(true);
        tracker.attach(
            CombatantId(3),
            &StatusTemplate::new(
                StatusKind::Recurring {
                    period: 1.0,
                    effect: RecurringEffect::HealthDelta(-2.0),
                },
                None,
            ),
        );

        let mut ticks = Vec::new();
        tracker.advance(0.6, |owner, effect| ticks.push((owner, effect)));
        assert!(ticks.is_empty());
        tracker.advance(2.5, |owner, effect| ticks.push((owner, effect)));
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[0], (CombatantId(3), RecurringEffect::HealthDelta(-2.0)));
    }

    #[test]
    fn tiny_periods_are_floored() {
        let mut tracker = StatusTracker::new();
        tracker.set_battle_active(true);
        for period in [0.0, 1e-9, f32::NAN] {
            tracker.attach(
                CombatantId(3),
                &StatusTemplate::new(
                    StatusKind::Recurring {
                        period,
                        effect: RecurringEffect::ApDelta(1.0),
                    },
                    None,
                ),
            );
        }

        let mut fired = 0;
        tracker.advance(0.12, |_, _| fired += 1);
        assert_eq!(fired, 6);
    }

    #[test]
    fn owner_death_destroys_unconditionally() {
        let mut tracker = StatusTracker::new();
        tracker.attach(CombatantId(1), &buff(None).persisting());
        tracker.attach(CombatantId(2), &buff(None));
        let removed = tracker.owner_died(CombatantId(1));
        assert_eq!(removed.len(), 1);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn battle_end_keeps_only_persisting_statuses_active() {
        let mut tracker = StatusTracker::new();
        tracker.set_battle_active(true);
        let (kept, _) = tracker.attach(CombatantId(1), &buff(Some(10.0)).persisting());
        tracker.attach(CombatantId(1), &buff(Some(10.0)));
        tracker.set_battle_active(false);

        let changes = tracker.battle_complete();
        assert_eq!(tracker.len(), 1);
        assert!(changes.iter().any(|c| matches!(c, StatusChange::Removed { .. })));
        assert!(tracker.get(kept).unwrap().is_active());

        // Stays active regardless of later combat transitions.
        assert!(tracker.set_battle_active(false).is_empty());
        assert!(tracker.get(kept).unwrap().is_active());
    }

    #[test]
    fn certain_cancel_chance_breaks_cooldown_lock() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tracker = StatusTracker::new();
        tracker.set_battle_active(true);
        let lock = |chance| {
            StatusTemplate::new(
                StatusKind::CooldownLock {
                    cancel_on_damage_chance: chance,
                },
                Some(5.0),
            )
        };
        tracker.attach(CombatantId(1), &lock(1.0));
        tracker.attach(CombatantId(1), &lock(0.0));

        let removed = tracker.owner_damaged(CombatantId(1), &mut rng);
        assert_eq!(removed.len(), 1);
        assert_eq!(tracker.len(), 1);
    }
}

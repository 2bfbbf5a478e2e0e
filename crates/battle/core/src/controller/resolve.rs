//! Queue draining and hit application.
//!
//! A dequeued entry becomes a [`Resolution`]: its first hit lands on the
//! tick it is dequeued, each further hit after `hit_delay`, and the halt
//! flag clears one `hit_delay` after the last hit. Entries whose sender or
//! recipient is gone by then are dropped without effect.

use std::sync::Arc;

use tracing::{debug, info};

use super::queue::{BattleSequence, Resolution};
use super::{BattleController, BattleState};
use crate::combatant::{CombatantId, StatKind};
use crate::damage::calculate_health_delta;
use crate::events::{BattleEvent, StateAlteredKind};
use crate::skill::{Skill, SkillEffect, SkillId};
use crate::status::{RecurringEffect, StatusChange, StatusKind, StatusTemplate};

impl BattleController {
    pub(super) fn tick_queue(&mut self, dt: f32) {
        if let Some(resolution) = self.resolution.as_mut() {
            resolution.delay -= dt;
            if resolution.delay > 0.0 {
                return;
            }
            if resolution.hits_remaining() > 0 {
                self.apply_next_hit();
                return;
            }
            self.finish_resolution();
        }

        while self.state == BattleState::Combat && self.resolution.is_none() {
            if !self.dequeue() {
                break;
            }
        }
    }

    /// Pops one entry. Returns false when the queue was empty.
    fn dequeue(&mut self) -> bool {
        let Some(sequence) = self.queue.pop_front() else {
            return false;
        };
        let skill = self.skills.get(&sequence.skill);
        let sender_alive = self.entity(sequence.sender).is_some_and(|e| e.is_alive());
        let recipient_valid = match (&skill, self.entity(sequence.recipient)) {
            (Some(skill), Some(recipient)) => recipient.is_alive() || skill.targets_dead(),
            _ => false,
        };

        match skill {
            Some(skill) if sender_alive && recipient_valid => {
                self.emit(BattleEvent::SequenceProcessed(sequence.clone()));
                self.halted = true;
                self.resolution = Some(Resolution::new(sequence, skill));
                self.apply_next_hit();
            }
            _ => self.skip(sequence),
        }
        true
    }

    fn skip(&mut self, sequence: BattleSequence) {
        debug!(
            target: "battle::queue",
            sender = %sequence.sender,
            recipient = %sequence.recipient,
            skill = %sequence.skill,
            "skipping stale queue entry"
        );
        // The cost moves to the next entry of the same action.
        if sequence.pays_cost
            && let Some(next) = self.queue.iter_mut().find(|s| s.sender == sequence.sender)
        {
            next.pays_cost = true;
            return;
        }
        self.release_sender(sequence.sender, &sequence.skill, !sequence.pays_cost);
    }

    /// Unlocks a sender whose last queued entry was dropped.
    ///
    /// If part of the action already landed the skill cooldown applies,
    /// otherwise the sender may act again right away.
    fn release_sender(&mut self, sender: CombatantId, skill: &SkillId, action_landed: bool) {
        if self.queue.iter().any(|s| s.sender == sender) {
            return;
        }
        let base = match (action_landed, self.skills.get(skill)) {
            (true, Some(skill)) => skill.cooldown,
            _ => 0.0,
        };
        let Some(entity) = self.entity_mut(sender) else {
            return;
        };
        let combatant = entity.combatant_mut();
        if !combatant.is_alive() || combatant.cooldown().is_finite() {
            return;
        }
        let seconds = base * combatant.cooldown_multiplier();
        combatant.set_cooldown(seconds);
        let seconds = combatant.cooldown();
        self.altered(sender, StateAlteredKind::CooldownSet { seconds });
    }

    fn apply_next_hit(&mut self) {
        let Some(resolution) = self.resolution.as_mut() else {
            return;
        };
        let sequence = resolution.sequence.clone();
        let skill = Arc::clone(&resolution.skill);
        let first = resolution.hits_done == 0;
        resolution.hits_done += 1;
        resolution.delay = self.config.hit_delay;

        if !first {
            let sender_alive = self.entity(sequence.sender).is_some_and(|e| e.is_alive());
            let recipient_valid = self
                .entity(sequence.recipient)
                .is_some_and(|e| e.is_alive() || skill.targets_dead());
            if !sender_alive || !recipient_valid {
                debug!(
                    target: "battle::queue",
                    sender = %sequence.sender,
                    recipient = %sequence.recipient,
                    "remaining hits skipped"
                );
                self.finish_resolution();
                return;
            }
        }

        self.set_sender_cooldown(&sequence, &skill);
        if first && sequence.pays_cost && skill.ap_cost != 0.0 {
            self.change_ap(sequence.sender, -skill.ap_cost);
        }
        self.apply_effects(&sequence, &skill);
    }

    fn finish_resolution(&mut self) {
        if self.resolution.take().is_some() {
            self.halted = false;
        }
    }

    /// Cooldown from the skill, scaled by the sender's multiplier. Stays
    /// locked while the sender still has entries queued.
    fn set_sender_cooldown(&mut self, sequence: &BattleSequence, skill: &Skill) {
        if self.queue.iter().any(|s| s.sender == sequence.sender) {
            return;
        }
        let Some(entity) = self.entity_mut(sequence.sender) else {
            return;
        };
        let combatant = entity.combatant_mut();
        if !combatant.is_alive() {
            return;
        }
        combatant.set_cooldown(skill.cooldown * combatant.cooldown_multiplier());
        let seconds = combatant.cooldown();
        self.altered(sequence.sender, StateAlteredKind::CooldownSet { seconds });
    }

    /// HP effects, then AP effects, then statuses.
    fn apply_effects(&mut self, sequence: &BattleSequence, skill: &Skill) {
        let recipient = sequence.recipient;
        for effect in &skill.effects {
            if let SkillEffect::HealthDelta { amount } = effect {
                let (Some(sender), Some(target)) =
                    (self.combatant(sequence.sender), self.combatant(recipient))
                else {
                    return;
                };
                let delta = calculate_health_delta(*amount, skill.damage_type, sender, target);
                if !target.is_alive() && delta > 0.0 && skill.targets_dead() {
                    self.revive(recipient, delta);
                } else {
                    self.change_hp(recipient, delta);
                }
                if self.state != BattleState::Combat {
                    return;
                }
            }
        }

        if !self.combatant(recipient).is_some_and(|c| c.is_alive()) {
            return;
        }
        for effect in &skill.effects {
            if let SkillEffect::ApDelta { amount } = effect {
                self.change_ap(recipient, *amount);
            }
        }
        for effect in &skill.effects {
            if let SkillEffect::ApplyStatus(template) = effect {
                self.attach_status(recipient, template);
            }
        }
    }

    pub(super) fn change_hp(&mut self, id: CombatantId, delta: f32) {
        let rolling_allowed = self.state == BattleState::Combat;
        let Some(entity) = self.entity_mut(id) else {
            return;
        };
        // Friendly meters scroll; enemy HP snaps.
        let rolling = rolling_allowed && entity.side().is_friendly();
        let change = entity.combatant_mut().adjust_hp(delta, rolling);
        let hp = entity.combatant().target_hp();

        if change.applied != 0.0 {
            self.altered(
                id,
                StateAlteredKind::HpChanged {
                    delta: change.applied,
                    hp,
                },
            );
        }
        if change.applied < 0.0 {
            let changes = self.statuses.owner_damaged(id, &mut self.rng);
            self.apply_status_changes(changes);
        }
        if change.died {
            self.on_death(id);
        }
    }

    pub(super) fn change_ap(&mut self, id: CombatantId, delta: f32) {
        let Some(entity) = self.entity_mut(id) else {
            return;
        };
        let applied = entity.combatant_mut().adjust_ap(delta);
        let ap = entity.combatant().ap();
        if applied != 0.0 {
            self.altered(id, StateAlteredKind::ApChanged { delta: applied, ap });
        }
    }

    fn revive(&mut self, id: CombatantId, hp: f32) {
        let Some(entity) = self.entity_mut(id) else {
            return;
        };
        if !entity.combatant_mut().revive(hp) {
            return;
        }
        let hp = entity.combatant().hp();
        info!(target: "battle::controller", combatant = %id, hp, "combatant resurrected");
        self.altered(id, StateAlteredKind::Resurrected);
        self.altered(id, StateAlteredKind::HpChanged { delta: hp, hp });
    }

    fn attach_status(&mut self, owner: CombatantId, template: &StatusTemplate) {
        let (status, change) = self.statuses.attach(owner, template);
        self.altered(owner, StateAlteredKind::StatusApplied { status });
        if let Some(change) = change {
            self.apply_status_changes(vec![change]);
        }
    }

    pub(super) fn apply_recurring(&mut self, owner: CombatantId, effect: RecurringEffect) {
        if !self.combatant(owner).is_some_and(|c| c.is_alive()) {
            return;
        }
        match effect {
            RecurringEffect::HealthDelta(amount) => self.change_hp(owner, amount),
            RecurringEffect::ApDelta(amount) => self.change_ap(owner, amount),
        }
    }

    pub(super) fn apply_status_changes(&mut self, changes: Vec<StatusChange>) {
        for change in changes {
            match change {
                StatusChange::Activated { owner, kind, .. } => {
                    self.apply_status_effect(owner, &kind, true);
                }
                StatusChange::Deactivated { owner, kind, .. } => {
                    self.apply_status_effect(owner, &kind, false);
                }
                StatusChange::Removed {
                    id,
                    owner,
                    kind,
                    was_active,
                } => {
                    if was_active {
                        self.apply_status_effect(owner, &kind, false);
                    }
                    self.altered(owner, StateAlteredKind::StatusRemoved { status: id });
                }
            }
        }
    }

    fn apply_status_effect(&mut self, owner: CombatantId, kind: &StatusKind, active: bool) {
        let still_locked = self.statuses.for_owner(owner).any(|s| {
            s.is_active() && matches!(s.kind(), StatusKind::CooldownLock { .. })
        });
        let Some(entity) = self.entity_mut(owner) else {
            return;
        };
        let combatant = entity.combatant_mut();
        match kind {
            StatusKind::StatModifier { stat, value } => {
                if active {
                    combatant.modifiers_mut().add(*stat, *value);
                } else {
                    combatant.modifiers_mut().remove(*stat, *value);
                }
                if matches!(stat, StatKind::Hp | StatKind::Ap) {
                    self.clamp_to_max(owner);
                }
            }
            StatusKind::CooldownLock { .. } => combatant.set_cooldown_paused(active || still_locked),
            StatusKind::Recurring { .. } => {}
        }
    }

    /// Re-applies the `[0, max]` bounds after a max HP/AP modifier changed.
    fn clamp_to_max(&mut self, id: CombatantId) {
        let Some(entity) = self.entity_mut(id) else {
            return;
        };
        let (change, ap_delta) = entity.combatant_mut().clamp_to_max();
        let hp = entity.combatant().target_hp();
        let ap = entity.combatant().ap();

        if change.applied != 0.0 {
            self.altered(
                id,
                StateAlteredKind::HpChanged {
                    delta: change.applied,
                    hp,
                },
            );
        }
        if ap_delta != 0.0 {
            self.altered(id, StateAlteredKind::ApChanged { delta: ap_delta, ap });
        }
        if change.died {
            self.on_death(id);
        }
    }

    pub(super) fn on_death(&mut self, id: CombatantId) {
        info!(target: "battle::controller", combatant = %id, "combatant died");
        self.altered(id, StateAlteredKind::Died);
        let changes = self.statuses.owner_died(id);
        self.apply_status_changes(changes);
        if self.selection.references(id) {
            self.selection.clear();
        }
        self.check_outcome();
    }
}

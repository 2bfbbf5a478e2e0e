//! Combatant records: identity, side, HP/AP meters and the cooldown timer.
//!
//! A combatant wraps a stat-bearing participant for the duration of one
//! battle. HP and AP are always clamped to `[0, max]`; reaching 0 HP flags the
//! combatant dead immediately.
//!
//! Friendly combatants take damage through a *rolling* meter: a hit moves
//! `target_hp`, and the displayed `hp` approaches it linearly over the
//! configured scroll duration. Death happens when the displayed value reaches
//! zero, which leaves a window for healing to land first.

mod record;
mod stats;

pub use record::CombatantRecord;
pub use stats::{StatKind, StatModifiers, StatSheet, StatsProvider};

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::skill::SkillId;

/// Unique identifier for a battle participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of the battle a participant fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// Party character.
    Ally,
    Enemy,
    /// Helper fighting alongside the party; does not count toward defeat.
    Assist,
}

impl Side {
    /// Allies and assists share the friendly pool.
    pub const fn is_friendly(self) -> bool {
        matches!(self, Side::Ally | Side::Assist)
    }
}

bitflags! {
    /// Runtime state bits of a combatant.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CombatantFlags: u8 {
        const ALIVE           = 1 << 0;
        /// Timers advance only while set (battle state is Combat).
        const IN_COMBAT       = 1 << 1;
        /// Cooldown frozen by a cooldown-lock status.
        const COOLDOWN_PAUSED = 1 << 2;
    }
}

/// Result of an HP adjustment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HpChange {
    /// Delta actually applied to the target value after clamping.
    pub applied: f32,
    pub died: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HpScroll {
    from: f32,
    elapsed: f32,
}

/// A participant in battle with HP/AP/cooldown state.
#[derive(Clone, Debug)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    side: Side,
    stats: Arc<dyn StatsProvider>,
    modifiers: StatModifiers,
    skills: Vec<SkillId>,
    hp: f32,
    target_hp: f32,
    scroll: Option<HpScroll>,
    ap: f32,
    cooldown: f32,
    flags: CombatantFlags,
}

impl Combatant {
    /// Creates a living combatant at full HP/AP with no cooldown.
    pub fn new(
        id: CombatantId,
        name: impl Into<String>,
        side: Side,
        stats: Arc<dyn StatsProvider>,
    ) -> Self {
        let hp = stats.calculated_stat(StatKind::Hp).max(0.0);
        let ap = stats.calculated_stat(StatKind::Ap).max(0.0);
        let flags = if hp > 0.0 {
            CombatantFlags::ALIVE
        } else {
            CombatantFlags::empty()
        };
        Self {
            id,
            name: name.into(),
            side,
            stats,
            modifiers: StatModifiers::default(),
            skills: Vec::new(),
            hp,
            target_hp: hp,
            scroll: None,
            ap,
            cooldown: 0.0,
            flags,
        }
    }

    #[must_use]
    pub fn with_skills(mut self, skills: impl IntoIterator<Item = SkillId>) -> Self {
        self.skills = skills.into_iter().collect();
        self
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn skills(&self) -> &[SkillId] {
        &self.skills
    }

    pub fn knows(&self, skill: &SkillId) -> bool {
        self.skills.contains(skill)
    }

    /// Provider stat plus active status modifiers.
    pub fn stat(&self, kind: StatKind) -> f32 {
        self.stats.calculated_stat(kind) + self.modifiers.get(kind)
    }

    pub fn modifiers_mut(&mut self) -> &mut StatModifiers {
        &mut self.modifiers
    }

    pub fn max_hp(&self) -> f32 {
        self.stat(StatKind::Hp).max(0.0)
    }

    pub fn max_ap(&self) -> f32 {
        self.stat(StatKind::Ap).max(0.0)
    }

    /// Displayed HP.
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// HP the displayed value is rolling toward.
    pub fn target_hp(&self) -> f32 {
        self.target_hp
    }

    pub fn hp_fraction(&self) -> f32 {
        let max = self.max_hp();
        if max <= 0.0 { 0.0 } else { self.hp / max }
    }

    pub fn ap(&self) -> f32 {
        self.ap
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn cooldown_multiplier(&self) -> f32 {
        self.stat(StatKind::CooldownMultiplier).max(0.0)
    }

    pub fn flags(&self) -> CombatantFlags {
        self.flags
    }

    pub fn is_alive(&self) -> bool {
        self.flags.contains(CombatantFlags::ALIVE)
    }

    pub fn is_in_combat(&self) -> bool {
        self.flags.contains(CombatantFlags::IN_COMBAT)
    }

    /// Alive with an expired cooldown.
    pub fn is_ready(&self) -> bool {
        self.is_alive() && self.cooldown <= 0.0
    }

    pub fn is_hp_rolling(&self) -> bool {
        self.scroll.is_some()
    }

    pub fn set_in_combat(&mut self, in_combat: bool) {
        self.flags.set(CombatantFlags::IN_COMBAT, in_combat);
    }

    /// Locks the combatant out of re-selection until a cooldown is set.
    pub fn lock_cooldown(&mut self) {
        self.cooldown = f32::INFINITY;
    }

    pub fn set_cooldown(&mut self, seconds: f32) {
        self.cooldown = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
    }

    pub fn set_cooldown_paused(&mut self, paused: bool) {
        self.flags.set(CombatantFlags::COOLDOWN_PAUSED, paused);
    }

    /// Counts the cooldown down. Returns true on the tick it reaches zero.
    pub fn tick_cooldown(&mut self, dt: f32) -> bool {
        if !self.is_alive()
            || !self.is_in_combat()
            || self.flags.contains(CombatantFlags::COOLDOWN_PAUSED)
            || !self.cooldown.is_finite()
            || self.cooldown <= 0.0
        {
            return false;
        }
        self.cooldown -= dt;
        if self.cooldown <= 0.0 {
            self.cooldown = 0.0;
            return true;
        }
        false
    }

    /// Applies an HP delta. With `rolling`, only the target moves and the
    /// displayed value catches up in [`Combatant::tick_hp`].
    pub fn adjust_hp(&mut self, delta: f32, rolling: bool) -> HpChange {
        if !self.is_alive() || !delta.is_finite() {
            return HpChange {
                applied: 0.0,
                died: false,
            };
        }
        let max = self.max_hp();
        let previous = self.target_hp;
        self.target_hp = (self.target_hp + delta).clamp(0.0, max);
        let applied = self.target_hp - previous;

        if rolling {
            self.scroll = Some(HpScroll {
                from: self.hp,
                elapsed: 0.0,
            });
            return HpChange {
                applied,
                died: false,
            };
        }

        self.hp = self.target_hp;
        self.scroll = None;
        HpChange {
            applied,
            died: self.check_death(),
        }
    }

    /// Moves the displayed HP toward its target. Returns true if the
    /// combatant died on this tick.
    pub fn tick_hp(&mut self, dt: f32, span: f32) -> bool {
        let Some(scroll) = self.scroll.as_mut() else {
            return false;
        };
        scroll.elapsed += dt;
        let progress = if span <= 0.0 {
            1.0
        } else {
            (scroll.elapsed / span).min(1.0)
        };
        self.hp = scroll.from + (self.target_hp - scroll.from) * progress;
        if progress >= 1.0 {
            self.hp = self.target_hp;
            self.scroll = None;
        }
        self.check_death()
    }

    /// Snaps the displayed HP to its target. Returns true if that killed the
    /// combatant.
    pub fn settle_hp(&mut self) -> bool {
        if self.scroll.take().is_none() {
            return false;
        }
        self.hp = self.target_hp;
        self.check_death()
    }

    /// Applies an AP delta clamped to `[0, max]`; returns the applied delta.
    pub fn adjust_ap(&mut self, delta: f32) -> f32 {
        if !delta.is_finite() {
            return 0.0;
        }
        let previous = self.ap;
        self.ap = (self.ap + delta).clamp(0.0, self.max_ap());
        self.ap - previous
    }

    /// Pulls HP, its rolling target and AP back inside `[0, max]` after the
    /// maxima changed. A scroll that would end above the new cap is clipped.
    ///
    /// Returns the HP change and the applied AP delta.
    pub fn clamp_to_max(&mut self) -> (HpChange, f32) {
        let max_hp = self.max_hp();
        let previous_hp = self.hp;
        self.target_hp = self.target_hp.clamp(0.0, max_hp);
        self.hp = self.hp.clamp(0.0, max_hp);
        if let Some(scroll) = self.scroll.as_mut() {
            scroll.from = scroll.from.min(max_hp);
            if self.hp == self.target_hp {
                self.scroll = None;
            }
        }

        let previous_ap = self.ap;
        self.ap = self.ap.clamp(0.0, self.max_ap());

        let change = HpChange {
            applied: self.hp - previous_hp,
            died: self.check_death(),
        };
        (change, self.ap - previous_ap)
    }

    /// Brings a dead combatant back with the given HP (at least 1).
    pub fn revive(&mut self, hp: f32) -> bool {
        if self.is_alive() {
            return false;
        }
        let max = self.max_hp();
        if max <= 0.0 {
            return false;
        }
        let hp = if hp.is_finite() { hp } else { 1.0 };
        self.hp = hp.clamp(1.0_f32.min(max), max);
        self.target_hp = self.hp;
        self.scroll = None;
        self.cooldown = 0.0;
        self.flags.insert(CombatantFlags::ALIVE);
        true
    }

    /// Immutable view handed out with state-change notifications.
    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            id: self.id,
            name: self.name.clone(),
            side: self.side,
            hp: self.hp,
            max_hp: self.max_hp(),
            ap: self.ap,
            max_ap: self.max_ap(),
            cooldown: self.cooldown,
            alive: self.is_alive(),
        }
    }

    fn check_death(&mut self) -> bool {
        if self.is_alive() && self.hp <= 0.0 {
            self.hp = 0.0;
            self.target_hp = 0.0;
            self.scroll = None;
            self.flags.remove(CombatantFlags::ALIVE);
            return true;
        }
        false
    }
}

/// Participant state captured for outbound events.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub hp: f32,
    pub max_hp: f32,
    pub ap: f32,
    pub max_ap: f32,
    pub cooldown: f32,
    pub alive: bool,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sheet(hp: f32, ap: f32) -> Arc<dyn StatsProvider> {
        Arc::new(StatSheet::new().with(StatKind::Hp, hp).with(StatKind::Ap, ap))
    }

    pub(crate) fn combatant(id: u32, side: Side) -> Combatant {
        Combatant::new(CombatantId(id), format!("c{id}"), side, sheet(100.0, 20.0))
    }

    #[test]
    fn instant_damage_clamps_and_kills() {
        let mut enemy = combatant(1, Side::Enemy);
        let change = enemy.adjust_hp(-30.0, false);
        assert_eq!(change.applied, -30.0);
        assert_eq!(enemy.hp(), 70.0);

        let change = enemy.adjust_hp(-500.0, false);
        assert_eq!(change.applied, -70.0);
        assert!(change.died);
        assert!(!enemy.is_alive());
        assert_eq!(enemy.hp(), 0.0);
    }

    #[test]
    fn rolling_damage_approaches_target_linearly() {
        let mut ally = combatant(1, Side::Ally);
        let change = ally.adjust_hp(-40.0, true);
        assert!(!change.died);
        assert_eq!(ally.hp(), 100.0);
        assert_eq!(ally.target_hp(), 60.0);

        assert!(!ally.tick_hp(0.5, 1.0));
        assert!((ally.hp() - 80.0).abs() < 1e-4);

        assert!(!ally.tick_hp(0.5, 1.0));
        assert_eq!(ally.hp(), 60.0);
        assert!(!ally.is_hp_rolling());
    }

    #[test]
    fn lowered_maxima_clip_meters_and_scrolls() {
        let mut ally = combatant(1, Side::Ally);
        ally.modifiers_mut().add(StatKind::Hp, 50.0);
        ally.modifiers_mut().add(StatKind::Ap, 10.0);
        ally.adjust_hp(50.0, true);
        ally.adjust_ap(10.0);
        ally.tick_hp(0.5, 1.0);
        assert!((ally.hp() - 125.0).abs() < 1e-4);

        ally.modifiers_mut().remove(StatKind::Hp, 50.0);
        ally.modifiers_mut().remove(StatKind::Ap, 10.0);
        let (change, ap_delta) = ally.clamp_to_max();
        assert!((change.applied + 25.0).abs() < 1e-4);
        assert!(!change.died);
        assert_eq!(ap_delta, -10.0);
        assert_eq!(ally.hp(), 100.0);
        assert_eq!(ally.target_hp(), 100.0);
        assert_eq!(ally.ap(), 20.0);
        assert!(!ally.is_hp_rolling());
    }

    #[test]
    fn rolling_death_happens_when_display_reaches_zero() {
        let mut ally = combatant(1, Side::Ally);
        ally.adjust_hp(-100.0, true);
        assert!(ally.is_alive());
        assert!(!ally.tick_hp(0.25, 1.0));
        assert!(ally.tick_hp(1.0, 1.0));
        assert!(!ally.is_alive());
    }

    #[test]
    fn healing_during_roll_can_save_an_ally() {
        let mut ally = combatant(1, Side::Ally);
        ally.adjust_hp(-100.0, true);
        ally.tick_hp(0.5, 1.0);
        ally.adjust_hp(30.0, true);
        assert_eq!(ally.target_hp(), 30.0);
        assert!(!ally.tick_hp(2.0, 1.0));
        assert_eq!(ally.hp(), 30.0);
        assert!(ally.is_alive());
    }

    #[test]
    fn cooldown_expires_once_and_only_in_combat() {
        let mut unit = combatant(1, Side::Ally);
        unit.set_cooldown(1.0);
        assert!(!unit.tick_cooldown(2.0));

        unit.set_in_combat(true);
        assert!(!unit.tick_cooldown(0.5));
        assert!(unit.tick_cooldown(0.5));
        assert!(!unit.tick_cooldown(0.5));
        assert!(unit.is_ready());
    }

    #[test]
    fn locked_and_paused_cooldowns_do_not_advance() {
        let mut unit = combatant(1, Side::Enemy);
        unit.set_in_combat(true);
        unit.lock_cooldown();
        assert!(!unit.tick_cooldown(100.0));
        assert!(!unit.is_ready());

        unit.set_cooldown(1.0);
        unit.set_cooldown_paused(true);
        assert!(!unit.tick_cooldown(5.0));
        assert_eq!(unit.cooldown(), 1.0);
    }

    #[test]
    fn ap_is_clamped() {
        let mut unit = combatant(1, Side::Ally);
        assert_eq!(unit.adjust_ap(-50.0), -20.0);
        assert_eq!(unit.ap(), 0.0);
        assert_eq!(unit.adjust_ap(5.0), 5.0);
    }

    #[test]
    fn revive_restores_a_dead_combatant() {
        let mut unit = combatant(1, Side::Ally);
        unit.adjust_hp(-100.0, false);
        assert!(unit.revive(25.0));
        assert!(unit.is_alive());
        assert_eq!(unit.hp(), 25.0);
        assert!(!unit.revive(25.0));
    }
}

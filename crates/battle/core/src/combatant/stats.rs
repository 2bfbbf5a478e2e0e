//! Stat collaborator contract.
//!
//! Stat computation (levels, equipment, growth curves) belongs to the
//! embedding application. The battle core only reads values through
//! [`StatsProvider`] and layers temporary status modifiers on top.

use std::collections::HashMap;
use std::fmt;

/// Stats the battle core consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatKind {
    /// Maximum HP.
    Hp,
    /// Maximum AP.
    Ap,
    /// Scales every skill cooldown (1.0 = unchanged).
    CooldownMultiplier,
    /// Experience granted to the winners when this combatant is defeated.
    ExperienceReward,
    PhysicalAdder,
    MagicalAdder,
    /// Fraction of physical damage absorbed, in [0, 1].
    PhysicalResistance,
    /// Fraction of magical damage absorbed, in [0, 1].
    MagicalResistance,
}

impl StatKind {
    /// Value used when a provider has nothing configured for this stat.
    pub const fn neutral_value(self) -> f32 {
        match self {
            StatKind::CooldownMultiplier => 1.0,
            _ => 0.0,
        }
    }
}

/// Read-only view of a participant's stats.
pub trait StatsProvider: fmt::Debug + Send + Sync {
    /// Raw stat value.
    fn stat(&self, kind: StatKind) -> f32;

    /// Stat value after the provider's own bonuses (equipment, level).
    fn calculated_stat(&self, kind: StatKind) -> f32 {
        self.stat(kind)
    }
}

/// Map-backed [`StatsProvider`] used by content files and tests.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StatSheet {
    values: HashMap<StatKind, f32>,
}

impl StatSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, kind: StatKind, value: f32) -> Self {
        self.values.insert(kind, value);
        self
    }

    pub fn set(&mut self, kind: StatKind, value: f32) {
        self.values.insert(kind, value);
    }
}

impl StatsProvider for StatSheet {
    fn stat(&self, kind: StatKind) -> f32 {
        self.values
            .get(&kind)
            .copied()
            .unwrap_or(kind.neutral_value())
    }
}

/// Additive modifiers contributed by active statuses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatModifiers {
    values: HashMap<StatKind, f32>,
}

impl StatModifiers {
    pub fn add(&mut self, kind: StatKind, value: f32) {
        *self.values.entry(kind).or_insert(0.0) += value;
    }

    pub fn remove(&mut self, kind: StatKind, value: f32) {
        if let Some(current) = self.values.get_mut(&kind) {
            *current -= value;
            if current.abs() < f32::EPSILON {
                self.values.remove(&kind);
            }
        }
    }

    pub fn get(&self, kind: StatKind) -> f32 {
        self.values.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_stats_fall_back_to_neutral_values() {
        let sheet = StatSheet::new().with(StatKind::Hp, 40.0);
        assert_eq!(sheet.calculated_stat(StatKind::Hp), 40.0);
        assert_eq!(sheet.calculated_stat(StatKind::CooldownMultiplier), 1.0);
        assert_eq!(sheet.calculated_stat(StatKind::PhysicalAdder), 0.0);
    }

    #[test]
    fn modifiers_cancel_out() {
        let mut modifiers = StatModifiers::default();
        modifiers.add(StatKind::PhysicalAdder, 5.0);
        modifiers.add(StatKind::PhysicalAdder, 2.5);
        assert_eq!(modifiers.get(StatKind::PhysicalAdder), 7.5);

        modifiers.remove(StatKind::PhysicalAdder, 7.5);
        assert!(modifiers.is_empty());
    }
}

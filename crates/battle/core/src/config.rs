use crate::entity::BattleRow;
use crate::error::{BattleError, Result};

/// Battle timing constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Seconds between two hits of one sequence, and between queue entries.
    pub hit_delay: f32,
    /// Seconds an ally's displayed HP takes to roll toward a new value.
    pub hp_scroll_duration: f32,
    pub intro_duration: f32,
    pub outro_duration: f32,
    /// Cooldown applied at battle start to the side without initiative, and
    /// used as the retry delay when an AI combatant finds nothing to do.
    pub initial_cooldown: f32,
    /// Seed for the controller-owned RNG.
    pub seed: u64,
    pub mat: MatConfig,
}

impl BattleConfig {
    // ===== compile-time limits =====
    /// Occupancy is tracked in a `u16` per row.
    pub const MAX_COLUMNS_LIMIT: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_HIT_DELAY: f32 = 0.5;
    pub const DEFAULT_HP_SCROLL_DURATION: f32 = 1.0;
    pub const DEFAULT_INTRO_DURATION: f32 = 1.0;
    pub const DEFAULT_OUTRO_DURATION: f32 = 1.0;
    pub const DEFAULT_INITIAL_COOLDOWN: f32 = 1.0;

    pub fn new() -> Self {
        Self {
            hit_delay: Self::DEFAULT_HIT_DELAY,
            hp_scroll_duration: Self::DEFAULT_HP_SCROLL_DURATION,
            intro_duration: Self::DEFAULT_INTRO_DURATION,
            outro_duration: Self::DEFAULT_OUTRO_DURATION,
            initial_cooldown: Self::DEFAULT_INITIAL_COOLDOWN,
            seed: 0,
            mat: MatConfig::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rejects values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            self.hit_delay,
            self.hp_scroll_duration,
            self.intro_duration,
            self.outro_duration,
            self.initial_cooldown,
        ];
        if durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(BattleError::InvalidConfig {
                reason: "durations must be finite and non-negative",
            });
        }
        self.mat.validate()
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Layout parameters for the enemy battle mat.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatConfig {
    pub max_columns: usize,
    /// A preferred row is reused while it holds fewer enemies than this.
    pub split_threshold: usize,
    /// Once this many enemies are placed, rows outside `default_rows` open.
    pub new_row_threshold: usize,
    pub default_rows: Vec<BattleRow>,
}

impl MatConfig {
    pub const DEFAULT_MAX_COLUMNS: usize = 5;
    pub const DEFAULT_SPLIT_THRESHOLD: usize = 3;
    pub const DEFAULT_NEW_ROW_THRESHOLD: usize = 6;

    fn validate(&self) -> Result<()> {
        if self.max_columns == 0 || self.max_columns > BattleConfig::MAX_COLUMNS_LIMIT {
            return Err(BattleError::InvalidConfig {
                reason: "max_columns must be within 1..=16",
            });
        }
        if self.default_rows.contains(&BattleRow::Any) {
            return Err(BattleError::InvalidConfig {
                reason: "default_rows cannot contain the Any row",
            });
        }
        Ok(())
    }
}

impl Default for MatConfig {
    fn default() -> Self {
        Self {
            max_columns: Self::DEFAULT_MAX_COLUMNS,
            split_threshold: Self::DEFAULT_SPLIT_THRESHOLD,
            new_row_threshold: Self::DEFAULT_NEW_ROW_THRESHOLD,
            default_rows: vec![BattleRow::Middle, BattleRow::Top],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(BattleConfig::default().validate(), Ok(()));
    }

    #[test]
    fn negative_delay_is_rejected() {
        let config = BattleConfig {
            hit_delay: -1.0,
            ..BattleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn column_limit_is_enforced() {
        let mut config = BattleConfig::default();
        config.mat.max_columns = 17;
        assert!(config.validate().is_err());
        config.mat.max_columns = 0;
        assert!(config.validate().is_err());
    }
}

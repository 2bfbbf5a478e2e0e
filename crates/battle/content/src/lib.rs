//! Data-driven battle content and loaders.
//!
//! Battles are described by three files in a content directory:
//! - `config.toml`: timing constants and mat layout ([`battle_core::BattleConfig`])
//! - `skills.ron`: the skill catalog
//! - `roster.ron`: both sides of the encounter, with optional AI behaviours
//!
//! Loaders deserialize straight into battle-core types; the core never reads
//! files itself.

#[cfg(feature = "serde")]
pub mod roster;

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "serde")]
pub use roster::{CombatantSpec, RosterSpec};

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, LoadResult, PreparedBattle, RosterLoader, SkillLoader,
};

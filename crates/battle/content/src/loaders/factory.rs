//! Content factory for building battles from a data directory.

use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, BattleController, CombatantId, SkillBook};

use crate::loaders::{ConfigLoader, LoadResult, RosterLoader, SkillLoader};
use crate::roster::RosterSpec;

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── skills.ron
/// └── roster.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

/// A controller set up from a roster, ready to be advanced.
pub struct PreparedBattle {
    pub controller: BattleController,
    /// Enemies the mat had no room for.
    pub unplaced: Vec<CombatantId>,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load battle configuration from `config.toml`.
    ///
    /// A missing file yields the default configuration.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(BattleConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the skill catalog from `skills.ron`.
    pub fn load_skills(&self) -> LoadResult<SkillBook> {
        let path = self.data_dir.join("skills.ron");
        SkillLoader::load(&path)
    }

    /// Load the encounter roster from `roster.ron`.
    pub fn load_roster(&self) -> LoadResult<RosterSpec> {
        let path = self.data_dir.join("roster.ron");
        RosterLoader::load(&path)
    }

    /// Builds a controller for `roster` and puts the AI-driven combatants
    /// under AI control.
    ///
    /// Every skill a combatant or its AI names must exist in `skills.ron`.
    pub fn prepare(&self, config: BattleConfig, roster: &RosterSpec) -> LoadResult<PreparedBattle> {
        let skills = self.load_skills()?;
        for spec in roster.combatants() {
            let unknown = spec.unknown_skills(&skills);
            if let Some(skill) = unknown.first() {
                anyhow::bail!("'{}' references unknown skill '{}'", spec.name, skill);
            }
        }

        let mut controller = BattleController::new(config, skills)?;
        let unplaced = controller.setup(roster.allies(), roster.enemies(), roster.transition)?;
        for spec in roster.combatants() {
            if let Some(ai) = &spec.ai {
                controller.set_ai(spec.id, Some(ai.clone()));
            }
        }

        Ok(PreparedBattle {
            controller,
            unplaced,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/battle");
        assert_eq!(factory.data_dir(), Path::new("/tmp/battle"));
    }
}

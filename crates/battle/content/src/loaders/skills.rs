//! Skill catalog loader.

use std::collections::HashSet;
use std::path::Path;

use battle_core::{Skill, SkillBook, SkillEffect, StatusKind};

use crate::loaders::{LoadResult, read_file};

/// Loader for the skill catalog from RON files.
pub struct SkillLoader;

impl SkillLoader {
    /// Load a skill catalog from a RON file.
    ///
    /// RON format: `Vec<Skill>`. Skill ids must be unique.
    pub fn load(path: &Path) -> LoadResult<SkillBook> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SkillBook> {
        let skills: Vec<Skill> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill catalog RON: {}", e))?;

        let mut seen = HashSet::new();
        for skill in &skills {
            if !seen.insert(skill.id.clone()) {
                anyhow::bail!("Duplicate skill id '{}'", skill.id);
            }
            if skill.number_of_hits == 0 {
                anyhow::bail!("Skill '{}' must hit at least once", skill.id);
            }
            for effect in &skill.effects {
                if let SkillEffect::ApplyStatus(template) = effect
                    && let StatusKind::Recurring { period, .. } = template.kind
                    && (period.is_nan() || period < StatusKind::MIN_RECURRING_PERIOD)
                {
                    anyhow::bail!(
                        "Skill '{}' has a recurring period of {}s, below the {}s minimum",
                        skill.id,
                        period,
                        StatusKind::MIN_RECURRING_PERIOD
                    );
                }
            }
        }

        Ok(skills.into_iter().collect())
    }
}

//! Encounter roster loader.

use std::path::Path;

use battle_core::Side;

use crate::loaders::{LoadResult, read_file};
use crate::roster::RosterSpec;

/// Loader for encounter rosters from RON files.
pub struct RosterLoader;

impl RosterLoader {
    /// Load a roster from a RON file.
    ///
    /// Rejects rosters with duplicate ids, enemy-side combatants on the
    /// friendly list (or the reverse), or no party member / no enemy.
    pub fn load(path: &Path) -> LoadResult<RosterSpec> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<RosterSpec> {
        let roster: RosterSpec = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;

        if let Some(id) = roster.duplicate_ids().first() {
            anyhow::bail!("Combatant id {} is listed more than once", id);
        }
        if let Some(spec) = roster.allies.iter().find(|c| !c.side.is_friendly()) {
            anyhow::bail!("'{}' is on the ally list but fights for {}", spec.name, spec.side);
        }
        if let Some(spec) = roster.enemies.iter().find(|c| c.side != Side::Enemy) {
            anyhow::bail!("'{}' is on the enemy list but fights for {}", spec.name, spec.side);
        }
        if !roster.is_playable() {
            anyhow::bail!("Roster needs at least one ally and one enemy");
        }

        Ok(roster)
    }
}

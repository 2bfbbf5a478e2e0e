//! Battle mat: assigns enemies to row/column cells.
//!
//! Occupancy is a bitmask per placeable row. A failed placement returns
//! `BattleRow::Any`, which callers read as "unplaced".

use std::collections::HashMap;

use arrayvec::ArrayVec;
use tracing::{debug, warn};

use crate::combatant::CombatantId;
use crate::config::{BattleConfig, MatConfig};
use crate::entity::BattleRow;

/// Assigned cell. `row == BattleRow::Any` means no cell was free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub row: BattleRow,
    pub column: usize,
}

impl Placement {
    pub const UNPLACED: Placement = Placement {
        row: BattleRow::Any,
        column: 0,
    };

    pub fn is_placed(&self) -> bool {
        self.row != BattleRow::Any
    }
}

#[derive(Clone, Debug)]
pub struct BattleMat {
    config: MatConfig,
    occupancy: [u16; 3],
    placements: HashMap<CombatantId, Placement>,
}

impl BattleMat {
    /// `max_columns` is clamped to `1..=16`, the width of a row bitmask.
    pub fn new(mut config: MatConfig) -> Self {
        let limit = BattleConfig::MAX_COLUMNS_LIMIT;
        if !(1..=limit).contains(&config.max_columns) {
            warn!(
                target: "battle::mat",
                max_columns = config.max_columns,
                limit,
                "max_columns out of range, clamping"
            );
            config.max_columns = config.max_columns.clamp(1, limit);
        }
        Self {
            config,
            occupancy: [0; 3],
            placements: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MatConfig {
        &self.config
    }

    pub fn row_count(&self, row: BattleRow) -> usize {
        row.index()
            .map_or(0, |i| self.occupancy[i].count_ones() as usize)
    }

    pub fn total(&self) -> usize {
        self.placements.len()
    }

    pub fn is_row_full(&self, row: BattleRow) -> bool {
        row.index().is_none() || self.row_count(row) >= self.max_columns()
    }

    pub fn is_occupied(&self, row: BattleRow, column: usize) -> bool {
        match row.index() {
            Some(i) if column < self.max_columns() => self.occupancy[i] & (1 << column) != 0,
            _ => false,
        }
    }

    pub fn placement(&self, enemy: CombatantId) -> Option<Placement> {
        self.placements.get(&enemy).copied()
    }

    /// Places an enemy, preferring `preferred` when it is still light.
    ///
    /// Placing an already placed enemy returns its existing cell without
    /// touching occupancy.
    pub fn place_enemy(&mut self, enemy: CombatantId, preferred: BattleRow) -> Placement {
        if let Some(existing) = self.placements.get(&enemy) {
            return *existing;
        }

        let Some(row) = self.choose_row(preferred) else {
            debug!(target: "battle::mat", %enemy, "no row with free capacity");
            return Placement::UNPLACED;
        };
        let Some(column) = self.choose_column(row) else {
            return Placement::UNPLACED;
        };
        if let Some(i) = row.index() {
            self.occupancy[i] |= 1 << column;
        }

        let placement = Placement { row, column };
        self.placements.insert(enemy, placement);
        debug!(target: "battle::mat", %enemy, %row, column, "placed enemy");
        placement
    }

    /// Frees the enemy's cell; returns the cell it held.
    pub fn remove(&mut self, enemy: CombatantId) -> Option<Placement> {
        let placement = self.placements.remove(&enemy)?;
        if let Some(i) = placement.row.index() {
            self.occupancy[i] &= !(1 << placement.column);
        }
        Some(placement)
    }

    pub fn clear(&mut self) {
        self.occupancy = [0; 3];
        self.placements.clear();
    }

    fn max_columns(&self) -> usize {
        self.config.max_columns
    }

    fn choose_row(&self, preferred: BattleRow) -> Option<BattleRow> {
        let has_room = |row: BattleRow| !self.is_row_full(row);

        if preferred != BattleRow::Any
            && has_room(preferred)
            && self.row_count(preferred) < self.config.split_threshold
        {
            return Some(preferred);
        }

        let mut candidates: ArrayVec<BattleRow, 4> = ArrayVec::new();
        let mut push = |row: BattleRow| {
            if row != BattleRow::Any && has_room(row) && !candidates.contains(&row) {
                candidates.push(row);
            }
        };
        if preferred != BattleRow::Any {
            push(preferred);
        }
        for row in &self.config.default_rows {
            push(*row);
        }
        if self.total() >= self.config.new_row_threshold {
            for row in BattleRow::PLACEABLE {
                push(row);
            }
        }

        // Least occupied wins; ties keep priority order.
        let best = candidates
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|(order, row)| (self.row_count(*row), *order))
            .map(|(_, row)| row);

        best.or_else(|| BattleRow::PLACEABLE.into_iter().find(|row| has_room(*row)))
    }

    /// Center column first, then fanning outward.
    fn choose_column(&self, row: BattleRow) -> Option<usize> {
        let max = self.max_columns();
        let center = max / 2;
        (0..max)
            .filter_map(|step| {
                let offset = step.div_ceil(2);
                if step % 2 == 1 {
                    center.checked_sub(offset)
                } else {
                    Some(center + offset)
                }
            })
            .filter(|column| *column < max)
            .find(|column| !self.is_occupied(row, *column))
            .or_else(|| (0..max).find(|column| !self.is_occupied(row, *column)))
    }
}

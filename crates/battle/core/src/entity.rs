//! Positional wrapper placing a combatant on the battle board.

use crate::combatant::{Combatant, CombatantId, Side};

/// Board row. `Any` means "no preference" on input and "unplaced" on output.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleRow {
    Top,
    Middle,
    Bottom,
    #[default]
    Any,
}

impl BattleRow {
    /// Rows an enemy can actually occupy.
    pub const PLACEABLE: [BattleRow; 3] = [BattleRow::Top, BattleRow::Middle, BattleRow::Bottom];

    /// Occupancy slot of this row, `None` for `Any`.
    pub const fn index(self) -> Option<usize> {
        match self {
            BattleRow::Top => Some(0),
            BattleRow::Middle => Some(1),
            BattleRow::Bottom => Some(2),
            BattleRow::Any => None,
        }
    }
}

/// A combatant plus its board position.
///
/// Friendly entities are not laid out on the mat: they keep `BattleRow::Any`
/// and use their party index as column.
#[derive(Clone, Debug)]
pub struct BattleEntity {
    combatant: Combatant,
    row: BattleRow,
    column: usize,
}

impl BattleEntity {
    pub fn new(combatant: Combatant, row: BattleRow, column: usize) -> Self {
        Self {
            combatant,
            row,
            column,
        }
    }

    pub fn id(&self) -> CombatantId {
        self.combatant.id()
    }

    pub fn side(&self) -> Side {
        self.combatant.side()
    }

    pub fn combatant(&self) -> &Combatant {
        &self.combatant
    }

    pub fn combatant_mut(&mut self) -> &mut Combatant {
        &mut self.combatant
    }

    pub fn row(&self) -> BattleRow {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn is_alive(&self) -> bool {
        self.combatant.is_alive()
    }

    pub fn set_position(&mut self, row: BattleRow, column: usize) {
        self.row = row;
        self.column = column;
    }
}

/// Looks an entity up by id in a pool.
pub fn find(pool: &[BattleEntity], id: CombatantId) -> Option<&BattleEntity> {
    pool.iter().find(|entity| entity.id() == id)
}

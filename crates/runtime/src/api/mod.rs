//! Public runtime API surface.

pub mod errors;
pub mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::RuntimeHandle;

use battle_core::{BattleOutcome, BattleState, CombatantSnapshot};
use serde::{Deserialize, Serialize};

/// Read-only view of a running battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub state: BattleState,
    pub outcome: BattleOutcome,
    pub allies: Vec<CombatantSnapshot>,
    pub enemies: Vec<CombatantSnapshot>,
    pub queue_len: usize,
    pub ticks: u64,
}

/// Summary of a battle that reached `Complete`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub outcome: BattleOutcome,
    pub ticks: u64,
    /// Simulated seconds.
    pub elapsed: f32,
    /// Experience owed to the party; zero unless the battle was won.
    pub experience: f32,
    pub survivors: Vec<CombatantSnapshot>,
}

//! Worker tasks that back the runtime orchestration.
//!
//! The battle worker owns the controller and is the only place that
//! advances it.

mod battle;

pub use battle::{BattleWorker, Command};

//! Async orchestration around the synchronous battle core.
//!
//! The core is advanced by whoever owns the [`battle_core::BattleController`].
//! This crate moves that ownership into a background worker that ticks the
//! controller on a fixed interval, relays every core event onto a topic-based
//! [`EventBus`], and accepts player commands through a cloneable
//! [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and its configuration
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus and the core listener
//! - `workers` keeps the tick loop internal to the crate
pub mod api;
pub mod events;
pub mod runtime;

mod workers;

pub use api::{BattleReport, BattleSnapshot, Result, RuntimeError, RuntimeHandle};
pub use events::{BusListener, EventBus, Topic};
pub use runtime::{BattleRuntime, RuntimeConfig};

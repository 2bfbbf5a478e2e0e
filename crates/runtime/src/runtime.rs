//! High-level runtime orchestrator.
//!
//! The runtime moves a prepared [`BattleController`] into a background
//! worker, wires up the command channel and the event bus, and exposes a
//! handle for clients to drive and observe the battle.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use battle_core::BattleController;

use crate::api::{BattleReport, Result, RuntimeError, RuntimeHandle};
use crate::events::{BusListener, EventBus};
use crate::workers::BattleWorker;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Seconds advanced per tick.
    pub tick: f32,
    /// Pace ticks in wall-clock time; otherwise run as fast as possible.
    pub realtime: bool,
    /// Give up with [`RuntimeError::TickLimit`] after this many ticks.
    pub max_ticks: u64,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_TICK: f32 = 1.0 / 60.0;
    pub const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 10;

    pub fn validate(&self) -> Result<()> {
        if !self.tick.is_finite() || self.tick <= 0.0 {
            return Err(RuntimeError::InvalidConfig {
                reason: "tick must be a positive number of seconds",
            });
        }
        if self.command_buffer_size == 0 {
            return Err(RuntimeError::InvalidConfig {
                reason: "command_buffer_size must be non-zero",
            });
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick: Self::DEFAULT_TICK,
            realtime: true,
            max_ticks: Self::DEFAULT_MAX_TICKS,
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

/// Main runtime that runs one battle in the background
///
/// Design: Runtime owns the worker task; [`RuntimeHandle`] provides a
/// cloneable façade for clients.
pub struct BattleRuntime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<Result<BattleReport>>,
}

impl BattleRuntime {
    /// Spawns the worker for `controller`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(controller: BattleController, config: RuntimeConfig) -> Result<Self> {
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        Self::start_with_bus(controller, config, event_bus)
    }

    /// Like [`BattleRuntime::start`], publishing onto an existing bus so
    /// subscribers created beforehand see the battle from its first tick.
    pub fn start_with_bus(
        mut controller: BattleController,
        config: RuntimeConfig,
        event_bus: EventBus,
    ) -> Result<Self> {
        config.validate()?;

        controller.add_listener(BusListener::new(event_bus.clone()));

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size);
        let worker = BattleWorker::new(controller, config, command_rx);
        let worker_handle = tokio::spawn(worker.run());

        Ok(Self {
            handle: RuntimeHandle::new(command_tx, event_bus),
            worker_handle,
        })
    }

    /// Runs `controller` until `Complete` and returns the report.
    pub async fn run_to_completion(
        controller: BattleController,
        config: RuntimeConfig,
    ) -> Result<BattleReport> {
        Self::start(controller, config)?.wait().await
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Waits for the worker to finish the battle.
    pub async fn wait(self) -> Result<BattleReport> {
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)?
    }

    /// Stops the worker without waiting for the battle to end.
    pub fn abort(self) {
        self.worker_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tick_is_rejected() {
        let config = RuntimeConfig {
            tick: 0.0,
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RuntimeError::InvalidConfig { .. })
        ));
        assert!(RuntimeConfig::default().validate().is_ok());
    }
}

//! Battle worker that owns the authoritative [`BattleController`].
//!
//! Advances the controller by a fixed tick, either paced by a
//! `tokio::time::interval` or as fast as possible, and serves commands from
//! [`crate::RuntimeHandle`] between ticks.

use std::time::Duration;

use battle_core::{BattleController, BattleInput, BattleState, CombatantId, SkillId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::{BattleReport, BattleSnapshot, Result, RuntimeError};
use crate::runtime::RuntimeConfig;

/// Ticks run between cooperative yields when not paced.
const YIELD_EVERY: u64 = 64;

/// Commands that can be sent to the battle worker
pub enum Command {
    /// Queue an action for a player-controlled combatant.
    Enqueue {
        sender: CombatantId,
        skill: SkillId,
        targets: Vec<CombatantId>,
        reply: oneshot::Sender<Result<bool>>,
    },
    /// Forward a global input.
    Input {
        input: BattleInput,
        reply: oneshot::Sender<bool>,
    },
    /// Query the current battle state (read-only).
    Snapshot {
        reply: oneshot::Sender<BattleSnapshot>,
    },
}

/// Background task that ticks one battle to completion.
pub struct BattleWorker {
    controller: BattleController,
    config: RuntimeConfig,
    command_rx: mpsc::Receiver<Command>,
    ticks: u64,
}

impl BattleWorker {
    pub fn new(
        controller: BattleController,
        config: RuntimeConfig,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        info!(
            target: "runtime::worker",
            allies = controller.allies().len(),
            enemies = controller.enemies().len(),
            tick = config.tick,
            realtime = config.realtime,
            "BattleWorker initialized"
        );
        Self {
            controller,
            config,
            command_rx,
            ticks: 0,
        }
    }

    /// Main worker loop. Returns once the battle is `Complete`.
    pub async fn run(mut self) -> Result<BattleReport> {
        let mut interval = tokio::time::interval(Duration::from_secs_f32(self.config.tick));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.controller.state() == BattleState::Complete {
                let report = self.report();
                info!(
                    target: "runtime::worker",
                    outcome = %report.outcome,
                    ticks = report.ticks,
                    experience = report.experience,
                    "battle complete"
                );
                return Ok(report);
            }
            if self.ticks >= self.config.max_ticks {
                return Err(RuntimeError::TickLimit { ticks: self.ticks });
            }

            if self.config.realtime {
                tokio::select! {
                    _ = interval.tick() => self.step(),
                    Some(cmd) = self.command_rx.recv() => self.handle_command(cmd),
                }
            } else {
                while let Ok(cmd) = self.command_rx.try_recv() {
                    self.handle_command(cmd);
                }
                self.step();
                if self.ticks % YIELD_EVERY == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    fn step(&mut self) {
        let before = self.controller.state();
        let after = self.controller.advance(self.config.tick);
        self.ticks += 1;
        if before != after {
            debug!(target: "runtime::worker", tick = self.ticks, from = %before, to = %after, "phase change");
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Enqueue {
                sender,
                skill,
                targets,
                reply,
            } => {
                let result = self
                    .controller
                    .enqueue_action(sender, &skill, &targets)
                    .map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Enqueue reply channel closed (caller dropped)");
                }
            }
            Command::Input { input, reply } => {
                let handled = self.controller.handle_input(input);
                if reply.send(handled).is_err() {
                    debug!(target: "runtime::worker", "Input reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.snapshot()).is_err() {
                    debug!(target: "runtime::worker", "Snapshot reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            state: self.controller.state(),
            outcome: self.controller.outcome(),
            allies: self
                .controller
                .allies()
                .iter()
                .map(|e| e.combatant().snapshot())
                .collect(),
            enemies: self
                .controller
                .enemies()
                .iter()
                .map(|e| e.combatant().snapshot())
                .collect(),
            queue_len: self.controller.queue_len(),
            ticks: self.ticks,
        }
    }

    fn report(&self) -> BattleReport {
        BattleReport {
            outcome: self.controller.outcome(),
            ticks: self.ticks,
            elapsed: self.ticks as f32 * self.config.tick,
            experience: self.controller.experience_reward(),
            survivors: self
                .controller
                .allies()
                .iter()
                .chain(self.controller.enemies())
                .filter(|e| e.is_alive())
                .map(|e| e.combatant().snapshot())
                .collect(),
        }
    }
}

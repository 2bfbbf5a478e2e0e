//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving player-controlled combatants or streaming events from specific
//! topics.
use std::collections::HashMap;

use battle_core::{BattleEvent, BattleInput, CombatantId, SkillId};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::BattleSnapshot;
use super::errors::{Result, RuntimeError};
use crate::events::{EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with a running battle
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Queue an action for `sender` against `targets`.
    ///
    /// `Ok(false)` means the core declined it (not in combat, sender not
    /// ready, skill not usable, no targets).
    pub async fn enqueue(
        &self,
        sender: CombatantId,
        skill: SkillId,
        targets: Vec<CombatantId>,
    ) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Enqueue {
                sender,
                skill,
                targets,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Forward a global input; returns whether the battle consumed it.
    pub async fn input(&self, input: BattleInput) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Input {
                input,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Query the current battle state (read-only snapshot)
    pub async fn snapshot(&self) -> Result<BattleSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Battle` - phase transitions and outcome
    /// - `Topic::Combatant` - HP/AP/cooldown/status changes
    /// - `Topic::Queue` - queue entries as they resolve
    /// - `Topic::Roster` - participants added or removed
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<BattleEvent> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<BattleEvent>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

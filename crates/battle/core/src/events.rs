//! Outbound notifications and the listener seam.
//!
//! The controller buffers events while it mutates state and flushes them to
//! every registered [`BattleListener`] at the end of each public call, so
//! listeners never observe a half-applied hit.

use std::sync::{Arc, Mutex};

use crate::combatant::{CombatantId, CombatantSnapshot, Side};
use crate::controller::{BattleOutcome, BattleSequence, BattleState};
use crate::entity::BattleRow;
use crate::status::StatusId;

/// Per-combatant state change.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateAlteredKind {
    HpChanged { delta: f32, hp: f32 },
    ApChanged { delta: f32, ap: f32 },
    Died,
    Resurrected,
    CooldownSet { seconds: f32 },
    CooldownExpired,
    StatusApplied { status: StatusId },
    StatusRemoved { status: StatusId },
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEvent {
    StateChanged {
        state: BattleState,
        outcome: BattleOutcome,
        allies: Vec<CombatantSnapshot>,
        enemies: Vec<CombatantSnapshot>,
    },
    CombatantAltered {
        combatant: CombatantId,
        kind: StateAlteredKind,
    },
    /// The queue entry about to resolve.
    SequenceProcessed(BattleSequence),
    EntityAdded {
        combatant: CombatantId,
        side: Side,
        row: BattleRow,
        column: usize,
    },
    EntityRemoved {
        combatant: CombatantId,
    },
}

impl BattleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BattleEvent::StateChanged { .. } => "state_changed",
            BattleEvent::CombatantAltered { .. } => "combatant_altered",
            BattleEvent::SequenceProcessed(_) => "sequence_processed",
            BattleEvent::EntityAdded { .. } => "entity_added",
            BattleEvent::EntityRemoved { .. } => "entity_removed",
        }
    }
}

/// Observer registered on a controller.
pub trait BattleListener: Send {
    fn on_event(&mut self, event: &BattleEvent);
}

impl<F> BattleListener for F
where
    F: FnMut(&BattleEvent) + Send,
{
    fn on_event(&mut self, event: &BattleEvent) {
        self(event)
    }
}

/// Listener that keeps every event; clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<BattleEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BattleEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn take(&self) -> Vec<BattleEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl BattleListener for EventRecorder {
    fn on_event(&mut self, event: &BattleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

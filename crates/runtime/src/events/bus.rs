//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use battle_core::BattleEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Battle phase transitions and outcome
    Battle,
    /// Per-combatant HP/AP/cooldown/status changes
    Combatant,
    /// Queue entries as they start resolving
    Queue,
    /// Participants joining or leaving the battle
    Roster,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Battle, Topic::Combatant, Topic::Queue, Topic::Roster];

    /// Topic a core event is routed to.
    pub fn of(event: &BattleEvent) -> Topic {
        match event {
            BattleEvent::StateChanged { .. } => Topic::Battle,
            BattleEvent::CombatantAltered { .. } => Topic::Combatant,
            BattleEvent::SequenceProcessed(_) => Topic::Queue,
            BattleEvent::EntityAdded { .. } | BattleEvent::EntityRemoved { .. } => Topic::Roster,
        }
    }

    const fn index(self) -> usize {
        match self {
            Topic::Battle => 0,
            Topic::Combatant => 1,
            Topic::Queue => 2,
            Topic::Roster => 3,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels are created up front, one per topic.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<[broadcast::Sender<BattleEvent>; 4]>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Topic::ALL.map(|_| broadcast::channel(capacity).0)),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: BattleEvent) {
        let topic = Topic::of(&event);
        if self.channels[topic.index()].send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<BattleEvent> {
        self.channels[topic.index()].subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<BattleEvent>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels[topic.index()].receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{CombatantId, StateAlteredKind};

    use super::*;

    #[test]
    fn events_only_reach_their_topic() {
        let bus = EventBus::new();
        let mut combatants = bus.subscribe(Topic::Combatant);
        let mut roster = bus.subscribe(Topic::Roster);

        let died = BattleEvent::CombatantAltered {
            combatant: CombatantId(3),
            kind: StateAlteredKind::Died,
        };
        bus.publish(died.clone());
        bus.publish(BattleEvent::EntityRemoved {
            combatant: CombatantId(3),
        });

        assert_eq!(combatants.try_recv().unwrap(), died);
        assert!(combatants.try_recv().is_err());
        assert!(matches!(
            roster.try_recv().unwrap(),
            BattleEvent::EntityRemoved { .. }
        ));
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::with_capacity(0);
        bus.publish(BattleEvent::EntityRemoved {
            combatant: CombatantId(1),
        });
        assert_eq!(bus.subscriber_count(Topic::Roster), 0);
    }
}

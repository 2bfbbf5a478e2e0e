//! Bridge from the core listener seam onto the bus.

use battle_core::{BattleEvent, BattleListener};

use super::EventBus;

/// Republishes every core event on the bus under its topic.
pub struct BusListener {
    bus: EventBus,
}

impl BusListener {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl BattleListener for BusListener {
    fn on_event(&mut self, event: &BattleEvent) {
        self.bus.publish(event.clone());
    }
}

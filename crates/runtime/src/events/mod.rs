//! Topic-based event bus for battle events.
//!
//! Core events are published to the topic they belong to, and consumers can
//! subscribe only to the topics they need.

mod bus;
mod listener;

pub use bus::{EventBus, Topic};
pub use listener::BusListener;

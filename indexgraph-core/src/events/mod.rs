//! Graph Events
//!
//! The engine announces every change to registered listeners: node and
//! relationship creation and deletion, property changes, and engine start and
//! stop. The index node is built entirely on these events.

mod handler;
mod listener;

pub use handler::EventHandler;
pub use listener::{EventListener, ListenerId};

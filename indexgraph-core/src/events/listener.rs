//! Listener types for graph events.
//!
//! A listener is anything that wants to hear about graph changes or engine
//! lifecycle. All callbacks default to doing nothing, so a listener only
//! implements the events it cares about.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::error::GraphResult;
use crate::graph::{GraphDb, Node, NodeId, Relationship};

/// Unique identifier for a listener.
///
/// The event handler uses this ID to avoid duplicate registrations and to
/// remove listeners again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives graph events from an [`EventHandler`](super::EventHandler).
///
/// Callbacks run after the engine has released its locks, so they may read
/// and mutate the graph. Returning an error aborts the dispatch and fails the
/// operation that triggered it.
pub trait EventListener: Send + Sync {
    /// Get the listener's unique ID.
    fn listener_id(&self) -> ListenerId;

    /// A node was created.
    fn on_node_created(&self, _db: &GraphDb, _node: &Node) -> GraphResult<()> {
        Ok(())
    }

    /// A node was deleted. Its relationships are already gone.
    fn on_node_deleted(&self, _db: &GraphDb, _node: &Node) -> GraphResult<()> {
        Ok(())
    }

    fn on_relationship_created(&self, _db: &GraphDb, _rel: &Relationship) -> GraphResult<()> {
        Ok(())
    }

    fn on_relationship_deleted(&self, _db: &GraphDb, _rel: &Relationship) -> GraphResult<()> {
        Ok(())
    }

    /// A property changed. `old` is `None` when the property was new.
    fn on_property_changed(
        &self,
        _db: &GraphDb,
        _node: NodeId,
        _key: &str,
        _old: Option<&Value>,
        _new: &Value,
    ) -> GraphResult<()> {
        Ok(())
    }

    /// The engine started.
    fn on_started(&self, _db: &GraphDb) -> GraphResult<()> {
        Ok(())
    }

    /// The engine is about to stop.
    fn on_stopped(&self, _db: &GraphDb) -> GraphResult<()> {
        Ok(())
    }
}

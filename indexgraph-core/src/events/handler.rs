//! Event Handler
//!
//! The event handler is the registry of listeners for one graph engine. The
//! engine calls one of its dispatch methods after every change.
//!
//! # How It Works
//!
//! 1. Listeners are registered with [`EventHandler::add`] and removed with
//!    [`EventHandler::remove`].
//!
//! 2. On dispatch, the handler copies the current listener list and releases
//!    its lock before invoking anyone. A listener may therefore add or remove
//!    listeners, or mutate the graph, while handling an event. Changes to the
//!    list take effect from the next dispatch.
//!
//! 3. Listeners run in registration order. The first error stops the
//!    dispatch and is returned to the engine.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::listener::{EventListener, ListenerId};
use crate::error::GraphResult;
use crate::graph::{GraphDb, Node, NodeId, Relationship};

/// Registry of event listeners.
#[derive(Default)]
pub struct EventHandler {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    ///
    /// Returns `false` if a listener with the same ID is already registered.
    pub fn add(&self, listener: Arc<dyn EventListener>) -> bool {
        let id = listener.listener_id();
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| l.listener_id() == id) {
            return false;
        }
        listeners.push(listener);
        debug!(listener = ?id, "listener added");
        true
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| l.listener_id() != id);
        let removed = listeners.len() != before;
        if removed {
            debug!(listener = ?id, "listener removed");
        }
        removed
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.read().iter().any(|l| l.listener_id() == id)
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn EventListener>> {
        self.listeners.read().clone()
    }

    fn dispatch<F>(&self, mut f: F) -> GraphResult<()>
    where
        F: FnMut(&dyn EventListener) -> GraphResult<()>,
    {
        // The lock is released before any listener runs.
        for listener in self.snapshot() {
            f(listener.as_ref())?;
        }
        Ok(())
    }

    pub fn node_created(&self, db: &GraphDb, node: &Node) -> GraphResult<()> {
        self.dispatch(|l| l.on_node_created(db, node))
    }

    pub fn node_deleted(&self, db: &GraphDb, node: &Node) -> GraphResult<()> {
        self.dispatch(|l| l.on_node_deleted(db, node))
    }

    pub fn relationship_created(&self, db: &GraphDb, rel: &Relationship) -> GraphResult<()> {
        self.dispatch(|l| l.on_relationship_created(db, rel))
    }

    pub fn relationship_deleted(&self, db: &GraphDb, rel: &Relationship) -> GraphResult<()> {
        self.dispatch(|l| l.on_relationship_deleted(db, rel))
    }

    pub fn property_changed(
        &self,
        db: &GraphDb,
        node: NodeId,
        key: &str,
        old: Option<&Value>,
        new: &Value,
    ) -> GraphResult<()> {
        self.dispatch(|l| l.on_property_changed(db, node, key, old, new))
    }

    pub fn started(&self, db: &GraphDb) -> GraphResult<()> {
        self.dispatch(|l| l.on_started(db))
    }

    pub fn stopped(&self, db: &GraphDb) -> GraphResult<()> {
        self.dispatch(|l| l.on_stopped(db))
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("listeners", &self.len())
            .finish()
    }
}

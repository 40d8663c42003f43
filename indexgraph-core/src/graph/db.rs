//! Graph Engine
//!
//! `GraphDb` is the host engine the index node plugs into. It owns the graph
//! state, the event handler and the engine lifecycle.
//!
//! # Lifecycle
//!
//! 1. `GraphDb::new` builds a stopped engine. When the configuration enables
//!    it, the index node lifecycle listener is registered here.
//!
//! 2. `start` loads the snapshot (if one is configured and present), marks
//!    the engine running and announces `on_started`.
//!
//! 3. Mutations are only accepted while running. Each one runs in a
//!    transaction and announces its event after the state lock is released.
//!
//! 4. `stop` marks the engine stopped, announces `on_stopped` and writes the
//!    snapshot.
//!
//! # Thread Safety
//!
//! State and listeners sit behind `parking_lot` locks that are never held
//! while a listener runs. Transactions are tracked per thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use super::node::{Node, NodeClass, NodeId};
use super::relationship::{Direction, Relationship, RelationshipId, RelationshipType};
use super::store::GraphState;
use crate::config::Config;
use crate::error::{GraphError, GraphResult};
use crate::events::EventHandler;
use crate::index_node::{IndexNode, IndexNodeLifecycle};
use crate::transaction::{self, Transaction, UndoOp};

/// Counter for generating engine instance IDs.
static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An in-process graph engine.
pub struct GraphDb {
    /// Identifies this engine in the thread-local transaction stack.
    instance: u64,

    config: Config,

    state: RwLock<GraphState>,

    running: AtomicBool,

    events: EventHandler,

    /// Present when the index node is enabled.
    index: Option<Arc<IndexNodeLifecycle>>,

    this: Weak<GraphDb>,
}

impl GraphDb {
    /// Build a stopped engine.
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new_cyclic(|this| {
            let index = config
                .index_node
                .enabled
                .then(|| Arc::new(IndexNodeLifecycle::new(&config.index_node.relation)));

            let db = Self {
                instance: INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed),
                config,
                state: RwLock::new(GraphState::new()),
                running: AtomicBool::new(false),
                events: EventHandler::new(),
                index,
                this: this.clone(),
            };

            if let Some(lifecycle) = &db.index {
                db.events.add(lifecycle.clone());
            }
            db
        })
    }

    pub(crate) fn instance_id(&self) -> u64 {
        self.instance
    }

    /// A weak handle to this engine.
    pub fn handle(&self) -> Weak<GraphDb> {
        self.this.clone()
    }

    /// The engine's event handler.
    pub fn event_handler(&self) -> &EventHandler {
        &self.events
    }

    /// The cached index node, `None` while stopped or when disabled.
    pub fn index_node(&self) -> Option<Arc<IndexNode>> {
        self.index.as_ref().and_then(|lifecycle| lifecycle.instance())
    }

    /// Start the engine.
    pub fn start(&self) -> GraphResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GraphError::AlreadyRunning);
        }

        if let Some(path) = &self.config.storage_path {
            if path.exists() {
                let loaded = match GraphState::load(path) {
                    Ok(state) => state,
                    Err(err) => {
                        self.running.store(false, Ordering::SeqCst);
                        return Err(err);
                    }
                };
                *self.state.write() = loaded;
                info!(path = %path.display(), "graph snapshot loaded");
            }
        }

        info!(
            nodes = self.node_count(),
            relationships = self.relationship_count(),
            "graph engine started"
        );

        if let Err(err) = self.events.started(self) {
            // Listeners that already ran may have cached state; release it.
            if let Some(lifecycle) = &self.index {
                lifecycle.release(self);
            }
            self.running.store(false, Ordering::SeqCst);
            return Err(err);
        }
        Ok(())
    }

    /// Stop the engine.
    ///
    /// Mutations are rejected before `on_stopped` is announced, so listeners
    /// see a stopped engine.
    pub fn stop(&self) -> GraphResult<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(GraphError::NotRunning);
        }
        if let Err(err) = self.events.stopped(self) {
            self.running.store(true, Ordering::SeqCst);
            return Err(err);
        }

        if let Some(path) = &self.config.storage_path {
            self.state.read().save(path)?;
            info!(path = %path.display(), "graph snapshot written");
        }
        info!("graph engine stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> GraphResult<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(GraphError::NotRunning)
        }
    }

    /// The engine-owned reference node.
    pub fn ref_node(&self) -> NodeId {
        NodeId::REFERENCE
    }

    /// Get a copy of a node.
    pub fn node(&self, id: NodeId) -> GraphResult<Node> {
        self.state
            .read()
            .node(id)
            .cloned()
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub fn relationship(&self, id: RelationshipId) -> GraphResult<Relationship> {
        self.state
            .read()
            .relationship(id)
            .cloned()
            .ok_or(GraphError::RelationshipNotFound(id))
    }

    /// Create a node and announce it to listeners.
    ///
    /// Node creation and everything listeners do in response share one
    /// transaction. The returned copy reflects the node after listeners ran.
    pub fn create_node(&self, class: NodeClass) -> GraphResult<Node> {
        self.ensure_running()?;
        Transaction::run(self, || {
            let node = self.state.write().add_node(class);
            transaction::record(self.instance, UndoOp::CreateNode(node.id()));
            debug!(node = %node.id(), class = node.class().name(), "node created");

            self.events.node_created(self, &node)?;
            self.node(node.id())
        })
    }

    /// Delete a node and all of its relationships.
    pub fn delete_node(&self, id: NodeId) -> GraphResult<()> {
        self.ensure_running()?;
        if id == NodeId::REFERENCE {
            return Err(GraphError::ReferenceNodeDeletion);
        }
        Transaction::run(self, || {
            let rels = self.relationships(id, Direction::Both, None)?;
            for rel in rels {
                self.delete_relationship(rel.id())?;
            }

            let (node, _) = self
                .state
                .write()
                .remove_node(id)
                .ok_or(GraphError::NodeNotFound(id))?;
            transaction::record(self.instance, UndoOp::DeleteNode(node.clone()));
            debug!(node = %id, "node deleted");

            self.events.node_deleted(self, &node)
        })
    }

    /// Set a node property.
    pub fn set_property(&self, id: NodeId, key: &str, value: impl Into<Value>) -> GraphResult<()> {
        self.ensure_running()?;
        let value = value.into();
        Transaction::run(self, || {
            let previous = self.state.write().set_property(id, key, value.clone())?;
            transaction::record(
                self.instance,
                UndoOp::SetProperty {
                    node: id,
                    key: key.to_string(),
                    previous: previous.clone(),
                },
            );
            self.events
                .property_changed(self, id, key, previous.as_ref(), &value)
        })
    }

    /// Get a node property.
    pub fn property(&self, id: NodeId, key: &str) -> GraphResult<Option<Value>> {
        self.state
            .read()
            .node(id)
            .map(|node| node.property(key).cloned())
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Create a relationship `start -[rtype]-> end`.
    pub fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        rtype: RelationshipType,
    ) -> GraphResult<Relationship> {
        self.ensure_running()?;
        Transaction::run(self, || {
            let rel = self.state.write().add_relationship(start, end, rtype)?;
            transaction::record(self.instance, UndoOp::CreateRelationship(rel.id()));
            debug!(rel = %rel.id(), rtype = %rel.rtype(), start = %start, end = %end, "relationship created");

            self.events.relationship_created(self, &rel)?;
            Ok(rel)
        })
    }

    pub fn delete_relationship(&self, id: RelationshipId) -> GraphResult<()> {
        self.ensure_running()?;
        Transaction::run(self, || {
            let rel = self
                .state
                .write()
                .remove_relationship(id)
                .ok_or(GraphError::RelationshipNotFound(id))?;
            transaction::record(self.instance, UndoOp::DeleteRelationship(rel.clone()));
            debug!(rel = %id, "relationship deleted");

            self.events.relationship_deleted(self, &rel)
        })
    }

    /// Relationships of a node, optionally filtered by type.
    pub fn relationships(
        &self,
        id: NodeId,
        direction: Direction,
        rtype: Option<&RelationshipType>,
    ) -> GraphResult<Vec<Relationship>> {
        self.state.read().relationships(id, direction, rtype)
    }

    /// Whether a node has at least one relationship of the given type.
    pub fn has_relationship(
        &self,
        id: NodeId,
        direction: Direction,
        rtype: &RelationshipType,
    ) -> GraphResult<bool> {
        Ok(!self.relationships(id, direction, Some(rtype))?.is_empty())
    }

    /// Total number of nodes, including the reference node.
    pub fn node_count(&self) -> usize {
        self.state.read().node_count()
    }

    pub fn relationship_count(&self) -> usize {
        self.state.read().relationship_count()
    }

    /// Replay an undo log, newest entry first. No events are announced, so
    /// the index node cache is brought back in line with the graph afterwards.
    pub(crate) fn rollback(&self, undo: Vec<UndoOp>) {
        self.replay(undo);
        if let Some(lifecycle) = &self.index {
            lifecycle.resync(self);
        }
    }

    fn replay(&self, undo: Vec<UndoOp>) {
        let mut state = self.state.write();
        for op in undo.into_iter().rev() {
            match op {
                UndoOp::CreateNode(id) => {
                    state.remove_node(id);
                }
                UndoOp::DeleteNode(node) => state.insert_node(node),
                UndoOp::CreateRelationship(id) => {
                    state.remove_relationship(id);
                }
                UndoOp::DeleteRelationship(rel) => state.insert_relationship(rel),
                UndoOp::SetProperty {
                    node,
                    key,
                    previous,
                } => state.restore_property(node, &key, previous),
            }
        }
    }
}

impl std::fmt::Debug for GraphDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphDb")
            .field("instance", &self.instance)
            .field("running", &self.is_running())
            .field("nodes", &self.node_count())
            .field("relationships", &self.relationship_count())
            .finish()
    }
}

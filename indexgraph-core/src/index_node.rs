//! Index Node
//!
//! The index node is a well-known node that every newly created domain node
//! is linked to. Walking the outgoing relationships of the index node
//! enumerates every domain node in the graph, which is what reindexing and
//! "all instances of a class" lookups rely on.
//!
//! # How It Works
//!
//! Two listeners cooperate:
//!
//! 1. [`IndexNodeLifecycle`] is registered with the engine when the engine
//!    is built. On start it finds the index node through the reference node's
//!    `index_node` relationship, creating and linking one the first time.
//!    It caches the node as an [`IndexNode`] and registers that as a listener.
//!    On stop it unregisters the instance and drops the cache.
//!
//! 2. [`IndexNode`] listens for node creation and connects itself to every
//!    new node. The relationship type is the root class of the new node, so
//!    all nodes of one class hierarchy share a type.
//!
//! ```text
//! (reference) -[index_node]-> (IndexNode) -[Person]-> (alice)
//!                                         -[Person]-> (bob: Employee)
//!                                         -[Company]-> (acme)
//! ```

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{GraphError, GraphResult};
use crate::events::{EventListener, ListenerId};
use crate::graph::{Direction, GraphDb, Node, NodeClass, NodeId, RelationshipType};
use crate::transaction::Transaction;

/// Class name of the index node.
pub const INDEX_NODE_CLASS: &str = "IndexNode";

/// The cached index node.
pub struct IndexNode {
    id: NodeId,
    listener: ListenerId,
    db: Weak<GraphDb>,
}

impl IndexNode {
    fn new(id: NodeId, db: Weak<GraphDb>) -> Self {
        Self {
            id,
            listener: ListenerId::new(),
            db,
        }
    }

    /// The index node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn db(&self) -> GraphResult<Arc<GraphDb>> {
        self.db.upgrade().ok_or(GraphError::NotRunning)
    }

    /// Connect the index node with `node`.
    ///
    /// The relationship type is the root class of the node's class.
    pub fn connect(&self, node: &Node) -> GraphResult<()> {
        let rtype = RelationshipType::instance(node.class().root_class());
        self.connect_as(node.id(), rtype)
    }

    /// Connect the index node with `node` using an explicit relationship type.
    pub fn connect_as(&self, node: NodeId, rtype: RelationshipType) -> GraphResult<()> {
        let db = self.db()?;
        Transaction::run(&db, || {
            db.create_relationship(self.id, node, rtype)?;
            Ok(())
        })
    }

    /// Every node reachable from the index node, in connection order.
    pub fn nodes(&self) -> GraphResult<Vec<NodeId>> {
        self.collect(None)
    }

    /// Nodes connected under the given root class.
    pub fn nodes_of(&self, root_class: &str) -> GraphResult<Vec<NodeId>> {
        self.collect(Some(&RelationshipType::instance(root_class)))
    }

    fn collect(&self, rtype: Option<&RelationshipType>) -> GraphResult<Vec<NodeId>> {
        Ok(self
            .db()?
            .relationships(self.id, Direction::Outgoing, rtype)?
            .into_iter()
            .map(|rel| rel.end())
            .collect())
    }
}

impl EventListener for IndexNode {
    fn listener_id(&self) -> ListenerId {
        self.listener
    }

    fn on_node_created(&self, _db: &GraphDb, node: &Node) -> GraphResult<()> {
        // Never connect to ourself.
        if node.id() == self.id {
            return Ok(());
        }
        self.connect(node)
    }
}

impl PartialEq for IndexNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for IndexNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexNode").field("id", &self.id).finish()
    }
}

/// Engine lifecycle listener that owns the cached [`IndexNode`].
pub struct IndexNodeLifecycle {
    id: ListenerId,
    relation: RelationshipType,
    instance: RwLock<Option<Arc<IndexNode>>>,
}

impl IndexNodeLifecycle {
    /// `relation` is the relationship type from the reference node to the
    /// index node.
    pub fn new(relation: &str) -> Self {
        Self {
            id: ListenerId::new(),
            relation: RelationshipType::instance(relation),
            instance: RwLock::new(None),
        }
    }

    /// The cached index node, `None` while the engine is stopped.
    pub fn instance(&self) -> Option<Arc<IndexNode>> {
        self.instance.read().clone()
    }

    /// Find the index node linked from the reference node, creating and
    /// linking a new one if there is none.
    fn find_or_create(&self, db: &GraphDb) -> GraphResult<NodeId> {
        let ref_node = db.ref_node();
        Transaction::run(db, || {
            let existing = db.relationships(ref_node, Direction::Outgoing, Some(&self.relation))?;
            if let Some(rel) = existing.first() {
                info!(node = %rel.end(), "reusing index node");
                return Ok(rel.end());
            }

            let node = db.create_node(NodeClass::new(INDEX_NODE_CLASS))?;
            db.create_relationship(ref_node, node.id(), self.relation.clone())?;
            info!(node = %node.id(), relation = %self.relation, "index node created");
            Ok(node.id())
        })
    }

    /// Cache the index node `id` and register it as a listener, replacing
    /// any previously cached instance.
    fn register(&self, db: &GraphDb, id: NodeId) {
        let index = Arc::new(IndexNode::new(id, db.handle()));
        db.event_handler().add(index.clone());

        let previous = self.instance.write().replace(index);
        if let Some(previous) = previous {
            db.event_handler().remove(previous.listener);
        }
    }

    /// Unregister and drop the cached instance.
    pub(crate) fn release(&self, db: &GraphDb) {
        let released = self.instance.write().take();
        if let Some(index) = released {
            db.event_handler().remove(index.listener);
            debug!(node = %index.id, "index node unregistered");
        }
    }

    /// Bring the cache back in line with the graph after a rollback.
    ///
    /// While running, the cached instance must be the node linked from the
    /// reference node. Rollback restores graph state without events, so a
    /// rolled-back delete of the index node is only visible here.
    pub(crate) fn resync(&self, db: &GraphDb) {
        if !db.is_running() {
            return;
        }
        let linked = db
            .relationships(db.ref_node(), Direction::Outgoing, Some(&self.relation))
            .ok()
            .and_then(|rels| rels.first().map(|rel| rel.end()));
        let cached = self.instance().map(|index| index.id);
        if linked == cached {
            return;
        }

        match linked {
            Some(id) => {
                info!(node = %id, "index node restored after rollback");
                self.register(db, id);
            }
            None => self.release(db),
        }
    }
}

impl EventListener for IndexNodeLifecycle {
    fn listener_id(&self) -> ListenerId {
        self.id
    }

    fn on_started(&self, db: &GraphDb) -> GraphResult<()> {
        let id = self.find_or_create(db)?;
        self.register(db, id);
        Ok(())
    }

    fn on_stopped(&self, db: &GraphDb) -> GraphResult<()> {
        self.release(db);
        Ok(())
    }

    fn on_node_deleted(&self, db: &GraphDb, node: &Node) -> GraphResult<()> {
        let mut instance = self.instance.write();
        if instance.as_ref().is_some_and(|index| index.id == node.id()) {
            if let Some(index) = instance.take() {
                db.event_handler().remove(index.listener);
            }
            warn!(node = %node.id(), "index node deleted; new nodes are no longer indexed");
        }
        Ok(())
    }
}

//! Transactions
//!
//! A transaction groups graph mutations so they either all stay or are all
//! undone. `Transaction::run` is the only entry point:
//!
//! - If this thread already has a transaction open for the engine, the body
//!   joins it and the outer transaction decides the outcome.
//! - Otherwise a new transaction is opened. When the body returns `Ok` the
//!   transaction commits. When it returns `Err` every mutation recorded while
//!   it was open is undone, newest first, and the error is returned.
//!
//! Rollback restores graph state only. Events that were already dispatched
//! are not retracted.

mod context;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::GraphResult;
use crate::graph::{GraphDb, Node, NodeId, Relationship, RelationshipId};

pub(crate) use context::record;

/// Inverse of one graph mutation.
#[derive(Debug, Clone)]
pub(crate) enum UndoOp {
    /// A node was created; undo removes it.
    CreateNode(NodeId),
    /// A node was deleted; undo puts it back.
    DeleteNode(Node),
    /// A relationship was created; undo removes it.
    CreateRelationship(RelationshipId),
    /// A relationship was deleted; undo puts it back.
    DeleteRelationship(Relationship),
    /// A property was set; undo restores the previous value.
    SetProperty {
        node: NodeId,
        key: String,
        previous: Option<Value>,
    },
}

/// Transaction scope for a graph engine.
pub struct Transaction;

impl Transaction {
    /// Run `f` inside a transaction on `db`.
    pub fn run<T, F>(db: &GraphDb, f: F) -> GraphResult<T>
    where
        F: FnOnce() -> GraphResult<T>,
    {
        let db_id = db.instance_id();
        if context::is_active_for(db_id) {
            return f();
        }

        let scope = context::TxScope::enter(db_id);
        let result = f();
        let undo = scope.finish();

        match result {
            Ok(value) => {
                debug!(ops = undo.len(), "transaction committed");
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, ops = undo.len(), "transaction rolled back");
                db.rollback(undo);
                Err(err)
            }
        }
    }

    /// Whether any transaction is open on this thread.
    pub fn is_active() -> bool {
        context::is_active()
    }

    /// Whether a transaction for `db` is open on this thread.
    pub fn is_active_for(db: &GraphDb) -> bool {
        context::is_active_for(db.instance_id())
    }

    /// Number of transactions open on this thread, across engines.
    pub fn depth() -> usize {
        context::depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::GraphError;
    use crate::graph::{Direction, NodeClass, RelationshipType};

    fn running_db() -> std::sync::Arc<GraphDb> {
        let db = GraphDb::new(Config::default().without_index_node());
        db.start().unwrap();
        db
    }

    #[test]
    fn commit_keeps_mutations() {
        let db = running_db();

        let id = Transaction::run(&db, || {
            assert!(Transaction::is_active_for(&db));
            let node = db.create_node(NodeClass::new("Person"))?;
            db.set_property(node.id(), "name", "Alice")?;
            Ok(node.id())
        })
        .unwrap();

        assert!(!Transaction::is_active());
        assert_eq!(
            db.property(id, "name").unwrap(),
            Some(Value::from("Alice"))
        );
    }

    #[test]
    fn error_rolls_back_everything() {
        let db = running_db();
        let keep = db.create_node(NodeClass::new("Person")).unwrap();
        db.set_property(keep.id(), "name", "Alice").unwrap();

        let result: GraphResult<()> = Transaction::run(&db, || {
            let node = db.create_node(NodeClass::new("Person"))?;
            db.create_relationship(keep.id(), node.id(), RelationshipType::instance("KNOWS"))?;
            db.set_property(keep.id(), "name", "Bob")?;
            db.set_property(keep.id(), "age", 42)?;
            Err(GraphError::NodeNotFound(NodeId::from(999)))
        });

        assert!(result.is_err());
        assert_eq!(db.node_count(), 2);
        assert_eq!(db.relationship_count(), 0);
        assert_eq!(
            db.property(keep.id(), "name").unwrap(),
            Some(Value::from("Alice"))
        );
        assert_eq!(db.property(keep.id(), "age").unwrap(), None);
    }

    #[test]
    fn rollback_restores_deleted_node_and_relationships() {
        let db = running_db();
        let a = db.create_node(NodeClass::new("Person")).unwrap().id();
        let b = db.create_node(NodeClass::new("Person")).unwrap().id();
        db.create_relationship(a, b, RelationshipType::instance("KNOWS"))
            .unwrap();

        let result: GraphResult<()> = Transaction::run(&db, || {
            db.delete_node(b)?;
            Err(GraphError::NotRunning)
        });

        assert!(result.is_err());
        assert!(db.node(b).is_ok());
        let rels = db.relationships(a, Direction::Outgoing, None).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].end(), b);
    }

    #[test]
    fn nested_run_joins_outer_transaction() {
        let db = running_db();

        let result: GraphResult<()> = Transaction::run(&db, || {
            Transaction::run(&db, || {
                assert_eq!(Transaction::depth(), 1);
                db.create_node(NodeClass::new("Person"))?;
                Ok(())
            })?;
            Err(GraphError::NotRunning)
        });

        assert!(result.is_err());
        // Only the reference node survives the outer rollback.
        assert_eq!(db.node_count(), 1);
    }
}

//! IndexGraph Core
//!
//! This crate keeps an "index node" for an object-to-graph mapping layer:
//! one well-known node that every newly created domain node is linked to, so
//! the full set of domain nodes can be enumerated by walking relationships
//! from it.
//!
//! It implements:
//!
//! - An in-process property graph engine with a reference node
//! - Event dispatch for graph changes and engine lifecycle
//! - Thread-scoped transactions with rollback
//! - The index node lifecycle and creation listeners
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Nodes, relationships and the `GraphDb` engine
//! - `events`: Listener trait and the per-engine event handler
//! - `transaction`: Transaction scope and undo log
//! - `index_node`: The index node and its lifecycle listener
//! - `config`: JSON configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use indexgraph_core::{Config, GraphDb, NodeClass};
//!
//! let db = GraphDb::new(Config::default());
//! db.start()?;
//!
//! let person = NodeClass::new("Person");
//! let alice = db.create_node(person.clone())?;
//! let bob = db.create_node(person.subclass("Employee"))?;
//!
//! // Both hang off the index node under their root class.
//! let index = db.index_node().unwrap();
//! assert_eq!(index.nodes_of("Person")?, vec![alice.id(), bob.id()]);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod index_node;
pub mod transaction;

pub use config::{Config, IndexNodeConfig};
pub use error::{GraphError, GraphResult};
pub use events::{EventHandler, EventListener, ListenerId};
pub use graph::{Direction, GraphDb, Node, NodeClass, NodeId, Relationship, RelationshipId, RelationshipType};
pub use index_node::{IndexNode, IndexNodeLifecycle, INDEX_NODE_CLASS};
pub use transaction::Transaction;

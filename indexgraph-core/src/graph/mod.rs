//! Property Graph
//!
//! This module implements the in-process graph engine the index node runs on.
//!
//! # Overview
//!
//! The graph is a directed multigraph where:
//!
//! - Nodes carry a mapped class and a property map
//! - Relationships are typed and point from a start node to an end node
//! - Node 0 is the reference node, created with every graph and never deleted
//!
//! # Design Decisions
//!
//! 1. Nodes and relationships live in insertion-ordered maps keyed by ID, so
//!    lookups are O(1) and traversal order is stable across snapshots.
//!
//! 2. Every node keeps both its outgoing and incoming relationship IDs to
//!    enable traversal in both directions.
//!
//! 3. Relationship types are interned; comparing two types compares two
//!    shared strings.

mod db;
mod node;
mod relationship;
mod store;

pub use db::GraphDb;
pub use node::{Node, NodeClass, NodeId, REFERENCE_NODE_CLASS};
pub use relationship::{Direction, Relationship, RelationshipId, RelationshipType};

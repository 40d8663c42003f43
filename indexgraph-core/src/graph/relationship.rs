//! Graph Relationships
//!
//! Relationships are directed, typed edges between two nodes.

use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Unique identifier for a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipId(u64);

impl RelationshipId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RelationshipId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// Interned relationship type names.
static TYPES: OnceLock<DashMap<String, RelationshipType>> = OnceLock::new();

fn get_types() -> &'static DashMap<String, RelationshipType> {
    TYPES.get_or_init(DashMap::new)
}

/// A relationship type.
///
/// Types are interned: every call to [`RelationshipType::instance`] with the
/// same name returns a handle to the same shared string.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RelationshipType(Arc<str>);

impl RelationshipType {
    /// Get the interned type for `name`.
    pub fn instance(name: &str) -> Self {
        if let Some(existing) = get_types().get(name) {
            return existing.clone();
        }
        get_types()
            .entry(name.to_string())
            .or_insert_with(|| Self(Arc::from(name)))
            .clone()
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<String> for RelationshipType {
    fn from(name: String) -> Self {
        Self::instance(&name)
    }
}

impl From<&str> for RelationshipType {
    fn from(name: &str) -> Self {
        Self::instance(name)
    }
}

impl From<RelationshipType> for String {
    fn from(rtype: RelationshipType) -> Self {
        rtype.0.to_string()
    }
}

impl fmt::Debug for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which relationships of a node to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Relationships starting at the node.
    Outgoing,
    /// Relationships ending at the node.
    Incoming,
    /// Both directions.
    Both,
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    id: RelationshipId,
    rtype: RelationshipType,
    start: NodeId,
    end: NodeId,
}

impl Relationship {
    pub(crate) fn new(id: RelationshipId, rtype: RelationshipType, start: NodeId, end: NodeId) -> Self {
        Self { id, rtype, start, end }
    }

    /// Get the relationship's ID.
    pub fn id(&self) -> RelationshipId {
        self.id
    }

    /// Get the relationship's type.
    pub fn rtype(&self) -> &RelationshipType {
        &self.rtype
    }

    /// The node this relationship starts at.
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// The node this relationship ends at.
    pub fn end(&self) -> NodeId {
        self.end
    }
}

//! Graph Nodes
//!
//! This module defines the node types stored in the graph.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use super::relationship::RelationshipId;

/// Class name of the engine-owned reference node.
pub const REFERENCE_NODE_CLASS: &str = "ReferenceNode";

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// The reference node always has this ID.
    pub const REFERENCE: NodeId = NodeId(0);

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The mapped class of a node.
///
/// A class knows the root of its hierarchy. The root class names the
/// relationship the index node uses to reach nodes of this class, so
/// `Employee` nodes extending `Person` hang off the index node as `Person`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeClass {
    name: String,
    root: String,
}

impl NodeClass {
    /// A root class.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root: name.clone(),
            name,
        }
    }

    /// A class extending this one. The root class is inherited.
    pub fn subclass(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: self.root.clone(),
        }
    }

    /// The class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root class of the hierarchy this class belongs to.
    pub fn root_class(&self) -> &str {
        &self.root
    }
}

/// A node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// Mapped class of this node.
    class: NodeClass,

    /// Property values keyed by name, in insertion order.
    properties: IndexMap<String, Value>,

    /// Relationships starting at this node.
    outgoing: SmallVec<[RelationshipId; 4]>,

    /// Relationships ending at this node.
    incoming: SmallVec<[RelationshipId; 4]>,
}

impl Node {
    pub(crate) fn new(id: NodeId, class: NodeClass) -> Self {
        Self {
            id,
            class,
            properties: IndexMap::new(),
            outgoing: SmallVec::new(),
            incoming: SmallVec::new(),
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's class.
    pub fn class(&self) -> &NodeClass {
        &self.class
    }

    /// Get a property value.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// All property values.
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Relationships starting at this node.
    pub fn outgoing(&self) -> &[RelationshipId] {
        &self.outgoing
    }

    /// Relationships ending at this node.
    pub fn incoming(&self) -> &[RelationshipId] {
        &self.incoming
    }

    /// Number of relationships touching this node.
    pub fn degree(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }

    pub(crate) fn set_property(&mut self, key: String, value: Value) -> Option<Value> {
        self.properties.insert(key, value)
    }

    pub(crate) fn remove_property(&mut self, key: &str) -> Option<Value> {
        self.properties.shift_remove(key)
    }

    pub(crate) fn add_outgoing(&mut self, id: RelationshipId) {
        self.outgoing.push(id);
    }

    pub(crate) fn add_incoming(&mut self, id: RelationshipId) {
        self.incoming.push(id);
    }

    pub(crate) fn remove_relationship(&mut self, id: RelationshipId) {
        self.outgoing.retain(|r| *r != id);
        self.incoming.retain(|r| *r != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subclass_keeps_root() {
        let person = NodeClass::new("Person");
        let employee = person.subclass("Employee");
        let manager = employee.subclass("Manager");

        assert_eq!(person.root_class(), "Person");
        assert_eq!(employee.name(), "Employee");
        assert_eq!(employee.root_class(), "Person");
        assert_eq!(manager.root_class(), "Person");
        assert_eq!(manager.name(), "Manager");
    }

    #[test]
    fn property_management() {
        let mut node = Node::new(NodeId::from(7), NodeClass::new("Person"));

        assert_eq!(node.set_property("name".into(), Value::from("Alice")), None);
        assert_eq!(
            node.set_property("name".into(), Value::from("Bob")),
            Some(Value::from("Alice"))
        );
        assert_eq!(node.property("name"), Some(&Value::from("Bob")));

        node.remove_property("name");
        assert!(node.property("name").is_none());
    }

    #[test]
    fn relationship_lists() {
        let mut node = Node::new(NodeId::from(1), NodeClass::new("Person"));
        let out = RelationshipId::from(10);
        let inc = RelationshipId::from(11);

        node.add_outgoing(out);
        node.add_incoming(inc);
        assert_eq!(node.degree(), 2);

        node.remove_relationship(out);
        assert!(node.outgoing().is_empty());
        assert_eq!(node.incoming(), &[inc]);
    }

    #[test]
    fn reference_id_is_zero() {
        assert_eq!(NodeId::REFERENCE.raw(), 0);
        assert_eq!(NodeId::REFERENCE.to_string(), "n0");
    }
}

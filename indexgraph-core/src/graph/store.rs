//! Graph State
//!
//! `GraphState` owns every node and relationship. It keeps both ends of a
//! relationship in sync: adding a relationship records it in the start node's
//! outgoing list and the end node's incoming list, removing it clears both.
//!
//! The state knows nothing about events or transactions. `GraphDb` wraps it in
//! a lock and layers those on top.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::{Node, NodeClass, NodeId, REFERENCE_NODE_CLASS};
use super::relationship::{Direction, Relationship, RelationshipId, RelationshipType};
use crate::error::{GraphError, GraphResult};

/// All nodes and relationships of one graph.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GraphState {
    nodes: IndexMap<NodeId, Node>,
    relationships: IndexMap<RelationshipId, Relationship>,
    next_node: u64,
    next_relationship: u64,
}

impl GraphState {
    /// A graph holding only the reference node.
    pub fn new() -> Self {
        let mut nodes = IndexMap::new();
        nodes.insert(
            NodeId::REFERENCE,
            Node::new(NodeId::REFERENCE, NodeClass::new(REFERENCE_NODE_CLASS)),
        );
        Self {
            nodes,
            relationships: IndexMap::new(),
            next_node: NodeId::REFERENCE.raw() + 1,
            next_relationship: 0,
        }
    }

    /// Read a snapshot written by [`GraphState::save`].
    pub fn load(path: &Path) -> GraphResult<Self> {
        let bytes = fs::read(path)?;
        Ok(rmp_serde::from_slice(&bytes)?)
    }

    /// Write a snapshot of the whole graph.
    pub fn save(&self, path: &Path) -> GraphResult<()> {
        let bytes = rmp_serde::to_vec_named(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Create a node and return a copy of it.
    pub fn add_node(&mut self, class: NodeClass) -> Node {
        let id = NodeId::from(self.next_node);
        self.next_node += 1;
        let node = Node::new(id, class);
        self.nodes.insert(id, node.clone());
        node
    }

    /// Put back a node removed earlier. Its relationship lists must be empty.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id(), node);
    }

    /// Remove a node.
    ///
    /// Also removes all relationships involving this node and returns them
    /// alongside the node.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<(Node, Vec<Relationship>)> {
        let rel_ids: Vec<RelationshipId> = {
            let node = self.nodes.get(&node_id)?;
            node.outgoing().iter().chain(node.incoming()).copied().collect()
        };
        let removed = rel_ids
            .into_iter()
            .filter_map(|id| self.remove_relationship(id))
            .collect();
        self.nodes
            .shift_remove(&node_id)
            .map(|node| (node, removed))
    }

    /// Get a reference to a node.
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Set a property, returning the previous value.
    pub fn set_property(&mut self, node_id: NodeId, key: &str, value: Value) -> GraphResult<Option<Value>> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        Ok(node.set_property(key.to_string(), value))
    }

    /// Put a property back to `previous`, removing it when there was none.
    pub fn restore_property(&mut self, node_id: NodeId, key: &str, previous: Option<Value>) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            match previous {
                Some(value) => {
                    node.set_property(key.to_string(), value);
                }
                None => {
                    node.remove_property(key);
                }
            }
        }
    }

    /// Add a relationship `start -[rtype]-> end`.
    pub fn add_relationship(
        &mut self,
        start: NodeId,
        end: NodeId,
        rtype: RelationshipType,
    ) -> GraphResult<Relationship> {
        for id in [start, end] {
            if !self.nodes.contains_key(&id) {
                return Err(GraphError::NodeNotFound(id));
            }
        }
        let id = RelationshipId::from(self.next_relationship);
        self.next_relationship += 1;
        let rel = Relationship::new(id, rtype, start, end);
        self.insert_relationship(rel.clone());
        Ok(rel)
    }

    /// Store a relationship and link it from both of its nodes.
    pub fn insert_relationship(&mut self, rel: Relationship) {
        if let Some(start) = self.nodes.get_mut(&rel.start()) {
            start.add_outgoing(rel.id());
        }
        if let Some(end) = self.nodes.get_mut(&rel.end()) {
            end.add_incoming(rel.id());
        }
        self.relationships.insert(rel.id(), rel);
    }

    /// Remove a relationship and unlink it from both of its nodes.
    pub fn remove_relationship(&mut self, rel_id: RelationshipId) -> Option<Relationship> {
        let rel = self.relationships.shift_remove(&rel_id)?;
        for node_id in [rel.start(), rel.end()] {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.remove_relationship(rel_id);
            }
        }
        Some(rel)
    }

    pub fn relationship(&self, rel_id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&rel_id)
    }

    /// Relationships of a node in the given direction, optionally filtered by
    /// type. Outgoing relationships come first when `direction` is `Both`.
    pub fn relationships(
        &self,
        node_id: NodeId,
        direction: Direction,
        rtype: Option<&RelationshipType>,
    ) -> GraphResult<Vec<Relationship>> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;

        let ids: Vec<RelationshipId> = match direction {
            Direction::Outgoing => node.outgoing().to_vec(),
            Direction::Incoming => node.incoming().to_vec(),
            Direction::Both => node.outgoing().iter().chain(node.incoming()).copied().collect(),
        };

        Ok(ids
            .into_iter()
            .filter_map(|id| self.relationships.get(&id))
            .filter(|rel| rtype.map_or(true, |t| rel.rtype() == t))
            .cloned()
            .collect())
    }

    /// Get the total number of nodes, including the reference node.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knows() -> RelationshipType {
        RelationshipType::instance("KNOWS")
    }

    #[test]
    fn starts_with_reference_node() {
        let state = GraphState::new();
        assert_eq!(state.node_count(), 1);
        let reference = state.node(NodeId::REFERENCE).unwrap();
        assert_eq!(reference.class().name(), REFERENCE_NODE_CLASS);
    }

    #[test]
    fn add_and_remove_nodes() {
        let mut state = GraphState::new();

        let a = state.add_node(NodeClass::new("Person")).id();
        let b = state.add_node(NodeClass::new("Person")).id();
        assert_ne!(a, b);
        assert_eq!(state.node_count(), 3);

        state.remove_node(a);
        assert_eq!(state.node_count(), 2);
        assert!(state.node(a).is_none());
        assert!(state.node(b).is_some());
    }

    #[test]
    fn add_and_remove_relationships() {
        let mut state = GraphState::new();
        let a = state.add_node(NodeClass::new("Person")).id();
        let b = state.add_node(NodeClass::new("Person")).id();

        let rel = state.add_relationship(a, b, knows()).unwrap();

        assert_eq!(state.node(a).unwrap().outgoing(), &[rel.id()]);
        assert_eq!(state.node(b).unwrap().incoming(), &[rel.id()]);

        state.remove_relationship(rel.id());

        assert!(state.node(a).unwrap().outgoing().is_empty());
        assert!(state.node(b).unwrap().incoming().is_empty());
        assert_eq!(state.relationship_count(), 0);
    }

    #[test]
    fn relationship_to_missing_node_fails() {
        let mut state = GraphState::new();
        let a = state.add_node(NodeClass::new("Person")).id();
        let missing = NodeId::from(99);

        let err = state.add_relationship(a, missing, knows()).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(id) if id == missing));
        assert_eq!(state.relationship_count(), 0);
    }

    #[test]
    fn removing_node_removes_its_relationships() {
        let mut state = GraphState::new();
        let a = state.add_node(NodeClass::new("Person")).id();
        let b = state.add_node(NodeClass::new("Person")).id();
        let c = state.add_node(NodeClass::new("Person")).id();
        state.add_relationship(a, b, knows()).unwrap();
        state.add_relationship(c, a, knows()).unwrap();

        let (_, removed) = state.remove_node(a).unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(state.relationship_count(), 0);
        assert!(state.node(b).unwrap().incoming().is_empty());
        assert!(state.node(c).unwrap().outgoing().is_empty());
    }

    #[test]
    fn relationships_filter_by_direction_and_type() {
        let mut state = GraphState::new();
        let a = state.add_node(NodeClass::new("Person")).id();
        let b = state.add_node(NodeClass::new("Person")).id();
        state.add_relationship(a, b, knows()).unwrap();
        state
            .add_relationship(b, a, RelationshipType::instance("LIKES"))
            .unwrap();

        assert_eq!(state.relationships(a, Direction::Outgoing, None).unwrap().len(), 1);
        assert_eq!(state.relationships(a, Direction::Incoming, None).unwrap().len(), 1);
        assert_eq!(state.relationships(a, Direction::Both, None).unwrap().len(), 2);
        assert_eq!(
            state
                .relationships(a, Direction::Both, Some(&knows()))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn snapshot_restores_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.snapshot");

        let mut state = GraphState::new();
        let a = state.add_node(NodeClass::new("Person").subclass("Employee")).id();
        state.set_property(a, "name", Value::from("Alice")).unwrap();
        state.add_relationship(NodeId::REFERENCE, a, knows()).unwrap();
        state.save(&path).unwrap();

        let mut loaded = GraphState::load(&path).unwrap();
        let node = loaded.node(a).unwrap();
        assert_eq!(node.class().root_class(), "Person");
        assert_eq!(node.property("name"), Some(&Value::from("Alice")));
        assert_eq!(loaded.relationship_count(), 1);

        // Ids continue after the loaded ones.
        let next = loaded.add_node(NodeClass::new("Person")).id();
        assert!(next > a);
    }
}

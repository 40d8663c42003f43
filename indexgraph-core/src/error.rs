//! Error types for the graph engine and its listeners.

use thiserror::Error;

use crate::graph::{NodeId, RelationshipId};

/// Errors raised by the graph engine, its listeners and transactions.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A mutating operation was attempted while the engine is stopped.
    #[error("graph engine is not running")]
    NotRunning,

    /// `start` was called on an engine that is already running.
    #[error("graph engine is already running")]
    AlreadyRunning,

    /// The referenced node does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The referenced relationship does not exist.
    #[error("relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    /// The reference node is owned by the engine.
    #[error("the reference node cannot be deleted")]
    ReferenceNodeDeletion,

    /// Reading a config file or reading/writing the snapshot failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the snapshot failed.
    #[error("snapshot encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Decoding the snapshot failed.
    #[error("snapshot decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type GraphResult<T> = Result<T, GraphError>;

//! Engine Configuration
//!
//! Configuration is plain data deserialized from JSON. Every field has a
//! default, so an empty object (`{}`) is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GraphResult;

/// Relationship type linking the reference node to the index node.
pub const DEFAULT_INDEX_RELATION: &str = "index_node";

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the graph snapshot is written on stop and read on start.
    /// `None` keeps the graph in memory only.
    pub storage_path: Option<PathBuf>,

    /// Index node settings.
    pub index_node: IndexNodeConfig,
}

/// Settings for the index node listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexNodeConfig {
    /// Register the index node lifecycle listener when the engine is built.
    pub enabled: bool,

    /// Relationship type from the reference node to the index node.
    pub relation: String,
}

impl Default for IndexNodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            relation: DEFAULT_INDEX_RELATION.to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> GraphResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Configuration with a snapshot file at `path`.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Configuration without the index node listener.
    pub fn without_index_node(mut self) -> Self {
        self.index_node.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.index_node.enabled);
        assert_eq!(config.index_node.relation, "index_node");
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn partial_index_node_section() {
        let config =
            Config::from_json_str(r#"{"index_node": {"relation": "all_nodes"}}"#).unwrap();
        assert!(config.index_node.enabled);
        assert_eq!(config.index_node.relation, "all_nodes");
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let err = Config::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, crate::GraphError::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, crate::GraphError::Io(_)));
        assert!(err.to_string().starts_with("io error:"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, r#"{"storage_path": "/tmp/graph.db"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/graph.db")));
    }
}

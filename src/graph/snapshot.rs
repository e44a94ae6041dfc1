//! JSON snapshot format for externally supplied dependency graphs
//!
//! Architecture: Anti-Corruption Layer - Snapshot translates collaborator output
//! - Any static-analysis tool that emits this node/edge shape can feed the checker
//! - Parsing stays here; the graph itself never touches files or JSON

use crate::domain::violations::{ArchError, ArchResult, DanglingReference};
use crate::graph::{DanglingPolicy, DependencyGraph, Edge, GraphBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serializable node/edge snapshot of an analyzed codebase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Fully-qualified node identifiers, external references included
    pub nodes: Vec<String>,
    /// Directed reference edges between nodes
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<String>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Load a snapshot from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            ArchError::graph(format!(
                "Failed to read graph snapshot '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::load_from_str(&contents)
    }

    /// Load a snapshot from JSON content
    pub fn load_from_str(content: &str) -> ArchResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| ArchError::graph(format!("Failed to parse graph snapshot: {e}")))
    }

    /// Serialize the snapshot to JSON
    pub fn to_json(&self, pretty: bool) -> ArchResult<String> {
        let result = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        result.map_err(|e| ArchError::graph(format!("Failed to serialize graph snapshot: {e}")))
    }

    /// Assemble the snapshot into an indexed graph under the given policy
    pub fn build_graph(
        &self,
        policy: DanglingPolicy,
    ) -> ArchResult<(DependencyGraph, Vec<DanglingReference>)> {
        let mut builder = GraphBuilder::new(policy);
        builder.add_nodes(self.nodes.iter().cloned());
        builder.add_edges(self.edges.iter().cloned());
        builder.build()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

//! Dependency graph assembly and indexing
//!
//! Architecture: Domain Services - GraphBuilder assembles an immutable snapshot
//! - Nodes and edges come from an external static-analysis collaborator
//! - Forward and reverse adjacency are indexed once at build time
//! - BTree storage keeps iteration order deterministic across runs

pub mod snapshot;

use crate::domain::violations::{ArchError, ArchResult, DanglingReference, EdgeEnd};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use snapshot::GraphSnapshot;

/// A directed dependency: `source` references `target`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { source: source.into(), target: target.into() }
    }
}

/// How to treat an edge whose endpoint is absent from the node set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Drop the edge, accumulate a warning (the default)
    Skip,
    /// Abort graph assembly
    Error,
}

impl Default for DanglingPolicy {
    fn default() -> Self {
        Self::Skip
    }
}

/// Immutable dependency graph with forward and reverse adjacency
///
/// Constructed once per check invocation and discarded afterwards.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: BTreeSet<String>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    /// Iterate over node identifiers in lexicographic order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Nodes that `node` depends on
    pub fn dependencies_of(&self, node: &str) -> impl Iterator<Item = &str> {
        self.dependencies.get(node).into_iter().flatten().map(String::as_str)
    }

    /// Nodes that depend on `node`
    pub fn dependents_of(&self, node: &str) -> impl Iterator<Item = &str> {
        self.dependents.get(node).into_iter().flatten().map(String::as_str)
    }

    /// Iterate over all edges in (source, target) order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependencies
            .iter()
            .flat_map(|(source, targets)| {
                targets.iter().map(move |target| (source.as_str(), target.as_str()))
            })
    }
}

/// Assembles a [`DependencyGraph`] from externally supplied nodes and edges
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    nodes: BTreeSet<String>,
    edges: Vec<Edge>,
    policy: DanglingPolicy,
}

impl GraphBuilder {
    pub fn new(policy: DanglingPolicy) -> Self {
        Self { nodes: BTreeSet::new(), edges: Vec::new(), policy }
    }

    pub fn add_node(&mut self, id: impl Into<String>) -> &mut Self {
        self.nodes.insert(id.into());
        self
    }

    pub fn add_nodes<I, S>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.edges.push(Edge::new(source, target));
        self
    }

    pub fn add_edges<I>(&mut self, edges: I) -> &mut Self
    where
        I: IntoIterator<Item = Edge>,
    {
        self.edges.extend(edges);
        self
    }

    /// Index the supplied nodes and edges into an immutable graph
    ///
    /// Dangling edges are handled per the configured policy: under `Skip` the
    /// edge is dropped and a warning accumulated; under `Error` assembly
    /// aborts on the first dangling edge.
    pub fn build(self) -> ArchResult<(DependencyGraph, Vec<DanglingReference>)> {
        let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut edge_count = 0;

        for edge in self.edges {
            let missing = if !self.nodes.contains(&edge.source) {
                Some(EdgeEnd::Source)
            } else if !self.nodes.contains(&edge.target) {
                Some(EdgeEnd::Target)
            } else {
                None
            };

            if let Some(end) = missing {
                let warning = DanglingReference::new(&edge.source, &edge.target, end);
                match self.policy {
                    DanglingPolicy::Skip => {
                        tracing::warn!("{}", warning.format_display());
                        warnings.push(warning);
                        continue;
                    }
                    DanglingPolicy::Error => {
                        return Err(ArchError::graph(warning.format_display()));
                    }
                }
            }

            let inserted = dependencies
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.target.clone());
            // Duplicate edges collapse; count only the first occurrence
            if inserted {
                dependents.entry(edge.target).or_default().insert(edge.source);
                edge_count += 1;
            }
        }

        Ok((
            DependencyGraph { nodes: self.nodes, dependencies, dependents, edge_count },
            warnings,
        ))
    }
}

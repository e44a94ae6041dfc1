//! Layer definitions and node classification
//!
//! Architecture: Service Layer - LayerClassifier orchestrates pattern matching logic
//! - Layers are declared as an ordered list of (name, patterns) pairs
//! - A node is assigned to the FIRST declared layer with a matching pattern;
//!   this tie-break is documented behavior, not incidental
//! - Nodes matching no pattern stay unclassified and sit outside layer-scoped rules

use crate::domain::violations::{ArchError, ArchResult};
use crate::graph::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named layer defined by one or more matching patterns
#[derive(Debug, Clone, Serialize, Deserialize, Hash)]
pub struct LayerDef {
    /// Layer name referenced by rules
    pub name: String,
    /// Segment or glob patterns selecting member nodes
    pub patterns: Vec<String>,
}

impl LayerDef {
    pub fn new<S: Into<String>>(name: impl Into<String>, patterns: Vec<S>) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

/// A compiled layer pattern
///
/// Patterns without glob metacharacters match any node whose path contains
/// that segment (the `..domain..` style); patterns with metacharacters are
/// matched as globs against the full identifier.
#[derive(Debug, Clone)]
enum CompiledPattern {
    Segment(String),
    Glob(glob::Pattern),
}

impl CompiledPattern {
    fn compile(pattern: &str) -> ArchResult<Self> {
        if pattern.is_empty() {
            return Err(ArchError::pattern("Empty layer pattern".to_string()));
        }

        if pattern.contains(['*', '?', '[']) {
            let compiled = glob::Pattern::new(pattern)
                .map_err(|e| ArchError::pattern(format!("Invalid pattern '{pattern}': {e}")))?;
            Ok(Self::Glob(compiled))
        } else {
            Ok(Self::Segment(pattern.to_string()))
        }
    }

    fn matches(&self, id: &str) -> bool {
        match self {
            Self::Segment(segment) => path_segments(id).any(|s| s == segment),
            Self::Glob(pattern) => pattern.matches(id),
        }
    }
}

/// Split a fully-qualified identifier into path segments
///
/// Both `::` (Rust) and `.` (JVM-style) separators are understood, so the
/// same layer definitions work against either identifier scheme.
fn path_segments(id: &str) -> impl Iterator<Item = &str> {
    id.split("::").flat_map(|part| part.split('.'))
}

#[derive(Debug, Clone)]
struct CompiledLayer {
    name: String,
    patterns: Vec<CompiledPattern>,
}

/// Assigns nodes to layers by first-declared-match
#[derive(Debug, Clone)]
pub struct LayerClassifier {
    layers: Vec<CompiledLayer>,
}

impl LayerClassifier {
    /// Compile an ordered list of layer definitions
    ///
    /// Fails fast on duplicate layer names and malformed patterns.
    pub fn compile(defs: &[LayerDef]) -> ArchResult<Self> {
        let mut layers = Vec::with_capacity(defs.len());

        for def in defs {
            if def.name.is_empty() {
                return Err(ArchError::config("Layer with empty name".to_string()));
            }
            if layers.iter().any(|l: &CompiledLayer| l.name == def.name) {
                return Err(ArchError::config(format!("Duplicate layer name '{}'", def.name)));
            }
            if def.patterns.is_empty() {
                return Err(ArchError::config(format!(
                    "Layer '{}' declares no patterns",
                    def.name
                )));
            }

            let patterns = def
                .patterns
                .iter()
                .map(|p| CompiledPattern::compile(p))
                .collect::<ArchResult<Vec<_>>>()
                .map_err(|e| {
                    ArchError::config(format!("Layer '{}' has a malformed pattern: {e}", def.name))
                })?;

            layers.push(CompiledLayer { name: def.name.clone(), patterns });
        }

        Ok(Self { layers })
    }

    /// Layer names in declaration order
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.name.as_str())
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    /// Classify a single node: first declared layer with a matching pattern wins
    pub fn classify_node(&self, id: &str) -> Option<&str> {
        self.layers
            .iter()
            .find(|layer| layer.patterns.iter().any(|p| p.matches(id)))
            .map(|layer| layer.name.as_str())
    }

    /// Partition all graph nodes into layers
    ///
    /// Computed fresh per check run; the result is valid only for the graph
    /// it was derived from.
    pub fn classify(&self, graph: &DependencyGraph) -> LayerMap {
        let mut assignments = BTreeMap::new();

        for node in graph.nodes() {
            if let Some(layer) = self.classify_node(node) {
                assignments.insert(node.to_string(), layer.to_string());
            }
        }

        LayerMap { assignments }
    }
}

/// Node-to-layer assignment for one check run
#[derive(Debug, Clone, Default)]
pub struct LayerMap {
    assignments: BTreeMap<String, String>,
}

impl LayerMap {
    /// Layer the node was assigned to, or None if unclassified
    pub fn layer_of(&self, node: &str) -> Option<&str> {
        self.assignments.get(node).map(String::as_str)
    }

    /// Number of classified nodes
    pub fn classified_count(&self) -> usize {
        self.assignments.len()
    }

    /// Iterate over (node, layer) assignments in node order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assignments.iter().map(|(n, l)| (n.as_str(), l.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DanglingPolicy, GraphBuilder};
    use rstest::rstest;

    fn hexagonal() -> LayerClassifier {
        LayerClassifier::compile(&[
            LayerDef::new("domain", vec!["domain"]),
            LayerDef::new("application", vec!["application"]),
            LayerDef::new("adapter", vec!["adapter"]),
        ])
        .unwrap()
    }

    #[rstest]
    #[case("app::domain::user", Some("domain"))]
    #[case("app::application::register", Some("application"))]
    #[case("app::adapter::scheduler", Some("adapter"))]
    #[case("nuts.learning.archunit.domain.User", Some("domain"))]
    #[case("app::infra::metrics", None)]
    #[case("serde", None)]
    fn test_segment_classification(#[case] id: &str, #[case] expected: Option<&str>) {
        assert_eq!(hexagonal().classify_node(id), expected);
    }

    #[test]
    fn test_segment_does_not_match_substrings() {
        // "domainish" contains "domain" as a substring but not as a segment
        assert_eq!(hexagonal().classify_node("app::domainish::thing"), None);
    }

    #[rstest]
    #[case("app::web::*", "app::web::login", true)]
    #[case("app::web::*", "app::webby::login", false)]
    #[case("*_test", "user_test", true)]
    fn test_glob_classification(#[case] pattern: &str, #[case] id: &str, #[case] matched: bool) {
        let classifier =
            LayerClassifier::compile(&[LayerDef::new("web", vec![pattern])]).unwrap();
        assert_eq!(classifier.classify_node(id).is_some(), matched);
    }

    #[test]
    fn test_first_declared_layer_wins_on_overlap() {
        // Both patterns match "app::domain::service"; declaration order decides
        let classifier = LayerClassifier::compile(&[
            LayerDef::new("first", vec!["domain"]),
            LayerDef::new("second", vec!["service"]),
        ])
        .unwrap();

        assert_eq!(classifier.classify_node("app::domain::service"), Some("first"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = hexagonal();
        let mut builder = GraphBuilder::new(DanglingPolicy::Skip);
        builder.add_nodes(["app::domain::a", "app::application::b", "app::other::c"]);
        let (graph, _) = builder.build().unwrap();

        let first = classifier.classify(&graph);
        let second = classifier.classify(&graph);

        assert_eq!(first.classified_count(), 2);
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            second.iter().collect::<Vec<_>>()
        );
        assert_eq!(first.layer_of("app::other::c"), None);
    }

    #[test]
    fn test_duplicate_layer_name_rejected() {
        let result = LayerClassifier::compile(&[
            LayerDef::new("domain", vec!["domain"]),
            LayerDef::new("domain", vec!["core"]),
        ]);

        assert!(matches!(result, Err(ArchError::Configuration { .. })));
    }

    #[test]
    fn test_malformed_glob_rejected() {
        let result = LayerClassifier::compile(&[LayerDef::new("bad", vec!["[invalid"])]);
        assert!(matches!(result, Err(ArchError::Configuration { .. })));
    }

    #[test]
    fn test_layer_without_patterns_rejected() {
        let result =
            LayerClassifier::compile(&[LayerDef::new("empty", Vec::<String>::new())]);
        assert!(matches!(result, Err(ArchError::Configuration { .. })));
    }
}

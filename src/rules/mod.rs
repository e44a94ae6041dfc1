//! Declarative conformance rules and their evaluation
//!
//! Architecture: Domain Services - RuleEvaluator runs one generic edge walk per rule shape
//! - Rules are data, not code; new constraints are new entries, not new functions
//! - Inbound rules walk edges by target layer, outbound rules by source layer
//! - A violated rule is a normal failing CheckResult, never an error

use crate::domain::violations::{ArchResult, ArchError, CheckResult, Severity, Violation};
use crate::graph::DependencyGraph;
use crate::layers::{LayerClassifier, LayerMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The constraint shape a rule evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Inbound-restriction: nodes in `layer` may only be depended upon by
    /// nodes in the listed layers
    OnlyDependedOnBy,
    /// Outbound-restriction: nodes in `layer` must not depend on nodes in
    /// the listed layers
    MustNotDependOn,
    /// Outbound-restriction against raw namespace prefixes instead of
    /// declared layers
    MustNotDependOnNamespaces,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnlyDependedOnBy => "only_depended_on_by",
            Self::MustNotDependOn => "must_not_depend_on",
            Self::MustNotDependOnNamespaces => "must_not_depend_on_namespaces",
        }
    }
}

/// A single declarative conformance rule
#[derive(Debug, Clone, Serialize, Deserialize, Hash)]
pub struct Rule {
    /// Unique identifier for this rule
    pub id: String,
    /// Constraint shape
    pub kind: RuleKind,
    /// The constrained layer
    pub layer: String,
    /// Permitted (inbound) or forbidden (outbound) layer set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<String>,
    /// Forbidden namespace prefixes, for the namespace shape
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Severity of a failing result
    #[serde(default)]
    pub severity: Severity,
    /// Whether this rule is evaluated
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Rule {
    pub fn new(id: impl Into<String>, kind: RuleKind, layer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            layer: layer.into(),
            layers: Vec::new(),
            namespaces: Vec::new(),
            description: None,
            severity: Severity::default(),
            enabled: true,
        }
    }

    pub fn with_layers<S: Into<String>>(mut self, layers: Vec<S>) -> Self {
        self.layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_namespaces<S: Into<String>>(mut self, namespaces: Vec<S>) -> Self {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// The rule's constraint, in words
    pub fn describe(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }

        match self.kind {
            RuleKind::OnlyDependedOnBy => format!(
                "'{}' may only be depended upon by [{}]",
                self.layer,
                self.layers.join(", ")
            ),
            RuleKind::MustNotDependOn => {
                format!("'{}' must not depend on [{}]", self.layer, self.layers.join(", "))
            }
            RuleKind::MustNotDependOnNamespaces => format!(
                "'{}' must not depend on namespaces [{}]",
                self.layer,
                self.namespaces.join(", ")
            ),
        }
    }

    /// Check this rule against the declared layers
    ///
    /// Raised before any evaluation: a rule naming an undeclared layer is a
    /// setup mistake, not a code-quality finding.
    pub fn validate_against(&self, classifier: &LayerClassifier) -> ArchResult<()> {
        if self.id.is_empty() {
            return Err(ArchError::config("Rule with empty id".to_string()));
        }

        if !classifier.has_layer(&self.layer) {
            return Err(ArchError::config(format!(
                "Rule '{}' references undeclared layer '{}'",
                self.id, self.layer
            )));
        }

        match self.kind {
            RuleKind::OnlyDependedOnBy | RuleKind::MustNotDependOn => {
                if self.layers.is_empty() {
                    return Err(ArchError::config(format!(
                        "Rule '{}' declares an empty layer set",
                        self.id
                    )));
                }
                for name in &self.layers {
                    if !classifier.has_layer(name) {
                        return Err(ArchError::config(format!(
                            "Rule '{}' references undeclared layer '{}'",
                            self.id, name
                        )));
                    }
                }
            }
            RuleKind::MustNotDependOnNamespaces => {
                if self.namespaces.is_empty() {
                    return Err(ArchError::config(format!(
                        "Rule '{}' declares no forbidden namespaces",
                        self.id
                    )));
                }
                if self.namespaces.iter().any(String::is_empty) {
                    return Err(ArchError::config(format!(
                        "Rule '{}' has an empty namespace prefix",
                        self.id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Validate a rule set as a whole: per-rule checks plus id uniqueness
pub fn validate_rules(rules: &[Rule], classifier: &LayerClassifier) -> ArchResult<()> {
    let mut seen = BTreeSet::new();

    for rule in rules {
        rule.validate_against(classifier)?;
        if !seen.insert(rule.id.as_str()) {
            return Err(ArchError::config(format!("Duplicate rule id '{}'", rule.id)));
        }
    }

    Ok(())
}

/// Whether `id` falls under the namespace `prefix`
///
/// Prefixes match whole path segments: `sqlx` matches `sqlx` and
/// `sqlx::Pool` but not `sqlxish`. Both `::` and `.` separators count,
/// and a trailing separator on the prefix (`sqlx::`) is tolerated.
fn in_namespace(id: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches("::").trim_end_matches('.');
    if id == prefix {
        return true;
    }
    id.strip_prefix(prefix)
        .map(|rest| rest.starts_with("::") || rest.starts_with('.'))
        .unwrap_or(false)
}

/// Evaluates rules against a classified graph
///
/// Evaluation is a pure function of (graph, classification, rule): read-only
/// over shared immutable state, so independent rules may run on separate
/// workers with no coordination.
pub struct RuleEvaluator<'a> {
    graph: &'a DependencyGraph,
    layers: &'a LayerMap,
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(graph: &'a DependencyGraph, layers: &'a LayerMap) -> Self {
        Self { graph, layers }
    }

    /// Evaluate one rule, producing a pass or a failing result with violations
    pub fn evaluate(&self, rule: &Rule) -> CheckResult {
        let violations = match rule.kind {
            RuleKind::OnlyDependedOnBy => self.walk_inbound(rule),
            RuleKind::MustNotDependOn => self.walk_outbound(rule),
            RuleKind::MustNotDependOnNamespaces => self.walk_namespaces(rule),
        };

        CheckResult::new(&rule.id, rule.describe(), rule.severity, violations)
    }

    /// Inbound walk: edges whose target is in the constrained layer; the
    /// source's layer must be in the permitted set. Unclassified sources are
    /// outside layer-scoped rules and skipped.
    fn walk_inbound(&self, rule: &Rule) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (source, target) in self.graph.edges() {
            if self.layers.layer_of(target) != Some(rule.layer.as_str()) {
                continue;
            }
            let Some(source_layer) = self.layers.layer_of(source) else {
                continue;
            };
            if rule.layers.iter().any(|l| l == source_layer) {
                continue;
            }

            violations.push(
                Violation::new(
                    &rule.id,
                    source,
                    target,
                    format!(
                        "'{source_layer}' may not depend on '{}' (permitted: [{}])",
                        rule.layer,
                        rule.layers.join(", ")
                    ),
                )
                .with_layers(Some(source_layer), Some(rule.layer.as_str())),
            );
        }

        violations
    }

    /// Outbound walk: edges whose source is in the constrained layer; the
    /// target's layer must not be in the forbidden set.
    fn walk_outbound(&self, rule: &Rule) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (source, target) in self.graph.edges() {
            if self.layers.layer_of(source) != Some(rule.layer.as_str()) {
                continue;
            }
            let Some(target_layer) = self.layers.layer_of(target) else {
                continue;
            };
            if !rule.layers.iter().any(|l| l == target_layer) {
                continue;
            }

            violations.push(
                Violation::new(
                    &rule.id,
                    source,
                    target,
                    format!("'{}' must not depend on '{target_layer}'", rule.layer),
                )
                .with_layers(Some(rule.layer.as_str()), Some(target_layer)),
            );
        }

        violations
    }

    /// Namespace walk: outbound shape, but the forbidden set is raw prefix
    /// matches against the target identifier; classification of the target
    /// is irrelevant.
    fn walk_namespaces(&self, rule: &Rule) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (source, target) in self.graph.edges() {
            if self.layers.layer_of(source) != Some(rule.layer.as_str()) {
                continue;
            }
            let Some(prefix) = rule.namespaces.iter().find(|ns| in_namespace(target, ns)) else {
                continue;
            };

            violations.push(
                Violation::new(
                    &rule.id,
                    source,
                    target,
                    format!("'{}' must not depend on namespace '{prefix}'", rule.layer),
                )
                .with_layers(Some(rule.layer.as_str()), self.layers.layer_of(target)),
            );
        }

        violations
    }
}

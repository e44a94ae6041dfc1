//! Core domain models for architecture conformance results
//!
//! Architecture: Rich Domain Models - Check results are entities with behavior, not just data
//! - Violations know the edge and rule that produced them and can format themselves
//! - ConformanceReport acts as an aggregate root over per-rule CheckResults
//! - Rule violations are ordinary data; only setup mistakes become errors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity levels for conformance rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Findings that should be addressed but don't fail the run
    Warning,
    /// Findings that fail the run and CI builds
    Error,
}

impl Severity {
    /// Whether this severity level should cause the check run to fail
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Error
    }
}

/// A single dependency edge that breaks a declared rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule this edge violates
    pub rule_id: String,
    /// Node on the depending side of the edge
    pub source: String,
    /// Node being depended upon
    pub target: String,
    /// Layer the source was classified into, if any
    pub source_layer: Option<String>,
    /// Layer the target was classified into, if any
    pub target_layer: Option<String>,
    /// Human-readable description of the violation
    pub message: String,
}

impl Violation {
    pub fn new(
        rule_id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            source: source.into(),
            target: target.into(),
            source_layer: None,
            target_layer: None,
            message: message.into(),
        }
    }

    /// Record the layer classification of both endpoints
    pub fn with_layers(
        mut self,
        source_layer: Option<impl Into<String>>,
        target_layer: Option<impl Into<String>>,
    ) -> Self {
        self.source_layer = source_layer.map(Into::into);
        self.target_layer = target_layer.map(Into::into);
        self
    }

    /// Format violation for display
    pub fn format_display(&self) -> String {
        format!("{} -> {} [{}] {}", self.source, self.target, self.rule_id, self.message)
    }
}

/// Outcome of evaluating one rule against the graph: pass, or fail with violations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Identifier of the evaluated rule
    pub rule_id: String,
    /// What the rule constrains, in words
    pub description: String,
    /// Severity the rule was configured with
    pub severity: Severity,
    /// Violating edges, ordered by (source, target)
    pub violations: Vec<Violation>,
}

impl CheckResult {
    /// Create a result, normalizing violation order to (source, target)
    pub fn new(
        rule_id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        mut violations: Vec<Violation>,
    ) -> Self {
        violations.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            severity,
            violations,
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn failed(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether this result should fail the whole run
    pub fn is_blocking(&self) -> bool {
        self.failed() && self.severity.is_blocking()
    }
}

/// Which end of a dangling edge was absent from the node set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeEnd {
    Source,
    Target,
}

impl EdgeEnd {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

/// An edge referencing a node absent from the supplied node set
///
/// Recoverable under the default skip policy; accumulated and reported
/// alongside check results without aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingReference {
    pub source: String,
    pub target: String,
    /// Which endpoint was missing
    pub missing: EdgeEnd,
}

impl DanglingReference {
    pub fn new(source: impl Into<String>, target: impl Into<String>, missing: EdgeEnd) -> Self {
        Self { source: source.into(), target: target.into(), missing }
    }

    pub fn format_display(&self) -> String {
        format!(
            "dangling edge {} -> {} ({} not in node set)",
            self.source,
            self.target,
            self.missing.as_str()
        )
    }
}

/// Summary statistics for a conformance report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total rules evaluated
    pub rules_evaluated: usize,
    /// Rules that produced no violations
    pub rules_passed: usize,
    /// Rules that produced at least one violation
    pub rules_failed: usize,
    /// Violations across all failed rules
    pub total_violations: usize,
    /// Nodes in the checked graph
    pub nodes: usize,
    /// Edges in the checked graph (after dangling-edge handling)
    pub edges: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when the check was performed
    pub checked_at: DateTime<Utc>,
}

/// Complete conformance report: one CheckResult per rule plus warnings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceReport {
    /// Per-rule results, in rule declaration order
    pub results: Vec<CheckResult>,
    /// Dangling-reference warnings accumulated during graph assembly
    pub warnings: Vec<DanglingReference>,
    /// Summary statistics
    pub summary: ReportSummary,
    /// Fingerprint of the configuration that produced this report
    pub config_fingerprint: Option<String>,
}

impl ConformanceReport {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            warnings: Vec::new(),
            summary: ReportSummary { checked_at: Utc::now(), ..Default::default() },
            config_fingerprint: None,
        }
    }

    /// Add a per-rule result, updating the summary counters
    pub fn add_result(&mut self, result: CheckResult) {
        self.summary.rules_evaluated += 1;
        if result.passed() {
            self.summary.rules_passed += 1;
        } else {
            self.summary.rules_failed += 1;
            self.summary.total_violations += result.violations.len();
        }
        self.results.push(result);
    }

    /// Record a dangling-reference warning
    pub fn add_warning(&mut self, warning: DanglingReference) {
        self.warnings.push(warning);
    }

    /// Whether any rule failed
    pub fn has_failures(&self) -> bool {
        self.summary.rules_failed > 0
    }

    /// Whether any failed rule is error severity
    pub fn has_blocking_failures(&self) -> bool {
        self.results.iter().any(CheckResult::is_blocking)
    }

    /// Iterate over the failed results only
    pub fn failed_results(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.failed())
    }

    /// Set the size of the checked graph
    pub fn set_graph_size(&mut self, nodes: usize, edges: usize) {
        self.summary.nodes = nodes;
        self.summary.edges = edges;
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }
}

impl Default for ConformanceReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during a check run
///
/// Rule violations are never errors; they are data in the report.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// Rule or layer configuration is malformed - fails fast, no partial report
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// IO failure reading configuration, snapshots, or source files
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A layer pattern failed to compile
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Graph assembly failed (dangling edge under the error policy)
    #[error("Graph error: {message}")]
    Graph { message: String },

    /// Source extraction failed for a specific file
    #[error("Extraction error in {file}: {message}")]
    Extraction { file: String, message: String },
}

impl ArchError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern { message: message.into() }
    }

    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph { message: message.into() }
    }

    pub fn extraction(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction { file: file.into(), message: message.into() }
    }
}

/// Result type for checker operations
pub type ArchResult<T> = Result<T, ArchError>;

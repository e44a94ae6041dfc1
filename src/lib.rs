//! Arch Guardian - layered-architecture conformance checking for dependency graphs
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain logic separated from infrastructure concerns
//! - Graph sources, rule configuration, and report formatting plug in at the edges
//! - One check invocation builds the graph, classifies it fresh, evaluates every
//!   rule, and discards the graph

pub mod config;
pub mod domain;
pub mod extract;
pub mod graph;
pub mod layers;
pub mod report;
pub mod rules;

// Re-export main types for convenient access
pub use domain::violations::{
    ArchError, ArchResult, CheckResult, ConformanceReport, DanglingReference, EdgeEnd,
    ReportSummary, Severity, Violation,
};

pub use config::{ArchConfig, ConfigBuilder};

pub use graph::{DanglingPolicy, DependencyGraph, Edge, GraphBuilder, GraphSnapshot};

pub use layers::{LayerClassifier, LayerDef, LayerMap};

pub use rules::{Rule, RuleEvaluator, RuleKind};

pub use extract::{ExtractionOptions, RustGraphExtractor};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

/// Options for customizing a check run
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Evaluate rules on parallel workers
    ///
    /// Each evaluation is read-only over the shared immutable graph, so the
    /// only coordination is result collection; rule order is preserved either
    /// way. Off by default - typical graphs are small enough that the
    /// sequential scan wins.
    pub parallel: bool,
}

/// Main conformance checker coordinating one check invocation
///
/// Construction validates the configuration: a rule referencing an
/// undeclared layer or a malformed pattern fails here, before any graph is
/// ever evaluated.
pub struct ArchChecker {
    config: ArchConfig,
}

impl ArchChecker {
    /// Create a checker with the built-in hexagonal preset
    pub fn new() -> ArchResult<Self> {
        Self::new_with_config(ArchConfig::default())
    }

    /// Create a checker with the given configuration
    pub fn new_with_config(config: ArchConfig) -> ArchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a checker loading configuration from a YAML file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let config = ArchConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    pub fn config(&self) -> &ArchConfig {
        &self.config
    }

    /// Check a graph snapshot against the configured rules
    pub fn check_snapshot(&self, snapshot: &GraphSnapshot) -> ArchResult<ConformanceReport> {
        self.check_snapshot_with_options(snapshot, &CheckOptions::default())
    }

    /// Check a graph snapshot with custom options
    pub fn check_snapshot_with_options(
        &self,
        snapshot: &GraphSnapshot,
        options: &CheckOptions,
    ) -> ArchResult<ConformanceReport> {
        let start_time = Instant::now();

        // Fail fast on setup mistakes before touching the graph
        let classifier = self.config.compile_classifier()?;
        rules::validate_rules(&self.config.rules, &classifier)?;

        let (graph, warnings) = snapshot.build_graph(self.config.dangling)?;

        // Classified fresh per run; never cached across graphs
        let layer_map = classifier.classify(&graph);
        let evaluator = RuleEvaluator::new(&graph, &layer_map);

        let enabled: Vec<&Rule> = self.config.enabled_rules().collect();
        let results: Vec<CheckResult> = if options.parallel {
            enabled.par_iter().map(|rule| evaluator.evaluate(rule)).collect()
        } else {
            enabled.iter().map(|rule| evaluator.evaluate(rule)).collect()
        };

        let mut report = ConformanceReport::new();
        for result in results {
            report.add_result(result);
        }
        for warning in warnings {
            report.add_warning(warning);
        }
        report.set_graph_size(graph.node_count(), graph.edge_count());
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config.fingerprint());

        Ok(report)
    }

    /// Extract a graph from a Rust source tree and check it
    pub fn check_source_dir<P: AsRef<Path>>(&self, root: P) -> ArchResult<ConformanceReport> {
        self.check_source_dir_with_options(root, ExtractionOptions::default(), &CheckOptions::default())
    }

    /// Extract and check with custom extraction and check options
    pub fn check_source_dir_with_options<P: AsRef<Path>>(
        &self,
        root: P,
        extraction: ExtractionOptions,
        options: &CheckOptions,
    ) -> ArchResult<ConformanceReport> {
        self.check_source_dirs_with_options(&[root], extraction, options)
    }

    /// Extract several source trees into one merged graph and check it
    ///
    /// Every supplied root contributes nodes and edges; none is silently
    /// ignored.
    pub fn check_source_dirs_with_options<P: AsRef<Path>>(
        &self,
        roots: &[P],
        extraction: ExtractionOptions,
        options: &CheckOptions,
    ) -> ArchResult<ConformanceReport> {
        let extractor = RustGraphExtractor::with_options(extraction);
        let snapshot = extractor.extract_dirs(roots)?;
        self.check_snapshot_with_options(&snapshot, options)
    }
}

/// Convenience function to check a snapshot against a configuration
pub fn check_snapshot(
    config: ArchConfig,
    snapshot: &GraphSnapshot,
) -> ArchResult<ConformanceReport> {
    ArchChecker::new_with_config(config)?.check_snapshot(snapshot)
}

/// Convenience function to check a Rust source tree with the default preset
pub fn check_source_dir<P: AsRef<Path>>(root: P) -> ArchResult<ConformanceReport> {
    ArchChecker::new()?.check_source_dir(root)
}

/// Test-harness integration
///
/// Lets a crate enforce its own layering from an ordinary `#[test]`: any
/// failed rule becomes an `Err` whose message lists the violations.
pub mod harness {
    use super::*;

    /// Check a snapshot and fail on any blocking rule violation
    pub fn enforce(config: ArchConfig, snapshot: &GraphSnapshot) -> ArchResult<()> {
        let report = ArchChecker::new_with_config(config)?.check_snapshot(snapshot)?;
        fail_on_blocking(&report)
    }

    /// Check a source tree and fail on any blocking rule violation
    pub fn enforce_source_dir<P: AsRef<Path>>(config: ArchConfig, root: P) -> ArchResult<()> {
        let report = ArchChecker::new_with_config(config)?.check_source_dir(root)?;
        fail_on_blocking(&report)
    }

    fn fail_on_blocking(report: &ConformanceReport) -> ArchResult<()> {
        if !report.has_blocking_failures() {
            return Ok(());
        }

        let mut message = String::from("architecture check failed:\n");
        for result in report.failed_results() {
            message.push_str(&format!("  rule '{}': {}\n", result.rule_id, result.description));
            for violation in &result.violations {
                message.push_str(&format!("    {} -> {}\n", violation.source, violation.target));
            }
        }

        Err(ArchError::config(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexagonal_config() -> ArchConfig {
        ConfigBuilder::new()
            .layer("domain", vec!["domain"])
            .layer("application", vec!["application"])
            .layer("adapter", vec!["adapter"])
            .rule(
                Rule::new("domain-isolation", RuleKind::MustNotDependOn, "domain")
                    .with_layers(vec!["application", "adapter"]),
            )
            .rule(
                Rule::new("app-inbound", RuleKind::OnlyDependedOnBy, "application")
                    .with_layers(vec!["application", "adapter"]),
            )
            .build()
            .unwrap()
    }

    fn snapshot(nodes: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot {
        GraphSnapshot::new(
            nodes.iter().map(|n| n.to_string()).collect(),
            edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
        )
    }

    #[test]
    fn test_checker_rejects_invalid_config() {
        let mut config = ArchConfig::default();
        config.rules.push(
            Rule::new("bad", RuleKind::MustNotDependOn, "domain")
                .with_layers(vec!["presentation"]),
        );

        assert!(matches!(
            ArchChecker::new_with_config(config),
            Err(ArchError::Configuration { .. })
        ));
    }

    #[test]
    fn test_check_reports_violation() {
        let checker = ArchChecker::new_with_config(hexagonal_config()).unwrap();
        let report = checker
            .check_snapshot(&snapshot(
                &["shop::domain::user", "shop::application::register"],
                &[("shop::domain::user", "shop::application::register")],
            ))
            .unwrap();

        assert!(report.has_failures());
        assert_eq!(report.summary.rules_evaluated, 2);
        // Both rules flag the same edge
        assert_eq!(report.summary.rules_failed, 2);
        assert!(report.config_fingerprint.is_some());
    }

    #[test]
    fn test_check_passes_on_clean_graph() {
        let checker = ArchChecker::new_with_config(hexagonal_config()).unwrap();
        let report = checker
            .check_snapshot(&snapshot(
                &["shop::domain::user", "shop::application::register", "shop::adapter::http"],
                &[
                    ("shop::application::register", "shop::domain::user"),
                    ("shop::adapter::http", "shop::application::register"),
                ],
            ))
            .unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.summary.rules_passed, 2);
        assert_eq!(report.summary.nodes, 3);
        assert_eq!(report.summary.edges, 2);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let checker = ArchChecker::new_with_config(hexagonal_config()).unwrap();
        let snap = snapshot(
            &["shop::domain::a", "shop::domain::b", "shop::application::c"],
            &[("shop::domain::a", "shop::application::c"), ("shop::domain::b", "shop::application::c")],
        );

        let sequential = checker.check_snapshot(&snap).unwrap();
        let parallel = checker
            .check_snapshot_with_options(&snap, &CheckOptions { parallel: true })
            .unwrap();

        let ids = |r: &ConformanceReport| {
            r.results.iter().map(|c| (c.rule_id.clone(), c.violations.clone())).collect::<Vec<_>>()
        };
        assert_eq!(ids(&sequential), ids(&parallel));
    }

    #[test]
    fn test_dangling_edge_surfaces_as_warning() {
        let checker = ArchChecker::new_with_config(hexagonal_config()).unwrap();
        let report = checker
            .check_snapshot(&snapshot(
                &["shop::domain::user"],
                &[("shop::domain::user", "shop::ghost")],
            ))
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(!report.has_failures());
        assert_eq!(report.summary.edges, 0);
    }

    #[test]
    fn test_harness_enforce() {
        let clean = snapshot(
            &["shop::domain::user", "shop::application::register"],
            &[("shop::application::register", "shop::domain::user")],
        );
        assert!(harness::enforce(hexagonal_config(), &clean).is_ok());

        let dirty = snapshot(
            &["shop::domain::user", "shop::application::register"],
            &[("shop::domain::user", "shop::application::register")],
        );
        let err = harness::enforce(hexagonal_config(), &dirty).unwrap_err();
        assert!(err.to_string().contains("domain-isolation"));
    }

    #[test]
    fn test_harness_ignores_warning_severity() {
        let config = ConfigBuilder::new()
            .layer("domain", vec!["domain"])
            .layer("application", vec!["application"])
            .rule(
                Rule::new("soft", RuleKind::MustNotDependOn, "domain")
                    .with_layers(vec!["application"])
                    .with_severity(Severity::Warning),
            )
            .build()
            .unwrap();

        let dirty = snapshot(
            &["shop::domain::user", "shop::application::register"],
            &[("shop::domain::user", "shop::application::register")],
        );

        assert!(harness::enforce(config, &dirty).is_ok());
    }

    #[test]
    fn test_check_source_dir() {
        use std::fs;
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path().join("shop");
        fs::create_dir_all(root.join("src/domain")).unwrap();
        fs::create_dir_all(root.join("src/application")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub mod domain;\npub mod application;\n").unwrap();
        fs::write(
            root.join("src/domain/mod.rs"),
            "use crate::application::register;\npub struct User;\n",
        )
        .unwrap();
        fs::write(root.join("src/application/mod.rs"), "pub fn register() {}\n").unwrap();

        let checker = ArchChecker::new_with_config(hexagonal_config()).unwrap();
        let report = checker.check_source_dir(&root).unwrap();

        // The domain module reaches into the application layer
        assert!(report.has_failures());
        assert!(report
            .failed_results()
            .any(|r| r.violations.iter().any(|v| v.source == "shop::domain")));
    }

    #[test]
    fn test_check_source_dirs_covers_every_root() {
        use std::fs;
        let temp_dir = tempfile::TempDir::new().unwrap();

        // First tree is clean; the violation lives only in the second
        let clean = temp_dir.path().join("billing");
        fs::create_dir_all(clean.join("src/domain")).unwrap();
        fs::write(clean.join("src/lib.rs"), "pub mod domain;\n").unwrap();
        fs::write(clean.join("src/domain/mod.rs"), "pub struct Invoice;\n").unwrap();

        let dirty = temp_dir.path().join("shipping");
        fs::create_dir_all(dirty.join("src/domain")).unwrap();
        fs::create_dir_all(dirty.join("src/application")).unwrap();
        fs::write(dirty.join("src/lib.rs"), "pub mod domain;\npub mod application;\n").unwrap();
        fs::write(
            dirty.join("src/domain/mod.rs"),
            "use crate::application::ship;\npub struct Parcel;\n",
        )
        .unwrap();
        fs::write(dirty.join("src/application/mod.rs"), "pub fn ship() {}\n").unwrap();

        let checker = ArchChecker::new_with_config(hexagonal_config()).unwrap();
        let report = checker
            .check_source_dirs_with_options(
                &[&clean, &dirty],
                ExtractionOptions::default(),
                &CheckOptions::default(),
            )
            .unwrap();

        assert!(report.has_failures());
        assert!(report
            .failed_results()
            .any(|r| r.violations.iter().any(|v| v.source == "shipping::domain")));
    }
}

//! Report formatting with multiple output formats
//!
//! Architecture: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - ConformanceReport (domain) is converted to various external representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Aggregation stays in the domain; only presentation lives here

use crate::domain::violations::{ArchError, ArchResult, CheckResult, ConformanceReport, Severity};
use std::io::Write;

/// Supported output formats for conformance reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors and per-rule violation lists
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// JUnit XML format for CI/CD integration
    Junit,
    /// GitHub Actions format for workflow integration
    GitHub,
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to list passing rules in human output
    pub show_passed: bool,
    /// Maximum number of violations to print per rule
    pub max_violations: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { use_colors: true, show_passed: true, max_violations: None }
    }
}

/// Main report formatter that dispatches to specific formatters
pub struct ReportFormatter {
    options: ReportOptions,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

impl ReportFormatter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a conformance report in the specified format
    pub fn format_report(
        &self,
        report: &ConformanceReport,
        format: OutputFormat,
    ) -> ArchResult<String> {
        match format {
            OutputFormat::Human => self.format_human(report),
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Junit => self.format_junit(report),
            OutputFormat::GitHub => Ok(self.format_github(report)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &ConformanceReport,
        format: OutputFormat,
        mut writer: W,
    ) -> ArchResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes()).map_err(|e| ArchError::Io { source: e })?;
        Ok(())
    }

    fn severity_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
        }
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &ConformanceReport) -> ArchResult<String> {
        let mut output = String::new();
        let colors = self.options.use_colors;

        if !report.has_failures() {
            if colors {
                output.push_str("\x1b[32mAll architecture rules passed\x1b[0m\n");
            } else {
                output.push_str("All architecture rules passed\n");
            }
        } else if colors {
            output.push_str("\x1b[31mArchitecture rule violations found\x1b[0m\n\n");
        } else {
            output.push_str("Architecture rule violations found\n\n");
        }

        for result in &report.results {
            if result.passed() {
                if self.options.show_passed {
                    if colors {
                        output.push_str(&format!(
                            "  \x1b[32mpass\x1b[0m  {} - {}\n",
                            result.rule_id, result.description
                        ));
                    } else {
                        output
                            .push_str(&format!("  pass  {} - {}\n", result.rule_id, result.description));
                    }
                }
                continue;
            }

            let label = result.severity.as_str();
            if colors {
                output.push_str(&format!(
                    "  \x1b[{}mfail\x1b[0m  {} - {} ({} violation{})\n",
                    Self::severity_color(result.severity),
                    result.rule_id,
                    result.description,
                    result.violations.len(),
                    if result.violations.len() == 1 { "" } else { "s" },
                ));
            } else {
                output.push_str(&format!(
                    "  fail  {} [{}] - {} ({} violation{})\n",
                    result.rule_id,
                    label,
                    result.description,
                    result.violations.len(),
                    if result.violations.len() == 1 { "" } else { "s" },
                ));
            }

            let shown = match self.options.max_violations {
                Some(max) => &result.violations[..result.violations.len().min(max)],
                None => &result.violations[..],
            };
            for violation in shown {
                if colors {
                    output.push_str(&format!(
                        "        \x1b[2m{} -> {}\x1b[0m  {}\n",
                        violation.source, violation.target, violation.message
                    ));
                } else {
                    output.push_str(&format!(
                        "        {} -> {}  {}\n",
                        violation.source, violation.target, violation.message
                    ));
                }
            }
            let hidden = result.violations.len() - shown.len();
            if hidden > 0 {
                output.push_str(&format!("        ... and {hidden} more\n"));
            }
        }

        if !report.warnings.is_empty() {
            output.push('\n');
            for warning in &report.warnings {
                if colors {
                    output.push_str(&format!(
                        "  \x1b[33mwarning\x1b[0m {}\n",
                        warning.format_display()
                    ));
                } else {
                    output.push_str(&format!("  warning {}\n", warning.format_display()));
                }
            }
        }

        output.push('\n');
        output.push_str(&self.format_summary(report));

        Ok(output)
    }

    /// Format report in JSON format
    fn format_json(&self, report: &ConformanceReport) -> ArchResult<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| ArchError::config(format!("JSON serialization failed: {e}")))
    }

    /// Format report in JUnit XML format: one testcase per rule
    fn format_junit(&self, report: &ConformanceReport) -> ArchResult<String> {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;
        xml.push_str(&format!(
            "<testsuite name=\"arch-guardian\" tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">\n",
            report.summary.rules_evaluated, report.summary.rules_failed, execution_time
        ));

        for result in &report.results {
            xml.push_str(&format!(
                "  <testcase classname=\"arch-guardian\" name=\"{}\">\n",
                escape_xml(&result.rule_id)
            ));

            if result.failed() {
                xml.push_str(&format!(
                    "    <failure message=\"{}\">\n",
                    escape_xml(&result.description)
                ));
                for violation in &result.violations {
                    xml.push_str(&format!(
                        "      {} -&gt; {}\n",
                        escape_xml(&violation.source),
                        escape_xml(&violation.target)
                    ));
                }
                xml.push_str("    </failure>\n");
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        Ok(xml)
    }

    /// Format report for GitHub Actions: one annotation per violation
    fn format_github(&self, report: &ConformanceReport) -> String {
        let mut output = String::new();

        for result in report.failed_results() {
            let level = match result.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };

            for violation in &result.violations {
                output.push_str(&format!(
                    "::{} title={}::{} -> {}: {}\n",
                    level, result.rule_id, violation.source, violation.target, violation.message
                ));
            }
        }

        output
    }

    /// Format the summary section
    fn format_summary(&self, report: &ConformanceReport) -> String {
        let summary = &report.summary;
        let execution_time = (summary.execution_time_ms as f64) / 1000.0;
        let colors = self.options.use_colors;

        let verdict = if summary.rules_failed == 0 {
            let text = format!("{} rules passed", summary.rules_passed);
            if colors { format!("\x1b[32m{text}\x1b[0m") } else { text }
        } else {
            let text = format!(
                "{} passed, {} failed ({} violation{})",
                summary.rules_passed,
                summary.rules_failed,
                summary.total_violations,
                if summary.total_violations == 1 { "" } else { "s" }
            );
            if colors { format!("\x1b[31m{text}\x1b[0m") } else { text }
        };

        format!(
            "Summary: {} | {} nodes, {} edges ({:.1}s)\n",
            verdict, summary.nodes, summary.edges, execution_time
        )
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

//! Domain layer containing core conformance models
//!
//! Architecture: Domain Layer - Pure models with no infrastructure dependencies
//! - Check results, violations, and errors live here
//! - No knowledge of graph sources, file formats, or output channels

pub mod violations;

pub use violations::{
    ArchError, ArchResult, CheckResult, ConformanceReport, DanglingReference, EdgeEnd,
    ReportSummary, Severity, Violation,
};

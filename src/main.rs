//! Arch Guardian CLI - Command-line interface for architecture conformance checking
//!
//! Architecture: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to domain operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and business logic

use arch_guardian::{
    ArchChecker, ArchConfig, ArchResult, CheckOptions, ExtractionOptions, OutputFormat,
    ReportFormatter, ReportOptions, RustGraphExtractor, Severity,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// Arch Guardian - Dependency-layer conformance checking
#[derive(Parser)]
#[command(name = "arch-guardian")]
#[command(version = "0.1.0")]
#[command(about = "Checks a dependency graph against declarative layering rules")]
#[command(
    long_about = "Arch Guardian classifies the nodes of a dependency graph into named layers and evaluates declarative rules over the edges: which layers may depend on a layer, which layers a layer must not reach, and which external namespaces are off limits. Designed for CI/CD integration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a dependency graph against the configured rules
    Check {
        /// Rust source directories to extract a graph from
        paths: Vec<PathBuf>,

        /// Check a pre-built graph snapshot (JSON) instead of extracting
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Maximum number of violations to report per rule
        #[arg(long)]
        max_violations: Option<usize>,

        /// Hide passing rules from human output
        #[arg(long)]
        hide_passed: bool,

        /// Evaluate rules in parallel
        #[arg(long)]
        parallel: bool,

        /// Drop references to external crates during extraction
        #[arg(long)]
        no_external: bool,

        /// Include #[cfg(test)] modules during extraction
        #[arg(long)]
        include_tests: bool,

        /// Override the crate name used for extracted node ids
        #[arg(long)]
        crate_name: Option<String>,
    },

    /// Extract a dependency graph snapshot from a Rust source tree
    Extract {
        /// Source directory to extract from
        path: PathBuf,

        /// Pretty-print the JSON snapshot
        #[arg(long)]
        pretty: bool,

        /// Drop references to external crates
        #[arg(long)]
        no_external: bool,

        /// Include #[cfg(test)] modules
        #[arg(long)]
        include_tests: bool,

        /// Override the crate name used for node ids
        #[arg(long)]
        crate_name: Option<String>,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// List configured layers and rules
    Rules {
        /// Show only enabled rules
        #[arg(long)]
        enabled_only: bool,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Junit,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Junit => OutputFormat::Junit,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run_command(cli) {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_command(cli: Cli) -> ArchResult<i32> {
    match cli.command {
        Commands::Check {
            paths,
            graph,
            format,
            max_violations,
            hide_passed,
            parallel,
            no_external,
            include_tests,
            crate_name,
        } => run_check(
            cli.config,
            paths,
            graph,
            format,
            max_violations,
            hide_passed,
            parallel,
            ExtractionOptions {
                include_external: !no_external,
                include_tests,
                crate_name,
            },
            !cli.no_color,
        ),
        Commands::Extract { path, pretty, no_external, include_tests, crate_name } => run_extract(
            path,
            pretty,
            ExtractionOptions {
                include_external: !no_external,
                include_tests,
                crate_name,
            },
        ),
        Commands::ValidateConfig { config_file } => {
            run_validate_config(config_file.or(cli.config))
        }
        Commands::Explain { rule_id } => run_explain(cli.config, rule_id),
        Commands::Rules { enabled_only } => run_list_rules(cli.config, enabled_only),
    }
}

/// Load an explicit config, a conventional config file, or the built-in preset
fn load_config(config_path: Option<PathBuf>) -> ArchResult<ArchConfig> {
    if let Some(config_path) = config_path {
        return ArchConfig::load_from_file(config_path);
    }

    let default_configs = ["arch_guardian.yaml", "arch_guardian.yml", ".arch_guardian.yaml"];
    for config_name in &default_configs {
        if Path::new(config_name).exists() {
            return ArchConfig::load_from_file(config_name);
        }
    }

    Ok(ArchConfig::default())
}

#[allow(clippy::too_many_arguments)]
fn run_check(
    config_path: Option<PathBuf>,
    paths: Vec<PathBuf>,
    graph: Option<PathBuf>,
    format: OutputFormatArg,
    max_violations: Option<usize>,
    hide_passed: bool,
    parallel: bool,
    extraction: ExtractionOptions,
    use_colors: bool,
) -> ArchResult<i32> {
    let config = load_config(config_path)?;
    let checker = ArchChecker::new_with_config(config)?;
    let options = CheckOptions { parallel };

    let report = if let Some(snapshot_path) = graph {
        let snapshot = arch_guardian::GraphSnapshot::load_from_file(snapshot_path)?;
        checker.check_snapshot_with_options(&snapshot, &options)?
    } else {
        // Default to the current directory, matching plain `arch-guardian check`
        let roots = if paths.is_empty() { vec![PathBuf::from(".")] } else { paths };
        checker.check_source_dirs_with_options(&roots, extraction, &options)?
    };

    let formatter = ReportFormatter::new(ReportOptions {
        use_colors,
        show_passed: !hide_passed,
        max_violations,
    });
    formatter.write_report(&report, format.into(), io::stdout().lock())?;

    if report.has_blocking_failures() {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn run_extract(
    path: PathBuf,
    pretty: bool,
    extraction: ExtractionOptions,
) -> ArchResult<i32> {
    let extractor = RustGraphExtractor::with_options(extraction);
    let snapshot = extractor.extract_dir(path)?;
    println!("{}", snapshot.to_json(pretty)?);
    Ok(0)
}

fn run_validate_config(config_path: Option<PathBuf>) -> ArchResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("arch_guardian.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match ArchConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");

            let enabled_rules = config.enabled_rules().count();
            println!("📊 Configuration summary:");
            println!("  Layers: {}", config.layers.len());
            println!("  Rules: {} total, {} enabled", config.rules.len(), enabled_rules);
            println!("  Dangling edges: {:?}", config.dangling);

            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {}", e);
            Ok(1)
        }
    }
}

fn run_explain(config_path: Option<PathBuf>, rule_id: String) -> ArchResult<i32> {
    let config = load_config(config_path)?;

    if let Some(rule) = config.find_rule(&rule_id) {
        println!("📖 Rule: {}", rule.id);
        println!("🔍 Kind: {}", rule.kind.as_str());
        println!("📂 Layer: {}", rule.layer);
        println!("⚠️ Severity: {:?}", rule.severity);
        println!("✅ Enabled: {}", rule.enabled);
        println!();
        println!("📝 Constraint:");
        println!("   {}", rule.describe());

        if !rule.namespaces.is_empty() {
            println!();
            println!("🚫 Forbidden namespaces:");
            for namespace in &rule.namespaces {
                println!("   - {}", namespace);
            }
        }

        return Ok(0);
    }

    eprintln!("❌ Rule '{}' not found", rule_id);
    println!();
    println!("Available rules:");
    for rule in &config.rules {
        println!("  - {}", rule.id);
    }

    Ok(1)
}

fn run_list_rules(config_path: Option<PathBuf>, enabled_only: bool) -> ArchResult<i32> {
    let config = load_config(config_path)?;

    println!("📋 Layers\n");
    for layer in &config.layers {
        println!("  📂 {} <- [{}]", layer.name, layer.patterns.join(", "));
    }

    println!("\n📋 Rules\n");
    for rule in &config.rules {
        if enabled_only && !rule.enabled {
            continue;
        }

        let status = if rule.enabled { "✅" } else { "❌" };
        let severity = match rule.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("  {} {} [{}] - {}", status, rule.id, severity, rule.describe());
    }

    Ok(0)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

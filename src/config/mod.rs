//! Configuration loading and management for layer rules
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to clean domain objects
//! - The built-in default encodes the hexagonal layering preset
//! - Validation fails fast: a malformed setup never reaches rule evaluation

use crate::domain::violations::{ArchError, ArchResult};
use crate::graph::DanglingPolicy;
use crate::layers::{LayerClassifier, LayerDef};
use crate::rules::{validate_rules, Rule, RuleKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration: layer definitions plus declarative rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchConfig {
    /// Configuration format version
    pub version: String,
    /// Dangling-edge policy applied at graph assembly
    #[serde(default)]
    pub dangling: DanglingPolicy,
    /// Ordered layer definitions; declaration order is the classification
    /// tie-break
    pub layers: Vec<LayerDef>,
    /// Rules evaluated in declaration order
    pub rules: Vec<Rule>,
}

impl ArchConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            ArchError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            ArchError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> ArchResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| ArchError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// The built-in hexagonal layering preset
    ///
    /// Three layers (domain, application, adapter) and four rules: the
    /// application layer may only be used from application and adapter code,
    /// application must not reach into adapters, domain depends on no other
    /// layer, and domain stays free of persistence/web framework namespaces.
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            dangling: DanglingPolicy::Skip,
            layers: vec![
                LayerDef::new("domain", vec!["domain"]),
                LayerDef::new("application", vec!["application"]),
                LayerDef::new("adapter", vec!["adapter"]),
            ],
            rules: vec![
                Rule::new(
                    "application-only-used-by-application-and-adapter",
                    RuleKind::OnlyDependedOnBy,
                    "application",
                )
                .with_layers(vec!["application", "adapter"]),
                Rule::new(
                    "application-must-not-depend-on-adapter",
                    RuleKind::MustNotDependOn,
                    "application",
                )
                .with_layers(vec!["adapter"]),
                Rule::new(
                    "domain-must-not-depend-on-other-layers",
                    RuleKind::MustNotDependOn,
                    "domain",
                )
                .with_layers(vec!["application", "adapter"]),
                Rule::new(
                    "domain-must-not-depend-on-frameworks",
                    RuleKind::MustNotDependOnNamespaces,
                    "domain",
                )
                .with_namespaces(vec!["sqlx", "diesel", "axum", "actix_web"]),
            ],
        }
    }

    /// Validate the configuration for consistency and correctness
    ///
    /// Compiles the layer classifier (catching malformed patterns and
    /// duplicate layer names) and validates every rule against it.
    pub fn validate(&self) -> ArchResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(ArchError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.layers.is_empty() {
            return Err(ArchError::config("No layers declared".to_string()));
        }

        let classifier = self.compile_classifier()?;
        validate_rules(&self.rules, &classifier)?;

        Ok(())
    }

    /// Compile the layer definitions into a classifier
    pub fn compile_classifier(&self) -> ArchResult<LayerClassifier> {
        LayerClassifier::compile(&self.layers)
    }

    /// Rules that are enabled, in declaration order
    pub fn enabled_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.enabled)
    }

    /// Look up a rule by id
    pub fn find_rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ArchResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ArchError::config(format!("Failed to serialize config: {e}")))
    }

    /// Create a stable fingerprint of the configuration
    ///
    /// Recorded on reports so a result can be traced back to the exact rule
    /// set that produced it.
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.version.hash(&mut hasher);
        self.dangling.hash(&mut hasher);
        for layer in &self.layers {
            layer.hash(&mut hasher);
        }
        for rule in &self.rules {
            rule.hash(&mut hasher);
        }

        format!("{:x}", hasher.finish())
    }
}

impl Default for ArchConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: ArchConfig,
}

impl ConfigBuilder {
    /// Start from an empty configuration (no layers, no rules)
    pub fn new() -> Self {
        Self {
            config: ArchConfig {
                version: "1.0".to_string(),
                dangling: DanglingPolicy::Skip,
                layers: Vec::new(),
                rules: Vec::new(),
            },
        }
    }

    /// Declare a layer; declaration order is the classification tie-break
    pub fn layer<S: Into<String>>(mut self, name: impl Into<String>, patterns: Vec<S>) -> Self {
        self.config.layers.push(LayerDef::new(name, patterns));
        self
    }

    /// Add a rule
    pub fn rule(mut self, rule: Rule) -> Self {
        self.config.rules.push(rule);
        self
    }

    /// Set the dangling-edge policy
    pub fn dangling(mut self, policy: DanglingPolicy) -> Self {
        self.config.dangling = policy;
        self
    }

    /// Validate and build the final configuration
    pub fn build(self) -> ArchResult<ArchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE_YAML: &str = r#"
version: "1.0"
dangling: skip
layers:
  - name: domain
    patterns: [domain]
  - name: application
    patterns: [application]
  - name: adapter
    patterns: [adapter]
rules:
  - id: domain-isolation
    kind: must_not_depend_on
    layer: domain
    layers: [application, adapter]
  - id: no-frameworks
    kind: must_not_depend_on_namespaces
    layer: domain
    namespaces: [sqlx]
    severity: warning
"#;

    #[test]
    fn test_load_from_str() {
        let config = ArchConfig::load_from_str(SAMPLE_YAML).unwrap();

        assert_eq!(config.layers.len(), 3);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.dangling, DanglingPolicy::Skip);
        assert_eq!(
            config.find_rule("no-frameworks").unwrap().severity,
            crate::domain::violations::Severity::Warning
        );
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("arch.yaml");
        fs::write(&path, SAMPLE_YAML).unwrap();

        let config = ArchConfig::load_from_file(&path).unwrap();
        assert_eq!(config.rules.len(), 2);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ArchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layers.len(), 3);
        assert_eq!(config.enabled_rules().count(), 4);
    }

    #[test]
    fn test_unknown_layer_in_rule_fails_validation() {
        let yaml = r#"
version: "1.0"
layers:
  - name: domain
    patterns: [domain]
rules:
  - id: bad
    kind: must_not_depend_on
    layer: domain
    layers: [presentation]
"#;
        let result = ArchConfig::load_from_str(yaml);
        assert!(matches!(result, Err(ArchError::Configuration { .. })));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let yaml = SAMPLE_YAML.replace("\"1.0\"", "\"2.0\"");
        assert!(ArchConfig::load_from_str(&yaml).is_err());
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new()
            .layer("core", vec!["core"])
            .layer("shell", vec!["shell"])
            .rule(
                Rule::new("core-isolation", RuleKind::MustNotDependOn, "core")
                    .with_layers(vec!["shell"]),
            )
            .dangling(DanglingPolicy::Error)
            .build()
            .unwrap();

        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.dangling, DanglingPolicy::Error);
    }

    #[test]
    fn test_builder_rejects_invalid_rule() {
        let result = ConfigBuilder::new()
            .layer("core", vec!["core"])
            .rule(
                Rule::new("bad", RuleKind::MustNotDependOn, "core")
                    .with_layers(vec!["missing"]),
            )
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let config = ArchConfig::default();
        assert_eq!(config.fingerprint(), config.fingerprint());

        let mut changed = config.clone();
        changed.rules.pop();
        assert_ne!(config.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ArchConfig::default();
        let yaml = config.to_yaml().unwrap();
        let reloaded = ArchConfig::load_from_str(&yaml).unwrap();

        assert_eq!(reloaded.fingerprint(), config.fingerprint());
    }
}

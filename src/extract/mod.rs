//! Built-in static-analysis collaborator for Rust source trees
//!
//! Architecture: Domain Services - the extractor orchestrates the source walk
//! - Walks a source tree, derives module identifiers from file paths, and
//!   collects reference edges from syn ASTs
//! - Produces the same GraphSnapshot shape any external collaborator would;
//!   the checker core never knows where a snapshot came from
//! - External crate references become nodes so namespace rules can fire

pub mod rust;

use crate::domain::violations::{ArchError, ArchResult};
use crate::graph::{Edge, GraphSnapshot};
use rust::ReferenceCollector;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::Visit;
use walkdir::WalkDir;

/// Options for customizing source extraction
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Whether references to external crates become graph nodes
    pub include_external: bool,
    /// Whether `#[cfg(test)]` modules contribute references
    pub include_tests: bool,
    /// Crate name override; derived from the root directory name if unset
    pub crate_name: Option<String>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self { include_external: true, include_tests: false, crate_name: None }
    }
}

/// Derives a dependency-graph snapshot from a Rust source tree
#[derive(Debug, Default)]
pub struct RustGraphExtractor {
    options: ExtractionOptions,
}

impl RustGraphExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractionOptions) -> Self {
        Self { options }
    }

    /// Extract module nodes and reference edges from a source tree
    pub fn extract_dir<P: AsRef<Path>>(&self, root: P) -> ArchResult<GraphSnapshot> {
        let root = root.as_ref();
        let crate_name = self.crate_name_for(root);

        let files = self.discover_files(root);

        // First pass: the module set, so references can be resolved against it
        let mut modules_by_file: BTreeMap<PathBuf, String> = BTreeMap::new();
        let mut modules: BTreeSet<String> = BTreeSet::new();
        for file in &files {
            let module = module_path_for(root, file, &crate_name);
            modules.insert(module.clone());
            modules_by_file.insert(file.clone(), module);
        }

        // Second pass: collect and resolve references per file
        let mut nodes = modules.clone();
        let mut edges: BTreeSet<(String, String)> = BTreeSet::new();

        for file in &files {
            let content = fs::read_to_string(file).map_err(|e| {
                ArchError::extraction(file.display().to_string(), format!("Failed to read file: {e}"))
            })?;

            let syntax_tree = match syn::parse_file(&content) {
                Ok(tree) => tree,
                Err(e) => {
                    // A file that doesn't parse won't compile either; skip it
                    tracing::debug!("Failed to parse {}: {}", file.display(), e);
                    continue;
                }
            };

            let mut collector = ReferenceCollector::new(self.options.include_tests);
            collector.visit_file(&syntax_tree);

            let source = &modules_by_file[file];
            for raw in &collector.references {
                let Some(target) = self.resolve(raw, source, &crate_name, &modules) else {
                    continue;
                };
                if &target == source {
                    continue;
                }
                if !modules.contains(&target) {
                    nodes.insert(target.clone());
                }
                edges.insert((source.clone(), target));
            }
        }

        Ok(GraphSnapshot::new(
            nodes.into_iter().collect(),
            edges.into_iter().map(|(s, t)| Edge::new(s, t)).collect(),
        ))
    }

    /// Extract several source trees into one merged snapshot
    ///
    /// Nodes and edges are unioned; each tree keeps its own crate-name
    /// prefix, so the same layer patterns apply across all of them.
    pub fn extract_dirs<P: AsRef<Path>>(&self, roots: &[P]) -> ArchResult<GraphSnapshot> {
        let mut nodes: BTreeSet<String> = BTreeSet::new();
        let mut edges: BTreeSet<Edge> = BTreeSet::new();

        for root in roots {
            let snapshot = self.extract_dir(root)?;
            nodes.extend(snapshot.nodes);
            edges.extend(snapshot.edges);
        }

        Ok(GraphSnapshot::new(
            nodes.into_iter().collect(),
            edges.into_iter().collect(),
        ))
    }

    fn crate_name_for(&self, root: &Path) -> String {
        if let Some(name) = &self.options.crate_name {
            return name.clone();
        }
        root.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.replace('-', "_"))
            .unwrap_or_else(|| "crate".to_string())
    }

    /// Rust files under the root, skipping target/ and hidden directories
    fn discover_files(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                // The root itself may be hidden (e.g. a temp dir); only prune below it
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !(entry.file_type().is_dir() && (name == "target" || name.starts_with('.')))
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().map(|ext| ext == "rs").unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Resolve a raw segment path to a target node identifier
    ///
    /// `crate`/`self`/`super` prefixes are rebased onto the current module;
    /// internal references are trimmed to the longest known module prefix.
    /// Anything rooted at a lowercase foreign segment is treated as an
    /// external crate reference and kept whole. Capitalized roots are local
    /// type references that cannot be resolved without name lookup; they are
    /// dropped rather than guessed at.
    fn resolve(
        &self,
        raw: &[String],
        current_module: &str,
        crate_name: &str,
        modules: &BTreeSet<String>,
    ) -> Option<String> {
        let first = raw.first()?;

        let segments: Vec<String> = match first.as_str() {
            "crate" => std::iter::once(crate_name.to_string())
                .chain(raw[1..].iter().cloned())
                .collect(),
            "self" => current_module
                .split("::")
                .map(str::to_string)
                .chain(raw[1..].iter().cloned())
                .collect(),
            "super" => {
                let mut base: Vec<String> =
                    current_module.split("::").map(str::to_string).collect();
                let mut rest = raw;
                while rest.first().map(String::as_str) == Some("super") {
                    base.pop()?;
                    rest = &rest[1..];
                }
                if base.is_empty() {
                    return None;
                }
                base.extend(rest.iter().cloned());
                base
            }
            segment if segment == crate_name => raw.to_vec(),
            segment if segment.chars().next().is_some_and(char::is_lowercase) => {
                if !self.options.include_external {
                    return None;
                }
                return Some(raw.join("::"));
            }
            _ => return None,
        };

        // Trim to the longest known module prefix
        for end in (1..=segments.len()).rev() {
            let candidate = segments[..end].join("::");
            if modules.contains(&candidate) {
                return Some(candidate);
            }
        }

        tracing::debug!("Unresolved internal reference {}", segments.join("::"));
        None
    }
}

/// Derive a module identifier from a file path relative to the source root
///
/// `src/lib.rs` and `src/main.rs` map to the crate root; `src/x/mod.rs` and
/// `src/x.rs` both map to `{crate}::x`.
fn module_path_for(root: &Path, file: &Path, crate_name: &str) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);

    let mut segments = vec![crate_name.to_string()];
    let components: Vec<_> =
        relative.iter().map(|c| c.to_string_lossy().into_owned()).collect();

    for (index, component) in components.iter().enumerate() {
        let is_last = index + 1 == components.len();
        if index == 0 && component == "src" {
            continue;
        }
        if is_last {
            let stem = component.trim_end_matches(".rs");
            if !matches!(stem, "lib" | "main" | "mod") {
                segments.push(stem.to_string());
            }
        } else {
            segments.push(component.clone());
        }
    }

    segments.join("::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_tree(root: &Path, files: &[(&str, &str)]) {
        for (path, content) in files {
            let full = root.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
    }

    #[test]
    fn test_module_path_derivation() {
        let root = Path::new("/p/shop");

        assert_eq!(module_path_for(root, Path::new("/p/shop/src/lib.rs"), "shop"), "shop");
        assert_eq!(
            module_path_for(root, Path::new("/p/shop/src/domain/mod.rs"), "shop"),
            "shop::domain"
        );
        assert_eq!(
            module_path_for(root, Path::new("/p/shop/src/domain/user.rs"), "shop"),
            "shop::domain::user"
        );
    }

    #[test]
    fn test_extracts_internal_edges() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_tree(
            root,
            &[
                ("src/lib.rs", "pub mod domain;\npub mod application;\n"),
                ("src/domain/mod.rs", "pub struct User;\n"),
                (
                    "src/application/mod.rs",
                    "use crate::domain::User;\npub fn register(_u: User) {}\n",
                ),
            ],
        );

        let extractor = RustGraphExtractor::with_options(ExtractionOptions {
            crate_name: Some("shop".to_string()),
            ..Default::default()
        });
        let snapshot = extractor.extract_dir(root).unwrap();

        assert!(snapshot.nodes.contains(&"shop::domain".to_string()));
        assert!(snapshot
            .edges
            .iter()
            .any(|e| e.source == "shop::application" && e.target == "shop::domain"));
    }

    #[test]
    fn test_external_references_become_nodes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_tree(
            root,
            &[("src/domain/user.rs", "use serde::Deserialize;\npub struct User;\n")],
        );

        let extractor = RustGraphExtractor::with_options(ExtractionOptions {
            crate_name: Some("shop".to_string()),
            ..Default::default()
        });
        let snapshot = extractor.extract_dir(root).unwrap();

        assert!(snapshot.nodes.contains(&"serde::Deserialize".to_string()));
        assert!(snapshot
            .edges
            .iter()
            .any(|e| e.source == "shop::domain::user" && e.target == "serde::Deserialize"));
    }

    #[test]
    fn test_external_references_can_be_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_tree(root, &[("src/domain/user.rs", "use serde::Deserialize;\n")]);

        let extractor = RustGraphExtractor::with_options(ExtractionOptions {
            include_external: false,
            crate_name: Some("shop".to_string()),
            ..Default::default()
        });
        let snapshot = extractor.extract_dir(root).unwrap();

        assert!(!snapshot.nodes.iter().any(|n| n.starts_with("serde")));
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn test_super_references_resolve_to_parent_module() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_tree(
            root,
            &[
                ("src/domain/mod.rs", "pub mod user;\npub struct Base;\n"),
                ("src/domain/user.rs", "use super::Base;\npub struct User(pub Base);\n"),
            ],
        );

        let extractor = RustGraphExtractor::with_options(ExtractionOptions {
            crate_name: Some("shop".to_string()),
            ..Default::default()
        });
        let snapshot = extractor.extract_dir(root).unwrap();

        assert!(snapshot
            .edges
            .iter()
            .any(|e| e.source == "shop::domain::user" && e.target == "shop::domain"));
    }

    #[test]
    fn test_unparsable_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_tree(
            root,
            &[
                ("src/good.rs", "pub fn ok() {}\n"),
                ("src/bad.rs", "this is not rust {{{"),
            ],
        );

        let extractor = RustGraphExtractor::new();
        let snapshot = extractor.extract_dir(root).unwrap();

        // Both files still appear as nodes; only references from the bad one are lost
        assert_eq!(snapshot.nodes.iter().filter(|n| n.contains("good") || n.contains("bad")).count(), 2);
    }

    #[test]
    fn test_extract_dirs_merges_trees() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("billing");
        let second = temp_dir.path().join("shipping");
        write_tree(
            &first,
            &[
                ("src/lib.rs", "pub mod domain;\n"),
                ("src/domain/mod.rs", "pub struct Invoice;\n"),
            ],
        );
        write_tree(
            &second,
            &[
                ("src/lib.rs", "pub mod domain;\npub mod application;\n"),
                ("src/domain/mod.rs", "use crate::application::ship;\n"),
                ("src/application/mod.rs", "pub fn ship() {}\n"),
            ],
        );

        let extractor = RustGraphExtractor::new();
        let snapshot = extractor.extract_dirs(&[&first, &second]).unwrap();

        assert!(snapshot.nodes.contains(&"billing::domain".to_string()));
        assert!(snapshot.nodes.contains(&"shipping::domain".to_string()));
        assert!(snapshot
            .edges
            .iter()
            .any(|e| e.source == "shipping::domain" && e.target == "shipping::application"));
    }

    #[test]
    fn test_target_directory_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_tree(
            root,
            &[
                ("src/lib.rs", "pub mod a;\n"),
                ("target/debug/build/gen.rs", "pub fn junk() {}\n"),
            ],
        );

        let extractor = RustGraphExtractor::new();
        let snapshot = extractor.extract_dir(root).unwrap();

        assert!(!snapshot.nodes.iter().any(|n| n.contains("gen")));
    }
}

//! Reference collection from Rust syntax trees
//!
//! Architecture: Specialized Analysis Services - the visitor reads syn ASTs only
//! - Collects `use` trees and multi-segment path expressions as raw segment paths
//! - Resolution against the module set happens in the extractor, not here

use syn::visit::Visit;

/// Collects raw referenced paths from one parsed source file
pub(crate) struct ReferenceCollector {
    /// Referenced paths as segment lists, unresolved
    pub references: Vec<Vec<String>>,
    /// Whether to descend into `#[cfg(test)]` modules
    pub include_tests: bool,
}

impl ReferenceCollector {
    pub fn new(include_tests: bool) -> Self {
        Self { references: Vec::new(), include_tests }
    }

    fn record(&mut self, segments: Vec<String>) {
        if segments.len() > 1 {
            self.references.push(segments);
        }
    }

    fn flatten_use_tree(&mut self, tree: &syn::UseTree, mut prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.flatten_use_tree(&path.tree, prefix);
            }
            syn::UseTree::Name(name) => {
                prefix.push(name.ident.to_string());
                self.record(prefix);
            }
            syn::UseTree::Rename(rename) => {
                // The original name is the dependency, not the alias
                prefix.push(rename.ident.to_string());
                self.record(prefix);
            }
            syn::UseTree::Glob(_) => {
                self.record(prefix);
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.flatten_use_tree(item, prefix.clone());
                }
            }
        }
    }
}

/// Whether an item module is gated behind `#[cfg(test)]`
fn is_test_module(module: &syn::ItemMod) -> bool {
    module.attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .map(|ident| ident == "test")
                .unwrap_or(false)
    })
}

impl Visit<'_> for ReferenceCollector {
    fn visit_item_use(&mut self, item: &syn::ItemUse) {
        self.flatten_use_tree(&item.tree, Vec::new());
    }

    fn visit_item_mod(&mut self, module: &syn::ItemMod) {
        if !self.include_tests && is_test_module(module) {
            return;
        }
        syn::visit::visit_item_mod(self, module);
    }

    fn visit_path(&mut self, path: &syn::Path) {
        let segments: Vec<String> =
            path.segments.iter().map(|segment| segment.ident.to_string()).collect();
        self.record(segments);

        syn::visit::visit_path(self, path);
    }
}

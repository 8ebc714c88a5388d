//! Target filtering.
//!
//! Decides which nodes take part in hashing. A node is left out when its
//! name is excluded, or when it is the resource bundle synthesized for an
//! excluded node (`"{project}_{excluded}"`). Matching is by name across all
//! projects: two nodes sharing an excluded name are both dropped.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::graph::{Graph, Node, ProductKind};

/// Inclusion predicate for one hashing invocation.
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
  excluded: HashSet<String>,
  /// Synthesized bundle names to drop, per project root.
  excluded_bundles: HashMap<PathBuf, HashSet<String>>,
}

impl TargetFilter {
  /// Precompute the exclusion lookups for `graph`.
  pub fn new<S: AsRef<str>>(graph: &Graph, excluded: impl IntoIterator<Item = S>) -> Self {
    let excluded: HashSet<String> = excluded.into_iter().map(|s| s.as_ref().to_string()).collect();

    let excluded_bundles = if excluded.is_empty() {
      HashMap::new()
    } else {
      graph
        .projects()
        .map(|project| {
          let names = excluded.iter().map(|name| project.bundle_name(name)).collect();
          (project.path.clone(), names)
        })
        .collect()
    };

    Self {
      excluded,
      excluded_bundles,
    }
  }

  /// Whether `node` participates in hashing.
  pub fn included(&self, node: &Node) -> bool {
    if self.excluded.contains(node.name()) {
      return false;
    }

    if node.product == ProductKind::ResourceBundle
      && let Some(bundles) = self.excluded_bundles.get(node.project())
      && bundles.contains(node.name())
    {
      return false;
    }

    true
  }

  pub fn excluded_names(&self) -> impl Iterator<Item = &str> {
    self.excluded.iter().map(String::as_str)
  }
}

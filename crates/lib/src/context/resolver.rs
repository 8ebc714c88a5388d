//! Default build configuration resolution from the graph's projects.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::graph::{BuildVariant, Graph};
use crate::hasher::HashError;

use super::ConfigurationResolver;

/// Resolves configurations against those declared by the graph's projects.
///
/// 1. A requested name is returned when some project declares it.
/// 2. Otherwise the override is returned when some project declares it.
/// 3. Otherwise the alphabetically first debug configuration is used.
///
/// A requested or override name that no project declares is an error, as is
/// a graph with no debug configuration at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphConfigurationResolver;

impl GraphConfigurationResolver {
  fn declared(graph: &Graph) -> BTreeMap<&str, BuildVariant> {
    graph
      .projects()
      .flat_map(|p| p.configurations.iter().map(|(name, variant)| (name.as_str(), *variant)))
      .collect()
  }
}

#[async_trait]
impl ConfigurationResolver for GraphConfigurationResolver {
  async fn resolve_default_configuration(
    &self,
    requested: Option<&str>,
    configuration_override: Option<&str>,
    graph: &Graph,
  ) -> Result<String, HashError> {
    let declared = Self::declared(graph);

    if let Some(name) = requested.or(configuration_override) {
      return if declared.contains_key(name) {
        Ok(name.to_string())
      } else {
        Err(HashError::ConfigurationResolution(format!(
          "configuration '{}' is not declared by any project",
          name
        )))
      };
    }

    declared
      .iter()
      .find(|(_, variant)| **variant == BuildVariant::Debug)
      .map(|(name, _)| name.to_string())
      .ok_or_else(|| HashError::ConfigurationResolution("no debug configuration is declared".to_string()))
  }
}

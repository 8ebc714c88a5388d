//! Hashing DAG over the included nodes of a graph.
//!
//! This module builds the sub-graph induced by a [`TargetFilter`] and
//! computes the waves in which node digests can be combined: every node's
//! dependencies sit in an earlier wave.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::filter::TargetFilter;
use crate::graph::{Graph, Node, NodeId};
use crate::platform::Platform;

use super::types::HashError;

/// The induced sub-graph of included nodes.
///
/// Edges run from dependency to dependent. Edges to excluded nodes are
/// dropped, so excluded dependencies are absent rather than opaque.
/// Non-hashable nodes stay in the DAG so their own dependencies can be
/// propagated through them.
pub struct HashDag<'g> {
  /// The underlying graph.
  graph: DiGraph<&'g Node, ()>,

  /// Map from node identity to node index.
  indices: HashMap<&'g NodeId, NodeIndex>,
}

impl<'g> HashDag<'g> {
  /// Build the DAG of nodes accepted by `filter`.
  ///
  /// With a `destination`, nodes that build for another platform are kept
  /// only when a destination-matching node depends on them, directly or
  /// through other kept nodes.
  ///
  /// # Errors
  ///
  /// Returns `CycleDetected` if the included nodes form a cycle.
  pub fn new(source: &'g Graph, filter: &TargetFilter, destination: Option<&Platform>) -> Result<Self, HashError> {
    let mut kept: HashSet<&'g NodeId> = HashSet::new();
    for node in source.nodes() {
      if filter.included(node) {
        kept.insert(&node.id);
      } else {
        debug!(node = %node.id, "excluded from hashing");
      }
    }

    if destination.is_some() {
      kept = reachable_from_destination(source, &kept, destination);
    }

    let mut graph = DiGraph::new();
    let mut indices = HashMap::new();

    // First pass: create nodes for everything kept
    for node in source.nodes() {
      if kept.contains(&node.id) {
        indices.insert(&node.id, graph.add_node(node));
      }
    }

    // Second pass: edges between kept nodes only
    for node in source.nodes() {
      let Some(&dependent_idx) = indices.get(&node.id) else {
        continue;
      };
      for dep in &node.dependencies {
        if let Some(&dep_idx) = indices.get(dep) {
          graph.add_edge(dep_idx, dependent_idx, ());
        }
      }
    }

    let dag = Self { graph, indices };
    dag.verify_acyclic()?;

    Ok(dag)
  }

  /// Verify that the graph is acyclic.
  fn verify_acyclic(&self) -> Result<(), HashError> {
    toposort(&self.graph, None).map_err(|_| HashError::CycleDetected)?;
    Ok(())
  }

  /// Get hashable nodes organized into waves.
  ///
  /// Each wave contains nodes whose effective dependencies all sit in earlier
  /// waves. Nodes within a wave are ordered by identity.
  pub fn waves(&self) -> Result<Vec<Vec<&'g Node>>, HashError> {
    // Kahn's algorithm with a ready queue; a node's level is one past its
    // deepest dependency
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
    let mut node_level: HashMap<NodeIndex, usize> = HashMap::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();

    for idx in self.graph.node_indices() {
      let degree = self.graph.neighbors_directed(idx, Direction::Incoming).count();
      in_degree.insert(idx, degree);
      if degree == 0 {
        node_level.insert(idx, 0);
        queue.push_back(idx);
      }
    }

    let mut visited = 0;
    let mut level_count = 0;

    while let Some(idx) = queue.pop_front() {
      visited += 1;
      let level = node_level.get(&idx).copied().unwrap_or(0);
      level_count = level_count.max(level + 1);

      for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
        let entry = node_level.entry(neighbor).or_insert(0);
        *entry = (*entry).max(level + 1);

        if let Some(deg) = in_degree.get_mut(&neighbor) {
          *deg = deg.saturating_sub(1);
          if *deg == 0 {
            queue.push_back(neighbor);
          }
        }
      }
    }

    if visited != self.graph.node_count() {
      return Err(HashError::CycleDetected);
    }

    let mut waves: Vec<Vec<&'g Node>> = vec![Vec::new(); level_count];
    for (idx, level) in node_level {
      let node = self.graph[idx];
      if node.product.is_hashable() {
        waves[level].push(node);
      }
    }

    // Levels holding only transparent nodes leave gaps
    waves.retain(|w| !w.is_empty());
    for wave in &mut waves {
      wave.sort_by(|a, b| a.id.cmp(&b.id));
    }

    Ok(waves)
  }

  /// Hashable dependencies of `id`, looking through non-hashable nodes.
  ///
  /// Returned sorted by identity, without duplicates.
  pub fn effective_dependencies(&self, id: &NodeId) -> Vec<&'g NodeId> {
    let Some(&start) = self.indices.get(id) else {
      return Vec::new();
    };

    let mut deps = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<NodeIndex> = self.graph.neighbors_directed(start, Direction::Incoming).collect();

    while let Some(idx) = stack.pop() {
      if !visited.insert(idx) {
        continue;
      }
      let node = self.graph[idx];
      if node.product.is_hashable() {
        deps.push(&node.id);
      } else {
        stack.extend(self.graph.neighbors_directed(idx, Direction::Incoming));
      }
    }

    deps.sort();
    deps.dedup();
    deps
  }

  /// Whether `id` is part of the DAG.
  pub fn contains(&self, id: &NodeId) -> bool {
    self.indices.contains_key(id)
  }

  /// Number of included nodes, hashable or not.
  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  /// Number of included hashable nodes.
  pub fn hashable_count(&self) -> usize {
    self.graph.node_weights().filter(|n| n.product.is_hashable()).count()
  }
}

/// Nodes in `kept` that build for `destination`, plus every kept node they
/// depend on transitively.
fn reachable_from_destination<'g>(
  source: &'g Graph,
  kept: &HashSet<&'g NodeId>,
  destination: Option<&Platform>,
) -> HashSet<&'g NodeId> {
  let mut reached: HashSet<&'g NodeId> = HashSet::new();
  let mut stack: Vec<&'g Node> = source
    .nodes()
    .filter(|node| {
      kept.contains(&node.id) && node.product.is_hashable() && node.matches_destination(destination)
    })
    .collect();

  while let Some(node) = stack.pop() {
    if !reached.insert(&node.id) {
      continue;
    }
    for dep in &node.dependencies {
      if kept.contains(dep)
        && !reached.contains(dep)
        && let Some(dep_node) = source.node(dep)
      {
        stack.push(dep_node);
      }
    }
  }

  for id in kept.difference(&reached) {
    debug!(node = %id, "not needed for destination, skipping");
  }

  reached
}

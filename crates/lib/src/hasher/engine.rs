//! Recursive hash engine.
//!
//! Derives one digest per hashable node from its leaf digest, the digests of
//! its effective dependencies (sorted by identity) and the run-wide inputs.
//! Leaf digests do not depend on other nodes, so every leaf hash starts at
//! once, bounded by a semaphore. Only the combining step follows dependency
//! order, wave by wave.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::consts::CACHE_VERSION;
use crate::graph::{Node, NodeId};
use crate::util::hash::{Digest, DigestBuilder};

use super::dag::HashDag;
use super::leaf::LeafHasher;
use super::types::{HashError, HasherConfig};

/// Combine a leaf digest with dependency digests and run-wide inputs.
///
/// `dependencies` must already be in identity order.
pub fn combine_digest(leaf: &Digest, dependencies: &[&Digest], inputs: &[String]) -> Digest {
  let mut builder = DigestBuilder::new(CACHE_VERSION);
  builder.str_field(b'L', leaf.as_str());
  for dep in dependencies {
    builder.str_field(b'D', dep.as_str());
  }
  for input in inputs {
    builder.str_field(b'G', input);
  }
  builder.finish()
}

/// Compute digests for every hashable node in `dag`.
///
/// The memo table is only written here, after all leaf hashes finished, so
/// each node is leaf-hashed at most once and a dependent always sees its
/// dependencies' digests. Any leaf failure fails the whole run.
pub async fn hash_dag(
  dag: &HashDag<'_>,
  leaf: &Arc<dyn LeafHasher>,
  inputs: &[String],
  config: &HasherConfig,
) -> Result<BTreeMap<NodeId, Digest>, HashError> {
  let waves = dag.waves()?;
  debug!(wave_count = waves.len(), "computed hashing waves");

  let nodes: Vec<&Node> = waves.iter().flatten().copied().collect();
  let mut leaf_digests = hash_leaves(&nodes, leaf, config.parallelism).await?;
  let mut memo: BTreeMap<NodeId, Digest> = BTreeMap::new();

  for (wave_idx, wave) in waves.iter().enumerate() {
    debug!(wave = wave_idx, nodes = wave.len(), "combining wave");

    for node in wave {
      let leaf_digest = leaf_digests
        .remove(&node.id)
        .ok_or_else(|| HashError::TaskFailed(format!("no leaf digest for {}", node.id)))?;

      let deps = dag.effective_dependencies(&node.id);
      let mut dep_digests = Vec::with_capacity(deps.len());
      for dep in deps {
        // Waves guarantee dependencies are combined first
        let digest = memo.get(dep).ok_or(HashError::CycleDetected)?;
        dep_digests.push(digest);
      }

      let digest = combine_digest(&leaf_digest, &dep_digests, inputs);
      debug!(node = %node.id, digest = %digest, deps = dep_digests.len(), "hashed node");
      memo.insert(node.id.clone(), digest);
    }
  }

  Ok(memo)
}

/// Leaf-hash every node concurrently, at most `parallelism` at a time.
///
/// All tasks run to completion so the reported failure does not depend on
/// scheduling: it is the one for the lowest node identity.
async fn hash_leaves(
  nodes: &[&Node],
  leaf: &Arc<dyn LeafHasher>,
  parallelism: usize,
) -> Result<HashMap<NodeId, Digest>, HashError> {
  let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
  let mut join_set = JoinSet::new();

  for node in nodes {
    let node = (*node).clone();
    let leaf = Arc::clone(leaf);
    let semaphore = Arc::clone(&semaphore);

    join_set.spawn(async move {
      let result = match semaphore.acquire_owned().await {
        Ok(_permit) => leaf.hash_leaf(&node).await.map_err(|e| e.for_node(&node.id)),
        Err(e) => Err(HashError::TaskFailed(e.to_string())),
      };
      (node.id, result)
    });
  }

  let mut digests = HashMap::with_capacity(nodes.len());
  let mut failures: BTreeMap<NodeId, HashError> = BTreeMap::new();
  let mut panicked = None;

  while let Some(join_result) = join_set.join_next().await {
    match join_result {
      Ok((id, Ok(digest))) => {
        digests.insert(id, digest);
      }
      Ok((id, Err(e))) => {
        error!(node = %id, error = %e, "leaf hashing failed");
        failures.insert(id, e);
      }
      Err(e) => {
        error!(error = %e, "leaf hashing task panicked");
        if panicked.is_none() {
          panicked = Some(HashError::TaskFailed(e.to_string()));
        }
      }
    }
  }

  if let Some((_, err)) = failures.into_iter().next() {
    return Err(err);
  }
  if let Some(err) = panicked {
    return Err(err);
  }

  Ok(digests)
}

//! Test utilities for cachekey-lib.
//!
//! Cross-platform helpers for tests that spawn processes, plus graph
//! builders shared by the hashing tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::graph::{Node, NodeId, ProductKind};
use crate::hasher::{HashError, LeafHasher};
use crate::util::hash::{Digest, hash_bytes};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to echo a message.
///
/// On Unix, this uses /bin/echo directly.
/// On Windows, echo is a shell builtin, so we wrap it in cmd.exe.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("/bin/echo", vec![msg.to_string()])
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("echo {}", msg)])
}

pub const PROJECT: &str = "/p";

pub fn node(name: &str, product: ProductKind) -> Node {
  Node::new(PROJECT, name, product)
}

pub fn id(name: &str) -> NodeId {
  NodeId::new(PROJECT, name)
}

/// Leaf hasher returning a digest of the node name plus an optional salt,
/// counting calls per node. Nodes can be made to fail or to take longer.
#[derive(Default)]
pub struct CountingLeafHasher {
  salts: HashMap<String, String>,
  delays: HashMap<String, Duration>,
  failing: HashSet<String>,
  calls: Mutex<HashMap<NodeId, usize>>,
  total: AtomicUsize,
}

impl CountingLeafHasher {
  pub fn with_salt(mut self, name: &str, salt: &str) -> Self {
    self.salts.insert(name.to_string(), salt.to_string());
    self
  }

  pub fn failing_on(mut self, name: &str) -> Self {
    self.failing.insert(name.to_string());
    self
  }

  pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
    self.delays.insert(name.to_string(), delay);
    self
  }

  pub fn calls(&self, id: &NodeId) -> usize {
    self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
  }

  pub fn total_calls(&self) -> usize {
    self.total.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl LeafHasher for CountingLeafHasher {
  async fn hash_leaf(&self, node: &Node) -> Result<Digest, HashError> {
    self.total.fetch_add(1, Ordering::SeqCst);
    *self.calls.lock().unwrap().entry(node.id.clone()).or_default() += 1;

    if let Some(delay) = self.delays.get(node.name()) {
      tokio::time::sleep(*delay).await;
    }

    if self.failing.contains(node.name()) {
      return Err(HashError::LeafHash {
        node: node.id.clone(),
        message: "unreadable file".to_string(),
      });
    }

    let salt = self.salts.get(node.name()).map(String::as_str).unwrap_or("");
    Ok(hash_bytes(format!("{}:{}", node.name(), salt).as_bytes()))
  }
}

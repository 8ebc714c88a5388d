//! cachekey-lib: content-addressed cache keys for project build graphs
//!
//! This crate computes a deterministic digest for every buildable node in a
//! project dependency graph, so a build orchestrator can decide per node
//! whether a previously produced artifact can be reused:
//! - `graph`: immutable projects, nodes and dependency edges
//! - `filter`: which nodes take part in hashing
//! - `context`: run-wide inputs and their providers
//! - `hasher`: the recursive hash engine and its entry point

pub mod consts;
pub mod context;
pub mod filter;
pub mod graph;
pub mod hasher;
pub mod platform;
pub mod util;

pub use context::{
  CommandVersion, ConfigurationResolver, GraphConfigurationResolver, LanguageVersionProvider, RunContext,
  StaticVersion, ToolchainVersionProvider,
};
pub use filter::TargetFilter;
pub use graph::{Graph, GraphError, Node, NodeId, ProductKind, Project};
pub use hasher::{ContentHashes, FileContentHasher, GraphContentHasher, HashError, HasherConfig, LeafHasher};
pub use platform::Platform;
pub use util::hash::Digest;

//! Project dependency graph.
//!
//! The graph is an immutable arena of [`Project`]s and [`Node`]s keyed by
//! identity. Nodes reference their owning project by root path and their
//! dependencies by [`NodeId`]; neither is an owning edge.

pub mod manifest;
pub mod types;

pub use manifest::{GraphManifest, LoadedGraph, load_graph};
pub use types::{BuildVariant, Graph, GraphError, Node, NodeId, ProductKind, Project};

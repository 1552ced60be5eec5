//! Hierarchical community clustering for weighted graphs.
//!
//! [`cluster_graph`] reduces a graph to its largest connected component
//! (optionally), runs one of five strategies and returns a flat list of
//! [`Community`] records tagged with level and parent.

pub mod cluster;
pub mod config;
pub mod data;
pub mod embed;
pub mod error;
pub mod graph;
pub mod partition;
pub mod storage;

pub use cluster::{cluster_graph, Communities, Community};
pub use config::{ClusterConfig, ClusterStrategy, DEFAULT_SEED};
pub use error::{ClusterError, Result};
pub use graph::{GraphBuilder, WeightedGraph};

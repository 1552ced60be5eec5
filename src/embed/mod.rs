//! Graph embedding for density-based re-partitioning.
//!
//! The recursive density backend projects each oversized subgraph into a
//! low-dimensional coordinate space and clusters the points. [`Embedder`]
//! is that projection; [`SpectralEmbedding`] is the default.

#[cfg(feature = "density")]
mod spectral;

#[cfg(feature = "density")]
pub use spectral::SpectralEmbedding;

use crate::error::Result;
use crate::graph::WeightedGraph;
use ndarray::Array2;

/// Upper bound on embedding dimensions requested by the recursive backend
pub const MAX_EMBEDDING_DIM: usize = 64;

/// Projection of a graph into coordinate space
pub trait Embedder {
    /// One row per node, `dimensions` columns, reproducible for a seed.
    fn embed(&self, graph: &WeightedGraph, dimensions: usize, seed: u64) -> Result<Array2<f64>>;
}

/// Dimensions used for a subgraph of `node_count` nodes
pub fn embedding_dimensions(node_count: usize) -> usize {
    node_count.saturating_sub(1).min(MAX_EMBEDDING_DIM)
}

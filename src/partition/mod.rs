//! Partitioning routines behind the clustering backends.
//!
//! Each backend talks to its routine through one of three seams:
//!
//! - [`HierarchicalPartitioner`]: multi-resolution partitions reported as
//!   (node, cluster, parent, level) entries
//! - [`FlatPartitioner`]: one partition, as member lists
//! - [`DensityClusterer`]: labels for points of an embedding, with noise
//!
//! The default implementations are compiled in through cargo features, one
//! per strategy.

#[cfg(feature = "girvan-newman")]
mod girvan_newman;
#[cfg(feature = "density")]
mod hdbscan;
#[cfg(feature = "label-prop")]
mod label_prop;
#[cfg(feature = "leiden")]
mod leiden;
#[cfg(feature = "louvain")]
mod louvain;
#[cfg(any(feature = "leiden", feature = "louvain"))]
pub(crate) mod modularity;

#[cfg(feature = "girvan-newman")]
pub use girvan_newman::GirvanNewman;
#[cfg(feature = "density")]
pub use hdbscan::Hdbscan;
#[cfg(feature = "label-prop")]
pub use label_prop::LabelPropagation;
#[cfg(feature = "leiden")]
pub use leiden::{HierarchicalLeiden, Leiden};
#[cfg(feature = "louvain")]
pub use louvain::Louvain;

use crate::error::Result;
use crate::graph::WeightedGraph;
use ndarray::ArrayView2;
use std::collections::HashMap;
use std::hash::Hash;

/// One node's membership at one level of a hierarchical partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchicalCluster {
    /// Node index in the partitioned graph
    pub node: usize,
    /// Cluster id, unique across all levels
    pub cluster: usize,
    /// Cluster this one was split from
    pub parent_cluster: Option<usize>,
    /// Depth of the cluster, 0 for the coarsest level
    pub level: usize,
    /// Whether the cluster was left unsplit
    pub is_final: bool,
}

/// Routine producing a full multi-level partition in one call
pub trait HierarchicalPartitioner {
    /// Partition `graph`, splitting clusters larger than `max_cluster_size`
    /// further where the routine can.
    fn partition(
        &self,
        graph: &WeightedGraph,
        max_cluster_size: usize,
    ) -> Result<Vec<HierarchicalCluster>>;
}

/// Routine producing a single-level partition
pub trait FlatPartitioner {
    /// Member lists covering every node exactly once
    fn partition(&self, graph: &WeightedGraph) -> Result<Vec<Vec<usize>>>;
}

/// Density-based clusterer over embedded points
pub trait DensityClusterer {
    /// One label per row of `points`; `None` marks noise.
    fn fit_predict(
        &self,
        points: ArrayView2<'_, f64>,
        min_cluster_size: usize,
    ) -> Result<Vec<Option<usize>>>;
}

/// Group positions by label, in order of each label's first occurrence
pub fn group_by_label<L: Copy + Eq + Hash>(labels: &[L]) -> Vec<Vec<usize>> {
    let mut slots: HashMap<L, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (position, &label) in labels.iter().enumerate() {
        let slot = *slots.entry(label).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(position);
    }

    groups
}

/// Relabel to consecutive integers in first-occurrence order
#[cfg(any(feature = "leiden", feature = "louvain", feature = "label-prop"))]
pub(crate) fn renumber(assignment: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let relabeled = assignment
        .iter()
        .map(|&label| {
            let next = mapping.len();
            *mapping.entry(label).or_insert(next)
        })
        .collect();
    (relabeled, mapping.len())
}

/// Node visiting order drawn from a seeded generator
#[cfg(any(feature = "leiden", feature = "louvain", feature = "label-prop"))]
pub(crate) fn shuffled_order(n: usize, rng: &mut rand::rngs::StdRng) -> Vec<usize> {
    use rand::seq::SliceRandom;

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    order
}

//! Louvain modularity optimization.
//!
//! Multi-level greedy optimization (Blondel et al. 2008): move nodes
//! locally until modularity stops improving, collapse communities into
//! nodes, repeat on the coarse graph. Only the final flat partition is
//! reported.

use super::modularity::{local_moving, Network};
use super::{group_by_label, renumber, shuffled_order, FlatPartitioner};
use crate::config::DEFAULT_SEED;
use crate::error::{ClusterError, Result};
use crate::graph::WeightedGraph;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Seed for the node visiting order.
    seed: u64,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_levels: 32,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Community label of every node, numbered from 0 in node order.
    pub fn detect(&self, graph: &WeightedGraph) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(ClusterError::EmptyInput);
        }

        let base = Network::from_graph(graph);
        let mut network = base.clone();
        let mut membership: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);

        for level in 0..self.max_levels {
            let size = network.node_count();
            let mut assignment: Vec<usize> = (0..size).collect();
            let order = shuffled_order(size, &mut rng);
            if !local_moving(&network, &mut assignment, &order, self.resolution) {
                break;
            }

            let (assignment, count) = renumber(&assignment);
            for m in membership.iter_mut() {
                *m = assignment[*m];
            }
            log::debug!("Louvain level {}: {} -> {} nodes", level, size, count);

            if count == size {
                break;
            }
            network = network.aggregate(&assignment, count);
        }

        let (labels, _) = renumber(&membership);
        log::debug!(
            "Louvain partition modularity {:.4}",
            base.modularity(&labels, self.resolution)
        );
        Ok(labels)
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatPartitioner for Louvain {
    fn partition(&self, graph: &WeightedGraph) -> Result<Vec<Vec<usize>>> {
        Ok(group_by_label(&self.detect(graph)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn two_triangles() -> WeightedGraph {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a0", "a1").unwrap();
        builder.add_edge("a1", "a2").unwrap();
        builder.add_edge("a0", "a2").unwrap();
        builder.add_edge("b0", "b1").unwrap();
        builder.add_edge("b1", "b2").unwrap();
        builder.add_edge("b0", "b2").unwrap();
        builder.add_edge("a2", "b0").unwrap();
        builder.build()
    }

    #[test]
    fn test_louvain_two_cliques() {
        let communities = Louvain::new().detect(&two_triangles()).unwrap();
        assert_eq!(communities, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_louvain_partition_covers_nodes() {
        let groups = Louvain::new().partition(&two_triangles()).unwrap();
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_louvain_empty_graph() {
        assert!(Louvain::new().detect(&WeightedGraph::empty()).is_err());
    }

    #[test]
    fn test_louvain_edgeless() {
        let mut builder = GraphBuilder::new();
        builder.add_node("x").unwrap();
        builder.add_node("y").unwrap();
        builder.add_node("z").unwrap();
        let communities = Louvain::new().detect(&builder.build()).unwrap();
        assert_eq!(communities, vec![0, 1, 2]);
    }
}

//! Weighted undirected graph in compressed sparse row form

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::mem;

/// Compressed sparse representation of an undirected weighted graph.
///
/// Every edge is stored in both endpoint rows. Neighbor lists are sorted by
/// node index, which makes lookups binary searches and keeps every traversal
/// in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedGraph {
    /// Number of nodes in the graph
    pub(crate) node_count: usize,

    /// offsets[i] to offsets[i+1] is the neighbor range of node i
    pub(crate) offsets: Vec<usize>,

    /// Concatenated neighbor lists
    pub(crate) targets: Vec<u32>,

    /// Weight of each entry in `targets`
    pub(crate) weights: Vec<f64>,

    /// Caller node identifiers, indexed by node
    pub(crate) node_ids: Vec<String>,
}

impl WeightedGraph {
    /// Graph with no nodes
    pub fn empty() -> Self {
        Self {
            offsets: vec![0],
            ..Self::default()
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Identifier of a node
    pub fn node_id(&self, node: usize) -> &str {
        &self.node_ids[node]
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    /// Index of the node with the given identifier
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_ids.iter().position(|n| n == id)
    }

    /// Neighbors of a node
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let (start, end) = self.range(node);
        &self.targets[start..end]
    }

    /// Neighbors of a node paired with edge weights
    pub fn weighted_neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (start, end) = self.range(node);
        self.targets[start..end]
            .iter()
            .zip(&self.weights[start..end])
            .map(|(&t, &w)| (t as usize, w))
    }

    /// Check if there's an edge between two nodes
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).binary_search(&(b as u32)).is_ok()
    }

    /// Weight of the edge between two nodes, if any
    pub fn edge_weight(&self, a: usize, b: usize) -> Option<f64> {
        let (start, _) = self.range(a);
        self.neighbors(a)
            .binary_search(&(b as u32))
            .ok()
            .map(|pos| self.weights[start + pos])
    }

    pub fn degree(&self, node: usize) -> usize {
        let (start, end) = self.range(node);
        end - start
    }

    /// Sum of incident edge weights
    pub fn weighted_degree(&self, node: usize) -> f64 {
        let (start, end) = self.range(node);
        self.weights[start..end].iter().sum()
    }

    /// Sum of all edge weights, each edge counted once
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum::<f64>() / 2.0
    }

    /// Undirected edges as (a, b, weight) with a < b, in row order
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.node_count).flat_map(move |a| {
            self.weighted_neighbors(a)
                .filter(move |&(b, _)| a < b)
                .map(move |(b, w)| (a, b, w))
        })
    }

    /// Subgraph induced by `nodes`, in the order given.
    ///
    /// Node `i` of the result is `nodes[i]` of this graph.
    pub fn induced_subgraph(&self, nodes: &[usize]) -> WeightedGraph {
        let mut orig_to_sub = vec![u32::MAX; self.node_count];
        for (i, &node) in nodes.iter().enumerate() {
            orig_to_sub[node] = i as u32;
        }

        let mut sub = WeightedGraph {
            node_count: nodes.len(),
            offsets: Vec::with_capacity(nodes.len() + 1),
            targets: Vec::new(),
            weights: Vec::new(),
            node_ids: nodes.iter().map(|&n| self.node_ids[n].clone()).collect(),
        };
        sub.offsets.push(0);

        let mut row: Vec<(u32, f64)> = Vec::new();
        for &node in nodes {
            row.clear();
            for (target, weight) in self.weighted_neighbors(node) {
                let mapped = orig_to_sub[target];
                if mapped != u32::MAX {
                    row.push((mapped, weight));
                }
            }
            // The caller's order may differ from ours, so re-sort the row
            row.sort_unstable_by_key(|&(t, _)| t);
            for &(t, w) in &row {
                sub.targets.push(t);
                sub.weights.push(w);
            }
            sub.offsets.push(sub.targets.len());
        }

        sub
    }

    /// Dense weighted adjacency matrix
    pub fn adjacency_matrix(&self) -> DMatrix<f64> {
        let n = self.node_count;
        let mut adj = DMatrix::zeros(n, n);
        for a in 0..n {
            for (b, w) in self.weighted_neighbors(a) {
                adj[(a, b)] = w;
            }
        }
        adj
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<usize>();
        let targets = self.targets.capacity() * mem::size_of::<u32>();
        let weights = self.weights.capacity() * mem::size_of::<f64>();
        let ids = self.node_ids.iter().map(|s| s.capacity()).sum::<usize>();

        base + offsets + targets + weights + ids
    }

    fn range(&self, node: usize) -> (usize, usize) {
        (self.offsets[node], self.offsets[node + 1])
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::GraphBuilder;

    fn path_graph() -> crate::graph::WeightedGraph {
        let mut builder = GraphBuilder::new();
        builder.add_weighted_edge("a", "b", 2.0).unwrap();
        builder.add_weighted_edge("b", "c", 3.0).unwrap();
        builder.add_weighted_edge("c", "d", 1.0).unwrap();
        builder.build()
    }

    #[test]
    fn test_edges_and_weights() {
        let graph = path_graph();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(0, 2));
        assert_eq!(graph.edge_weight(2, 1), Some(3.0));
        assert_eq!(graph.weighted_degree(1), 5.0);
        assert_eq!(graph.total_weight(), 6.0);

        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![(0, 1, 2.0), (1, 2, 3.0), (2, 3, 1.0)]);
    }

    #[test]
    fn test_induced_subgraph_reorders() {
        let graph = path_graph();
        let sub = graph.induced_subgraph(&[2, 1, 3]);

        assert_eq!(sub.node_ids(), &["c", "b", "d"]);
        assert_eq!(sub.edge_count(), 2);
        assert_eq!(sub.edge_weight(0, 1), Some(3.0));
        assert_eq!(sub.edge_weight(0, 2), Some(1.0));
        assert!(!sub.has_edge(1, 2));
    }

    #[test]
    fn test_adjacency_matrix_symmetric() {
        let adj = path_graph().adjacency_matrix();
        assert_eq!(adj.shape(), (4, 4));
        assert_eq!(adj[(0, 1)], 2.0);
        assert_eq!(adj[(1, 0)], 2.0);
        assert_eq!(adj[(0, 3)], 0.0);
        assert_eq!(adj, adj.transpose());
    }
}

//! Graph construction module

use crate::error::{ClusterError, Result};
use crate::graph::WeightedGraph;
use petgraph::graph::{IndexType, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use std::collections::HashMap;

/// Node indices below this fit a `u32` with `u32::MAX` left free as the
/// unmapped marker of induced subgraphs
const MAX_NODES: usize = u32::MAX as usize;

fn node_index(position: usize) -> Result<u32> {
    if position >= MAX_NODES {
        return Err(ClusterError::TooManyNodes(MAX_NODES));
    }
    u32::try_from(position).map_err(|_| ClusterError::TooManyNodes(MAX_NODES))
}

/// Builder for incrementally constructing a WeightedGraph
#[derive(Debug, Default)]
pub struct GraphBuilder {
    /// Mapping from string IDs to node indices
    id_to_index: HashMap<String, u32>,

    /// Node string IDs
    node_ids: Vec<String>,

    /// Adjacency of each node, keyed by neighbor
    adjacency: Vec<HashMap<u32, f64>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new graph builder with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            adjacency: Vec::with_capacity(capacity),
        }
    }

    /// Get or create a node for the given string ID
    pub fn add_node(&mut self, id: &str) -> Result<u32> {
        if let Some(&idx) = self.id_to_index.get(id) {
            return Ok(idx);
        }

        let idx = node_index(self.node_ids.len())?;
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());
        self.adjacency.push(HashMap::new());

        Ok(idx)
    }

    /// Add an edge of weight 1.0
    pub fn add_edge(&mut self, a: &str, b: &str) -> Result<()> {
        self.insert(a, b, 1.0)
    }

    /// Add an edge with an explicit weight.
    ///
    /// Adding the same pair again replaces its weight. Self-loops create the
    /// node but no edge.
    pub fn add_weighted_edge(&mut self, a: &str, b: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ClusterError::InvalidWeight {
                from: a.to_string(),
                to: b.to_string(),
                weight,
            });
        }
        self.insert(a, b, weight)
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    fn insert(&mut self, a: &str, b: &str, weight: f64) -> Result<()> {
        let a_idx = self.add_node(a)?;
        let b_idx = self.add_node(b)?;

        if a_idx == b_idx {
            log::debug!("Dropping self-loop on '{}'", a);
            return Ok(());
        }

        self.adjacency[a_idx as usize].insert(b_idx, weight);
        self.adjacency[b_idx as usize].insert(a_idx, weight);
        Ok(())
    }

    /// Build the compressed graph
    pub fn build(self) -> WeightedGraph {
        let node_count = self.node_ids.len();
        let entry_count: usize = self.adjacency.iter().map(|row| row.len()).sum();

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::with_capacity(entry_count);
        let mut weights = Vec::with_capacity(entry_count);
        offsets.push(0);

        for row in self.adjacency {
            let mut row: Vec<(u32, f64)> = row.into_iter().collect();
            // Sort for binary search and deterministic traversal
            row.sort_unstable_by_key(|&(t, _)| t);
            for (t, w) in row {
                targets.push(t);
                weights.push(w);
            }
            offsets.push(targets.len());
        }

        WeightedGraph {
            node_count,
            offsets,
            targets,
            weights,
            node_ids: self.node_ids,
        }
    }

    /// Convert a petgraph graph.
    ///
    /// `node_id` names each node and `weight` extracts an edge weight. Nodes
    /// that map to the same identifier are merged. Directed graphs are
    /// symmetrized.
    pub fn from_petgraph<N, E, Ty, Ix>(
        graph: &petgraph::Graph<N, E, Ty, Ix>,
        node_id: impl Fn(NodeIndex<Ix>, &N) -> String,
        weight: impl Fn(&E) -> f64,
    ) -> Result<WeightedGraph>
    where
        Ty: EdgeType,
        Ix: IndexType,
    {
        let mut builder = GraphBuilder::with_capacity(graph.node_count());
        let ids: Vec<String> = graph
            .node_indices()
            .map(|idx| node_id(idx, &graph[idx]))
            .collect();

        for id in &ids {
            builder.add_node(id)?;
        }
        for edge in graph.edge_references() {
            let a = &ids[edge.source().index()];
            let b = &ids[edge.target().index()];
            builder.add_weighted_edge(a, b, weight(edge.weight()))?;
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::{DiGraph, UnGraph};

    #[test]
    fn test_duplicate_edge_overwrites_weight() {
        let mut builder = GraphBuilder::new();
        builder.add_weighted_edge("a", "b", 1.0).unwrap();
        builder.add_weighted_edge("b", "a", 4.0).unwrap();
        let graph = builder.build();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight(0, 1), Some(4.0));
        assert_eq!(graph.edge_weight(1, 0), Some(4.0));
    }

    #[test]
    fn test_self_loop_dropped() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("a", "a").unwrap();
        let graph = builder.build();

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut builder = GraphBuilder::new();
        assert!(builder.add_weighted_edge("a", "b", -1.0).is_err());
        assert!(builder.add_weighted_edge("a", "b", f64::NAN).is_err());
        assert!(builder.add_weighted_edge("a", "b", f64::INFINITY).is_err());
        assert!(builder.add_weighted_edge("a", "b", 0.0).is_ok());
    }

    #[test]
    fn test_node_index_range_checked() {
        assert_eq!(node_index(0), Ok(0));
        assert_eq!(node_index(MAX_NODES - 1), Ok(u32::MAX - 1));
        assert_eq!(
            node_index(MAX_NODES),
            Err(ClusterError::TooManyNodes(MAX_NODES))
        );
        assert!(node_index(usize::MAX).is_err());
    }

    #[test]
    fn test_isolated_nodes_kept() {
        let mut builder = GraphBuilder::new();
        builder.add_node("lonely").unwrap();
        builder.add_edge("a", "b").unwrap();
        let graph = builder.build();

        assert_eq!(graph.node_ids(), &["lonely", "a", "b"]);
        assert_eq!(graph.degree(0), 0);
    }

    #[test]
    fn test_from_petgraph_undirected() {
        let mut g = UnGraph::<&str, f64>::new_undirected();
        let a = g.add_node("a");
        let b = g.add_node("b");
        let c = g.add_node("c");
        g.add_edge(a, b, 2.0);
        g.add_edge(b, c, 0.5);

        let graph = GraphBuilder::from_petgraph(&g, |_, n| n.to_string(), |w| *w).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_weight(0, 1), Some(2.0));
        assert_eq!(graph.edge_weight(2, 1), Some(0.5));
    }

    #[test]
    fn test_from_petgraph_directed_symmetrized() {
        let mut g = DiGraph::<(), ()>::new();
        let a = g.add_node(());
        let b = g.add_node(());
        g.add_edge(a, b, ());

        let graph =
            GraphBuilder::from_petgraph(&g, |idx, _| format!("n{}", idx.index()), |_| 1.0)
                .unwrap();
        assert!(graph.has_edge(1, 0));
        assert_eq!(graph.index_of("n1"), Some(1));
    }
}

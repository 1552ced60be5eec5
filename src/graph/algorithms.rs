//! Connectivity algorithms and largest-component reduction

use crate::graph::WeightedGraph;
use std::borrow::Cow;

/// Union-Find data structure for connected component analysis
#[derive(Debug, Clone)]
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<usize>,

    /// Size of each set, valid at roots (for union by size)
    size: Vec<usize>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            size: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression: point every node on the path at the root
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Union the sets containing x and y. Returns false if they already
    /// shared a set.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return false;
        }

        // Attach smaller tree under root of larger tree
        let (big, small) = if self.size[root_x] >= self.size[root_y] {
            (root_x, root_y)
        } else {
            (root_y, root_x)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];

        true
    }

    /// Get the size of the set containing x
    pub fn size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }

    /// Group elements by set, ordered by each set's first element
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut slot = vec![usize::MAX; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for node in 0..n {
            let root = self.find(node);
            if slot[root] == usize::MAX {
                slot[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot[root]].push(node);
        }

        groups
    }
}

/// Connected components of the graph.
///
/// Components are ordered by their first node and list members in node order.
pub fn connected_components(graph: &WeightedGraph) -> Vec<Vec<usize>> {
    let mut sets = DisjointSets::new(graph.node_count());
    for (a, b, _) in graph.edges() {
        sets.union(a, b);
    }
    sets.groups()
}

/// Node indices of the largest connected component.
///
/// Ties between equally large components go to the one holding the
/// lexicographically smallest node id.
pub fn largest_connected_component(graph: &WeightedGraph) -> Vec<usize> {
    connected_components(graph)
        .into_iter()
        .map(|members| {
            let min_id = members
                .iter()
                .map(|&n| graph.node_id(n))
                .min()
                .unwrap_or_default()
                .to_string();
            (members, min_id)
        })
        .min_by(|(a, a_id), (b, b_id)| b.len().cmp(&a.len()).then_with(|| a_id.cmp(b_id)))
        .map(|(members, _)| members)
        .unwrap_or_default()
}

/// Optionally restrict the graph to its largest connected component.
///
/// Without reduction the input is returned as is.
pub fn reduce_graph(graph: &WeightedGraph, use_lcc: bool) -> Cow<'_, WeightedGraph> {
    if !use_lcc || graph.is_empty() {
        return Cow::Borrowed(graph);
    }

    let component = largest_connected_component(graph);
    if component.len() == graph.node_count() {
        return Cow::Borrowed(graph);
    }

    log::info!(
        "Restricting graph to largest connected component: {} of {} nodes",
        component.len(),
        graph.node_count()
    );
    Cow::Owned(graph.induced_subgraph(&component))
}

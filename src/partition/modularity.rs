//! Modularity optimization primitives shared by Louvain and Leiden.
//!
//! ```text
//! Q = (1/2m) × Σ_c [ in_c − γ × tot_c² / 2m ]
//! ```
//!
//! `in_c` is the adjacency weight inside community c (both directions, plus
//! self-loops of aggregated nodes), `tot_c` the summed degree of c.
//!
//! All loops walk nodes and neighbors in index order, and candidate
//! communities are considered in first-touch order, so results depend only on
//! the visiting order handed in by the caller.

use crate::graph::WeightedGraph;

/// Gains below this are treated as ties with staying put
const GAIN_EPSILON: f64 = 1e-12;

/// Local moving sweeps before giving up on convergence
const MAX_SWEEPS: usize = 64;

/// Weighted network that can be coarsened by community
#[derive(Debug, Clone)]
pub(crate) struct Network {
    /// node -> [(neighbor, weight)], no self entries
    pub adj: Vec<Vec<(usize, f64)>>,
    /// Internal weight of aggregated nodes
    pub self_loops: Vec<f64>,
    /// Weighted degree, self-loops included
    pub degrees: Vec<f64>,
    /// Sum of all degrees (2m)
    pub total_weight: f64,
}

impl Network {
    pub fn from_graph(graph: &WeightedGraph) -> Self {
        let n = graph.node_count();
        let adj: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|node| graph.weighted_neighbors(node).collect())
            .collect();
        let degrees: Vec<f64> = adj
            .iter()
            .map(|row| row.iter().map(|&(_, w)| w).sum())
            .collect();
        let total_weight = degrees.iter().sum();

        Self {
            adj,
            self_loops: vec![0.0; n],
            degrees,
            total_weight,
        }
    }

    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    /// Collapse every community into a single node.
    ///
    /// `assignment` must use labels 0..community_count.
    pub fn aggregate(&self, assignment: &[usize], community_count: usize) -> Network {
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); community_count];
        for (node, &c) in assignment.iter().enumerate() {
            members[c].push(node);
        }

        let mut adj = Vec::with_capacity(community_count);
        let mut self_loops = vec![0.0; community_count];
        let mut degrees = vec![0.0; community_count];
        let mut buffer = vec![0.0; community_count];
        let mut seen = vec![false; community_count];
        let mut touched: Vec<usize> = Vec::new();

        for (c, nodes) in members.iter().enumerate() {
            touched.clear();
            for &node in nodes {
                degrees[c] += self.degrees[node];
                self_loops[c] += self.self_loops[node];
                for &(neighbor, w) in &self.adj[node] {
                    let target = assignment[neighbor];
                    if target == c {
                        self_loops[c] += w;
                        continue;
                    }
                    if !seen[target] {
                        seen[target] = true;
                        touched.push(target);
                    }
                    buffer[target] += w;
                }
            }

            let mut row = Vec::with_capacity(touched.len());
            for &target in &touched {
                row.push((target, buffer[target]));
                buffer[target] = 0.0;
                seen[target] = false;
            }
            row.sort_unstable_by_key(|&(t, _)| t);
            adj.push(row);
        }

        Network {
            adj,
            self_loops,
            degrees,
            total_weight: self.total_weight,
        }
    }

    /// Modularity of a partition of this network
    pub fn modularity(&self, assignment: &[usize], resolution: f64) -> f64 {
        if self.total_weight == 0.0 {
            return 0.0;
        }

        let community_count = assignment.iter().copied().max().map_or(0, |m| m + 1);
        let mut internal = vec![0.0; community_count];
        let mut totals = vec![0.0; community_count];

        for node in 0..self.node_count() {
            let c = assignment[node];
            totals[c] += self.degrees[node];
            internal[c] += self.self_loops[node];
            for &(neighbor, w) in &self.adj[node] {
                if assignment[neighbor] == c {
                    internal[c] += w;
                }
            }
        }

        let m2 = self.total_weight;
        internal
            .iter()
            .zip(&totals)
            .map(|(&inside, &tot)| inside / m2 - resolution * (tot / m2) * (tot / m2))
            .sum()
    }
}

/// Greedily move nodes to the neighboring community with the best gain,
/// sweeping in `order` until nothing moves.
///
/// `assignment` must use labels below the network's node count. Returns
/// whether any node moved.
pub(crate) fn local_moving(
    network: &Network,
    assignment: &mut [usize],
    order: &[usize],
    resolution: f64,
) -> bool {
    let n = network.node_count();
    if network.total_weight == 0.0 || n == 0 {
        return false;
    }

    let m2 = network.total_weight;
    let mut community_totals = vec![0.0; n];
    for node in 0..n {
        community_totals[assignment[node]] += network.degrees[node];
    }

    let mut buffer = vec![0.0; n];
    let mut seen = vec![false; n];
    let mut touched: Vec<usize> = Vec::new();
    let mut any_moved = false;

    for _sweep in 0..MAX_SWEEPS {
        let mut moved = false;

        for &node in order {
            let current = assignment[node];
            let k = network.degrees[node];

            touched.clear();
            for &(neighbor, w) in &network.adj[node] {
                let c = assignment[neighbor];
                if !seen[c] {
                    seen[c] = true;
                    touched.push(c);
                }
                buffer[c] += w;
            }

            // Remove the node from its community before scoring
            community_totals[current] -= k;

            let gain =
                |c: usize, weight_to: f64| weight_to - resolution * community_totals[c] * k / m2;
            let mut best = current;
            let mut best_gain = gain(current, buffer[current]);
            for &c in &touched {
                let g = gain(c, buffer[c]);
                if g > best_gain + GAIN_EPSILON {
                    best = c;
                    best_gain = g;
                }
            }

            community_totals[best] += k;
            for &c in &touched {
                buffer[c] = 0.0;
                seen[c] = false;
            }

            if best != current {
                assignment[node] = best;
                moved = true;
            }
        }

        if !moved {
            break;
        }
        any_moved = true;
    }

    any_moved
}

/// Split every community into its connected pieces.
///
/// Returned labels are numbered in first-occurrence order.
pub(crate) fn refine_connected(network: &Network, assignment: &[usize]) -> (Vec<usize>, usize) {
    let n = network.node_count();
    let mut refined = vec![usize::MAX; n];
    let mut next = 0;
    let mut stack = Vec::new();

    for start in 0..n {
        if refined[start] != usize::MAX {
            continue;
        }
        let community = assignment[start];
        refined[start] = next;
        stack.push(start);

        while let Some(node) = stack.pop() {
            for &(neighbor, _) in &network.adj[node] {
                if refined[neighbor] == usize::MAX && assignment[neighbor] == community {
                    refined[neighbor] = next;
                    stack.push(neighbor);
                }
            }
        }
        next += 1;
    }

    (refined, next)
}

//! Label propagation for community detection.
//!
//! Very fast O(E) per sweep: every node adopts the label carrying the most
//! edge weight among its neighbors. Visiting order and ties come from a
//! seeded generator.

use super::{group_by_label, renumber, shuffled_order, FlatPartitioner};
use crate::config::DEFAULT_SEED;
use crate::error::{ClusterError, Result};
use crate::graph::WeightedGraph;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Weights this close to the maximum count as ties
const TIE_EPSILON: f64 = 1e-12;

/// Label propagation community detection.
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    /// Maximum sweeps.
    max_iter: usize,
    /// Random seed.
    seed: u64,
}

impl LabelPropagation {
    /// Create a new label propagation detector.
    pub fn new() -> Self {
        Self {
            max_iter: 100,
            seed: DEFAULT_SEED,
        }
    }

    /// Set random seed.
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

        let mut labels: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut votes = vec![0.0; n];
        let mut seen = vec![false; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut candidates: Vec<usize> = Vec::new();

        for iteration in 0..self.max_iter {
            let mut changed = false;

            for node in shuffled_order(n, &mut rng) {
                touched.clear();
                for (neighbor, weight) in graph.weighted_neighbors(node) {
                    let label = labels[neighbor];
                    if !seen[label] {
                        seen[label] = true;
                        touched.push(label);
                    }
                    votes[label] += weight;
                }
                if touched.is_empty() {
                    continue;
                }

                let best = touched
                    .iter()
                    .map(|&l| votes[l])
                    .fold(f64::NEG_INFINITY, f64::max);
                candidates.clear();
                candidates.extend(
                    touched
                        .iter()
                        .copied()
                        .filter(|&l| votes[l] >= best - TIE_EPSILON),
                );
                for &label in &touched {
                    votes[label] = 0.0;
                    seen[label] = false;
                }

                // Keeping the current label on a tie lets the sweep settle
                if candidates.contains(&labels[node]) {
                    continue;
                }
                let new_label = if candidates.len() == 1 {
                    candidates[0]
                } else {
                    candidates[rng.gen_range(0..candidates.len())]
                };

                labels[node] = new_label;
                changed = true;
            }

            if !changed {
                log::debug!("Label propagation settled after {} sweeps", iteration + 1);
                break;
            }
        }

        Ok(renumber(&labels).0)
    }
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatPartitioner for LabelPropagation {
    fn partition(&self, graph: &WeightedGraph) -> Result<Vec<Vec<usize>>> {
        Ok(group_by_label(&self.detect(graph)?))
    }
}

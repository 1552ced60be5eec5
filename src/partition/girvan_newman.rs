//! Girvan-Newman divisive clustering, first split only.
//!
//! Girvan & Newman (2002) remove the edge with the highest betweenness
//! until the graph falls apart, then repeat on the pieces to build a
//! dendrogram. Only the first split is taken here: edges are removed until
//! the number of connected components grows, and those components are the
//! partition.
//!
//! Edge betweenness uses Brandes' accumulation over unweighted shortest
//! paths. Sources are processed in fixed-size chunks in parallel and the
//! partial scores are summed in chunk order, so the scores do not depend on
//! the thread count.

use super::FlatPartitioner;
use crate::error::{ClusterError, Result};
use crate::graph::algorithms::DisjointSets;
use crate::graph::WeightedGraph;
use rayon::prelude::*;
use std::collections::VecDeque;

/// Sources handled by one parallel task
const SOURCE_CHUNK: usize = 64;

/// First Girvan-Newman split of a graph
#[derive(Debug, Clone, Default)]
pub struct GirvanNewman;

/// Edge list with removal flags and per-node incidence
struct EdgeSet {
    node_count: usize,
    endpoints: Vec<(usize, usize)>,
    alive: Vec<bool>,
    /// node -> [(neighbor, edge index)]
    incidence: Vec<Vec<(usize, usize)>>,
}

impl EdgeSet {
    fn from_graph(graph: &WeightedGraph) -> Self {
        let node_count = graph.node_count();
        let endpoints: Vec<(usize, usize)> = graph.edges().map(|(a, b, _)| (a, b)).collect();
        let mut incidence = vec![Vec::new(); node_count];
        for (idx, &(a, b)) in endpoints.iter().enumerate() {
            incidence[a].push((b, idx));
            incidence[b].push((a, idx));
        }

        Self {
            node_count,
            alive: vec![true; endpoints.len()],
            endpoints,
            incidence,
        }
    }

    fn components(&self) -> Vec<Vec<usize>> {
        let mut sets = DisjointSets::new(self.node_count);
        for (idx, &(a, b)) in self.endpoints.iter().enumerate() {
            if self.alive[idx] {
                sets.union(a, b);
            }
        }
        sets.groups()
    }

    /// Brandes edge betweenness over the surviving edges
    fn betweenness(&self) -> Vec<f64> {
        let sources: Vec<usize> = (0..self.node_count).collect();
        let partials: Vec<Vec<f64>> = sources
            .par_chunks(SOURCE_CHUNK)
            .map(|chunk| {
                let mut scores = vec![0.0; self.endpoints.len()];
                for &source in chunk {
                    self.accumulate_from(source, &mut scores);
                }
                scores
            })
            .collect();

        let mut total = vec![0.0; self.endpoints.len()];
        for partial in partials {
            for (t, p) in total.iter_mut().zip(partial) {
                *t += p;
            }
        }
        total
    }

    fn accumulate_from(&self, source: usize, scores: &mut [f64]) {
        let n = self.node_count;
        let mut order = Vec::with_capacity(n);
        let mut preds: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut dist = vec![usize::MAX; n];
        let mut queue = VecDeque::new();

        sigma[source] = 1.0;
        dist[source] = 0;
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &(w, edge) in &self.incidence[v] {
                if !self.alive[edge] {
                    continue;
                }
                if dist[w] == usize::MAX {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push((v, edge));
                }
            }
        }

        let mut delta = vec![0.0; n];
        for &w in order.iter().rev() {
            for &(v, edge) in &preds[w] {
                let credit = sigma[v] / sigma[w] * (1.0 + delta[w]);
                scores[edge] += credit;
                delta[v] += credit;
            }
        }
    }

    /// Surviving edge with the highest score, lowest index on ties
    fn strongest(&self, scores: &[f64]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, &score) in scores.iter().enumerate() {
            if !self.alive[idx] {
                continue;
            }
            match best {
                Some(b) if scores[b] >= score => {}
                _ => best = Some(idx),
            }
        }
        best
    }
}

impl GirvanNewman {
    pub fn new() -> Self {
        Self
    }

    /// Components after the first betweenness split.
    ///
    /// Members of each component are sorted by node id; components are
    /// ordered by their first node. A graph without edges returns its
    /// singleton components.
    pub fn first_split(&self, graph: &WeightedGraph) -> Result<Vec<Vec<usize>>> {
        if graph.is_empty() {
            return Err(ClusterError::EmptyInput);
        }

        let mut edges = EdgeSet::from_graph(graph);
        let initial = edges.components().len();
        let mut components = edges.components();
        let mut removed = 0;

        while components.len() <= initial {
            let scores = edges.betweenness();
            let Some(edge) = edges.strongest(&scores) else {
                break;
            };
            edges.alive[edge] = false;
            removed += 1;
            components = edges.components();
        }

        log::debug!(
            "Girvan-Newman split {} components into {} after removing {} edges",
            initial,
            components.len(),
            removed
        );

        for members in &mut components {
            members.sort_by(|&a, &b| graph.node_id(a).cmp(graph.node_id(b)));
        }
        Ok(components)
    }
}

impl FlatPartitioner for GirvanNewman {
    fn partition(&self, graph: &WeightedGraph) -> Result<Vec<Vec<usize>>> {
        self.first_split(graph)
    }
}

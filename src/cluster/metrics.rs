//! Community statistics and metrics

use crate::cluster::Community;
use crate::graph::WeightedGraph;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::collections::HashMap;

/// Statistics for one hierarchy level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub level: usize,
    pub community_count: usize,
    /// Sum of community sizes at this level
    pub member_count: usize,
    pub largest: usize,
    pub smallest: usize,
    pub avg_size: f64,
    pub avg_density: f64,
}

/// Lookup from node id to node index
pub type IdIndex<'a> = HashMap<&'a str, usize>;

pub fn node_index(graph: &WeightedGraph) -> IdIndex<'_> {
    graph
        .node_ids()
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect()
}

/// Node indices of a community's members; unknown ids are skipped
pub fn member_indices(index: &IdIndex<'_>, community: &Community) -> Vec<usize> {
    community
        .members
        .iter()
        .filter_map(|id| index.get(id.as_str()).copied())
        .collect()
}

/// Calculate density (internal edges / potential edges)
pub fn community_density(graph: &WeightedGraph, members: &[usize]) -> f64 {
    let n = members.len();
    if n <= 1 {
        return 1.0; // By convention, singleton communities have density 1
    }

    let mut sorted = members.to_vec();
    sorted.sort_unstable();

    // Each internal edge is seen from both ends
    let internal: usize = members
        .iter()
        .map(|&node| {
            graph
                .neighbors(node)
                .iter()
                .filter(|&&t| sorted.binary_search(&(t as usize)).is_ok())
                .count()
        })
        .sum();

    internal as f64 / (n * (n - 1)) as f64
}

/// Newman modularity of a set of disjoint groups.
///
/// Nodes outside every group are treated as singletons.
pub fn modularity(graph: &WeightedGraph, groups: &[Vec<usize>]) -> f64 {
    let m2 = 2.0 * graph.total_weight();
    if m2 <= 0.0 {
        return 0.0;
    }

    let mut label = vec![usize::MAX; graph.node_count()];
    for (g, members) in groups.iter().enumerate() {
        for &node in members {
            label[node] = g;
        }
    }

    let mut internal = vec![0.0; groups.len()];
    let mut degree = vec![0.0; groups.len()];
    let mut singletons = 0.0;
    for node in 0..graph.node_count() {
        let k = graph.weighted_degree(node);
        match label[node] {
            usize::MAX => singletons += (k / m2).powi(2),
            g => {
                degree[g] += k;
                internal[g] += graph
                    .weighted_neighbors(node)
                    .filter(|&(t, _)| label[t] == g)
                    .map(|(_, w)| w)
                    .sum::<f64>();
            }
        }
    }

    internal
        .iter()
        .zip(&degree)
        .map(|(&e, &d)| e / m2 - (d / m2).powi(2))
        .sum::<f64>()
        - singletons
}

/// Per-level counts, sizes and mean density, levels ascending
pub fn level_summary(graph: &WeightedGraph, communities: &[Community]) -> Vec<LevelSummary> {
    let index = node_index(graph);
    communities
        .iter()
        .into_group_map_by(|c| c.level)
        .into_iter()
        .sorted_by_key(|(level, _)| *level)
        .map(|(level, group)| {
            let sizes: Vec<usize> = group.iter().map(|c| c.len()).collect();
            let (smallest, largest) = match sizes.iter().minmax() {
                MinMaxResult::NoElements => (0, 0),
                MinMaxResult::OneElement(&s) => (s, s),
                MinMaxResult::MinMax(&lo, &hi) => (lo, hi),
            };
            let member_count: usize = sizes.iter().sum();
            let density_sum: f64 = group
                .iter()
                .map(|c| community_density(graph, &member_indices(&index, c)))
                .sum();

            LevelSummary {
                level,
                community_count: group.len(),
                member_count,
                largest,
                smallest,
                avg_size: member_count as f64 / group.len() as f64,
                avg_density: density_sum / group.len() as f64,
            }
        })
        .collect()
}

//! Recursive density re-partitioning.
//!
//! Every subgraph larger than the size bound is embedded, density
//! clustered, and split by label; each piece is handled the same way one
//! level down. A step that cannot split turns its subgraph into a leaf
//! without affecting siblings.
//!
//! Work happens in two passes. The split tree is grown first, sibling
//! branches in parallel. Community ids are then handed out by one
//! depth-first pre-order walk, children in label order, so ids match a
//! sequential recursion whatever the thread count.

use super::normalize::{HierarchyMapping, ParentMapping};
use crate::embed::{embedding_dimensions, Embedder};
use crate::error::{ClusterError, Result};
use crate::graph::WeightedGraph;
use crate::partition::{group_by_label, DensityClusterer};
use rayon::prelude::*;
use thiserror::Error;

/// Why a subgraph was left unsplit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitFailure {
    #[error("embedding step: {0}")]
    Embedding(ClusterError),

    #[error("clustering step: {0}")]
    Clustering(ClusterError),

    #[error("clusterer returned no labels")]
    NoLabels,

    #[error("clusterer returned {found} labels for {expected} nodes")]
    LabelMismatch { expected: usize, found: usize },

    /// Fewer than two groups, so recursing would not shrink anything
    #[error("split produced a single group")]
    NoProgress,
}

/// Split tree node: a member set and the pieces it split into
#[derive(Debug, Clone, PartialEq)]
struct SplitNode {
    members: Vec<usize>,
    children: Vec<SplitNode>,
}

/// Size-bounded recursive density clustering
#[derive(Debug, Clone)]
pub struct RecursiveDensity<E, D> {
    embedder: E,
    clusterer: D,
    max_cluster_size: usize,
    min_cluster_size: usize,
    seed: u64,
}

impl<E, D> RecursiveDensity<E, D>
where
    E: Embedder + Sync,
    D: DensityClusterer + Sync,
{
    pub fn new(
        embedder: E,
        clusterer: D,
        max_cluster_size: usize,
        min_cluster_size: usize,
        seed: u64,
    ) -> Self {
        Self {
            embedder,
            clusterer,
            max_cluster_size,
            min_cluster_size,
            seed,
        }
    }

    /// Communities of the whole graph, grouped by level
    pub fn run(&self, graph: &WeightedGraph) -> Result<(HierarchyMapping, ParentMapping)> {
        let mut hierarchy = HierarchyMapping::new();
        let mut parents = ParentMapping::new();
        if graph.is_empty() {
            return Ok((hierarchy, parents));
        }

        let root = self.grow(graph, (0..graph.node_count()).collect());

        let mut next_id = 0;
        assign_ids(root, 0, None, &mut next_id, &mut hierarchy, &mut parents);

        log::debug!(
            "Recursive density clustering produced {} communities over {} levels",
            next_id,
            hierarchy.level_count()
        );
        Ok((hierarchy, parents))
    }

    fn grow(&self, graph: &WeightedGraph, members: Vec<usize>) -> SplitNode {
        if members.len() <= self.max_cluster_size {
            return SplitNode {
                members,
                children: Vec::new(),
            };
        }

        let children = match self.split(graph, &members) {
            Ok(groups) => groups
                .into_par_iter()
                .map(|group| self.grow(graph, group))
                .collect(),
            Err(failure) => {
                log::debug!(
                    "Keeping {} nodes as a leaf: {}",
                    members.len(),
                    failure
                );
                Vec::new()
            }
        };

        SplitNode { members, children }
    }

    /// Member groups of one split, in label order
    fn split(
        &self,
        graph: &WeightedGraph,
        members: &[usize],
    ) -> std::result::Result<Vec<Vec<usize>>, SplitFailure> {
        let subgraph = graph.induced_subgraph(members);
        let points = self
            .embedder
            .embed(&subgraph, embedding_dimensions(members.len()), self.seed)
            .map_err(SplitFailure::Embedding)?;
        let labels = self
            .clusterer
            .fit_predict(points.view(), self.min_cluster_size)
            .map_err(SplitFailure::Clustering)?;

        if labels.is_empty() {
            return Err(SplitFailure::NoLabels);
        }
        if labels.len() != members.len() {
            return Err(SplitFailure::LabelMismatch {
                expected: members.len(),
                found: labels.len(),
            });
        }

        let groups = group_by_label(&labels);
        if groups.len() < 2 {
            return Err(SplitFailure::NoProgress);
        }

        Ok(groups
            .into_iter()
            .map(|group| group.into_iter().map(|i| members[i]).collect())
            .collect())
    }
}

fn assign_ids(
    node: SplitNode,
    level: usize,
    parent: Option<usize>,
    next_id: &mut usize,
    hierarchy: &mut HierarchyMapping,
    parents: &mut ParentMapping,
) {
    let SplitNode { members, children } = node;
    if members.is_empty() {
        return;
    }

    let id = *next_id;
    *next_id += 1;
    hierarchy.insert_community(level, id, members);
    if let Some(parent) = parent {
        parents.insert(id, parent);
    }

    for child in children {
        assign_ids(child, level + 1, Some(id), next_id, hierarchy, parents);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use ndarray::{Array2, ArrayView2};

    /// One coordinate per node: its position in the subgraph
    struct IndexEmbedder;

    impl Embedder for IndexEmbedder {
        fn embed(&self, graph: &WeightedGraph, _dimensions: usize, _seed: u64) -> Result<Array2<f64>> {
            let n = graph.node_count();
            Ok(Array2::from_shape_fn((n, 1), |(i, _)| i as f64))
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _: &WeightedGraph, _: usize, _: u64) -> Result<Array2<f64>> {
            Err(ClusterError::Embedding("no convergence".to_string()))
        }
    }

    /// Front half of the points against the back half
    struct Halving;

    impl DensityClusterer for Halving {
        fn fit_predict(&self, points: ArrayView2<'_, f64>, _: usize) -> Result<Vec<Option<usize>>> {
            let n = points.nrows();
            Ok((0..n).map(|i| Some(usize::from(i >= n / 2))).collect())
        }
    }

    struct SingleLabel;

    impl DensityClusterer for SingleLabel {
        fn fit_predict(&self, points: ArrayView2<'_, f64>, _: usize) -> Result<Vec<Option<usize>>> {
            Ok(vec![Some(0); points.nrows()])
        }
    }

    struct ShortLabels;

    impl DensityClusterer for ShortLabels {
        fn fit_predict(&self, _: ArrayView2<'_, f64>, _: usize) -> Result<Vec<Option<usize>>> {
            Ok(vec![Some(0)])
        }
    }

    /// Fails on subgraphs of one size, halves the rest
    struct FailsAtSize {
        size: usize,
    }

    impl DensityClusterer for FailsAtSize {
        fn fit_predict(&self, points: ArrayView2<'_, f64>, min: usize) -> Result<Vec<Option<usize>>> {
            if points.nrows() == self.size {
                return Err(ClusterError::Clustering("boom".to_string()));
            }
            Halving.fit_predict(points, min)
        }
    }

    fn path(n: usize) -> WeightedGraph {
        let mut builder = GraphBuilder::new();
        for i in 1..n {
            builder.add_edge(&format!("n{:03}", i - 1), &format!("n{:03}", i)).unwrap();
        }
        builder.build()
    }

    fn communities(
        hierarchy: &HierarchyMapping,
        parents: &ParentMapping,
    ) -> Vec<(usize, usize, Option<usize>, Vec<usize>)> {
        hierarchy
            .iter()
            .map(|(level, id, members)| (level, id, parents.get(&id).copied(), members.to_vec()))
            .collect()
    }

    #[test]
    fn test_ids_follow_depth_first_order() {
        let backend = RecursiveDensity::new(IndexEmbedder, Halving, 2, 2, 0);
        let (hierarchy, parents) = backend.run(&path(8)).unwrap();

        let all = communities(&hierarchy, &parents);
        assert_eq!(
            all,
            vec![
                (0, 0, None, (0..8).collect()),
                (1, 1, Some(0), vec![0, 1, 2, 3]),
                (1, 4, Some(0), vec![4, 5, 6, 7]),
                (2, 2, Some(1), vec![0, 1]),
                (2, 3, Some(1), vec![2, 3]),
                (2, 5, Some(4), vec![4, 5]),
                (2, 6, Some(4), vec![6, 7]),
            ]
        );
    }

    #[test]
    fn test_leaves_respect_bound() {
        let backend = RecursiveDensity::new(IndexEmbedder, Halving, 10, 2, 0);
        let (hierarchy, parents) = backend.run(&path(100)).unwrap();

        let with_children: std::collections::HashSet<usize> = parents.values().copied().collect();
        for (_, id, members) in hierarchy.iter() {
            if !with_children.contains(&id) {
                assert!(members.len() <= 10);
            }
        }
    }

    #[test]
    fn test_embedding_failure_leaves_root() {
        let backend = RecursiveDensity::new(FailingEmbedder, Halving, 3, 2, 0);
        let (hierarchy, parents) = backend.run(&path(10)).unwrap();
        assert_eq!(hierarchy.community_count(), 1);
        assert!(parents.is_empty());
    }

    #[test]
    fn test_single_label_does_not_recurse() {
        let backend = RecursiveDensity::new(IndexEmbedder, SingleLabel, 3, 2, 0);
        let (hierarchy, _) = backend.run(&path(10)).unwrap();
        assert_eq!(hierarchy.community_count(), 1);
    }

    #[test]
    fn test_label_mismatch_is_leaf() {
        let backend = RecursiveDensity::new(IndexEmbedder, ShortLabels, 3, 2, 0);
        let graph = path(10);
        let members: Vec<usize> = (0..10).collect();
        assert_eq!(
            backend.split(&graph, &members),
            Err(SplitFailure::LabelMismatch {
                expected: 10,
                found: 1
            })
        );
    }

    #[test]
    fn test_failure_stays_in_its_branch() {
        // 13 nodes halve into 6 and 7; only the 6-node branch fails
        let backend = RecursiveDensity::new(IndexEmbedder, FailsAtSize { size: 6 }, 2, 2, 0);
        let (hierarchy, parents) = backend.run(&path(13)).unwrap();
        let all = communities(&hierarchy, &parents);

        let level1: Vec<_> = all.iter().filter(|c| c.0 == 1).collect();
        assert_eq!(level1.len(), 2);
        let (failed, split) = (level1[0], level1[1]);
        assert_eq!(failed.3.len(), 6);
        assert_eq!(split.3.len(), 7);
        assert!(!parents.values().any(|&p| p == failed.1));
        assert!(parents.values().any(|&p| p == split.1));
    }

    #[test]
    fn test_empty_graph() {
        let backend = RecursiveDensity::new(IndexEmbedder, Halving, 3, 2, 0);
        let (hierarchy, parents) = backend.run(&WeightedGraph::empty()).unwrap();
        assert!(hierarchy.is_empty());
        assert!(parents.is_empty());
    }

    #[test]
    fn test_spectral_density_splits_cliques() {
        use crate::embed::SpectralEmbedding;
        use crate::partition::Hdbscan;

        let mut builder = GraphBuilder::new();
        for c in 0..10 {
            for i in 0..10 {
                for j in (i + 1)..10 {
                    builder.add_edge(&format!("c{c}n{i}"), &format!("c{c}n{j}")).unwrap();
                }
            }
            builder.add_edge(&format!("c{c}n0"), &format!("c{}n5", (c + 1) % 10)).unwrap();
        }
        let graph = builder.build();

        let backend = RecursiveDensity::new(SpectralEmbedding::new(), Hdbscan::new(), 10, 5, 1);
        let (hierarchy, parents) = backend.run(&graph).unwrap();

        let members: std::collections::HashMap<usize, Vec<usize>> = hierarchy
            .iter()
            .map(|(_, id, m)| (id, m.to_vec()))
            .collect();
        for (child, parent) in &parents {
            assert!(members[child].iter().all(|n| members[parent].contains(n)));
            assert!(members[child].len() < members[parent].len());
        }
        let level0: Vec<_> = hierarchy.iter().filter(|c| c.0 == 0).collect();
        assert_eq!(level0.len(), 1);
        assert_eq!(level0[0].2.len(), 100);

        // One level-1 leaf per clique
        let level1: Vec<_> = hierarchy.iter().filter(|c| c.0 == 1).collect();
        assert_eq!(level1.len(), 10);
        assert_eq!(hierarchy.level_count(), 2);
        for (_, _, clique) in level1 {
            assert_eq!(clique.len(), 10);
            let prefix = &graph.node_id(clique[0])[..3];
            assert!(clique.iter().all(|&n| graph.node_id(n).starts_with(prefix)));
        }
    }
}

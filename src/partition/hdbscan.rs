//! HDBSCAN-style density clustering of embedded points.
//!
//! 1. Core distance of each point: distance to its `min_cluster_size`-th
//!    nearest neighbor
//! 2. Minimum spanning tree over mutual-reachability distances
//!    `max(core(a), core(b), d(a, b))`
//! 3. Single-linkage dendrogram from the sorted tree edges
//! 4. Condensation: walking down from the root, a split where both sides
//!    hold at least `min_cluster_size` points creates two child clusters;
//!    a smaller side drops out of the current cluster as individual points
//! 5. Excess-of-mass selection on cluster stability
//!    `Σ (λ_leave − λ_birth)` with `λ = 1 / distance`
//!
//! Points that leave the hierarchy above every selected cluster are noise.
//! Distances are computed on demand, never stored as an n x n matrix, so
//! memory stays linear in the point count. Core distances are computed in
//! parallel per point; everything after runs in index order, so labels are
//! a pure function of the input.
//!
//! Campello, Moulavi, Sander (2013). "Density-Based Clustering Based on
//! Hierarchical Density Estimates." PAKDD.

use super::DensityClusterer;
use crate::error::{ClusterError, Result};
use crate::graph::algorithms::DisjointSets;
use ndarray::ArrayView2;
use rayon::prelude::*;

/// Cap for λ when points coincide
const MAX_LAMBDA: f64 = 1e12;

/// Density clusterer over an embedding
#[derive(Debug, Clone, Default)]
pub struct Hdbscan {
    /// Allow the root to be selected when nothing splits
    allow_single_cluster: bool,
}

impl Hdbscan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_single_cluster(mut self, allow: bool) -> Self {
        self.allow_single_cluster = allow;
        self
    }
}

/// Merge step of the single-linkage dendrogram
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

struct Dendrogram {
    leaves: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    /// Build from spanning tree edges (a, b, distance)
    fn from_tree(leaves: usize, mut edges: Vec<(usize, usize, f64)>) -> Self {
        edges.sort_by(|x, y| x.2.total_cmp(&y.2));

        let mut sets = DisjointSets::new(leaves);
        let mut node_of_root: Vec<usize> = (0..leaves).collect();
        let mut merges = Vec::with_capacity(leaves.saturating_sub(1));

        for (a, b, distance) in edges {
            let root_a = sets.find(a);
            let root_b = sets.find(b);
            if root_a == root_b {
                continue;
            }
            let left = node_of_root[root_a];
            let right = node_of_root[root_b];
            sets.union(root_a, root_b);

            let size = sets.size(root_a);
            let root = sets.find(root_a);
            node_of_root[root] = leaves + merges.len();
            merges.push(Merge {
                left,
                right,
                distance,
                size,
            });
        }

        Self { leaves, merges }
    }

    fn size(&self, node: usize) -> usize {
        if node < self.leaves {
            1
        } else {
            self.merges[node - self.leaves].size
        }
    }

    /// Leaf points below a node
    fn points_under(&self, node: usize) -> Vec<usize> {
        let mut points = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current < self.leaves {
                points.push(current);
            } else {
                let merge = &self.merges[current - self.leaves];
                stack.push(merge.right);
                stack.push(merge.left);
            }
        }
        points
    }
}

/// Condensed cluster tree with per-cluster stability
struct CondensedTree {
    parent: Vec<Option<usize>>,
    birth: Vec<f64>,
    children: Vec<Vec<usize>>,
    stability: Vec<f64>,
    /// Cluster each point falls out of
    point_cluster: Vec<usize>,
}

impl CondensedTree {
    fn build(dendrogram: &Dendrogram, min_cluster_size: usize) -> Self {
        let n = dendrogram.leaves;
        let mut tree = CondensedTree {
            parent: vec![None],
            birth: vec![0.0],
            children: vec![Vec::new()],
            stability: vec![0.0],
            point_cluster: vec![0; n],
        };
        if dendrogram.merges.is_empty() {
            return tree;
        }

        let root = n + dendrogram.merges.len() - 1;
        let mut stack = vec![(root, 0usize)];

        while let Some((node, cluster)) = stack.pop() {
            let merge = dendrogram.merges[node - n];
            let lambda = lambda_of(merge.distance);
            let left_big = dendrogram.size(merge.left) >= min_cluster_size;
            let right_big = dendrogram.size(merge.right) >= min_cluster_size;

            match (left_big, right_big) {
                (true, true) => {
                    // Right is pushed first so the left child is expanded
                    // and numbered first
                    let left = tree.add_child(cluster, lambda);
                    let right = tree.add_child(cluster, lambda);
                    for child in [merge.left, merge.right] {
                        tree.stability[cluster] +=
                            dendrogram.size(child) as f64 * (lambda - tree.birth[cluster]);
                    }
                    stack.push((merge.right, right));
                    stack.push((merge.left, left));
                }
                (true, false) => {
                    tree.drop_points(dendrogram, merge.right, cluster, lambda);
                    stack.push((merge.left, cluster));
                }
                (false, true) => {
                    tree.drop_points(dendrogram, merge.left, cluster, lambda);
                    stack.push((merge.right, cluster));
                }
                (false, false) => {
                    tree.drop_points(dendrogram, merge.left, cluster, lambda);
                    tree.drop_points(dendrogram, merge.right, cluster, lambda);
                }
            }
        }

        tree
    }

    fn add_child(&mut self, parent: usize, lambda: f64) -> usize {
        let id = self.parent.len();
        self.parent.push(Some(parent));
        self.birth.push(lambda);
        self.children.push(Vec::new());
        self.stability.push(0.0);
        self.children[parent].push(id);
        id
    }

    fn drop_points(&mut self, dendrogram: &Dendrogram, node: usize, cluster: usize, lambda: f64) {
        for point in dendrogram.points_under(node) {
            self.point_cluster[point] = cluster;
            self.stability[cluster] += lambda - self.birth[cluster];
        }
    }

    /// Excess-of-mass selection, bottom up
    fn select(&self, allow_single_cluster: bool) -> Vec<bool> {
        let count = self.parent.len();
        let mut selected = vec![false; count];
        let mut subtree = self.stability.clone();

        // Children always have larger ids than their parent
        for cluster in (0..count).rev() {
            if cluster == 0 && !allow_single_cluster {
                continue;
            }
            if self.children[cluster].is_empty() {
                selected[cluster] = true;
                continue;
            }

            let child_sum: f64 = self.children[cluster].iter().map(|&c| subtree[c]).sum();
            if child_sum > self.stability[cluster] {
                subtree[cluster] = child_sum;
            } else {
                selected[cluster] = true;
                let mut stack = self.children[cluster].clone();
                while let Some(descendant) = stack.pop() {
                    selected[descendant] = false;
                    stack.extend(self.children[descendant].iter().copied());
                }
            }
        }

        selected
    }

    fn labels(&self, allow_single_cluster: bool) -> Vec<Option<usize>> {
        let selected = self.select(allow_single_cluster);

        let mut label_of = vec![None; selected.len()];
        let mut next = 0;
        for (cluster, &is_selected) in selected.iter().enumerate() {
            if is_selected {
                label_of[cluster] = Some(next);
                next += 1;
            }
        }

        self.point_cluster
            .iter()
            .map(|&start| {
                let mut cluster = Some(start);
                while let Some(c) = cluster {
                    if selected[c] {
                        return label_of[c];
                    }
                    cluster = self.parent[c];
                }
                None
            })
            .collect()
    }
}

fn lambda_of(distance: f64) -> f64 {
    if distance > 0.0 {
        (1.0 / distance).min(MAX_LAMBDA)
    } else {
        MAX_LAMBDA
    }
}

fn distance(points: ArrayView2<'_, f64>, a: usize, b: usize) -> f64 {
    points
        .row(a)
        .iter()
        .zip(points.row(b).iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Distance from each point to its k-th nearest other point
fn core_distances(points: ArrayView2<'_, f64>, k: usize) -> Vec<f64> {
    let n = points.nrows();
    let k = k.clamp(1, n - 1);
    (0..n)
        .into_par_iter()
        .map(|i| {
            let mut others: Vec<f64> = (0..n)
                .filter(|&j| j != i)
                .map(|j| distance(points, i, j))
                .collect();
            let (_, kth, _) = others.select_nth_unstable_by(k - 1, |a, b| a.total_cmp(b));
            *kth
        })
        .collect()
}

/// Prim's algorithm over the complete mutual-reachability graph
fn mutual_reachability_tree(points: ArrayView2<'_, f64>, core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = points.nrows();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[current] = true;
    for _ in 1..n {
        let mut next = None;
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let reach = distance(points, current, j).max(core[current]).max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                from[j] = current;
            }
            match next {
                Some(b) if best[b] <= best[j] => {}
                _ => next = Some(j),
            }
        }
        let Some(j) = next else { break };
        in_tree[j] = true;
        edges.push((from[j], j, best[j]));
        current = j;
    }

    edges
}

impl DensityClusterer for Hdbscan {
    fn fit_predict(
        &self,
        points: ArrayView2<'_, f64>,
        min_cluster_size: usize,
    ) -> Result<Vec<Option<usize>>> {
        let n = points.nrows();
        if n == 0 {
            return Err(ClusterError::EmptyInput);
        }
        if points.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::Clustering(
                "embedding contains non-finite coordinates".to_string(),
            ));
        }

        let min_cluster_size = min_cluster_size.max(2);
        if n < min_cluster_size {
            return Ok(vec![None; n]);
        }

        let core = core_distances(points, min_cluster_size);
        let tree = mutual_reachability_tree(points, &core);
        let dendrogram = Dendrogram::from_tree(n, tree);
        let condensed = CondensedTree::build(&dendrogram, min_cluster_size);

        let labels = condensed.labels(self.allow_single_cluster);
        log::debug!(
            "Density clustering of {} points: {} condensed clusters, {} noise points",
            n,
            condensed.parent.len(),
            labels.iter().filter(|l| l.is_none()).count()
        );
        Ok(labels)
    }
}

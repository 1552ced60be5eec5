//! Spectral embedding of a weighted graph.
//!
//! ```text
//! 1. M = D^{-1/2} A D^{-1/2}            normalized adjacency
//! 2. leading k+1 eigenpairs of M + I     (shift keeps the operator PSD)
//! 3. drop the trivial first vector
//! 4. divide row i by sqrt(degree_i)      random-walk coordinates
//! 5. scale column j by (λ_j / λ_0)^t     diffusion over t lazy-walk steps
//! 6. flip each column so its largest |entry| is positive
//! ```
//!
//! Step 5 keeps weak modes from drowning the community structure when far
//! more dimensions are requested than the graph has communities.
//!
//! Small graphs are decomposed densely with [`SymmetricEigen`]; larger ones
//! use a seeded subspace iteration that only touches the sparse rows, with
//! QR orthonormalization and a Rayleigh-Ritz step on the projected block.

use super::Embedder;
use crate::error::{ClusterError, Result};
use crate::graph::WeightedGraph;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest node count solved with the dense eigensolver
const DENSE_LIMIT: usize = 200;

/// Block columns carried beyond the requested count
const OVERSAMPLE: usize = 8;

const MAX_ITERATIONS: usize = 1000;
const RESIDUAL_TOLERANCE: f64 = 1e-9;

/// Lazy random-walk steps applied to every coordinate
const DIFFUSION_TIME: i32 = 8;

/// Eigenpairs sorted by descending eigenvalue, one vector per column
struct Eigenpairs {
    values: Vec<f64>,
    vectors: DMatrix<f64>,
    converged: bool,
}

impl Eigenpairs {
    /// Leading `count` pairs of an unordered decomposition
    fn leading(values: &DVector<f64>, vectors: &DMatrix<f64>, count: usize) -> Self {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
        order.truncate(count);

        Self {
            values: order.iter().map(|&i| values[i]).collect(),
            vectors: vectors.select_columns(order.iter()),
            converged: true,
        }
    }
}

/// Leading `count` eigenpairs of a dense symmetric matrix
fn decompose(matrix: DMatrix<f64>, count: usize) -> Result<Eigenpairs> {
    let eigen = SymmetricEigen::try_new(matrix, f64::EPSILON, 0)
        .ok_or_else(|| ClusterError::Embedding("symmetric eigensolver failed".to_string()))?;
    Ok(Eigenpairs::leading(&eigen.eigenvalues, &eigen.eigenvectors, count))
}

/// Laplacian-eigenmap style embedding with diffusion weighting
#[derive(Debug, Clone)]
pub struct SpectralEmbedding {
    dense_limit: usize,
}

impl SpectralEmbedding {
    pub fn new() -> Self {
        Self {
            dense_limit: DENSE_LIMIT,
        }
    }

    /// Node count above which the iterative solver is used
    pub fn with_dense_limit(mut self, dense_limit: usize) -> Self {
        self.dense_limit = dense_limit;
        self
    }

    fn inverse_sqrt_degrees(graph: &WeightedGraph) -> Vec<f64> {
        (0..graph.node_count())
            .map(|node| {
                let degree = graph.weighted_degree(node);
                if degree > 0.0 {
                    1.0 / degree.sqrt()
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn dense_pairs(graph: &WeightedGraph, scale: &[f64], count: usize) -> Result<Eigenpairs> {
        let n = graph.node_count();
        let mut shifted = graph.adjacency_matrix();
        for b in 0..n {
            for a in 0..n {
                shifted[(a, b)] *= scale[a] * scale[b];
            }
            shifted[(b, b)] += 1.0;
        }
        decompose(shifted, count)
    }

    /// `(M + I) * block` without materializing M
    fn apply(graph: &WeightedGraph, scale: &[f64], block: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = block.clone();
        for node in 0..graph.node_count() {
            for (neighbor, w) in graph.weighted_neighbors(node) {
                let factor = w * scale[node] * scale[neighbor];
                for col in 0..block.ncols() {
                    out[(node, col)] += factor * block[(neighbor, col)];
                }
            }
        }
        out
    }

    fn sparse_pairs(
        graph: &WeightedGraph,
        scale: &[f64],
        count: usize,
        seed: u64,
    ) -> Result<Eigenpairs> {
        let n = graph.node_count();
        let width = (count + OVERSAMPLE).min(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut block = DMatrix::from_fn(n, width, |_, _| rng.gen_range(-1.0..1.0));

        let mut pairs = Eigenpairs {
            values: Vec::new(),
            vectors: DMatrix::zeros(n, 0),
            converged: false,
        };
        for _ in 0..MAX_ITERATIONS {
            let basis = block.qr().q();
            let image = Self::apply(graph, scale, &basis);
            let projected = basis.transpose() * &image;
            let projected = (&projected + projected.transpose()) * 0.5;

            let ritz = decompose(projected, width)?;
            let vectors = &basis * &ritz.vectors;
            let images = &image * &ritz.vectors;

            let residual = (0..count.min(width))
                .map(|j| {
                    let expected = vectors.column(j) * ritz.values[j];
                    (&images.column(j) - &expected).norm()
                })
                .fold(0.0, f64::max);

            pairs.values = ritz.values;
            pairs.vectors = vectors;
            if residual < RESIDUAL_TOLERANCE {
                pairs.converged = true;
                break;
            }
            block = images;
        }

        pairs.values.truncate(count);
        let kept = pairs.vectors.ncols().min(count);
        pairs.vectors = pairs.vectors.columns(0, kept).into_owned();
        Ok(pairs)
    }
}

impl Default for SpectralEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for SpectralEmbedding {
    fn embed(&self, graph: &WeightedGraph, dimensions: usize, seed: u64) -> Result<Array2<f64>> {
        let n = graph.node_count();
        if n < 2 {
            return Err(ClusterError::Embedding(format!(
                "need at least 2 nodes, got {}",
                n
            )));
        }
        if dimensions == 0 || dimensions >= n {
            return Err(ClusterError::invalid_parameter(
                "dimensions",
                format!("must be in 1..{}, got {}", n, dimensions),
            ));
        }
        if graph.edge_count() == 0 {
            return Err(ClusterError::Embedding("graph has no edges".to_string()));
        }

        let scale = Self::inverse_sqrt_degrees(graph);
        let pairs = if n <= self.dense_limit {
            Self::dense_pairs(graph, &scale, dimensions + 1)?
        } else {
            Self::sparse_pairs(graph, &scale, dimensions + 1, seed)?
        };
        if !pairs.converged {
            log::debug!(
                "Eigensolver did not converge on {} nodes, using best estimate",
                n
            );
        }
        if pairs.vectors.ncols() < dimensions + 1 {
            return Err(ClusterError::Embedding(format!(
                "eigensolver returned {} vectors, needed {}",
                pairs.vectors.ncols(),
                dimensions + 1
            )));
        }

        let top = pairs.values[0].max(f64::MIN_POSITIVE);
        let diffusion: Vec<f64> = pairs.values[1..=dimensions]
            .iter()
            .map(|&value| (value.max(0.0) / top).powi(DIFFUSION_TIME))
            .collect();

        let mut embedding = Array2::from_shape_fn((n, dimensions), |(i, j)| {
            pairs.vectors[(i, j + 1)] * scale[i] * diffusion[j]
        });
        for mut column in embedding.axis_iter_mut(Axis(1)) {
            let mut pivot = 0.0f64;
            for &x in column.iter() {
                if x.abs() > pivot.abs() + 1e-12 {
                    pivot = x;
                }
            }
            if pivot < 0.0 {
                column.mapv_inplace(|x| -x);
            }
        }

        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(ClusterError::Embedding(
                "embedding contains non-finite values".to_string(),
            ));
        }
        Ok(embedding)
    }
}

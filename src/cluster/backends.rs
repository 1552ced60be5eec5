//! Backend selection and dispatch.
//!
//! One variant per strategy. A variant only exists when the cargo feature
//! carrying its routine is enabled; selecting a strategy that was compiled
//! out fails with [`ClusterError::BackendUnavailable`].

use super::normalize::NativePartition;
use crate::config::{ClusterConfig, ClusterStrategy};
use crate::error::{ClusterError, Result};
use crate::graph::WeightedGraph;

#[cfg(feature = "density")]
use super::recursive::RecursiveDensity;
#[cfg(feature = "density")]
use crate::embed::SpectralEmbedding;
#[cfg(feature = "girvan-newman")]
use crate::partition::GirvanNewman;
#[cfg(feature = "density")]
use crate::partition::Hdbscan;
#[cfg(feature = "label-prop")]
use crate::partition::LabelPropagation;
#[cfg(feature = "louvain")]
use crate::partition::Louvain;
#[cfg(feature = "leiden")]
use crate::partition::{HierarchicalLeiden, HierarchicalPartitioner, Leiden};
#[cfg(any(feature = "louvain", feature = "label-prop", feature = "girvan-newman"))]
use crate::partition::FlatPartitioner;

/// A configured clustering backend
#[derive(Debug, Clone)]
pub enum Backend {
    #[cfg(feature = "leiden")]
    HierarchicalPartition {
        partitioner: HierarchicalLeiden,
        max_cluster_size: usize,
    },
    #[cfg(feature = "density")]
    RecursiveDensity(RecursiveDensity<SpectralEmbedding, Hdbscan>),
    #[cfg(feature = "louvain")]
    GreedyModularity(Louvain),
    #[cfg(feature = "label-prop")]
    LabelPropagation(LabelPropagation),
    #[cfg(feature = "girvan-newman")]
    EdgeBetweenness(GirvanNewman),
}

impl Backend {
    /// Build the backend for `config.strategy`; parameters the strategy
    /// does not use are ignored.
    pub fn from_config(config: &ClusterConfig) -> Result<Self> {
        #[allow(unused_variables)]
        let seed = config.effective_seed();

        match config.strategy {
            #[cfg(feature = "leiden")]
            ClusterStrategy::HierarchicalPartition => Ok(Backend::HierarchicalPartition {
                partitioner: HierarchicalLeiden::new(Leiden::new().with_seed(seed)),
                max_cluster_size: config.max_cluster_size,
            }),
            #[cfg(feature = "density")]
            ClusterStrategy::RecursiveDensity => Ok(Backend::RecursiveDensity(RecursiveDensity::new(
                SpectralEmbedding::new(),
                Hdbscan::new(),
                config.max_cluster_size,
                config.min_cluster_size,
                seed,
            ))),
            #[cfg(feature = "louvain")]
            ClusterStrategy::GreedyModularity => {
                Ok(Backend::GreedyModularity(Louvain::new().with_seed(seed)))
            }
            #[cfg(feature = "label-prop")]
            ClusterStrategy::LabelPropagation => Ok(Backend::LabelPropagation(
                LabelPropagation::new().with_seed(seed),
            )),
            #[cfg(feature = "girvan-newman")]
            ClusterStrategy::EdgeBetweenness => Ok(Backend::EdgeBetweenness(GirvanNewman::new())),
            #[allow(unreachable_patterns)]
            strategy => Err(ClusterError::BackendUnavailable(strategy)),
        }
    }

    /// Strategy this backend implements
    pub fn strategy(&self) -> ClusterStrategy {
        match *self {
            #[cfg(feature = "leiden")]
            Backend::HierarchicalPartition { .. } => ClusterStrategy::HierarchicalPartition,
            #[cfg(feature = "density")]
            Backend::RecursiveDensity(_) => ClusterStrategy::RecursiveDensity,
            #[cfg(feature = "louvain")]
            Backend::GreedyModularity(_) => ClusterStrategy::GreedyModularity,
            #[cfg(feature = "label-prop")]
            Backend::LabelPropagation(_) => ClusterStrategy::LabelPropagation,
            #[cfg(feature = "girvan-newman")]
            Backend::EdgeBetweenness(_) => ClusterStrategy::EdgeBetweenness,
        }
    }

    /// Partition `graph` in the backend's native output shape
    #[allow(unused_variables)]
    pub fn run(&self, graph: &WeightedGraph) -> Result<NativePartition> {
        match *self {
            #[cfg(feature = "leiden")]
            Backend::HierarchicalPartition {
                ref partitioner,
                max_cluster_size,
            } => Ok(NativePartition::Hierarchical(
                partitioner.partition(graph, max_cluster_size)?,
            )),
            #[cfg(feature = "density")]
            Backend::RecursiveDensity(ref backend) => {
                let (hierarchy, parents) = backend.run(graph)?;
                Ok(NativePartition::Tree(hierarchy, parents))
            }
            #[cfg(feature = "louvain")]
            Backend::GreedyModularity(ref louvain) => {
                Ok(NativePartition::Flat(louvain.partition(graph)?))
            }
            #[cfg(feature = "label-prop")]
            Backend::LabelPropagation(ref label_prop) => {
                Ok(NativePartition::Flat(label_prop.partition(graph)?))
            }
            #[cfg(feature = "girvan-newman")]
            Backend::EdgeBetweenness(ref girvan_newman) => {
                Ok(NativePartition::Flat(girvan_newman.partition(graph)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_strategy_builds() {
        for strategy in ClusterStrategy::ALL {
            let config = ClusterConfig::default().with_strategy(strategy);
            match Backend::from_config(&config) {
                Ok(backend) => assert_eq!(backend.strategy(), strategy),
                Err(err) => assert_eq!(err, ClusterError::BackendUnavailable(strategy)),
            }
        }
    }

    #[cfg(feature = "louvain")]
    #[test]
    fn test_flat_backend_output_shape() {
        use crate::graph::GraphBuilder;

        let mut builder = GraphBuilder::new();
        builder.add_edge("a", "b").unwrap();
        builder.add_edge("c", "d").unwrap();
        let config = ClusterConfig::default().with_strategy(ClusterStrategy::GreedyModularity);
        let native = Backend::from_config(&config)
            .unwrap()
            .run(&builder.build())
            .unwrap();
        assert_eq!(native, NativePartition::Flat(vec![vec![0, 1], vec![2, 3]]));
    }
}

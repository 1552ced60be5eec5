//! Community clustering entry point and output records

pub mod backends;
pub mod metrics;
pub mod normalize;
#[cfg(feature = "density")]
pub mod recursive;

use crate::config::ClusterConfig;
use crate::error::Result;
use crate::graph::{reduce_graph, WeightedGraph};
use backends::Backend;
use itertools::Itertools;
use normalize::{normalize, NativePartition};
use serde::{Deserialize, Serialize};

/// One community at one hierarchy level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Hierarchy depth, 0 for the coarsest partition
    pub level: usize,

    /// Identifier, unique across the whole result
    pub id: usize,

    /// Community this one refines; `None` for roots, written as -1
    #[serde(with = "parent_id")]
    pub parent: Option<usize>,

    /// Member node ids, no duplicates
    pub members: Vec<String>,
}

impl Community {
    /// Parent as an integer, -1 for roots
    pub fn parent_id(&self) -> i64 {
        self.parent.map_or(-1, |p| p as i64)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of one clustering call
pub type Communities = Vec<Community>;

mod parent_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(parent: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(parent.map_or(-1, |p| p as i64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        match i64::deserialize(deserializer)? {
            -1 => Ok(None),
            value => usize::try_from(value)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid parent id {}", value))),
        }
    }
}

/// Cluster `graph` into a multi-level list of communities.
///
/// The graph is first reduced to its largest connected component when
/// `config.use_lcc` is set. A graph left with no nodes gives an empty list.
pub fn cluster_graph(graph: &WeightedGraph, config: &ClusterConfig) -> Result<Communities> {
    config.validate()?;
    let backend = Backend::from_config(config)?;

    let reduced = reduce_graph(graph, config.use_lcc);
    if reduced.is_empty() {
        log::warn!("Graph has no nodes to cluster, returning no communities");
        return Ok(Vec::new());
    }

    log::info!(
        "Clustering {} nodes and {} edges with strategy '{}'",
        reduced.node_count(),
        reduced.edge_count(),
        backend.strategy()
    );
    let native = backend.run(&reduced)?;
    if let NativePartition::Flat(ref groups) = native {
        log::debug!(
            "Flat partition of {} communities, modularity {:.4}",
            groups.len(),
            metrics::modularity(&reduced, groups)
        );
    }
    let communities = normalize(&reduced, native);

    let sizes = communities
        .iter()
        .map(|c| (c.level, c.len()))
        .into_group_map();
    for (level, sizes) in sizes.into_iter().sorted_by_key(|(level, _)| *level) {
        log::info!(
            "Level {}: {} communities, largest {} members",
            level,
            sizes.len(),
            sizes.iter().max().copied().unwrap_or(0)
        );
    }

    Ok(communities)
}

//! Configuration management for community clustering

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seed used when the caller does not supply one
pub const DEFAULT_SEED: u64 = 0xDEAD_BEEF;

/// Clustering strategies supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterStrategy {
    /// Multi-resolution Leiden partitioning bounded by a maximum cluster size
    #[default]
    HierarchicalPartition,
    /// Spectral re-embedding plus density clustering of oversized clusters
    RecursiveDensity,
    /// Louvain modularity optimization, single level
    GreedyModularity,
    /// Label propagation, single level
    LabelPropagation,
    /// First Girvan-Newman split, single level
    EdgeBetweenness,
}

impl ClusterStrategy {
    /// Every strategy, in documentation order
    pub const ALL: [ClusterStrategy; 5] = [
        ClusterStrategy::HierarchicalPartition,
        ClusterStrategy::RecursiveDensity,
        ClusterStrategy::GreedyModularity,
        ClusterStrategy::LabelPropagation,
        ClusterStrategy::EdgeBetweenness,
    ];

    /// Canonical name of the strategy
    pub fn name(&self) -> &'static str {
        match self {
            ClusterStrategy::HierarchicalPartition => "hierarchical-partition",
            ClusterStrategy::RecursiveDensity => "recursive-density",
            ClusterStrategy::GreedyModularity => "greedy-modularity",
            ClusterStrategy::LabelPropagation => "label-propagation",
            ClusterStrategy::EdgeBetweenness => "edge-betweenness",
        }
    }

    /// Resolve a strategy by name, falling back to `HierarchicalPartition`
    /// for names outside the supported set.
    pub fn from_name(name: &str) -> Self {
        match name.parse() {
            Ok(strategy) => strategy,
            Err(_) => {
                log::warn!(
                    "Unknown clustering strategy '{}', falling back to {}",
                    name,
                    ClusterStrategy::default()
                );
                ClusterStrategy::default()
            }
        }
    }
}

impl FromStr for ClusterStrategy {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "hierarchical-partition" | "leiden" => Ok(ClusterStrategy::HierarchicalPartition),
            "recursive-density" | "evoc" => Ok(ClusterStrategy::RecursiveDensity),
            "greedy-modularity" | "louvain" => Ok(ClusterStrategy::GreedyModularity),
            "label-propagation" | "label-prop" => Ok(ClusterStrategy::LabelPropagation),
            "edge-betweenness" | "girvan-newman" => Ok(ClusterStrategy::EdgeBetweenness),
            _ => Err(ClusterError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for ClusterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for ClusterStrategy {
    fn from(name: String) -> Self {
        ClusterStrategy::from_name(&name)
    }
}

impl From<ClusterStrategy> for String {
    fn from(strategy: ClusterStrategy) -> Self {
        strategy.name().to_string()
    }
}

/// Parameters for one clustering call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum community size before a hierarchical strategy splits again
    pub max_cluster_size: usize,

    /// Restrict clustering to the largest connected component
    pub use_lcc: bool,

    /// Seed for every randomized routine
    pub seed: Option<u64>,

    /// Which algorithm to run
    pub strategy: ClusterStrategy,

    /// Minimum density cluster size (recursive-density only)
    pub min_cluster_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_cluster_size: 10,
            use_lcc: true,
            seed: Some(DEFAULT_SEED),
            strategy: ClusterStrategy::default(),
            min_cluster_size: 2,
        }
    }
}

impl ClusterConfig {
    pub fn with_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_cluster_size(mut self, max_cluster_size: usize) -> Self {
        self.max_cluster_size = max_cluster_size;
        self
    }

    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    pub fn with_lcc(mut self, use_lcc: bool) -> Self {
        self.use_lcc = use_lcc;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Seed actually handed to the routines
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_cluster_size == 0 {
            return Err(ClusterError::invalid_parameter(
                "max_cluster_size",
                "must be at least 1",
            ));
        }
        if self.min_cluster_size == 0 {
            return Err(ClusterError::invalid_parameter(
                "min_cluster_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_aliases() {
        assert_eq!(
            "leiden".parse::<ClusterStrategy>().unwrap(),
            ClusterStrategy::HierarchicalPartition
        );
        assert_eq!(
            "EVOC".parse::<ClusterStrategy>().unwrap(),
            ClusterStrategy::RecursiveDensity
        );
        assert_eq!(
            "label_prop".parse::<ClusterStrategy>().unwrap(),
            ClusterStrategy::LabelPropagation
        );
        assert_eq!(
            "girvan_newman".parse::<ClusterStrategy>().unwrap(),
            ClusterStrategy::EdgeBetweenness
        );
        for strategy in ClusterStrategy::ALL {
            assert_eq!(strategy.name().parse::<ClusterStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_unknown_strategy() {
        assert_eq!(
            "spectral".parse::<ClusterStrategy>(),
            Err(ClusterError::UnknownStrategy("spectral".to_string()))
        );
        assert_eq!(
            ClusterStrategy::from_name("spectral"),
            ClusterStrategy::HierarchicalPartition
        );
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: ClusterConfig =
            serde_json::from_str(r#"{"strategy": "louvain", "seed": null}"#).unwrap();
        assert_eq!(config.strategy, ClusterStrategy::GreedyModularity);
        assert_eq!(config.max_cluster_size, 10);
        assert!(config.use_lcc);
        assert_eq!(config.effective_seed(), DEFAULT_SEED);

        let fallback: ClusterConfig =
            serde_json::from_str(r#"{"strategy": "no-such-thing"}"#).unwrap();
        assert_eq!(fallback.strategy, ClusterStrategy::HierarchicalPartition);
    }

    #[test]
    fn test_config_validate() {
        assert!(ClusterConfig::default().validate().is_ok());
        assert!(ClusterConfig::default()
            .with_max_cluster_size(0)
            .validate()
            .is_err());
        assert!(ClusterConfig::default()
            .with_min_cluster_size(0)
            .validate()
            .is_err());
    }
}

//! Error types for the clustering engine

use crate::config::ClusterStrategy;
use thiserror::Error;

/// Result alias used by the clustering engine.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors returned by graph construction, partitioning routines and dispatch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// A routine was handed a graph or point set with nothing in it
    #[error("empty input provided")]
    EmptyInput,

    /// Strict strategy parsing met a name outside the supported set
    #[error("unknown clustering strategy '{0}'")]
    UnknownStrategy(String),

    /// The routine backing a strategy was compiled out of this build
    #[error("clustering strategy '{0}' is not available in this build")]
    BackendUnavailable(ClusterStrategy),

    /// Parameter outside its accepted range
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Edge weight that is negative, NaN or infinite
    #[error("invalid weight {weight} on edge '{from}' -> '{to}'")]
    InvalidWeight {
        /// First endpoint
        from: String,
        /// Second endpoint
        to: String,
        /// Offending weight
        weight: f64,
    },

    /// Node indices are stored as `u32`
    #[error("graph exceeds the limit of {0} nodes")]
    TooManyNodes(usize),

    /// Spectral projection of a subgraph failed
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Density clustering of an embedding failed
    #[error("density clustering failed: {0}")]
    Clustering(String),
}

impl ClusterError {
    pub(crate) fn invalid_parameter(name: &'static str, message: impl Into<String>) -> Self {
        ClusterError::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

//! JSON graph files
//!
//! ```json
//! { "nodes": ["a", "b", "c"],
//!   "edges": [{ "source": "a", "target": "b", "weight": 2.0 },
//!             { "source": "b", "target": "c" }] }
//! ```
//!
//! `nodes` is optional and only needed for isolated nodes; endpoints of
//! every edge are added automatically. Missing weights default to 1.0.

use crate::graph::{GraphBuilder, WeightedGraph};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// On-disk graph layout
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl GraphDocument {
    /// Build the weighted graph; nodes keep their first-mention order
    pub fn into_graph(self) -> Result<WeightedGraph> {
        let mut builder = GraphBuilder::with_capacity(self.nodes.len());
        for node in &self.nodes {
            builder.add_node(node)?;
        }
        for edge in &self.edges {
            builder
                .add_weighted_edge(&edge.source, &edge.target, edge.weight)
                .with_context(|| format!("Bad edge {} -> {}", edge.source, edge.target))?;
        }
        Ok(builder.build())
    }
}

/// Parse a graph from JSON text
pub fn parse_graph(text: &str) -> Result<WeightedGraph> {
    let document: GraphDocument = serde_json::from_str(text).context("Malformed graph JSON")?;
    document.into_graph()
}

/// Load a graph file from disk
pub fn load_graph(path: impl AsRef<Path>) -> Result<WeightedGraph> {
    let path = path.as_ref();
    log::info!("Reading graph file: {}", path.display());

    if !path.exists() {
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let graph = parse_graph(&text).with_context(|| format!("Failed to load {}", path.display()))?;

    log::info!(
        "Loaded graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    log::debug!(
        "Graph uses approximately {:.2} MB",
        graph.memory_usage() as f64 / (1024.0 * 1024.0)
    );
    Ok(graph)
}

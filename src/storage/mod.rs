//! Results persistence module

use crate::cluster::metrics::level_summary;
use crate::cluster::Community;
use crate::graph::WeightedGraph;
use anyhow::{Context, Result};
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Save clustering results to the specified directory.
///
/// Writes `communities.json` with every community record and
/// `summary.json` with graph and per-level statistics.
pub fn save_results(
    communities: &[Community],
    graph: &WeightedGraph,
    output_dir: impl AsRef<Path>,
) -> Result<()> {
    let output_dir = output_dir.as_ref();
    log::info!(
        "Saving {} communities to {}",
        communities.len(),
        output_dir.display()
    );

    // Ensure output directory exists
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    save_communities(communities, output_dir)?;
    save_summary(communities, graph, output_dir)?;

    log::info!("Results saved successfully");
    Ok(())
}

fn save_communities(communities: &[Community], output_dir: &Path) -> Result<()> {
    let path = output_dir.join("communities.json");
    let mut file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(to_string_pretty(communities)?.as_bytes())?;
    Ok(())
}

fn save_summary(communities: &[Community], graph: &WeightedGraph, output_dir: &Path) -> Result<()> {
    log::info!("Saving summary information");

    let path = output_dir.join("summary.json");
    let mut file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let node_count = graph.node_count();
    let levels = level_summary(graph, communities);
    let summary = json!({
        "graph_stats": {
            "node_count": node_count,
            "edge_count": graph.edge_count(),
            "total_weight": graph.total_weight(),
            "avg_degree": if node_count == 0 {
                0.0
            } else {
                2.0 * graph.edge_count() as f64 / node_count as f64
            },
        },
        "community_stats": {
            "community_count": communities.len(),
            "level_count": levels.len(),
            "root_count": communities.iter().filter(|c| c.parent.is_none()).count(),
            "levels": levels,
        }
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;
    Ok(())
}

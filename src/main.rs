use anyhow::{Context, Result};
use clap::Parser;
use graph_communities::{cluster_graph, data, storage, ClusterConfig, ClusterStrategy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "graph-communities",
    about = "Hierarchical community clustering of weighted graphs"
)]
struct Cli {
    /// Path to input graph JSON file
    #[clap(long)]
    input: PathBuf,

    /// Output directory for results
    #[clap(long, default_value = "community_results")]
    output_dir: PathBuf,

    /// JSON file with clustering parameters
    #[clap(long)]
    config: Option<PathBuf>,

    /// Clustering strategy (hierarchical-partition, recursive-density,
    /// greedy-modularity, label-propagation, edge-betweenness)
    #[clap(long)]
    strategy: Option<String>,

    /// Maximum community size before splitting again
    #[clap(long)]
    max_cluster_size: Option<usize>,

    /// Minimum density cluster size (recursive-density)
    #[clap(long)]
    min_cluster_size: Option<usize>,

    /// Random seed
    #[clap(long)]
    seed: Option<u64>,

    /// Cluster every component instead of only the largest
    #[clap(long)]
    no_lcc: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn cluster_config(&self) -> Result<ClusterConfig> {
        let mut config: ClusterConfig = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => ClusterConfig::default(),
        };

        if let Some(name) = &self.strategy {
            config.strategy = ClusterStrategy::from_name(name);
        }
        if let Some(size) = self.max_cluster_size {
            config.max_cluster_size = size;
        }
        if let Some(size) = self.min_cluster_size {
            config.min_cluster_size = size;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_lcc {
            config.use_lcc = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = args.cluster_config()?;
    log::info!("Starting community clustering");
    log::info!("Input: {}", args.input.display());
    log::info!("Output: {}", args.output_dir.display());
    log::info!(
        "Strategy: {}, max cluster size {}, largest component only: {}",
        config.strategy,
        config.max_cluster_size,
        config.use_lcc
    );

    // 1. Load data
    let graph = data::load_graph(&args.input)?;

    // 2. Cluster
    let communities = cluster_graph(&graph, &config)?;
    log::info!("Found {} communities", communities.len());

    // 3. Save results
    storage::save_results(&communities, &graph, &args.output_dir)?;

    log::info!(
        "Clustering complete. Results saved to {}",
        args.output_dir.display()
    );

    Ok(())
}

//! Graph representation and algorithms module

pub mod algorithms;
pub mod builder;
pub mod weighted;

pub use algorithms::{connected_components, largest_connected_component, reduce_graph};
pub use builder::GraphBuilder;
pub use weighted::WeightedGraph;

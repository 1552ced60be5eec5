//! End-to-end properties of `cluster_graph` across every strategy

use graph_communities::{
    cluster_graph, ClusterConfig, ClusterStrategy, Communities, GraphBuilder, WeightedGraph,
};
use std::collections::{HashMap, HashSet};

/// `count` cliques of `size` nodes, consecutive cliques joined by one edge
fn clique_ring(count: usize, size: usize) -> WeightedGraph {
    let mut builder = GraphBuilder::new();
    for c in 0..count {
        for i in 0..size {
            for j in (i + 1)..size {
                builder.add_edge(&format!("c{c}n{i}"), &format!("c{c}n{j}")).unwrap();
            }
        }
        let next = (c + 1) % count;
        builder.add_edge(&format!("c{c}n0"), &format!("c{next}n1")).unwrap();
    }
    builder.build()
}

fn config(strategy: ClusterStrategy) -> ClusterConfig {
    ClusterConfig::default()
        .with_strategy(strategy)
        .with_max_cluster_size(6)
        .with_min_cluster_size(3)
}

fn members_by_id(communities: &Communities) -> HashMap<usize, HashSet<&str>> {
    communities
        .iter()
        .map(|c| (c.id, c.members.iter().map(String::as_str).collect()))
        .collect()
}

#[test]
fn every_node_in_exactly_one_level_zero_community() {
    let graph = clique_ring(6, 5);
    for strategy in ClusterStrategy::ALL {
        let communities = cluster_graph(&graph, &config(strategy)).unwrap();

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for community in communities.iter().filter(|c| c.level == 0) {
            for member in &community.members {
                *seen.entry(member.as_str()).or_default() += 1;
            }
        }
        assert_eq!(seen.len(), graph.node_count(), "{strategy}");
        assert!(seen.values().all(|&count| count == 1), "{strategy}");
    }
}

#[test]
fn ids_are_unique_and_members_distinct() {
    let graph = clique_ring(6, 5);
    for strategy in ClusterStrategy::ALL {
        let communities = cluster_graph(&graph, &config(strategy)).unwrap();

        let ids: HashSet<usize> = communities.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), communities.len(), "{strategy}");
        for community in &communities {
            let distinct: HashSet<&String> = community.members.iter().collect();
            assert_eq!(distinct.len(), community.members.len(), "{strategy}");
            assert!(!community.members.is_empty(), "{strategy}");
        }
    }
}

#[test]
fn children_are_subsets_of_parents() {
    let graph = clique_ring(6, 5);
    for strategy in [
        ClusterStrategy::HierarchicalPartition,
        ClusterStrategy::RecursiveDensity,
    ] {
        let communities = cluster_graph(&graph, &config(strategy)).unwrap();
        let members = members_by_id(&communities);
        let levels: HashMap<usize, usize> = communities.iter().map(|c| (c.id, c.level)).collect();

        for community in &communities {
            let Some(parent) = community.parent else {
                assert_eq!(community.level, 0);
                continue;
            };
            assert_eq!(levels[&parent] + 1, community.level, "{strategy}");
            assert!(members[&community.id].is_subset(&members[&parent]), "{strategy}");
        }
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let graph = clique_ring(5, 6);
    for strategy in ClusterStrategy::ALL {
        let config = config(strategy).with_seed(Some(11));
        let first = cluster_graph(&graph, &config).unwrap();
        let second = cluster_graph(&graph, &config).unwrap();
        assert_eq!(first, second, "{strategy}");
    }
}

#[test]
fn empty_graph_gives_empty_result() {
    for strategy in ClusterStrategy::ALL {
        for use_lcc in [true, false] {
            let config = config(strategy).with_lcc(use_lcc);
            let communities = cluster_graph(&WeightedGraph::empty(), &config).unwrap();
            assert!(communities.is_empty(), "{strategy}");
        }
    }
}

#[test]
fn largest_component_only() {
    let mut builder = GraphBuilder::new();
    for (a, b) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("e", "a")] {
        builder.add_edge(a, b).unwrap();
    }
    for (a, b) in [("x", "y"), ("y", "z")] {
        builder.add_edge(a, b).unwrap();
    }
    let graph = builder.build();
    let big: HashSet<&str> = ["a", "b", "c", "d", "e"].into_iter().collect();

    for strategy in ClusterStrategy::ALL {
        let communities = cluster_graph(&graph, &config(strategy).with_lcc(true)).unwrap();
        assert!(!communities.is_empty(), "{strategy}");
        for community in &communities {
            assert!(
                community.members.iter().all(|m| big.contains(m.as_str())),
                "{strategy}"
            );
        }
    }
}

#[test]
fn without_reduction_every_component_is_clustered() {
    let mut builder = GraphBuilder::new();
    builder.add_edge("a", "b").unwrap();
    builder.add_edge("x", "y").unwrap();
    let graph = builder.build();

    for strategy in ClusterStrategy::ALL {
        let communities = cluster_graph(&graph, &config(strategy).with_lcc(false)).unwrap();
        let level0: usize = communities
            .iter()
            .filter(|c| c.level == 0)
            .map(|c| c.members.len())
            .sum();
        assert_eq!(level0, 4, "{strategy}");
    }
}

#[test]
fn flat_strategies_have_one_level_of_roots() {
    let graph = clique_ring(4, 5);
    for strategy in [
        ClusterStrategy::GreedyModularity,
        ClusterStrategy::LabelPropagation,
        ClusterStrategy::EdgeBetweenness,
    ] {
        let communities = cluster_graph(&graph, &config(strategy)).unwrap();
        assert!(communities.iter().all(|c| c.level == 0), "{strategy}");
        assert!(communities.iter().all(|c| c.parent_id() == -1), "{strategy}");
        let ids: Vec<usize> = communities.iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..communities.len()).collect::<Vec<_>>(), "{strategy}");
    }
}

#[test]
fn edge_betweenness_cuts_the_bridge() {
    let mut builder = GraphBuilder::new();
    for (a, b) in [("a0", "a1"), ("a1", "a2"), ("a0", "a2")] {
        builder.add_edge(a, b).unwrap();
    }
    for (a, b) in [("b0", "b1"), ("b1", "b2"), ("b0", "b2")] {
        builder.add_edge(a, b).unwrap();
    }
    builder.add_edge("a2", "b0").unwrap();

    let communities = cluster_graph(
        &builder.build(),
        &ClusterConfig::default().with_strategy(ClusterStrategy::EdgeBetweenness),
    )
    .unwrap();
    let members: Vec<Vec<&str>> = communities
        .iter()
        .map(|c| c.members.iter().map(String::as_str).collect())
        .collect();
    assert_eq!(members, vec![vec!["a0", "a1", "a2"], vec!["b0", "b1", "b2"]]);
}

#[test]
fn recursive_density_on_hundred_nodes_is_well_formed() {
    let graph = clique_ring(10, 10);
    let config = ClusterConfig::default()
        .with_strategy(ClusterStrategy::RecursiveDensity)
        .with_max_cluster_size(10)
        .with_min_cluster_size(5);
    let communities = cluster_graph(&graph, &config).unwrap();
    let members = members_by_id(&communities);

    // Communities at one level never overlap
    let mut per_level: HashMap<usize, HashSet<&str>> = HashMap::new();
    for community in &communities {
        let level = per_level.entry(community.level).or_default();
        for member in &community.members {
            assert!(level.insert(member.as_str()));
        }
    }

    // Splits always shrink, and a split parent is covered by its children
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for community in &communities {
        if let Some(parent) = community.parent {
            assert!(members[&community.id].len() < members[&parent].len());
            children.entry(parent).or_default().push(community.id);
        }
    }
    for (parent, kids) in &children {
        let covered: usize = kids.iter().map(|k| members[k].len()).sum();
        assert_eq!(covered, members[parent].len());
    }

    // Every clique ends up as its own leaf below the root
    assert!(communities.iter().any(|c| c.level == 1));
    let leaves: Vec<_> = communities
        .iter()
        .filter(|c| !children.contains_key(&c.id))
        .collect();
    assert_eq!(leaves.len(), 10);
    for leaf in leaves {
        assert!(leaf.members.len() <= 10, "leaf of {}", leaf.members.len());
        let prefix = leaf.members[0].split('n').next().unwrap_or_default();
        assert!(leaf.members.iter().all(|m| m.starts_with(&format!("{prefix}n"))));
    }
}

#[test]
fn hierarchical_partition_splits_oversized_clusters() {
    let graph = clique_ring(8, 6);
    let config = config(ClusterStrategy::HierarchicalPartition).with_max_cluster_size(4);
    let communities = cluster_graph(&graph, &config).unwrap();

    let parents: HashSet<usize> = communities.iter().filter_map(|c| c.parent).collect();
    for community in &communities {
        if community.members.len() <= 4 {
            assert!(!parents.contains(&community.id));
        }
    }
}

#[test]
fn unknown_strategy_falls_back_to_default() {
    let config: ClusterConfig = serde_json::from_str(r#"{"strategy": "spectral-magic"}"#).unwrap();
    assert_eq!(config.strategy, ClusterStrategy::HierarchicalPartition);

    let communities = cluster_graph(&clique_ring(3, 4), &config).unwrap();
    assert!(!communities.is_empty());
}

//! Conversion of backend-native partitions into [`Communities`]

use super::{Communities, Community};
use crate::graph::WeightedGraph;
use crate::partition::HierarchicalCluster;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Community id -> parent id; absent ids are roots
pub type ParentMapping = HashMap<usize, usize>;

/// Per-level community member lists.
///
/// Levels iterate in ascending order; communities within a level iterate
/// in the order they were first inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyMapping {
    levels: BTreeMap<usize, Vec<(usize, Vec<usize>)>>,
    /// (level, id) -> position inside `levels[level]`
    slots: HashMap<(usize, usize), usize>,
}

impl HierarchyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one node to a community, creating the community if needed
    pub fn insert(&mut self, level: usize, id: usize, node: usize) {
        let communities = self.levels.entry(level).or_default();
        let slot = *self.slots.entry((level, id)).or_insert_with(|| {
            communities.push((id, Vec::new()));
            communities.len() - 1
        });
        communities[slot].1.push(node);
    }

    /// Append a batch of nodes to a community
    pub fn insert_community(&mut self, level: usize, id: usize, members: Vec<usize>) {
        let communities = self.levels.entry(level).or_default();
        match self.slots.get(&(level, id)) {
            Some(&slot) => communities[slot].1.extend(members),
            None => {
                self.slots.insert((level, id), communities.len());
                communities.push((id, members));
            }
        }
    }

    pub fn community_count(&self) -> usize {
        self.slots.len()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// (level, id, members) in output order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[usize])> + '_ {
        self.levels.iter().flat_map(|(&level, communities)| {
            communities
                .iter()
                .map(move |(id, members)| (level, *id, members.as_slice()))
        })
    }
}

/// Partition data in the shape a backend produces it
#[derive(Debug, Clone, PartialEq)]
pub enum NativePartition {
    /// One entry per node per level
    Hierarchical(Vec<HierarchicalCluster>),
    /// Already grouped by level and community
    Tree(HierarchyMapping, ParentMapping),
    /// One level of member lists, no parents
    Flat(Vec<Vec<usize>>),
}

impl NativePartition {
    /// Group into the two intermediate mappings
    pub fn into_mappings(self) -> (HierarchyMapping, ParentMapping) {
        match self {
            NativePartition::Hierarchical(entries) => {
                let mut hierarchy = HierarchyMapping::new();
                let mut parents = ParentMapping::new();
                for entry in entries {
                    hierarchy.insert(entry.level, entry.cluster, entry.node);
                    if let Some(parent) = entry.parent_cluster {
                        parents.insert(entry.cluster, parent);
                    }
                }
                (hierarchy, parents)
            }
            NativePartition::Tree(hierarchy, parents) => (hierarchy, parents),
            NativePartition::Flat(groups) => {
                let mut hierarchy = HierarchyMapping::new();
                for (id, members) in groups.into_iter().enumerate() {
                    hierarchy.insert_community(0, id, members);
                }
                (hierarchy, ParentMapping::new())
            }
        }
    }
}

/// Flatten a native partition into community records.
///
/// Node indices resolve against `graph`; a node listed twice in one
/// community is kept once, at its first position.
pub fn normalize(graph: &WeightedGraph, native: NativePartition) -> Communities {
    let (hierarchy, parents) = native.into_mappings();

    hierarchy
        .iter()
        .map(|(level, id, members)| {
            let mut seen = HashSet::with_capacity(members.len());
            let members = members
                .iter()
                .filter(|&&node| seen.insert(node))
                .map(|&node| graph.node_id(node).to_string())
                .collect();
            Community {
                level,
                id,
                parent: parents.get(&id).copied(),
                members,
            }
        })
        .collect()
}

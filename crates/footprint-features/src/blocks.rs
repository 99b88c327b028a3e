//! Grouping of buildings that share walls into blocks.

use footprint_core::models::{BlockFeatures, BuildingId, FeatureValue};
use std::collections::HashMap;

/// One building as seen by the block grouping
#[derive(Debug, Clone)]
pub struct BlockMember<'a> {
    pub id: &'a BuildingId,
    /// Footprint area, `None` when unavailable
    pub area: Option<f64>,
    /// Ids whose footprint this building touches, corner contact included
    pub contacts: &'a [BuildingId],
}

/// Connected components of the contact graph
///
/// Returns one `BlockFeatures` per member, in member order. Contacts count
/// in both directions and ids not among the members are ignored.
pub fn group_blocks(members: &[BlockMember<'_>]) -> Vec<BlockFeatures> {
    let slots: HashMap<&BuildingId, usize> =
        members.iter().enumerate().map(|(slot, member)| (member.id, slot)).collect();

    let mut sets = DisjointSets::new(members.len());
    for (slot, member) in members.iter().enumerate() {
        for other in member.contacts {
            if let Some(&other_slot) = slots.get(other) {
                sets.union(slot, other_slot);
            }
        }
    }

    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for slot in 0..members.len() {
        let root = sets.find(slot);
        components.entry(root).or_default().push(slot);
    }

    let mut blocks: Vec<Option<BlockFeatures>> = vec![None; members.len()];
    for component in components.values() {
        let features = block_features(members, component);
        for &slot in component {
            blocks[slot] = Some(features.clone());
        }
    }

    blocks
        .into_iter()
        .map(|block| block.unwrap_or_else(|| BlockFeatures::unavailable("not grouped")))
        .collect()
}

fn block_features(members: &[BlockMember<'_>], component: &[usize]) -> BlockFeatures {
    let block_id = component.iter().map(|&slot| members[slot].id).min();
    let areas: Vec<f64> = component.iter().filter_map(|&slot| members[slot].area).collect();

    BlockFeatures {
        block_id: match block_id {
            Some(id) => FeatureValue::Categorical(id.to_string()),
            None => FeatureValue::unavailable("empty block"),
        },
        block_size: FeatureValue::Numeric(component.len() as f64),
        block_area: if areas.is_empty() {
            FeatureValue::unavailable("no member area available")
        } else {
            FeatureValue::from_f64(areas.iter().sum())
        },
    }
}

/// Union-find over member slots
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let (root_x, root_y) = (self.find(x), self.find(y));
        if root_x == root_y {
            return;
        }
        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Less => self.parent[root_x] = root_y,
            std::cmp::Ordering::Greater => self.parent[root_y] = root_x,
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
    }
}

use crate::tree::NodeId;
use std::collections::HashMap;

/// Partial, injective correspondence between old-tree and new-tree node
/// identities, held in both directions.
///
/// Insertion refuses any pair that would map an already-mapped node, so
/// injectivity holds by construction — no old node maps to two new nodes
/// and vice versa.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    old_to_new: HashMap<NodeId, NodeId>,
    new_to_old: HashMap<NodeId, NodeId>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pairing. Returns false (and changes nothing) when either
    /// side is already mapped.
    pub(crate) fn insert(&mut self, old: NodeId, new: NodeId) -> bool {
        if self.old_to_new.contains_key(&old) || self.new_to_old.contains_key(&new) {
            return false;
        }
        self.old_to_new.insert(old, new);
        self.new_to_old.insert(new, old);
        true
    }

    pub fn get_new(&self, old: NodeId) -> Option<NodeId> {
        self.old_to_new.get(&old).copied()
    }

    pub fn get_old(&self, new: NodeId) -> Option<NodeId> {
        self.new_to_old.get(&new).copied()
    }

    pub fn contains_old(&self, old: NodeId) -> bool {
        self.old_to_new.contains_key(&old)
    }

    pub fn contains_new(&self, new: NodeId) -> bool {
        self.new_to_old.contains_key(&new)
    }

    /// Number of mapped pairs.
    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.old_to_new.iter().map(|(&old, &new)| (old, new))
    }

    /// Serializable export for diagnostic tooling, sorted by old id.
    pub fn export(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort();
        pairs
    }
}

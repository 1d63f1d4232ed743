//! Candidate pre-filtering and ranking for the matcher.
//!
//! Distances are only computed for node pairs that pass the cheap
//! pre-filter (same category, same shape variant); candidates are bucketed
//! by that key so typical runs never enumerate all node pairs.

use crate::tree::{Category, NodeId, ShapeKind, SyntaxNode, TreeIndex};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Pre-filter key: a pairing is only considered between nodes that agree
/// on both components.
pub(crate) type BucketKey = (Category, ShapeKind);

pub(crate) fn bucket_key(node: &SyntaxNode) -> BucketKey {
    (node.annotation.category, node.shape.kind())
}

/// Cheap compatibility test applied before any distance computation.
/// Every accepted pairing satisfies this.
pub(crate) fn compatible(a: &SyntaxNode, b: &SyntaxNode) -> bool {
    bucket_key(a) == bucket_key(b)
}

/// Group a tree's nodes by pre-filter key, preserving pre-order within
/// each bucket.
pub(crate) fn bucket_nodes(index: &TreeIndex<'_>) -> HashMap<BucketKey, Vec<NodeId>> {
    let mut buckets: HashMap<BucketKey, Vec<NodeId>> = HashMap::new();
    for id in index.ids() {
        buckets.entry(bucket_key(index.node(id))).or_default().push(id);
    }
    buckets
}

/// A ranked pairing candidate. Ordering: distance first, then pre-order
/// proximity, then earliest occurrence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub id: NodeId,
    pub distance: f64,
    pub proximity: usize,
}

impl Candidate {
    pub(crate) fn cmp_rank(&self, other: &Candidate) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.proximity.cmp(&other.proximity))
            .then(self.id.cmp(&other.id))
    }

    pub(crate) fn better_than(&self, other: &Candidate) -> bool {
        self.cmp_rank(other) == Ordering::Less
    }
}

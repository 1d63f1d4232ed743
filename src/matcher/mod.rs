//! The tree matching algorithm.
//!
//! Two passes build the mapping. The top-down pass processes old nodes in
//! decreasing subtree-size order and pairs each with the best-ranked
//! compatible new node whose feature-vector distance clears the threshold
//! and which is mutually the best available match; acceptance recursively
//! proposes child pairings. The bottom-up pass then recovers small
//! subtrees — typically moved atomic tokens — by exact content equality,
//! which the aggregated fingerprints of the first pass can miss inside
//! deeply restructured regions.
//!
//! Finding no match for anything is a valid outcome: an empty mapping
//! simply yields a full delete + full insert script.

pub mod mapping;
mod oracle;

use crate::config::DiffConfig;
use crate::gram::{extract_grams, FeatureVector};
use crate::tree::node::content_hash;
use crate::tree::{NodeId, Shape, TreeIndex};
use oracle::{bucket_key, compatible, Candidate};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, trace};

pub use mapping::Mapping;

/// Subtrees at or below this size take part in bottom-up exact-content
/// recovery.
const SMALL_SUBTREE: usize = 3;

/// Build the node mapping between two indexed trees.
///
/// The later stages of the top-down pass depend on which earlier matches
/// were accepted, so the pass is sequential by design; all derived data
/// (grams, vectors) is local to this call and discarded with it.
///
/// Contract violations in `config` (zero p/q or dimension) panic; run
/// [`DiffConfig::validate`] first to get them as errors instead.
pub fn match_trees(old: &TreeIndex<'_>, new: &TreeIndex<'_>, config: &DiffConfig) -> Mapping {
    let old_vectors = subtree_vectors(old, config);
    let new_vectors = subtree_vectors(new, config);

    let mut state = MatchState {
        old,
        new,
        old_vectors,
        new_vectors,
        old_buckets: oracle::bucket_nodes(old),
        new_buckets: oracle::bucket_nodes(new),
        threshold: config.threshold,
        mapping: Mapping::new(),
    };

    debug!(
        old_nodes = old.len(),
        new_nodes = new.len(),
        "matching trees"
    );
    state.top_down();
    debug!(mapped = state.mapping.len(), "top-down pass complete");
    state.bottom_up();
    debug!(mapped = state.mapping.len(), "bottom-up pass complete");

    state.mapping
}

/// One feature vector per node, over the gram multiset of its subtree.
/// Pre-order contiguity makes each multiset a slice of the gram array.
fn subtree_vectors(index: &TreeIndex<'_>, config: &DiffConfig) -> Vec<FeatureVector> {
    let grams = extract_grams(index, config.left_context, config.right_context);
    index
        .ids()
        .map(|id| FeatureVector::build(&grams[index.subtree_range(id)], config.dimension))
        .collect()
}

struct MatchState<'a, 'o, 'n> {
    old: &'a TreeIndex<'o>,
    new: &'a TreeIndex<'n>,
    old_vectors: Vec<FeatureVector>,
    new_vectors: Vec<FeatureVector>,
    old_buckets: HashMap<oracle::BucketKey, Vec<NodeId>>,
    new_buckets: HashMap<oracle::BucketKey, Vec<NodeId>>,
    threshold: f64,
    mapping: Mapping,
}

impl<'a, 'o, 'n> MatchState<'a, 'o, 'n> {
    fn distance(&self, old_id: NodeId, new_id: NodeId) -> f64 {
        self.old_vectors[old_id.index()].distance(&self.new_vectors[new_id.index()])
    }

    fn top_down(&mut self) {
        let mut order: Vec<NodeId> = self.old.ids().collect();
        order.sort_by_key(|&id| (Reverse(self.old.size(id)), id.index()));

        for old_id in order {
            if !self.mapping.contains_old(old_id) {
                self.try_match(old_id);
            }
        }
    }

    /// Search the compatible bucket for the best-ranked candidate within
    /// the threshold; accept the first one that is also mutually best.
    fn try_match(&mut self, old_id: NodeId) {
        let key = bucket_key(self.old.node(old_id));
        let Some(bucket) = self.new_buckets.get(&key) else {
            return;
        };

        let mut candidates: Vec<Candidate> = bucket
            .iter()
            .filter(|&&new_id| !self.mapping.contains_new(new_id))
            .map(|&new_id| Candidate {
                id: new_id,
                distance: self.distance(old_id, new_id),
                proximity: old_id.index().abs_diff(new_id.index()),
            })
            .collect();
        candidates.sort_by(Candidate::cmp_rank);

        for candidate in candidates {
            if candidate.distance > self.threshold {
                break;
            }
            if self.mutually_best(old_id, &candidate, &key) {
                self.accept(old_id, candidate.id);
                return;
            }
        }
    }

    /// No other unmapped compatible old node may be strictly closer to the
    /// candidate than we are.
    fn mutually_best(&self, old_id: NodeId, candidate: &Candidate, key: &oracle::BucketKey) -> bool {
        let Some(rivals) = self.old_buckets.get(key) else {
            return true;
        };
        rivals.iter().all(|&rival| {
            rival == old_id
                || self.mapping.contains_old(rival)
                || self.distance(rival, candidate.id) >= candidate.distance
        })
    }

    fn accept(&mut self, old_id: NodeId, new_id: NodeId) {
        if !self.mapping.insert(old_id, new_id) {
            return;
        }
        trace!(old = old_id.index(), new = new_id.index(), "accepted pair");
        self.propose_children(old_id, new_id);
    }

    /// Accepting a pair proposes its children: by key for keyed shapes,
    /// positionally for fixed-arity and named-field shapes, and by
    /// best-match-within-siblings for variable-length lists.
    fn propose_children(&mut self, old_id: NodeId, new_id: NodeId) {
        let old_node = self.old.node(old_id);
        let new_node = self.new.node(new_id);
        let old_kids = self.old.children_ids(old_id);
        let new_kids = self.new.children_ids(new_id);

        if let (Shape::Keyed { entries: old_entries }, Shape::Keyed { entries: new_entries }) =
            (&old_node.shape, &new_node.shape)
        {
            let by_key: HashMap<&str, usize> = old_entries
                .iter()
                .enumerate()
                .map(|(pos, (key, _))| (key.as_str(), pos))
                .collect();
            for (new_pos, (key, _)) in new_entries.iter().enumerate() {
                if let Some(&old_pos) = by_key.get(key.as_str()) {
                    self.propose_pair(old_kids[old_pos], new_kids[new_pos]);
                }
            }
            return;
        }

        let old_segments = split_segments(&old_node.shape, &old_kids);
        let new_segments = split_segments(&new_node.shape, &new_kids);

        for ((pairing, old_seg), (_, new_seg)) in old_segments.iter().zip(new_segments.iter()) {
            match pairing {
                Pairing::Positional => {
                    for (&o, &n) in old_seg.iter().zip(new_seg.iter()) {
                        self.propose_pair(o, n);
                    }
                }
                Pairing::Variable => self.propose_within(old_seg, new_seg),
            }
        }
    }

    /// A child proposal becomes a pairing when the pre-filter passes and
    /// either the subtrees are content-equal or their distance clears the
    /// threshold.
    fn propose_pair(&mut self, old_id: NodeId, new_id: NodeId) {
        if self.mapping.contains_old(old_id) || self.mapping.contains_new(new_id) {
            return;
        }
        let old_node = self.old.node(old_id);
        let new_node = self.new.node(new_id);
        if !compatible(old_node, new_node) {
            return;
        }
        if old_node.content_eq(new_node) || self.distance(old_id, new_id) <= self.threshold {
            self.accept(old_id, new_id);
        }
    }

    /// Best-match within a variable-length sibling section, in order.
    fn propose_within(&mut self, old_seg: &[NodeId], new_seg: &[NodeId]) {
        for &old_id in old_seg {
            if self.mapping.contains_old(old_id) {
                continue;
            }
            let old_node = self.old.node(old_id);

            let mut best: Option<Candidate> = None;
            for &new_id in new_seg {
                if self.mapping.contains_new(new_id) {
                    continue;
                }
                if !compatible(old_node, self.new.node(new_id)) {
                    continue;
                }
                let candidate = Candidate {
                    id: new_id,
                    distance: self.distance(old_id, new_id),
                    proximity: old_id.index().abs_diff(new_id.index()),
                };
                if best.map_or(true, |b| candidate.better_than(&b)) {
                    best = Some(candidate);
                }
            }

            if let Some(best) = best {
                if best.distance <= self.threshold
                    || old_node.content_eq(self.new.node(best.id))
                {
                    self.accept(old_id, best.id);
                }
            }
        }
    }

    /// Recover small unmapped subtrees by exact content equality. The
    /// content key aggregates category, shape and payloads; collisions are
    /// re-checked with a full content comparison. Nearest pre-order
    /// position wins among equal candidates.
    fn bottom_up(&mut self) {
        let mut by_key: HashMap<u64, Vec<NodeId>> = HashMap::new();
        for new_id in self.new.ids() {
            if self.new.size(new_id) <= SMALL_SUBTREE && self.new_subtree_unmapped(new_id) {
                by_key
                    .entry(content_hash(self.new.node(new_id)))
                    .or_default()
                    .push(new_id);
            }
        }

        let old_ids: Vec<NodeId> = self.old.ids().collect();
        for old_id in old_ids {
            if self.old.size(old_id) > SMALL_SUBTREE || !self.old_subtree_unmapped(old_id) {
                continue;
            }
            let old_node = self.old.node(old_id);
            let Some(candidates) = by_key.get(&content_hash(old_node)) else {
                continue;
            };

            let mut best: Option<(usize, NodeId)> = None;
            for &new_id in candidates {
                if !self.new_subtree_unmapped(new_id) {
                    continue;
                }
                if !old_node.content_eq(self.new.node(new_id)) {
                    continue;
                }
                let proximity = old_id.index().abs_diff(new_id.index());
                let closer = best.map_or(true, |(bp, bid)| {
                    proximity < bp || (proximity == bp && new_id < bid)
                });
                if closer {
                    best = Some((proximity, new_id));
                }
            }

            if let Some((_, new_id)) = best {
                self.accept_subtree(old_id, new_id);
            }
        }
    }

    /// Map two content-equal subtrees wholesale. Content equality implies
    /// identical structure, so pre-order positions line up pairwise.
    fn accept_subtree(&mut self, old_id: NodeId, new_id: NodeId) {
        let old_range = self.old.subtree_range(old_id);
        let new_range = self.new.subtree_range(new_id);
        debug_assert_eq!(old_range.len(), new_range.len());
        trace!(
            old = old_id.index(),
            new = new_id.index(),
            size = old_range.len(),
            "accepted content-equal subtree"
        );
        for (o, n) in old_range.zip(new_range) {
            self.mapping.insert(NodeId::new(o), NodeId::new(n));
        }
    }

    fn old_subtree_unmapped(&self, id: NodeId) -> bool {
        self.old
            .subtree_ids(id)
            .all(|i| !self.mapping.contains_old(i))
    }

    fn new_subtree_unmapped(&self, id: NodeId) -> bool {
        self.new
            .subtree_ids(id)
            .all(|i| !self.mapping.contains_new(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pairing {
    Positional,
    Variable,
}

/// Decompose a node's child list into pairing sections. Section order and
/// count depend only on the shape variant (optional fields contribute a
/// zero-or-one positional section), so two nodes of the same variant
/// always produce aligned section lists.
fn split_segments(shape: &Shape, kids: &[NodeId]) -> Vec<(Pairing, Vec<NodeId>)> {
    let plan: Vec<(Pairing, usize)> = match shape {
        Shape::Leaf { .. } => Vec::new(),
        Shape::Indexed { children } => vec![(Pairing::Variable, children.len())],
        Shape::ParseError { recovered } => vec![(Pairing::Variable, recovered.len())],
        Shape::Fixed { children } => vec![(Pairing::Positional, children.len())],
        Shape::Keyed { entries } => vec![(Pairing::Positional, entries.len())],
        Shape::Operator { operands, .. } => vec![(Pairing::Positional, operands.len())],
        Shape::Call { arguments, .. } => vec![
            (Pairing::Positional, 1),
            (Pairing::Variable, arguments.len()),
        ],
        Shape::MethodCall { arguments, .. } => vec![
            (Pairing::Positional, 2),
            (Pairing::Variable, arguments.len()),
        ],
        Shape::Function {
            name, parameters, ..
        } => vec![
            (Pairing::Positional, usize::from(name.is_some())),
            (Pairing::Positional, usize::from(parameters.is_some())),
            (Pairing::Positional, 1),
        ],
        Shape::Assignment { .. } | Shape::Member { .. } => vec![(Pairing::Positional, 2)],
        Shape::Conditional { else_branch, .. } => vec![
            (Pairing::Positional, 2),
            (Pairing::Positional, usize::from(else_branch.is_some())),
        ],
    };

    let mut segments = Vec::with_capacity(plan.len());
    let mut offset = 0;
    for (pairing, len) in plan {
        segments.push((pairing, kids[offset..offset + len].to_vec()));
        offset += len;
    }
    debug_assert_eq!(offset, kids.len());
    segments
}

/// Whether a mapped pair sits in a different structural position than
/// before: its parents are not mapped to each other, or its index among
/// siblings changed.
pub(crate) fn position_changed(
    old: &TreeIndex<'_>,
    new: &TreeIndex<'_>,
    mapping: &Mapping,
    old_id: NodeId,
    new_id: NodeId,
) -> bool {
    match (old.parent(old_id), new.parent(new_id)) {
        (None, None) => false,
        (Some(old_parent), Some(new_parent)) => {
            mapping.get_new(old_parent) != Some(new_parent)
                || old.child_pos(old_id) != new.child_pos(new_id)
        }
        _ => true,
    }
}

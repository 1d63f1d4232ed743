//! Structural fingerprints: bounded-context category grams.
//!
//! Every node gets one gram: the `p` category labels preceding it along its
//! ancestor/left-sibling chain and the `q` labels of the sibling subtree
//! heads that follow it. Contexts near tree edges are padded with the
//! distinguished absent label, so gram length is constant within one run
//! and independent of subtree size — that bound is what keeps fingerprints
//! from blowing up on deeply nested or repetitive trees.
//!
//! A subtree's fingerprint is the multiset union of the grams of the node
//! and every node below it; since grams are produced in pre-order, that
//! multiset is the slice `grams[i..i + size(i)]` of the per-tree array.

pub mod vector;

use crate::tree::{Category, NodeId, TreeIndex};

pub use vector::FeatureVector;

/// A single context label: a category, or the absent padding label.
pub type Label = Option<Category>;

/// Local structural neighborhood of one node: `p` preceding labels
/// (nearest first) and `q` following labels. Pure value; equality is
/// structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gram {
    left: Vec<Label>,
    right: Vec<Label>,
}

impl Gram {
    pub fn new(left: Vec<Label>, right: Vec<Label>) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &[Label] {
        &self.left
    }

    pub fn right(&self) -> &[Label] {
        &self.right
    }

    /// Stable byte encoding fed to the feature-vector hash. Absent labels
    /// and the side separator use codes no category occupies.
    pub(crate) fn write_bytes(&self, buf: &mut Vec<u8>) {
        for label in &self.left {
            buf.push(label_code(*label));
        }
        buf.push(0xfe);
        for label in &self.right {
            buf.push(label_code(*label));
        }
    }
}

fn label_code(label: Label) -> u8 {
    match label {
        Some(category) => category.code(),
        None => 0xff,
    }
}

/// Compute one gram per node, pre-order aligned with `index`.
///
/// `p` and `q` must be positive; zero contexts are a caller contract
/// violation (`DiffConfig::validate` reports them as errors before any
/// extraction runs).
pub fn extract_grams(index: &TreeIndex<'_>, p: usize, q: usize) -> Vec<Gram> {
    assert!(p > 0 && q > 0, "gram context sizes must be positive");
    index
        .ids()
        .map(|id| Gram::new(left_context(index, id, p), right_context(index, id, q)))
        .collect()
}

/// Up to `p` labels from the nearest preceding structural neighbors:
/// the left sibling when there is one, otherwise the parent, repeated.
fn left_context(index: &TreeIndex<'_>, id: NodeId, p: usize) -> Vec<Label> {
    let mut labels = Vec::with_capacity(p);
    let mut cur = id;
    while labels.len() < p {
        if let Some(sibling) = index.prev_sibling(cur) {
            labels.push(Some(index.node(sibling).annotation.category));
            cur = sibling;
        } else if let Some(parent) = index.parent(cur) {
            labels.push(Some(index.node(parent).annotation.category));
            cur = parent;
        } else {
            break;
        }
    }
    labels.resize(p, None);
    labels
}

/// Up to `q` labels from the following siblings' subtree heads, climbing
/// to an ancestor's right sibling when a level runs out.
fn right_context(index: &TreeIndex<'_>, id: NodeId, q: usize) -> Vec<Label> {
    let mut labels = Vec::with_capacity(q);
    let mut cur = id;
    'outer: while labels.len() < q {
        loop {
            if let Some(sibling) = index.next_sibling(cur) {
                labels.push(Some(index.node(sibling).annotation.category));
                cur = sibling;
                break;
            }
            match index.parent(cur) {
                Some(parent) => cur = parent,
                None => break 'outer,
            }
        }
    }
    labels.resize(q, None);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Annotation, Shape, SyntaxNode};

    fn leaf(category: Category, text: &str) -> SyntaxNode {
        SyntaxNode::new(
            Annotation::synthetic(category),
            Shape::Leaf {
                text: text.to_string(),
            },
        )
    }

    fn list(children: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new(
            Annotation::synthetic(Category::List),
            Shape::Indexed { children },
        )
    }

    #[test]
    fn root_context_is_all_absent() {
        let tree = leaf(Category::Identifier, "x");
        let index = TreeIndex::build(&tree);
        let grams = extract_grams(&index, 2, 3);

        assert_eq!(grams.len(), 1);
        assert_eq!(grams[0].left(), &[None, None]);
        assert_eq!(grams[0].right(), &[None, None, None]);
    }

    #[test]
    fn sibling_and_parent_context() {
        let tree = list(vec![
            leaf(Category::Identifier, "a"),
            leaf(Category::Literal, "1"),
            leaf(Category::String, "s"),
        ]);
        let index = TreeIndex::build(&tree);
        let grams = extract_grams(&index, 2, 3);

        // Middle child: left sibling first, then the parent.
        assert_eq!(
            grams[2].left(),
            &[Some(Category::Identifier), Some(Category::List)]
        );
        // Following sibling head, then padding.
        assert_eq!(grams[2].right(), &[Some(Category::String), None, None]);
    }

    #[test]
    fn right_context_climbs_to_ancestor_siblings() {
        // list(list(a), b): "a" has no right sibling, so its following
        // neighbor is found at the parent's level.
        let tree = list(vec![
            list(vec![leaf(Category::Identifier, "a")]),
            leaf(Category::Literal, "b"),
        ]);
        let index = TreeIndex::build(&tree);
        let grams = extract_grams(&index, 2, 2);

        assert_eq!(grams[2].right(), &[Some(Category::Literal), None]);
    }

    #[test]
    fn gram_length_is_constant() {
        let tree = list(vec![
            leaf(Category::Identifier, "a"),
            list(vec![leaf(Category::Literal, "1")]),
        ]);
        let index = TreeIndex::build(&tree);
        for gram in extract_grams(&index, 3, 2) {
            assert_eq!(gram.left().len(), 3);
            assert_eq!(gram.right().len(), 2);
        }
    }

    #[test]
    #[should_panic(expected = "context sizes must be positive")]
    fn zero_context_panics() {
        let tree = leaf(Category::Identifier, "x");
        let index = TreeIndex::build(&tree);
        let _ = extract_grams(&index, 0, 3);
    }
}

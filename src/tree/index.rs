//! Pre-order flattening of a syntax tree.
//!
//! `TreeIndex` is the side table every algorithm in this crate works
//! against: it assigns each node occurrence a stable [`NodeId`] (its
//! pre-order index) and records parent links, sibling positions and subtree
//! sizes. Because pre-order numbering is contiguous, the subtree rooted at
//! node `i` is exactly the id range `[i, i + size(i))` — which is what lets
//! a subtree's gram multiset be a slice of the per-tree gram array instead
//! of a per-node allocation.

use crate::tree::node::SyntaxNode;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Identity of a node occurrence within one tree: its pre-order index.
///
/// Ids from different trees are unrelated; the mapping keeps old-tree ids
/// on one side and new-tree ids on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Wrap a raw pre-order index. The index must come from the same tree's
    /// `TreeIndex`; this is not checked.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

struct Entry<'t> {
    node: &'t SyntaxNode,
    parent: Option<NodeId>,
    child_pos: usize,
    prev_sibling: Option<NodeId>,
    size: usize,
}

/// Read-only flattened view of one tree.
pub struct TreeIndex<'t> {
    entries: Vec<Entry<'t>>,
}

impl<'t> TreeIndex<'t> {
    pub fn build(root: &'t SyntaxNode) -> Self {
        let mut entries = Vec::with_capacity(root.size());
        visit(root, None, 0, None, &mut entries);
        Self { entries }
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.entries.len()).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> &'t SyntaxNode {
        self.entries[id.0].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.0].parent
    }

    /// Position of `id` among its parent's children (0 for the root).
    pub fn child_pos(&self, id: NodeId) -> usize {
        self.entries[id.0].child_pos
    }

    /// Subtree size (the node itself plus all descendants).
    pub fn size(&self, id: NodeId) -> usize {
        self.entries[id.0].size
    }

    /// Raw pre-order index range covered by this subtree.
    pub fn subtree_range(&self, id: NodeId) -> Range<usize> {
        id.0..id.0 + self.entries[id.0].size
    }

    /// All ids in this subtree, the root included, in pre-order.
    pub fn subtree_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.subtree_range(id).map(NodeId)
    }

    pub fn children_ids(&self, id: NodeId) -> Vec<NodeId> {
        let end = id.0 + self.entries[id.0].size;
        let mut ids = Vec::new();
        let mut cur = id.0 + 1;
        while cur < end {
            ids.push(NodeId(cur));
            cur += self.entries[cur].size;
        }
        ids
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.0].prev_sibling
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.entries[id.0].parent?;
        let parent_end = parent.0 + self.entries[parent.0].size;
        let next = id.0 + self.entries[id.0].size;
        (next < parent_end).then_some(NodeId(next))
    }
}

fn visit<'t>(
    node: &'t SyntaxNode,
    parent: Option<NodeId>,
    child_pos: usize,
    prev_sibling: Option<NodeId>,
    entries: &mut Vec<Entry<'t>>,
) -> usize {
    let id = NodeId(entries.len());
    entries.push(Entry {
        node,
        parent,
        child_pos,
        prev_sibling,
        size: 0,
    });

    let mut size = 1;
    let mut prev = None;
    for (pos, child) in node.children().into_iter().enumerate() {
        let child_id = NodeId(entries.len());
        size += visit(child, Some(id), pos, prev, entries);
        prev = Some(child_id);
    }
    entries[id.0].size = size;
    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{Annotation, Category, Shape};

    fn leaf(text: &str) -> SyntaxNode {
        SyntaxNode::new(
            Annotation::synthetic(Category::Identifier),
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
    fn preorder_numbering() {
        // list(a, list(b, c), d) -> ids 0..=5
        let tree = list(vec![leaf("a"), list(vec![leaf("b"), leaf("c")]), leaf("d")]);
        let index = TreeIndex::build(&tree);

        assert_eq!(index.len(), 6);
        assert_eq!(index.size(index.root()), 6);
        assert_eq!(index.size(NodeId::new(2)), 3);
        assert_eq!(index.subtree_range(NodeId::new(2)), 2..5);
    }

    #[test]
    fn parent_and_sibling_links() {
        let tree = list(vec![leaf("a"), list(vec![leaf("b"), leaf("c")]), leaf("d")]);
        let index = TreeIndex::build(&tree);

        assert_eq!(index.parent(index.root()), None);
        assert_eq!(index.parent(NodeId::new(3)), Some(NodeId::new(2)));
        assert_eq!(index.child_pos(NodeId::new(5)), 2);
        assert_eq!(index.prev_sibling(NodeId::new(2)), Some(NodeId::new(1)));
        assert_eq!(index.next_sibling(NodeId::new(2)), Some(NodeId::new(5)));
        assert_eq!(index.next_sibling(NodeId::new(5)), None);
        assert_eq!(index.prev_sibling(NodeId::new(1)), None);
    }

    #[test]
    fn children_ids_skip_subtrees() {
        let tree = list(vec![leaf("a"), list(vec![leaf("b"), leaf("c")]), leaf("d")]);
        let index = TreeIndex::build(&tree);

        assert_eq!(
            index.children_ids(index.root()),
            vec![NodeId::new(1), NodeId::new(2), NodeId::new(5)]
        );
        assert_eq!(
            index.children_ids(NodeId::new(2)),
            vec![NodeId::new(3), NodeId::new(4)]
        );
        assert!(index.children_ids(NodeId::new(1)).is_empty());
    }
}

//! Edit script construction from a completed node mapping.
//!
//! The script is a flat list of operations covering both trees exactly
//! once: every old node appears in one `Delete`, `Replace` or `Copy`,
//! and every new node in one `Insert`, `Replace` or `Copy`. A `Delete`
//! or `Insert` naming the root of a fully-unmapped subtree stands for
//! the whole subtree; an unmapped node with mapped descendants is
//! deleted or inserted alone and its children handled individually.
//!
//! Output order follows a pre-order traversal of the new tree, with the
//! deletes for old-only subtrees attached after the new-side children of
//! their nearest mapped ancestor pair. When the old root itself is
//! unmapped its deletes open the script, so a total difference reads as
//! `Delete` then `Insert`.

use crate::matcher::{position_changed, Mapping};
use crate::tree::{NodeId, TreeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One edit operation, addressing nodes by pre-order id in the tree
/// they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// A new-tree subtree (or single node, when descendants are covered
    /// by other operations) with no old counterpart.
    Insert { new: NodeId },
    /// An old-tree subtree (or single node) with no new counterpart.
    Delete { old: NodeId },
    /// A mapped pair whose local content differs.
    Replace { old: NodeId, new: NodeId },
    /// A mapped pair with identical local content. `moved` is set when
    /// the pair sits in a different structural position than before.
    Copy {
        old: NodeId,
        new: NodeId,
        moved: bool,
    },
}

impl EditOp {
    /// The old-tree node this operation touches, if any.
    pub fn old_node(&self) -> Option<NodeId> {
        match *self {
            EditOp::Insert { .. } => None,
            EditOp::Delete { old }
            | EditOp::Replace { old, .. }
            | EditOp::Copy { old, .. } => Some(old),
        }
    }

    /// The new-tree node this operation touches, if any.
    pub fn new_node(&self) -> Option<NodeId> {
        match *self {
            EditOp::Delete { .. } => None,
            EditOp::Insert { new }
            | EditOp::Replace { new, .. }
            | EditOp::Copy { new, .. } => Some(new),
        }
    }

    /// Whether applying this operation discards old-tree content.
    pub fn is_destructive(&self) -> bool {
        matches!(self, EditOp::Delete { .. } | EditOp::Replace { .. })
    }
}

/// Operation counts over a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStats {
    pub inserts: usize,
    pub deletes: usize,
    pub replaces: usize,
    pub copies: usize,
    pub moves: usize,
}

impl ScriptStats {
    pub fn of(script: &[EditOp]) -> Self {
        let mut stats = ScriptStats::default();
        for op in script {
            match op {
                EditOp::Insert { .. } => stats.inserts += 1,
                EditOp::Delete { .. } => stats.deletes += 1,
                EditOp::Replace { .. } => stats.replaces += 1,
                EditOp::Copy { moved, .. } => {
                    stats.copies += 1;
                    if *moved {
                        stats.moves += 1;
                    }
                }
            }
        }
        stats
    }

    /// Whether the script changes anything at all.
    pub fn is_identity(&self) -> bool {
        self.inserts == 0 && self.deletes == 0 && self.replaces == 0 && self.moves == 0
    }
}

/// Build the edit script for a mapping between two indexed trees.
pub fn build_script(
    old: &TreeIndex<'_>,
    new: &TreeIndex<'_>,
    mapping: &Mapping,
) -> Vec<EditOp> {
    let mut ops = Vec::new();
    if !mapping.contains_old(old.root()) {
        emit_deletes(old, mapping, old.root(), &mut ops);
    }
    walk_new(old, new, mapping, new.root(), &mut ops);
    debug!(ops = ops.len(), "edit script built");
    ops
}

/// New-tree pre-order walk. A mapped node becomes `Copy` or `Replace`
/// (by node-local content), then its new-side children, then the deletes
/// for any old-only subtrees under its old counterpart. An unmapped node
/// becomes one `Insert` for its whole subtree when nothing below it is
/// mapped, or an `Insert` for the node alone followed by its children.
fn walk_new(
    old: &TreeIndex<'_>,
    new: &TreeIndex<'_>,
    mapping: &Mapping,
    new_id: NodeId,
    ops: &mut Vec<EditOp>,
) {
    if let Some(old_id) = mapping.get_old(new_id) {
        let old_node = old.node(old_id);
        let new_node = new.node(new_id);
        if old_node.local_content_eq(new_node) {
            ops.push(EditOp::Copy {
                old: old_id,
                new: new_id,
                moved: position_changed(old, new, mapping, old_id, new_id),
            });
        } else {
            ops.push(EditOp::Replace {
                old: old_id,
                new: new_id,
            });
        }
        for child in new.children_ids(new_id) {
            walk_new(old, new, mapping, child, ops);
        }
        for old_child in old.children_ids(old_id) {
            emit_deletes(old, mapping, old_child, ops);
        }
    } else {
        ops.push(EditOp::Insert { new: new_id });
        if new.subtree_ids(new_id).all(|id| !mapping.contains_new(id)) {
            return;
        }
        for child in new.children_ids(new_id) {
            walk_new(old, new, mapping, child, ops);
        }
    }
}

/// Deletes for the old-only parts of one subtree. A mapped node is
/// skipped entirely (its pair is emitted at its new-tree position); a
/// fully-unmapped subtree collapses into one `Delete`; an unmapped node
/// above a surviving descendant is deleted alone.
fn emit_deletes(old: &TreeIndex<'_>, mapping: &Mapping, old_id: NodeId, ops: &mut Vec<EditOp>) {
    if mapping.contains_old(old_id) {
        return;
    }
    ops.push(EditOp::Delete { old: old_id });
    if old.subtree_ids(old_id).all(|id| !mapping.contains_old(id)) {
        return;
    }
    for child in old.children_ids(old_id) {
        emit_deletes(old, mapping, child, ops);
    }
}

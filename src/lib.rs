//! Structural comparison of source trees.
//!
//! `treedelta` takes two language-neutral syntax trees, finds which nodes
//! of one correspond to which nodes of the other, and expresses the
//! difference as an edit script of inserts, deletes, replaces and copies.
//! Correspondence is judged structurally: every subtree is fingerprinted
//! by hashing its bounded-context category grams into a fixed-width
//! feature vector, and subtrees whose vectors are close enough are
//! candidates for pairing.
//!
//! # Architecture
//!
//! - [`tree`] defines the node model ([`SyntaxNode`], [`Category`],
//!   [`Shape`]) and the pre-order index ([`TreeIndex`]) that addresses
//!   nodes by id and exposes subtrees as contiguous ranges.
//! - [`gram`] extracts per-node context grams and folds them into hashed
//!   [`FeatureVector`]s with a normalized distance in `[0, 1]`.
//! - [`matcher`] builds the injective old-to-new [`Mapping`] in a
//!   top-down similarity pass followed by bottom-up exact-content
//!   recovery.
//! - [`script`] turns the mapping into a flat [`EditOp`] list covering
//!   every node of both trees exactly once.
//!
//! # Example
//!
//! ```
//! use treedelta::{diff, Annotation, Category, DiffConfig, EditOp, Shape, SyntaxNode};
//!
//! fn leaf(category: Category, text: &str) -> SyntaxNode {
//!     SyntaxNode::new(
//!         Annotation::synthetic(category),
//!         Shape::Leaf { text: text.into() },
//!     )
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let old = leaf(Category::Identifier, "total");
//! let new = leaf(Category::Identifier, "sum");
//!
//! let outcome = diff(&old, &new, &DiffConfig::default())?;
//!
//! // Same structure, different text: a single replace.
//! assert!(matches!(outcome.script[..], [EditOp::Replace { .. }]));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gram;
pub mod matcher;
pub mod script;
pub mod tree;

pub use config::{ConfigError, DiffConfig};
pub use gram::{extract_grams, FeatureVector, Gram, Label};
pub use matcher::{match_trees, Mapping};
pub use script::{build_script, EditOp, ScriptStats};
pub use tree::{
    Annotation, Category, NodeId, Position, Shape, ShapeKind, Span, SyntaxNode, TreeError,
    TreeIndex,
};

use thiserror::Error;

/// Errors surfaced by [`diff`].
#[derive(Debug, Error)]
pub enum DiffError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The result of comparing two trees: the node correspondence and the
/// edit script derived from it.
#[derive(Debug)]
pub struct DiffOutcome {
    pub mapping: Mapping,
    pub script: Vec<EditOp>,
}

impl DiffOutcome {
    /// Operation counts over the script.
    pub fn stats(&self) -> ScriptStats {
        ScriptStats::of(&self.script)
    }
}

/// Compare two trees end to end: validate the configuration, index both
/// trees, match nodes, and build the edit script.
pub fn diff(
    old: &SyntaxNode,
    new: &SyntaxNode,
    config: &DiffConfig,
) -> Result<DiffOutcome, DiffError> {
    config.validate()?;
    let old_index = TreeIndex::build(old);
    let new_index = TreeIndex::build(new);
    let mapping = match_trees(&old_index, &new_index, config);
    let script = build_script(&old_index, &new_index, &mapping);
    Ok(DiffOutcome { mapping, script })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_rejects_invalid_config() {
        let node = SyntaxNode::new(
            Annotation::synthetic(Category::Identifier),
            Shape::Leaf { text: "x".into() },
        );
        let config = DiffConfig {
            dimension: 0,
            ..DiffConfig::default()
        };
        let err = diff(&node, &node.clone(), &config);
        assert!(matches!(err, Err(DiffError::Config(_))));
    }

    #[test]
    fn diff_of_identical_trees_is_identity() {
        let node = SyntaxNode::new(
            Annotation::synthetic(Category::Identifier),
            Shape::Leaf { text: "x".into() },
        );
        let outcome = diff(&node, &node.clone(), &DiffConfig::default()).unwrap();
        assert!(outcome.stats().is_identity());
        assert_eq!(outcome.mapping.len(), 1);
    }
}

use crate::tree::node::ShapeKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("cannot rebuild {kind:?} node: expected {expected} children, got {got}")]
    ArityMismatch {
        kind: ShapeKind,
        expected: usize,
        got: usize,
    },
}

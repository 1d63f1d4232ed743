pub mod errors;
pub mod index;
pub mod node;

pub use errors::TreeError;
pub use index::{NodeId, TreeIndex};
pub use node::{Annotation, Category, Position, Shape, ShapeKind, Span, SyntaxNode};

use crate::tree::errors::TreeError;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use xxhash_rust::xxh3::Xxh3;

/// Language-independent classification of a syntax node.
///
/// Assigned upstream by the parsing/assignment layer from grammar-specific
/// node kinds; the core never interprets it beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Comment,
    Identifier,
    Literal,
    String,
    Operator,
    Assignment,
    Call,
    MethodCall,
    MemberAccess,
    Function,
    Conditional,
    Loop,
    Return,
    Block,
    List,
    Record,
    ParseError,
    Other,
}

impl Category {
    /// Stable byte code used in the gram/content hash encodings.
    ///
    /// Must never be reordered: feature vectors are only comparable when
    /// both sides hashed the same encoding.
    pub(crate) fn code(self) -> u8 {
        match self {
            Category::Comment => 0,
            Category::Identifier => 1,
            Category::Literal => 2,
            Category::String => 3,
            Category::Operator => 4,
            Category::Assignment => 5,
            Category::Call => 6,
            Category::MethodCall => 7,
            Category::MemberAccess => 8,
            Category::Function => 9,
            Category::Conditional => 10,
            Category::Loop => 11,
            Category::Return => 12,
            Category::Block => 13,
            Category::List => 14,
            Category::Record => 15,
            Category::ParseError => 16,
            Category::Other => 17,
        }
    }
}

/// A line/column pair (0-based, as produced by the parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Line/column extent of a node in the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Metadata attached to every node by the upstream layer.
///
/// Immutable once attached; the core reads `category` constantly and carries
/// the ranges through to the edit script untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub byte_range: Range<usize>,
    pub span: Span,
    pub category: Category,
}

impl Annotation {
    pub fn new(byte_range: Range<usize>, span: Span, category: Category) -> Self {
        Self {
            byte_range,
            span,
            category,
        }
    }

    /// Annotation with empty ranges, for trees built in memory rather than
    /// parsed from source (tests, tooling).
    pub fn synthetic(category: Category) -> Self {
        Self {
            byte_range: 0..0,
            span: Span::default(),
            category,
        }
    }
}

/// Discriminant of [`Shape`], used by the matcher's pre-filter and the
/// stable content encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Leaf,
    Indexed,
    Fixed,
    Keyed,
    Call,
    Function,
    Assignment,
    Member,
    MethodCall,
    Conditional,
    Operator,
    ParseError,
}

impl ShapeKind {
    pub(crate) fn code(self) -> u8 {
        match self {
            ShapeKind::Leaf => 0,
            ShapeKind::Indexed => 1,
            ShapeKind::Fixed => 2,
            ShapeKind::Keyed => 3,
            ShapeKind::Call => 4,
            ShapeKind::Function => 5,
            ShapeKind::Assignment => 6,
            ShapeKind::Member => 7,
            ShapeKind::MethodCall => 8,
            ShapeKind::Conditional => 9,
            ShapeKind::Operator => 10,
            ShapeKind::ParseError => 11,
        }
    }
}

/// The closed set of structural variants a node may take.
///
/// Exactly one shape applies to every node. Children are owned directly
/// (each parent exclusively owns its children; no sharing, no cycles), so
/// the same definitions serve as both the tree and its recursion scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Atomic payload: identifier or literal text. No children.
    Leaf { text: String },
    /// Ordered, variable-length child list (statement lists, tuple items).
    Indexed { children: Vec<SyntaxNode> },
    /// Ordered, fixed-arity child list (an operator and its operands laid
    /// out by the grammar).
    Fixed { children: Vec<SyntaxNode> },
    /// Children addressed by a textual key; insertion order preserved.
    Keyed { entries: Vec<(String, SyntaxNode)> },
    /// Function call: callee followed by ordered arguments.
    Call {
        callee: Box<SyntaxNode>,
        arguments: Vec<SyntaxNode>,
    },
    /// Function definition with optional name and parameter node.
    Function {
        name: Option<Box<SyntaxNode>>,
        parameters: Option<Box<SyntaxNode>>,
        body: Box<SyntaxNode>,
    },
    /// Assignment of a value to a target.
    Assignment {
        target: Box<SyntaxNode>,
        value: Box<SyntaxNode>,
    },
    /// Member access: object followed by property.
    Member {
        object: Box<SyntaxNode>,
        property: Box<SyntaxNode>,
    },
    /// Method call: receiver, method, ordered arguments.
    MethodCall {
        target: Box<SyntaxNode>,
        method: Box<SyntaxNode>,
        arguments: Vec<SyntaxNode>,
    },
    /// Conditional with condition, then-branch and optional else-branch.
    Conditional {
        condition: Box<SyntaxNode>,
        then_branch: Box<SyntaxNode>,
        else_branch: Option<Box<SyntaxNode>>,
    },
    /// Operator application: symbol plus ordered operands.
    Operator {
        symbol: String,
        operands: Vec<SyntaxNode>,
    },
    /// Parse-error placeholder holding whatever children the parser
    /// recovered. An ordinary variant, never fatal to the core.
    ParseError { recovered: Vec<SyntaxNode> },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Leaf { .. } => ShapeKind::Leaf,
            Shape::Indexed { .. } => ShapeKind::Indexed,
            Shape::Fixed { .. } => ShapeKind::Fixed,
            Shape::Keyed { .. } => ShapeKind::Keyed,
            Shape::Call { .. } => ShapeKind::Call,
            Shape::Function { .. } => ShapeKind::Function,
            Shape::Assignment { .. } => ShapeKind::Assignment,
            Shape::Member { .. } => ShapeKind::Member,
            Shape::MethodCall { .. } => ShapeKind::MethodCall,
            Shape::Conditional { .. } => ShapeKind::Conditional,
            Shape::Operator { .. } => ShapeKind::Operator,
            Shape::ParseError { .. } => ShapeKind::ParseError,
        }
    }
}

/// A single syntax construct: annotation plus shape.
///
/// Trees are immutable once built; everything the core derives from them
/// (indexes, grams, vectors) lives in side structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub annotation: Annotation,
    pub shape: Shape,
}

impl SyntaxNode {
    pub fn new(annotation: Annotation, shape: Shape) -> Self {
        Self { annotation, shape }
    }

    /// All children in declared order, each visited exactly once.
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match &self.shape {
            Shape::Leaf { .. } => Vec::new(),
            Shape::Indexed { children } | Shape::Fixed { children } => children.iter().collect(),
            Shape::Keyed { entries } => entries.iter().map(|(_, child)| child).collect(),
            Shape::Call { callee, arguments } => {
                let mut out = vec![callee.as_ref()];
                out.extend(arguments.iter());
                out
            }
            Shape::Function {
                name,
                parameters,
                body,
            } => {
                let mut out = Vec::new();
                if let Some(name) = name {
                    out.push(name.as_ref());
                }
                if let Some(parameters) = parameters {
                    out.push(parameters.as_ref());
                }
                out.push(body.as_ref());
                out
            }
            Shape::Assignment { target, value } => vec![target.as_ref(), value.as_ref()],
            Shape::Member { object, property } => vec![object.as_ref(), property.as_ref()],
            Shape::MethodCall {
                target,
                method,
                arguments,
            } => {
                let mut out = vec![target.as_ref(), method.as_ref()];
                out.extend(arguments.iter());
                out
            }
            Shape::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![condition.as_ref(), then_branch.as_ref()];
                if let Some(else_branch) = else_branch {
                    out.push(else_branch.as_ref());
                }
                out
            }
            Shape::Operator { operands, .. } => operands.iter().collect(),
            Shape::ParseError { recovered } => recovered.iter().collect(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Number of nodes in this subtree, including the node itself.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }

    /// Bottom-up fold: children are folded first (in declared order) and
    /// their results handed to `f` together with the node.
    pub fn fold<T, F>(&self, f: &mut F) -> T
    where
        F: FnMut(&SyntaxNode, Vec<T>) -> T,
    {
        let child_results = self
            .children()
            .into_iter()
            .map(|child| child.fold(f))
            .collect();
        f(self, child_results)
    }

    /// Rebuild this node with its children replaced, preserving annotation
    /// and shape skeleton (leaf text, operator symbol, keyed keys, optional
    /// field presence). The replacement count must match the current arity.
    pub fn with_children(&self, children: Vec<SyntaxNode>) -> Result<SyntaxNode, TreeError> {
        let expected = self.child_count();
        if children.len() != expected {
            return Err(TreeError::ArityMismatch {
                kind: self.shape.kind(),
                expected,
                got: children.len(),
            });
        }

        let mut it = children.into_iter();
        let shape = match &self.shape {
            Shape::Leaf { text } => Shape::Leaf { text: text.clone() },
            Shape::Indexed { .. } => Shape::Indexed {
                children: it.collect(),
            },
            Shape::Fixed { .. } => Shape::Fixed {
                children: it.collect(),
            },
            Shape::Keyed { entries } => Shape::Keyed {
                entries: entries
                    .iter()
                    .map(|(key, _)| key.clone())
                    .zip(it)
                    .collect(),
            },
            Shape::Call { .. } => Shape::Call {
                callee: Box::new(it.next().expect("arity checked above")),
                arguments: it.collect(),
            },
            Shape::Function {
                name, parameters, ..
            } => Shape::Function {
                name: name
                    .is_some()
                    .then(|| Box::new(it.next().expect("arity checked above"))),
                parameters: parameters
                    .is_some()
                    .then(|| Box::new(it.next().expect("arity checked above"))),
                body: Box::new(it.next().expect("arity checked above")),
            },
            Shape::Assignment { .. } => Shape::Assignment {
                target: Box::new(it.next().expect("arity checked above")),
                value: Box::new(it.next().expect("arity checked above")),
            },
            Shape::Member { .. } => Shape::Member {
                object: Box::new(it.next().expect("arity checked above")),
                property: Box::new(it.next().expect("arity checked above")),
            },
            Shape::MethodCall { .. } => Shape::MethodCall {
                target: Box::new(it.next().expect("arity checked above")),
                method: Box::new(it.next().expect("arity checked above")),
                arguments: it.collect(),
            },
            Shape::Conditional { else_branch, .. } => Shape::Conditional {
                condition: Box::new(it.next().expect("arity checked above")),
                then_branch: Box::new(it.next().expect("arity checked above")),
                else_branch: else_branch
                    .is_some()
                    .then(|| Box::new(it.next().expect("arity checked above"))),
            },
            Shape::Operator { symbol, .. } => Shape::Operator {
                symbol: symbol.clone(),
                operands: it.collect(),
            },
            Shape::ParseError { .. } => Shape::ParseError {
                recovered: it.collect(),
            },
        };

        Ok(SyntaxNode {
            annotation: self.annotation.clone(),
            shape,
        })
    }

    /// Node-local content equality: category, shape variant, and the node's
    /// own payload (leaf text, operator symbol, keyed key list). Children
    /// and source positions are ignored.
    ///
    /// This is what decides Copy vs Replace for a mapped pair: a node whose
    /// own content survives wraps its children's operations.
    pub fn local_content_eq(&self, other: &SyntaxNode) -> bool {
        if self.annotation.category != other.annotation.category {
            return false;
        }
        match (&self.shape, &other.shape) {
            (Shape::Leaf { text: a }, Shape::Leaf { text: b }) => a == b,
            (Shape::Operator { symbol: a, .. }, Shape::Operator { symbol: b, .. }) => a == b,
            (Shape::Keyed { entries: a }, Shape::Keyed { entries: b }) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, _), (kb, _))| ka == kb)
            }
            _ => self.shape.kind() == other.shape.kind(),
        }
    }

    /// Deep content equality: local content plus all descendants, position
    /// annotations ignored. Two content-equal subtrees at different places
    /// are still distinct node identities.
    pub fn content_eq(&self, other: &SyntaxNode) -> bool {
        if !self.local_content_eq(other) {
            return false;
        }
        let a = self.children();
        let b = other.children();
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.content_eq(y))
    }
}

/// Stable hash of a subtree's content (category, shape, payloads, child
/// structure), ignoring source positions. Used as the exact-equality key in
/// the matcher's bottom-up pass; collisions are re-checked with
/// [`SyntaxNode::content_eq`].
pub(crate) fn content_hash(node: &SyntaxNode) -> u64 {
    let mut hasher = Xxh3::new();
    write_content(node, &mut hasher);
    hasher.digest()
}

fn write_content(node: &SyntaxNode, hasher: &mut Xxh3) {
    hasher.update(&[node.annotation.category.code(), node.shape.kind().code()]);
    match &node.shape {
        Shape::Leaf { text } => hasher.update(text.as_bytes()),
        Shape::Operator { symbol, .. } => hasher.update(symbol.as_bytes()),
        Shape::Keyed { entries } => {
            for (key, _) in entries {
                hasher.update(key.as_bytes());
                hasher.update(&[0xff]);
            }
        }
        _ => {}
    }
    let children = node.children();
    hasher.update(&(children.len() as u32).to_le_bytes());
    for child in children {
        write_content(child, hasher);
    }
}

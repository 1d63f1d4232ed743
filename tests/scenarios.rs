//! End-to-end diff scenarios over hand-built trees.

use treedelta::{
    diff, Annotation, Category, DiffConfig, EditOp, NodeId, Shape, SyntaxNode,
};

fn leaf(category: Category, text: &str) -> SyntaxNode {
    SyntaxNode::new(
        Annotation::synthetic(category),
        Shape::Leaf {
            text: text.to_string(),
        },
    )
}

fn block(children: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::new(
        Annotation::synthetic(Category::Block),
        Shape::Indexed { children },
    )
}

fn operator(symbol: &str, operands: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::new(
        Annotation::synthetic(Category::Operator),
        Shape::Operator {
            symbol: symbol.to_string(),
            operands,
        },
    )
}

fn call(callee: SyntaxNode, arguments: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::new(
        Annotation::synthetic(Category::Call),
        Shape::Call {
            callee: Box::new(callee),
            arguments,
        },
    )
}

fn id(i: usize) -> NodeId {
    NodeId::new(i)
}

#[test]
fn identical_trees_yield_identity_script() {
    let tree = block(vec![
        call(
            leaf(Category::Identifier, "print"),
            vec![leaf(Category::String, "hello"), leaf(Category::Literal, "2")],
        ),
        operator(
            "+",
            vec![leaf(Category::Identifier, "a"), leaf(Category::Identifier, "b")],
        ),
    ]);
    let copy = tree.clone();

    let outcome = diff(&tree, &copy, &DiffConfig::default()).unwrap();
    let stats = outcome.stats();

    assert!(stats.is_identity());
    assert_eq!(stats.copies, tree.size());
    assert_eq!(outcome.mapping.len(), tree.size());
}

#[test]
fn disjoint_trees_yield_delete_then_insert() {
    let old = leaf(Category::Comment, "// gone");
    let new = leaf(Category::String, "fresh");

    let outcome = diff(&old, &new, &DiffConfig::default()).unwrap();

    assert!(outcome.mapping.is_empty());
    assert_eq!(
        outcome.script,
        vec![EditOp::Delete { old: id(0) }, EditOp::Insert { new: id(0) }]
    );
}

#[test]
fn renamed_operand_replaces_in_place() {
    // "a + b" vs "a + c": category profiles are identical, so the whole
    // expression maps at distance zero and only the renamed leaf differs
    // in local content.
    let old = operator(
        "+",
        vec![leaf(Category::Identifier, "a"), leaf(Category::Identifier, "b")],
    );
    let new = operator(
        "+",
        vec![leaf(Category::Identifier, "a"), leaf(Category::Identifier, "c")],
    );

    let outcome = diff(&old, &new, &DiffConfig::default()).unwrap();

    assert_eq!(
        outcome.script,
        vec![
            EditOp::Copy {
                old: id(0),
                new: id(0),
                moved: false,
            },
            EditOp::Copy {
                old: id(1),
                new: id(1),
                moved: false,
            },
            EditOp::Replace {
                old: id(2),
                new: id(2),
            },
        ]
    );
}

#[test]
fn swapped_siblings_become_moved_copies() {
    let old = block(vec![
        leaf(Category::Identifier, "f"),
        leaf(Category::Literal, "1"),
    ]);
    let new = block(vec![
        leaf(Category::Literal, "1"),
        leaf(Category::Identifier, "f"),
    ]);

    // The reordering perturbs every context gram, so the root pair only
    // clears a permissive threshold.
    let config = DiffConfig {
        threshold: 0.8,
        ..DiffConfig::default()
    };
    let outcome = diff(&old, &new, &config).unwrap();
    let stats = outcome.stats();

    assert_eq!(stats.copies, 3);
    assert_eq!(stats.moves, 2);
    assert_eq!(stats.deletes, 0);
    assert_eq!(stats.inserts, 0);
}

#[test]
fn removed_list_element_yields_single_delete() {
    let old = block(vec![
        leaf(Category::Identifier, "a"),
        leaf(Category::Identifier, "b"),
        leaf(Category::Identifier, "c"),
        leaf(Category::Identifier, "d"),
    ]);
    let new = block(vec![
        leaf(Category::Identifier, "a"),
        leaf(Category::Identifier, "b"),
        leaf(Category::Identifier, "c"),
    ]);

    // Dropping one element shifts every remaining context gram, so the
    // list pair needs a bit of slack to map; the survivors then pair by
    // exact content.
    let config = DiffConfig {
        threshold: 0.6,
        ..DiffConfig::default()
    };
    let outcome = diff(&old, &new, &config).unwrap();

    assert_eq!(
        outcome.script,
        vec![
            EditOp::Copy {
                old: id(0),
                new: id(0),
                moved: false,
            },
            EditOp::Copy {
                old: id(1),
                new: id(1),
                moved: false,
            },
            EditOp::Copy {
                old: id(2),
                new: id(2),
                moved: false,
            },
            EditOp::Copy {
                old: id(3),
                new: id(3),
                moved: false,
            },
            EditOp::Delete { old: id(4) },
        ]
    );
}

#[test]
fn parse_error_nodes_participate_like_any_node() {
    let broken = SyntaxNode::new(
        Annotation::synthetic(Category::ParseError),
        Shape::ParseError {
            recovered: vec![leaf(Category::Identifier, "x")],
        },
    );
    let old = block(vec![broken.clone()]);
    let new = block(vec![broken]);

    let outcome = diff(&old, &new, &DiffConfig::default()).unwrap();

    assert!(outcome.stats().is_identity());
    assert_eq!(outcome.mapping.len(), 3);
}

#[test]
fn wrapper_removal_keeps_operand_as_moved_copy() {
    // Unwrapping "-x" to "x": the operator disappears alone while its
    // operand survives under the block.
    let old = block(vec![operator("-", vec![leaf(Category::Identifier, "x")])]);
    let new = block(vec![leaf(Category::Identifier, "x")]);

    let config = DiffConfig {
        threshold: 0.8,
        ..DiffConfig::default()
    };
    let outcome = diff(&old, &new, &config).unwrap();
    let stats = outcome.stats();

    assert_eq!(stats.deletes, 1);
    assert_eq!(stats.inserts, 0);
    assert_eq!(stats.copies, 2);
    assert_eq!(stats.moves, 1);
    assert!(outcome.script.contains(&EditOp::Delete { old: id(1) }));
}

#[test]
fn script_round_trips_through_json() {
    let old = operator(
        "+",
        vec![leaf(Category::Identifier, "a"), leaf(Category::Identifier, "b")],
    );
    let new_tree = operator(
        "+",
        vec![leaf(Category::Identifier, "a"), leaf(Category::Identifier, "c")],
    );

    let outcome = diff(&old, &new_tree, &DiffConfig::default()).unwrap();

    let json = serde_json::to_string(&outcome.script).unwrap();
    let restored: Vec<EditOp> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, outcome.script);
    assert!(json.contains(r#""op":"replace""#));
}

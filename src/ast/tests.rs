use pretty_assertions::assert_eq;

use super::{
    ast::{Node, NodeKind, NodeTag},
    parent::{find_enclosing, find_node, walk},
};
use crate::{lexer::lexer::tokenize, parser::parser::parse, Location, Span};

fn parse_source(source: &str) -> Vec<Node> {
    let (tokens, _) = tokenize(source);
    let (nodes, errors) = parse(tokens);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    nodes
}

fn attributes(node: &Node) -> Vec<(&'static str, Option<usize>)> {
    node.children()
        .into_iter()
        .map(|(attribute, index, _)| (attribute, index))
        .collect()
}

/// First node, in walk order, matching `predicate`.
fn find<'a>(root: &'a Node, predicate: impl Fn(&Node) -> bool) -> &'a Node {
    let mut found = None;
    walk(root, &mut |node| {
        if found.is_none() && predicate(node) {
            found = Some(node);
        }
    });
    found.expect("no matching node")
}

#[test]
fn test_children_in_field_order() {
    let nodes = parse_source("a ? b : c\nfor i = 0 to 9\n    x := i");

    let NodeKind::ExprStmt { expr } = &nodes[0].kind else {
        panic!("expected an expression statement");
    };
    assert_eq!(
        attributes(expr),
        vec![("test", None), ("if_true", None), ("if_false", None)]
    );

    assert_eq!(
        attributes(&nodes[1]),
        vec![("init", None), ("final_value", None), ("body", None)]
    );
}

#[test]
fn test_optional_children_are_skipped() {
    let nodes = parse_source("x = 1\nfloat y = 2");

    assert_eq!(attributes(&nodes[0]), vec![("initial", None)]);
    assert_eq!(
        attributes(&nodes[1]),
        vec![("type_annotation", None), ("initial", None)]
    );
}

#[test]
fn test_leaves_have_no_children() {
    let leaf = Node::new(
        1,
        NodeKind::IntLiteral { value: 1 },
        Span::new(Location::new(1, 1), Location::new(1, 1)),
    );
    assert!(leaf.children().is_empty());
}

#[test]
fn test_every_node_but_the_roots_is_linked() {
    let nodes = parse_source("f(x) => x * 2\nif f(1) > 1\n    y = [1, 2]\nelse\n    y = [3, 4]");

    for root in &nodes {
        assert!(root.path.is_none());
        walk(root, &mut |node| {
            if node.id != root.id {
                assert!(node.path.is_some(), "unlinked node {}", node);
            }
        });
    }
}

#[test]
fn test_list_children_carry_their_index() {
    let nodes = parse_source("if a\n    b := 1\n    c := 2");

    let NodeKind::If { body, .. } = &nodes[0].kind else {
        panic!("expected an if statement");
    };
    assert_eq!(body.tag(), NodeTag::Suite);

    let NodeKind::Suite { body: stmts } = &body.kind else {
        panic!("expected a suite");
    };
    for (index, stmt) in stmts.iter().enumerate() {
        let path = stmt.path.as_ref().unwrap();
        assert_eq!(path.parent, body.id);
        assert_eq!(path.parent_tag, NodeTag::Suite);
        assert_eq!(path.attribute, "body");
        assert_eq!(path.index, Some(index));
    }
}

#[test]
fn test_case_clause_belongs_to_switch() {
    let nodes = parse_source("switch x\n    1 => a\n    2 => b\n    => c");
    let switch = &nodes[0];

    let NodeKind::Switch { cases, default, .. } = &switch.kind else {
        panic!("expected a switch");
    };

    let second = cases[1].path.as_ref().unwrap();
    assert_eq!(second.parent, switch.id);
    assert_eq!(second.parent_tag, NodeTag::Switch);
    assert_eq!(second.attribute, "cases");
    assert_eq!(second.index, Some(1));

    let default = default.as_ref().unwrap().path.as_ref().unwrap();
    assert_eq!(default.attribute, "default");
    assert_eq!(default.index, None);

    let b = find(switch, |node| matches!(&node.kind, NodeKind::Identifier { name } if name == "b"));
    let case = find_enclosing(switch, b.id, NodeTag::CaseClause).unwrap();
    assert_eq!(case.id, cases[1].id);
    assert_eq!(
        find_enclosing(switch, b.id, NodeTag::Switch).map(|node| node.id),
        Some(switch.id)
    );
    assert!(find_enclosing(switch, b.id, NodeTag::While).is_none());
}

#[test]
fn test_find_node() {
    let nodes = parse_source("x = a + b");
    let root = &nodes[0];

    let binary = find(root, |node| node.tag() == NodeTag::Binary);
    assert_eq!(find_node(root, binary.id).map(Node::sexpr), Some(String::from("(+ a b)")));
    assert!(find_node(root, usize::MAX).is_none());
}

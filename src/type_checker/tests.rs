use std::collections::HashSet;

use pretty_assertions::assert_eq;

use super::type_checker::{analyze_type, analyze_types, TypeChecker};
use crate::{
    ast::{
        ast::{Node, NodeKind, NodeTag},
        parent::{mark_parent, walk},
    },
    builtins::global_namespace,
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    types::qualifiers::Qualifier,
    Location, Span,
};

fn parse_source(source: &str) -> Vec<Node> {
    let (tokens, errors) = tokenize(source);
    assert!(errors.is_empty(), "unexpected lexical errors: {:?}", errors);
    let (nodes, errors) = parse(tokens);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    nodes
}

fn check(source: &str) -> (Vec<Node>, Vec<Error>) {
    let mut nodes = parse_source(source);
    let namespace = global_namespace();
    let errors = analyze_types(&namespace, &mut nodes);
    (nodes, errors)
}

fn type_of(node: &Node) -> String {
    node.ty
        .as_ref()
        .map(|ty| ty.to_string())
        .unwrap_or_else(|| String::from("<unset>"))
}

/// Types of the top level statements of a program that checks cleanly.
fn types(source: &str) -> Vec<String> {
    let (nodes, errors) = check(source);
    assert!(errors.is_empty(), "unexpected type errors: {:?}", errors);
    nodes.iter().map(type_of).collect()
}

fn error_names(source: &str) -> Vec<String> {
    let (_, errors) = check(source);
    errors
        .iter()
        .map(|error| error.get_error_name().to_string())
        .collect()
}

fn at(id: usize, kind: NodeKind) -> Node {
    Node::new(
        id,
        kind,
        Span::new(Location::new(1, 1), Location::new(1, 1)),
    )
}

#[test]
fn test_inferred_declaration() {
    assert_eq!(types("x = 1 + 2.0\ny = x"), vec!["float", "float"]);
}

#[test]
fn test_series_qualifier_propagates() {
    assert_eq!(
        types("a = close + 1\nb = close[1]\nc = bar_index * 2.0\nd = 1\ne = d[2]"),
        vec!["series float", "series float", "series float", "int", "series int"]
    );
}

#[test]
fn test_independent_errors_are_all_reported() {
    let (nodes, errors) = check("a = foo\nb = bar\nc = 1 + \"s\"");

    let names: Vec<_> = errors.iter().map(Error::get_error_name).collect();
    assert_eq!(
        names,
        vec!["UnknownIdentifier", "UnknownIdentifier", "UnsupportedBinaryOperation"]
    );
    assert_eq!(errors.iter().map(Error::row).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(
        errors[2].message(),
        "operator '+' cannot be applied to int and string"
    );
    assert!(nodes.iter().all(|node| node.ty.is_none()));
}

#[test]
fn test_failed_children_do_not_cascade() {
    assert_eq!(error_names("x = -foo * 2 + 1"), vec!["UnknownIdentifier"]);

    let (nodes, errors) = check("float y = foo\nz = y + 1");
    assert_eq!(errors.len(), 1);
    assert!(nodes[0].ty.is_none());
    assert_eq!(type_of(&nodes[1]), "float");
}

#[test]
fn test_error_position() {
    let (_, errors) = check("x = 1\ny = x + foo");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_position(), &Location::new(2, 9));
    assert_eq!(
        errors[0].get_error(),
        &ErrorImpl::UnknownIdentifier {
            name: String::from("foo")
        }
    );
}

#[test]
fn test_redeclaration() {
    let (_, errors) = check("x = 1\nx = 2");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "VariableAlreadyDeclared");
    assert_eq!(errors[0].row(), 2);

    let (_, errors) = check("x = 1\nif true\n    x = 2\n    y = 1\ny = 2");
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_switch_type_is_union_of_branches() {
    let (nodes, errors) = check("x = 1\nswitch x\n    1 => \"a\"\n    2 => \"b\"\n    => 3");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(type_of(&nodes[1]), "string | int");

    assert_eq!(
        types("x = 1\nswitch\n    x > 1 => \"a\"\n    => \"b\"")[1],
        "string"
    );
}

#[test]
fn test_switch_conditions() {
    assert_eq!(
        error_names("x = 1\nswitch x\n    \"a\" => 1"),
        vec!["CaseConditionMismatch"]
    );
    assert_eq!(
        error_names("switch\n    \"a\" => 1"),
        vec!["ConditionNotBool"]
    );
}

#[test]
fn test_case_outside_switch() {
    let mut case = at(
        1,
        NodeKind::CaseClause {
            condition: Box::new(at(2, NodeKind::BoolLiteral { value: true })),
            body: Box::new(at(3, NodeKind::IntLiteral { value: 1 })),
        },
    );
    mark_parent(&mut case);

    let errors = analyze_type(&global_namespace(), &mut case);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error(), &ErrorImpl::CaseOutsideSwitch);
    assert!(case.ty.is_none());
}

#[test]
fn test_if_type_is_union_of_branches() {
    assert_eq!(types("if true\n    1\nelse\n    \"s\""), vec!["int | string"]);
    assert_eq!(types("if true\n    1"), vec!["int | void"]);
    assert_eq!(types("if 1.5\n    1"), vec!["int | void"]);
    assert_eq!(error_names("if \"s\"\n    1"), vec!["ConditionNotBool"]);
}

#[test]
fn test_ternary() {
    assert_eq!(
        types("a = true ? 1 : 2.0\nb = close > open ? 1 : 2\nc = true ? na : 1"),
        vec!["float", "series int", "int"]
    );
    assert_eq!(error_names("x = true ? 1 : \"s\""), vec!["TernaryMismatch"]);
}

#[test]
fn test_annotated_declarations() {
    assert_eq!(
        types(
            "float x = 1\nseries float s = 1\nint[] xs = na\nchart.point p = na\nmap<string, float> m = na"
        ),
        vec![
            "float",
            "series float",
            "array<int>",
            "chart.point",
            "map<string, float>"
        ]
    );

    let (nodes, _) = check("series float s = 1");
    assert_eq!(nodes[0].ty.as_ref().map(|ty| ty.qualifier()), Some(Qualifier::Series));
}

#[test]
fn test_declaration_errors() {
    let (_, errors) = check("int x = 1.5");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message(),
        "types do not match: expected int, received float"
    );

    assert_eq!(error_names("x = na"), vec!["CannotInferType"]);
    assert_eq!(error_names("array xs = na"), vec!["MissingTypeArguments"]);
    assert_eq!(error_names("int<float> x = na"), vec!["NotATypeConstructor"]);
    assert_eq!(error_names("map<int> m = na"), vec!["TypeArgumentCount"]);
    assert_eq!(error_names("foo x = 1"), vec!["UnknownType"]);
    assert_eq!(error_names("foo x = 1\ny = x + 1\nz = x * 2"), vec!["UnknownType"]);
    assert_eq!(error_names("nope.point p = na"), vec!["UnknownNamespace"]);
}

#[test]
fn test_tuple_declarations() {
    assert_eq!(
        types("[a, b] = [1, \"s\"]\nc = a + 1\nd = b + \"t\""),
        vec!["[int, string]", "int", "string"]
    );
    assert_eq!(error_names("[a, b] = 1"), vec!["NotATuple"]);
    assert_eq!(error_names("[a, b] = [1, 2, 3]"), vec!["TupleArityMismatch"]);
}

#[test]
fn test_reassignment() {
    let (_, errors) = check("x = 1.0\nx := 2\nx += 1\ns = \"a\"\ns += \"b\"");
    assert!(errors.is_empty(), "{:?}", errors);

    assert_eq!(error_names("x = 1\nx := 2.5"), vec!["TypeMatchError"]);
    assert_eq!(error_names("x = 1\nx += 1.5"), vec!["TypeMatchError"]);
    assert_eq!(
        error_names("s = \"a\"\ns -= \"b\""),
        vec!["UnsupportedBinaryOperation"]
    );
    assert_eq!(error_names("y := 1"), vec!["UnknownIdentifier"]);
}

#[test]
fn test_for_loops() {
    assert_eq!(types("for i = 0 to 10\n    x = i"), vec!["int"]);
    assert_eq!(types("for i = 0 to 1.5\n    x = i"), vec!["float"]);

    let (_, errors) = check("for i = 0 to \"s\"\n    x = i");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message(),
        "final value of a for loop must be int or float, got string"
    );

    let (nodes, errors) = check("for i = \"a\" to \"b\" by true\n    x = i");
    assert_eq!(
        errors.iter().map(Error::message).collect::<Vec<_>>(),
        vec![
            "initial value of a for loop must be int or float, got string",
            "final value of a for loop must be int or float, got string",
            "step value of a for loop must be int or float, got bool",
        ]
    );
    assert_eq!(errors[0].get_position(), &Location::new(1, 9));
    assert_eq!(errors[1].get_position(), &Location::new(1, 16));
    assert!(nodes[0].ty.is_none());
}

#[test]
fn test_while_loops_and_loop_control() {
    assert_eq!(types("while 1\n    break"), vec!["void"]);
    assert_eq!(error_names("while \"s\"\n    x = 1"), vec!["ConditionNotBool"]);
    assert_eq!(error_names("break"), vec!["LoopControlOutsideLoop"]);
    assert_eq!(
        error_names("for i = 0 to 3\n    f() => break"),
        vec!["LoopControlOutsideLoop"]
    );
}

#[test]
fn test_for_in_loops() {
    let (nodes, errors) = check(
        "xs = array.new<int>()\nfor x in xs\n    y = x + 1\nfor [i, x] in xs\n    z = i * x",
    );
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(type_of(&nodes[1]), "int");

    assert_eq!(
        types("matrix<float> mx = na\nfor row in mx\n    r = row")[1],
        "array<float>"
    );
    assert_eq!(
        error_names("map<string, float> m = na\nfor [k, v] in m\n    w = v\nfor v in m\n    continue"),
        vec!["MapIterationNeedsKey"]
    );
    assert_eq!(error_names("for x in 1\n    continue"), vec!["NotIterable"]);
}

#[test]
fn test_function_declarations() {
    assert_eq!(
        types("f(x) => x * 2\ny = f(3)"),
        vec!["(uncertain x) => int", "int"]
    );

    let (nodes, errors) =
        check("f(int a, int b = 1) => a + b\nx = f(1)\ny = f(1, b = 2)\nz = f(a = 3)");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(type_of(&nodes[3]), "int");

    assert_eq!(error_names("f(int a) => a\nx = f(\"s\")"), vec!["ArgumentMismatch"]);
    assert_eq!(error_names("f(x) => x\ny = x"), vec!["UnknownIdentifier"]);
}

#[test]
fn test_function_overloads_and_qualifiers() {
    let result = types("f(int a) => a\nf(string s) => s\nx = f(1)\ny = f(\"s\")");
    assert_eq!(result[2..].to_vec(), vec!["int", "string"]);

    assert_eq!(
        error_names("f(simple int n) => n\ny = f(bar_index)"),
        vec!["ArgumentMismatch"]
    );
    assert!(error_names("f(simple int n) => n\ny = f(1)").is_empty());
}

#[test]
fn test_methods() {
    assert_eq!(
        types("method double(int x) => x * 2\nn = 3\ny = n.double()")[2],
        "int"
    );

    let result = types("xs = array.new<int>()\nxs.push(1)\nv = xs.get(0)\nn = xs.size()");
    assert_eq!(result[1..].to_vec(), vec!["void", "int", "int"]);

    assert_eq!(
        error_names("xs = array.new<int>()\nxs.push(\"s\")"),
        vec!["ArgumentMismatch"]
    );
    assert_eq!(error_names("x = 1\ny = x.foo()"), vec!["MethodNotFound"]);
}

#[test]
fn test_user_types() {
    assert_eq!(
        types("type Point\n    float x = 0\n    y = 1\nPoint p = na\na = p.x\nb = p.y"),
        vec!["{float x; int y}", "{float x; int y}", "float", "int"]
    );
    assert_eq!(
        types("type P\n    float x\nmethod norm(P p) => p.x * 2\nP q = na\nn = q.norm()")[3],
        "float"
    );

    assert_eq!(error_names("type T\n    int a\nT t = na\nb = t.z"), vec!["UnknownField"]);
    assert_eq!(
        error_names("type T\n    int a\ntype T\n    int b"),
        vec!["TypeAlreadyDeclared"]
    );
    assert_eq!(error_names("type T\n    int a = \"s\""), vec!["FieldTypeMatchError"]);
}

#[test]
fn test_defaulted_fields_are_optional() {
    let (nodes, errors) = check("type P\n    int x = 1\n    int y\n    z = 2.0");
    assert!(errors.is_empty(), "{:?}", errors);

    let Some(fields) = nodes[0].ty.as_ref().and_then(|ty| ty.fields()) else {
        panic!("type declaration typed as {:?}", nodes[0].ty);
    };
    assert_eq!(
        fields
            .iter()
            .map(|field| (field.name.as_str(), field.optional))
            .collect::<Vec<_>>(),
        vec![("x", true), ("y", false), ("z", true)]
    );
}

#[test]
fn test_member_rules_on_synthetic_trees() {
    let namespace = global_namespace();
    let int = || Box::new(at(0, NodeKind::SimpleType { name: String::from("int") }));

    let mut member = at(
        1,
        NodeKind::MemberDecl {
            type_annotation: Some(int()),
            name: String::from("a"),
            default: None,
        },
    );
    mark_parent(&mut member);
    let errors = analyze_type(&namespace, &mut member);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error(), &ErrorImpl::MemberOutsideType);

    let sum = at(
        2,
        NodeKind::Binary {
            op: String::from("+"),
            left: Box::new(at(3, NodeKind::IntLiteral { value: 1 })),
            right: Box::new(at(4, NodeKind::IntLiteral { value: 1 })),
        },
    );
    let mut decl = at(
        5,
        NodeKind::TypeDecl {
            export: false,
            name: String::from("T"),
            members: vec![at(
                6,
                NodeKind::MemberDecl {
                    type_annotation: Some(int()),
                    name: String::from("a"),
                    default: Some(Box::new(sum)),
                },
            )],
        },
    );
    mark_parent(&mut decl);
    let errors = analyze_type(&namespace, &mut decl);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error(), &ErrorImpl::InvalidMemberDefault);
}

#[test]
fn test_empty_suite_is_void() {
    let mut suite = at(1, NodeKind::Suite { body: vec![] });
    let errors = analyze_type(&global_namespace(), &mut suite);
    assert!(errors.is_empty());
    assert_eq!(type_of(&suite), "void");
}

#[test]
fn test_history_reference_offset() {
    assert_eq!(error_names("x = close[1.5]"), vec!["HistoryOffsetNotInt"]);
}

#[test]
fn test_namespace_members() {
    assert_eq!(
        types("p = math.pi\nc = color.red\nm = math.max(1, 2)\nn = math.max(close, 2)\na = math.abs(-3)"),
        vec!["float", "color", "int", "series float", "int"]
    );
    assert_eq!(error_names("q = math.nope"), vec!["UnknownMember"]);
}

#[test]
fn test_operators() {
    assert_eq!(
        types("a = 1 == 1.0\nb = 1 < 2 and not false\nc = \"a\" + \"b\"\nd = na + 1\ne = -2.5"),
        vec!["bool", "bool", "string", "int", "float"]
    );
    assert_eq!(
        error_names("x = \"a\" < \"b\""),
        vec!["UnsupportedBinaryOperation"]
    );
    assert_eq!(error_names("x = -\"s\""), vec!["UnsupportedUnaryOperation"]);
    assert_eq!(error_names("x = not \"s\""), vec!["UnsupportedUnaryOperation"]);
}

#[test]
fn test_calls() {
    assert_eq!(error_names("x = 1\ny = x(2)"), vec!["NotCallable"]);
    assert_eq!(error_names("x = math.abs<int>(1)"), vec!["NotGeneric"]);
    assert_eq!(types("xs = array.new<float>(3, 0)"), vec!["array<float>"]);
}

#[test]
fn test_macro_expansion() {
    let (nodes, errors) = check("x = iff(close > open, 1, 2.5)");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(type_of(&nodes[0]), "series float");

    let NodeKind::VarDecl { initial, .. } = &nodes[0].kind else {
        panic!("expected a declaration, got {}", nodes[0]);
    };
    let NodeKind::ExprStmt { expr } = &initial.kind else {
        panic!("expected an expression, got {}", initial);
    };
    assert_eq!(expr.sexpr(), "(quote (? (> close open) 1 2.5))");

    let mut ids = HashSet::new();
    walk(&nodes[0], &mut |node| {
        assert_ne!(node.id, 0);
        assert!(ids.insert(node.id), "duplicate id {}", node.id);
    });

    assert_eq!(types("x = iff(true, 1, otherwise = 2)"), vec!["int"]);
    assert_eq!(error_names("x = iff(true, 1)"), vec!["MacroArgumentMissing"]);
}

#[test]
fn test_user_function_shadows_macro() {
    let (nodes, errors) = check("iff(int a, int b, int c) => a + b\ny = iff(1, 2, 3)");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(type_of(&nodes[1]), "int");
    walk(&nodes[1], &mut |node| assert_ne!(node.tag(), NodeTag::Quote));
}

#[test]
fn test_import_is_void() {
    assert_eq!(types("import user/lib/1"), vec!["void"]);
}

#[test]
fn test_user_declarations_are_collected() {
    let namespace = global_namespace();
    let mut nodes = parse_source("type P\n    int a\nf(x) => x\nmethod g(P p) => p.a");

    let mut checker = TypeChecker::new(&namespace);
    checker.reserve_ids(&nodes);
    for node in nodes.iter_mut() {
        checker.analyze(node);
    }

    assert!(checker.errors().is_empty());
    let declared = checker.user_namespace();
    assert!(declared.find_type("P").is_some());
    assert!(declared.find_function("f").is_some());
    assert!(declared.find_function("g").is_some_and(|g| g.is_method()));
}

//! Unit tests for the parser module.
//!
//! Trees are compared through their s-expression dump.

use pretty_assertions::assert_eq;

use super::{
    expr::{decode_color, parse_number, unquote},
    parser::parse,
};
use crate::{
    ast::{
        ast::{Node, NodeKind},
        parent::walk,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    Location,
};

fn parse_source(source: &str) -> (Vec<Node>, Vec<Error>) {
    let (tokens, errors) = tokenize(source);
    assert!(errors.is_empty(), "unexpected lexical errors: {:?}", errors);
    parse(tokens)
}

fn sexprs(source: &str) -> Vec<String> {
    let (nodes, errors) = parse_source(source);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    nodes.iter().map(Node::sexpr).collect()
}

fn sexpr(source: &str) -> String {
    let mut all = sexprs(source);
    assert_eq!(all.len(), 1, "expected one statement in {:?}", all);
    all.remove(0)
}

#[test]
fn test_operator_precedence() {
    assert_eq!(sexpr("1 + 2 * 3"), "(+ 1 (* 2 3))");
    assert_eq!(sexpr("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    assert_eq!(sexpr("a - b - c"), "(- (- a b) c)");
    assert_eq!(sexpr("-x * 2"), "(* (- x) 2)");
    assert_eq!(sexpr("a or b and c"), "(or a (and b c))");
    assert_eq!(sexpr("a + 1 > b * 2"), "(> (+ a 1) (* b 2))");
}

#[test]
fn test_not_binds_looser_than_comparison() {
    assert_eq!(sexpr("not a == b"), "(not (== a b))");
    assert_eq!(sexpr("!a"), "(not a)");
    assert_eq!(sexpr("not a and b"), "(and (not a) b)");
}

#[test]
fn test_ternary_is_right_associative() {
    assert_eq!(sexpr("a ? b : c ? d : e"), "(? a b (? c d e))");
    assert_eq!(sexpr("x > 1 ? 1 : 2"), "(? (> x 1) 1 2)");
}

#[test]
fn test_postfix_expressions() {
    assert_eq!(sexpr("close[1]"), "(href close 1)");
    assert_eq!(sexpr("ta.sma(close, 14)"), "(call (. ta sma) close 14)");
    assert_eq!(
        sexpr("plot(close, title = \"x\")"),
        "(call plot close (kw title \"x\"))"
    );
    assert_eq!(sexpr("f()[2]"), "(href (call f) 2)");
    assert_eq!(sexpr("[1, 2]"), "[1 2]");
}

#[test]
fn test_generic_call_versus_comparison() {
    assert_eq!(sexpr("array.new<float>()"), "(call (inst (. array new) float))");
    assert_eq!(sexpr("a < b"), "(< a b)");
    assert_eq!(sexpr("a < b and c > d"), "(and (< a b) (> c d))");
}

#[test]
fn test_declarations() {
    assert_eq!(sexpr("x = 1 + 2.0"), "(decl x (+ 1 2.0))");
    assert_eq!(sexpr("var float x = 1"), "(decl var float x 1)");
    assert_eq!(sexpr("varip y = 0"), "(decl varip y 0)");
    assert_eq!(sexpr("const int n = 3"), "(decl const int n 3)");
    assert_eq!(sexpr("series s = close"), "(decl series s close)");
    assert_eq!(sexpr("text = 'hi'"), "(decl text \"hi\")");
    assert_eq!(sexpr("type = 1"), "(decl type 1)");
}

#[test]
fn test_typed_declarations_are_found_by_speculation() {
    assert_eq!(sexpr("float x = 1"), "(decl float x 1)");
    assert_eq!(
        sexpr("array<int> a = array.new<int>()"),
        "(decl array<int> a (call (inst (. array new) int)))"
    );
    assert_eq!(
        sexpr("map<string, float> m = map.new<string, float>()"),
        "(decl map<string, float> m (call (inst (. map new) string float)))"
    );
    assert_eq!(sexpr("int[] xs = f()"), "(decl array<int> xs (call f))");
    assert_eq!(
        sexpr("chart.point p = chart.point.new()"),
        "(decl chart.point p (call (. (. chart point) new)))"
    );
}

#[test]
fn test_reassignment() {
    assert_eq!(sexpr("x := x + 1"), "(:= x (+ x 1))");
    assert_eq!(sexpr("a.b += 2"), "(+= (. a b) 2)");

    let (nodes, errors) = parse_source("a[0] := 1");
    assert!(nodes.is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error(), &ErrorImpl::InvalidReassignTarget);
}

#[test]
fn test_tuple_declaration() {
    assert_eq!(sexpr("[a, b] = f()"), "(decl [a b] (call f))");
}

#[test]
fn test_statement_groups() {
    assert_eq!(sexprs("a = 1, b = 2"), vec!["(decl a 1)", "(decl b 2)"]);
    assert_eq!(
        sexpr("if a b := 1, c := 2"),
        "(if a {(:= b 1) (:= c 2)} _)"
    );
}

#[test]
fn test_import() {
    assert_eq!(sexpr("import user/lib/2 as l"), "(import user/lib/2 l)");
    assert_eq!(sexpr("import user/lib/1"), "(import user/lib/1)");
}

#[test]
fn test_if_else() {
    assert_eq!(
        sexpr("if a\n    b := 1\nelse\n    b := 2"),
        "(if a {(:= b 1)} {(:= b 2)})"
    );
    assert_eq!(sexpr("if a b := 1\nelse b := 2"), "(if a (:= b 1) (:= b 2))");
    assert_eq!(
        sexpr("if a\n    x := 1\nelse if b\n    x := 2"),
        "(if a {(:= x 1)} (if b {(:= x 2)} _))"
    );
}

#[test]
fn test_loops() {
    assert_eq!(
        sexpr("for i = 0 to 10 by 2\n    x := i"),
        "(for i 0 10 2 {(:= x i)})"
    );
    assert_eq!(sexpr("for i = 1 to n\n    break"), "(for i 1 n _ {break})");
    assert_eq!(
        sexpr("for [i, v] in xs\n    y := v"),
        "(for-in i v xs {(:= y v)})"
    );
    assert_eq!(sexpr("for v in xs\n    continue"), "(for-in _ v xs {continue})");
    assert_eq!(sexpr("while x < 3\n    x += 1"), "(while (< x 3) {(+= x 1)})");
}

#[test]
fn test_nested_blocks() {
    let source = "if a\n    if b\n        c := 1\n    d := 2\ne = 3";
    assert_eq!(
        sexprs(source),
        vec!["(if a {(if b {(:= c 1)} _) (:= d 2)} _)", "(decl e 3)"]
    );
}

#[test]
fn test_switch() {
    assert_eq!(
        sexpr("switch x\n    1 => a\n    2 => b\n    => c"),
        "(switch x (case 1 a) (case 2 b) c)"
    );
    assert_eq!(
        sexpr("switch\n    x > 1 =>\n        y := 1\n    => y := 2"),
        "(switch _ (case (> x 1) {(:= y 1)}) (:= y 2))"
    );
}

#[test]
fn test_switch_duplicate_default_keeps_first() {
    let (nodes, errors) = parse_source("switch\n    => a\n    => b");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error(), &ErrorImpl::DuplicateDefaultClause);
    assert_eq!(errors[0].get_position(), &Location::new(3, 5));

    assert_eq!(nodes.len(), 1);
    let NodeKind::Switch { default, .. } = &nodes[0].kind else {
        panic!("expected a switch, got {}", nodes[0]);
    };
    assert_eq!(default.as_ref().map(|d| d.sexpr()), Some(String::from("a")));
}

#[test]
fn test_function_declarations() {
    assert_eq!(
        sexpr("f(x, int y = 2) => x + y"),
        "(fn f (x int y=2) (+ x y))"
    );
    assert_eq!(sexpr("f(x = 1) => x"), "(fn f (x=1) x)");
    assert_eq!(
        sexpr("method twice(float v) =>\n    v * 2"),
        "(fn method twice (float v) {(* v 2)})"
    );
    assert_eq!(sexpr("export f() => 1"), "(fn export f () 1)");
    assert_eq!(
        sexpr("g(series float s, simple int n = na) => s"),
        "(fn g (series float s simple int n=na) s)"
    );
}

#[test]
fn test_default_must_be_literal_or_identifier() {
    let (nodes, errors) = parse_source("f(x = -1) => x");

    assert!(nodes.is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].get_error(),
        &ErrorImpl::InvalidDefaultValue {
            found: String::from("-")
        }
    );
}

#[test]
fn test_default_is_a_single_token() {
    assert_eq!(sexpr("f(int x = n, b = true) => x"), "(fn f (int x=n b=true) x)");

    for source in [
        "f(int x = g(1)) => x",
        "f(x = close[1]) => x",
        "type T\n    color c = color.red",
    ] {
        let (nodes, errors) = parse_source(source);
        assert!(nodes.is_empty(), "{}", source);
        assert_eq!(errors.len(), 1, "{}", source);
        assert!(
            matches!(errors[0].get_error(), ErrorImpl::UnexpectedToken { .. }),
            "{}: {:?}",
            source,
            errors[0]
        );
    }
}

#[test]
fn test_type_declarations() {
    assert_eq!(
        sexpr("type point\n    float x = 0.0\n    y"),
        "(type point float x=0.0 y)"
    );
    assert_eq!(
        sexpr("export type P\n    int a\n    string label = \"p\""),
        "(type export P int a string label=\"p\")"
    );
}

#[test]
fn test_error_recovery_skips_statement() {
    let (nodes, errors) = parse_source("x = (1 +\ny = 2");

    assert_eq!(
        nodes.iter().map(Node::sexpr).collect::<Vec<_>>(),
        vec!["(decl y 2)"]
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), "Expect an expression, but got \"Newline\"");
    assert_eq!(errors[0].row(), 2);
}

#[test]
fn test_error_recovery_skips_nested_block() {
    let (nodes, errors) = parse_source("if (\n    a := 1\n    b := 2\nc = 3");

    assert_eq!(
        nodes.iter().map(Node::sexpr).collect::<Vec<_>>(),
        vec!["(decl c 3)"]
    );
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_several_errors_are_reported() {
    let (nodes, errors) = parse_source("a = )\nb = 1\nc = ]\nd = 2");

    assert_eq!(
        nodes.iter().map(Node::sexpr).collect::<Vec<_>>(),
        vec!["(decl b 1)", "(decl d 2)"]
    );
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].row(), 1);
    assert_eq!(errors[1].row(), 3);
}

#[test]
fn test_error_at_end_of_input() {
    let (nodes, errors) = parse_source("x = ");

    assert!(nodes.is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row(), -1);
    assert_eq!(errors[0].col(), -1);
    assert_eq!(errors[0].get_error_name(), "UnexpectedEof");
}

#[test]
fn test_invalid_literals() {
    let (_, errors) = parse_source("x = #12345");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "InvalidColor");

    let (_, errors) = parse_source("x = 99999999999999999999");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "NumberParseError");
}

#[test]
fn test_spans() {
    let (nodes, _) = parse_source("x = 1 + 2");
    let decl = &nodes[0];

    assert_eq!(decl.span.start, Location::new(1, 1));
    assert_eq!(decl.span.end, Location::new(1, 9));

    let NodeKind::VarDecl { initial, .. } = &decl.kind else {
        panic!("expected a declaration");
    };
    assert_eq!(initial.span.start, Location::new(1, 5));
    assert_eq!(initial.span.end, Location::new(1, 9));
}

#[test]
fn test_node_ids_are_unique() {
    let (nodes, _) = parse_source("f(a, b) => a + b\nx = f(1, 2)\nif x > 2\n    x := 0");

    let mut ids = vec![];
    for node in &nodes {
        walk(node, &mut |n| ids.push(n.id));
    }
    let count = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), count);
}

#[test]
fn test_decode_color() {
    assert_eq!(decode_color("#f00"), Some((255, 0, 0, 0.0)));
    assert_eq!(decode_color("#00ff00"), Some((0, 255, 0, 0.0)));
    assert_eq!(decode_color("#000000ff"), Some((0, 0, 0, 0.0)));
    assert_eq!(decode_color("#12345600"), Some((0x12, 0x34, 0x56, 100.0)));
    assert_eq!(decode_color("#fff0"), Some((255, 255, 255, 100.0)));

    let (r, g, b, t) = decode_color("#ff000080").unwrap();
    assert_eq!((r, g, b), (255, 0, 0));
    assert!((t - (100.0 - 128.0 / 255.0 * 100.0)).abs() < 1e-9);

    assert_eq!(decode_color("#12345"), None);
    assert_eq!(decode_color("#1234567890"), None);
}

#[test]
fn test_parse_number() {
    assert!(matches!(parse_number("42"), Some(NodeKind::IntLiteral { value: 42 })));
    assert!(matches!(
        parse_number("1e3"),
        Some(NodeKind::FloatLiteral { value }) if value == 1000.0
    ));
    assert!(matches!(
        parse_number(".5"),
        Some(NodeKind::FloatLiteral { value }) if value == 0.5
    ));
    assert!(parse_number("99999999999999999999").is_none());
}

#[test]
fn test_unquote() {
    assert_eq!(unquote("\"abc\""), "abc");
    assert_eq!(unquote("\"a\\nb\""), "a\nb");
    assert_eq!(unquote("'it\\'s'"), "it's");
    assert_eq!(unquote("\"tab\\there\""), "tab\there");
    assert_eq!(unquote("\"unterminated"), "unterminated");
}

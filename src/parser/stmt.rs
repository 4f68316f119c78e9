use crate::{
    ast::ast::{DeclMode, Node, NodeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    types::qualifiers::Qualifier,
    Location, Span,
};

use super::{
    expr::{parse_atom, parse_expr, parse_test_expr},
    lookups::BindingPower,
    parser::{describe, Parser},
    types::parse_type,
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let Some(kind) = parser.peek_kind(0) else {
        return Err(parser.unexpected("a statement"));
    };

    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        return handler(parser);
    }

    if kind.is_identifier_like() {
        return parse_identifier_stmt(parser);
    }

    parse_expr_stmt(parser)
}

/// Statements written on one line and separated by commas.
pub fn parse_stmt_group(parser: &mut Parser) -> Result<Vec<Node>, Error> {
    let mut stmts = vec![parse_stmt(parser)?];
    while parser.consume(&[TokenKind::Comma]).is_some() {
        stmts.push(parse_stmt(parser)?);
    }
    Ok(stmts)
}

/// Consumes the newline that ends a statement. A block that was just
/// closed, or is about to close, ends the statement as well.
pub fn end_statement(parser: &mut Parser) -> Result<(), Error> {
    if parser.at_eof()
        || parser.previous_kind() == Some(TokenKind::Dedent)
        || parser.peek_kind(0) == Some(TokenKind::Dedent)
    {
        return Ok(());
    }

    parser.expect(TokenKind::Newline, "a new line")?;
    Ok(())
}

/// The body of a control statement: an indented block, or a statement
/// group on the same line.
pub fn parse_suite(parser: &mut Parser) -> Result<Node, Error> {
    let Some(indent) = parser.consume(&[TokenKind::Indent]) else {
        let mut stmts = parse_stmt_group(parser)?;
        if stmts.len() == 1 {
            return Ok(stmts.remove(0));
        }
        return Ok(make_suite(parser, stmts, Span::invalid()));
    };

    let mut body = vec![];
    while parser.consume(&[TokenKind::Dedent]).is_none() {
        body.extend(parse_stmt_group(parser)?);
        end_statement(parser)?;
    }

    Ok(make_suite(parser, body, indent.span))
}

fn make_suite(parser: &mut Parser, body: Vec<Node>, fallback: Span) -> Node {
    let span = match (body.first(), body.last()) {
        (Some(first), Some(last)) => first.span.to(&last.span),
        _ => fallback,
    };
    parser.make_node(NodeKind::Suite { body }, span)
}

pub fn parse_expr_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let expr = parse_test_expr(parser)?;
    Ok(make_expr_stmt(parser, expr))
}

fn make_expr_stmt(parser: &mut Parser, expr: Node) -> Node {
    let span = expr.span;
    parser.make_node(
        NodeKind::ExprStmt {
            expr: Box::new(expr),
        },
        span,
    )
}

pub fn parse_loop_control_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let Some(token) = parser.consume(&[TokenKind::Break, TokenKind::Continue]) else {
        return Err(parser.unexpected("\"break\" or \"continue\""));
    };

    let kind = match token.kind {
        TokenKind::Break => NodeKind::Break,
        _ => NodeKind::Continue,
    };
    Ok(parser.make_node(kind, token.span))
}

/// `import user/name/version [as alias]`
pub fn parse_import_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.expect(TokenKind::Import, "\"import\"")?.span.start;

    let user = parser.expect_identifier("an identifier as author name")?;
    parser.expect(TokenKind::Slash, "\"/\"")?;
    let name = parser.expect_identifier("an identifier as library name")?;
    parser.expect(TokenKind::Slash, "\"/\"")?;

    let version_token = parser.expect(TokenKind::Number, "a number as library version")?;
    let version = version_token.value.parse::<i64>().map_err(|_| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: version_token.value.clone(),
            },
            version_token.span.start,
        )
    })?;

    let alias = match parser.consume(&[TokenKind::As]) {
        Some(_) => Some(
            parser
                .expect_identifier("an identifier as alias of library")?
                .value,
        ),
        None => None,
    };

    let span = parser.span_from(start);
    Ok(parser.make_node(
        NodeKind::Import {
            user: user.value,
            name: name.value,
            version,
            alias,
        },
        span,
    ))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.expect(TokenKind::If, "\"if\"")?.span.start;

    let test = parse_test_expr(parser)?;
    let body = parse_suite(parser)?;
    let mut end = body.span.end;

    // An inline body leaves the newline before `else` unconsumed.
    if parser.peek_kind(0) == Some(TokenKind::Newline)
        && parser.peek_kind(1) == Some(TokenKind::Else)
    {
        parser.advance();
    }

    let orelse = match parser.consume(&[TokenKind::Else]) {
        Some(_) => {
            let orelse = parse_suite(parser)?;
            end = orelse.span.end;
            Some(Box::new(orelse))
        }
        None => None,
    };

    Ok(parser.make_node(
        NodeKind::If {
            test: Box::new(test),
            body: Box::new(body),
            orelse,
        },
        Span::new(start, end),
    ))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.expect(TokenKind::While, "\"while\"")?.span.start;

    let test = parse_test_expr(parser)?;
    let body = parse_suite(parser)?;

    let span = Span::new(start, body.span.end);
    Ok(parser.make_node(
        NodeKind::While {
            test: Box::new(test),
            body: Box::new(body),
        },
        span,
    ))
}

/// `for i = a to b [by s]`, `for x in c` or `for [i, x] in c`.
pub fn parse_for_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.expect(TokenKind::For, "\"for\"")?.span.start;

    if parser.consume(&[TokenKind::LeftSqBracket]).is_some() {
        let index = parser.expect_identifier("an identifier as index variable")?;
        parser.expect(TokenKind::Comma, "\",\"")?;
        let item = parser.expect_identifier("an identifier as iterator variable")?;
        parser.expect(TokenKind::RightSqBracket, "\"]\" to match \"[\"")?;
        parser.expect(TokenKind::In, "\"in\"")?;
        return parse_for_in_rest(parser, start, Some(index.value), item.value);
    }

    let counter = parser.expect_identifier("an identifier as loop variable")?;

    if parser.consume(&[TokenKind::In]).is_some() {
        return parse_for_in_rest(parser, start, None, counter.value);
    }

    parser.expect(TokenKind::Equal, "\"in\" or \"=\"")?;
    let init = parse_test_expr(parser)?;
    parser.expect(TokenKind::To, "\"to\"")?;
    let final_value = parse_test_expr(parser)?;
    let step = match parser.consume(&[TokenKind::By]) {
        Some(_) => Some(Box::new(parse_test_expr(parser)?)),
        None => None,
    };
    let body = parse_suite(parser)?;

    let span = Span::new(start, body.span.end);
    Ok(parser.make_node(
        NodeKind::For {
            counter: counter.value,
            init: Box::new(init),
            final_value: Box::new(final_value),
            step,
            body: Box::new(body),
        },
        span,
    ))
}

fn parse_for_in_rest(
    parser: &mut Parser,
    start: Location,
    index: Option<String>,
    item: String,
) -> Result<Node, Error> {
    let container = parse_test_expr(parser)?;
    let body = parse_suite(parser)?;

    let span = Span::new(start, body.span.end);
    Ok(parser.make_node(
        NodeKind::ForIn {
            index,
            item,
            container: Box::new(container),
            body: Box::new(body),
        },
        span,
    ))
}

/// ```text
/// switch [target]
///     cond => body
///     => default
/// ```
pub fn parse_switch_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.expect(TokenKind::Switch, "\"switch\"")?.span.start;

    let target = match parser.peek_kind(0) {
        Some(TokenKind::Indent) => None,
        _ => Some(Box::new(parse_test_expr(parser)?)),
    };

    let indent = parser.expect(TokenKind::Indent, "an indented block of cases")?;
    let mut end = indent.span.end;

    let mut cases = vec![];
    let mut default: Option<Box<Node>> = None;

    while parser.consume(&[TokenKind::Dedent]).is_none() {
        if let Some(arrow) = parser.consume(&[TokenKind::RightFatArrow]) {
            let body = parse_suite(parser)?;
            end = body.span.end;
            if default.is_some() {
                parser.record(Error::new(
                    ErrorImpl::DuplicateDefaultClause,
                    arrow.span.start,
                ));
            } else {
                default = Some(Box::new(body));
            }
        } else {
            let case = parse_case_clause(parser)?;
            end = case.span.end;
            cases.push(case);
        }

        end_statement(parser)?;
    }

    Ok(parser.make_node(
        NodeKind::Switch {
            target,
            cases,
            default,
        },
        Span::new(start, end),
    ))
}

fn parse_case_clause(parser: &mut Parser) -> Result<Node, Error> {
    let condition = parse_test_expr(parser)?;
    parser.expect(TokenKind::RightFatArrow, "\"=>\"")?;
    let body = parse_suite(parser)?;

    let span = condition.span.to(&body.span);
    Ok(parser.make_node(
        NodeKind::CaseClause {
            condition: Box::new(condition),
            body: Box::new(body),
        },
        span,
    ))
}

/// `export type Name` declares a type, any other `export` a function.
pub fn parse_export_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let declares_type = parser.peek_kind(1) == Some(TokenKind::Type)
        && parser
            .peek_kind(2)
            .is_some_and(|kind| kind.is_identifier_like());

    if declares_type {
        parse_type_decl_stmt(parser)
    } else {
        parse_fn_decl_stmt(parser)
    }
}

/// `type` is a soft keyword: `type Name` declares a type, anything else
/// uses `type` as a plain name.
pub fn parse_type_keyword_stmt(parser: &mut Parser) -> Result<Node, Error> {
    if parser
        .peek_kind(1)
        .is_some_and(|kind| kind.is_identifier_like())
    {
        parse_type_decl_stmt(parser)
    } else {
        parse_identifier_stmt(parser)
    }
}

pub fn parse_type_decl_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.location();
    let export = parser.consume(&[TokenKind::Export]).is_some();
    parser.expect(TokenKind::Type, "\"type\"")?;

    let name = parser.expect_identifier("an identifier as user defined type name")?;
    parser.expect(TokenKind::Indent, "an indented block of fields")?;

    let mut members = vec![];
    while parser.consume(&[TokenKind::Dedent]).is_none() {
        members.push(parse_member_decl(parser)?);
        end_statement(parser)?;
    }

    let end = members
        .last()
        .map(|member| member.span.end)
        .unwrap_or(name.span.end);
    Ok(parser.make_node(
        NodeKind::TypeDecl {
            export,
            name: name.value,
            members,
        },
        Span::new(start, end),
    ))
}

/// `[type] name [= default]`
fn parse_member_decl(parser: &mut Parser) -> Result<Node, Error> {
    let begin = parser.tell();
    let name = parser.expect_identifier("an identifier as field name or type name")?;

    if matches!(
        parser.peek_kind(0),
        Some(TokenKind::Equal | TokenKind::Newline | TokenKind::Dedent) | None
    ) {
        let default = parse_default_value(parser)?;
        let span = parser.span_from(name.span.start);
        return Ok(parser.make_node(
            NodeKind::MemberDecl {
                type_annotation: None,
                name: name.value,
                default,
            },
            span,
        ));
    }

    parser.seek(begin);
    let annotation = parse_type(parser)?;
    let name = parser.expect_identifier("an identifier as field name")?;
    let default = parse_default_value(parser)?;

    let span = parser.span_from(annotation.span.start);
    Ok(parser.make_node(
        NodeKind::MemberDecl {
            type_annotation: Some(Box::new(annotation)),
            name: name.value,
            default,
        },
        span,
    ))
}

/// `= literal` or `= identifier` after a parameter or a field.
fn parse_default_value(parser: &mut Parser) -> Result<Option<Box<Node>>, Error> {
    if parser.consume(&[TokenKind::Equal]).is_none() {
        return Ok(None);
    }

    match parser.current_token() {
        Some(token) if token.kind.is_identifier_like() || token.kind.is_literal() => {}
        Some(token) => {
            return Err(Error::new(
                ErrorImpl::InvalidDefaultValue {
                    found: describe(token),
                },
                token.span.start,
            ))
        }
        None => return Err(parser.unexpected("an identifier or a literal")),
    }

    let default = parse_atom(parser)?;
    if matches!(
        parser.peek_kind(0),
        Some(TokenKind::LeftParen | TokenKind::LeftSqBracket | TokenKind::Dot)
    ) {
        return Err(parser.unexpected("a single identifier or literal as default value"));
    }
    Ok(Some(Box::new(default)))
}

/// `[qualifier] [type] name [= default]`
fn parse_param_decl(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.location();
    let qualifier = parse_qualifier(parser);

    let begin = parser.tell();
    let name = parser.expect_identifier("an identifier as type name or argument name")?;

    if matches!(
        parser.peek_kind(0),
        Some(TokenKind::Equal | TokenKind::Comma | TokenKind::RightParen)
    ) {
        let default = parse_default_value(parser)?;
        let span = parser.span_from(start);
        return Ok(parser.make_node(
            NodeKind::ParamDecl {
                qualifier,
                type_annotation: None,
                name: name.value,
                default,
            },
            span,
        ));
    }

    parser.seek(begin);
    let annotation = parse_type(parser)?;
    let name = parser.expect_identifier("an identifier as param name")?;
    let default = parse_default_value(parser)?;

    let span = parser.span_from(start);
    Ok(parser.make_node(
        NodeKind::ParamDecl {
            qualifier,
            type_annotation: Some(Box::new(annotation)),
            name: name.value,
            default,
        },
        span,
    ))
}

fn parse_qualifier(parser: &mut Parser) -> Qualifier {
    parser
        .consume(&[TokenKind::Const, TokenKind::Simple, TokenKind::Series])
        .and_then(|token| Qualifier::from_keyword(&token.value))
        .unwrap_or_default()
}

/// `[export] [method] name(params) => body`
pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.location();
    let export = parser.consume(&[TokenKind::Export]).is_some();
    let method = parser.consume(&[TokenKind::Method]).is_some();

    let name = parser.expect_identifier("an identifier as function name")?;

    parser.expect(TokenKind::LeftParen, "\"(\"")?;
    let mut params = vec![];
    while !matches!(parser.peek_kind(0), Some(TokenKind::RightParen) | None) {
        params.push(parse_param_decl(parser)?);
        if parser.consume(&[TokenKind::Comma]).is_none() {
            break;
        }
    }
    parser.expect(TokenKind::RightParen, "\")\" to match \"(\"")?;
    parser.expect(TokenKind::RightFatArrow, "\"=>\"")?;

    let body = parse_suite(parser)?;

    let span = Span::new(start, body.span.end);
    Ok(parser.make_node(
        NodeKind::FuncDecl {
            export,
            method,
            name: name.value,
            params,
            body: Box::new(body),
        },
        span,
    ))
}

/// `[var|varip] [qualifier] [type] name = value`
pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.location();

    let mode = match parser.consume(&[TokenKind::Var, TokenKind::Varip]) {
        Some(token) if token.kind == TokenKind::Varip => DeclMode::Varip,
        Some(_) => DeclMode::Var,
        None => DeclMode::Default,
    };
    let qualifier = parse_qualifier(parser);

    let type_annotation = match parser.peek_kind(1) {
        Some(TokenKind::Equal) => None,
        _ => Some(Box::new(parse_type(parser)?)),
    };

    let name = parser.expect_identifier("an identifier as variable name")?;
    parser.expect(TokenKind::Equal, "\"=\" and an expression")?;
    let initial = parse_stmt(parser)?;

    let span = Span::new(start, initial.span.end);
    Ok(parser.make_node(
        NodeKind::VarDecl {
            mode,
            qualifier,
            type_annotation,
            name: name.value,
            initial: Box::new(initial),
        },
        span,
    ))
}

fn parse_reassign_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let target = parse_expr(parser, BindingPower::Primary)?;
    if !matches!(target.kind, NodeKind::Identifier { .. } | NodeKind::Attr { .. }) {
        return Err(Error::new(
            ErrorImpl::InvalidReassignTarget,
            target.span.start,
        ));
    }

    let op = match parser.peek_kind(0) {
        Some(kind) if kind.is_reassign_operator() => parser.advance(),
        _ => None,
    }
    .ok_or_else(|| parser.unexpected("\":=\", \"+=\", \"-=\", \"*=\", \"/=\" or \"%=\""))?;

    let value = parse_stmt(parser)?;

    let span = target.span.to(&value.span);
    Ok(parser.make_node(
        NodeKind::Reassign {
            target: Box::new(target),
            op: op.value,
            value: Box::new(value),
        },
        span,
    ))
}

/// Statements starting with a name: a function declaration, a
/// declaration, a reassignment or an expression.
fn parse_identifier_stmt(parser: &mut Parser) -> Result<Node, Error> {
    match parser.peek_kind(1) {
        Some(TokenKind::LeftParen) if parser.has_token_before_newline(TokenKind::RightFatArrow) => {
            return parse_fn_decl_stmt(parser)
        }
        Some(TokenKind::Equal) => return parse_var_decl_stmt(parser),
        Some(kind) if kind.is_reassign_operator() => return parse_reassign_stmt(parser),
        _ => {}
    }

    let begin = parser.tell();
    let Some(lhs) = parser.speculate(parse_test_expr) else {
        if parser.speculate(parse_typed_declaration_head).is_some() {
            parser.seek(begin);
            return parse_var_decl_stmt(parser);
        }
        return parse_expr_stmt(parser);
    };
    let after_expr = parser.tell();

    match parser.peek_kind(0) {
        Some(kind) if kind.is_reassign_operator() => {
            parser.seek(begin);
            return parse_reassign_stmt(parser);
        }
        Some(TokenKind::Equal)
            if matches!(lhs.kind, NodeKind::Identifier { .. } | NodeKind::Attr { .. }) =>
        {
            parser.seek(begin);
            return parse_var_decl_stmt(parser);
        }
        _ => {}
    }

    // `float x = ...` and `array<int> xs = ...` also parse as expressions.
    parser.seek(begin);
    if parser.speculate(parse_typed_declaration_head).is_some() {
        parser.seek(begin);
        return parse_var_decl_stmt(parser);
    }

    parser.seek(after_expr);
    Ok(make_expr_stmt(parser, lhs))
}

fn parse_typed_declaration_head(parser: &mut Parser) -> Result<(), Error> {
    parse_type(parser)?;
    parser.expect_identifier("an identifier as variable name")?;
    parser.expect(TokenKind::Equal, "\"=\"")?;
    Ok(())
}

/// `[a, b] = value`, or a tuple expression.
pub fn parse_tuple_decl_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let start = parser.location();

    let Some(names) = parser.speculate(|parser| {
        let names = parse_identifier_tuple(parser)?;
        parser.expect(TokenKind::Equal, "\"=\"")?;
        Ok(names)
    }) else {
        return parse_expr_stmt(parser);
    };

    let initial = parse_stmt(parser)?;

    let span = Span::new(start, initial.span.end);
    Ok(parser.make_node(
        NodeKind::TupleDecl {
            names,
            initial: Box::new(initial),
        },
        span,
    ))
}

fn parse_identifier_tuple(parser: &mut Parser) -> Result<Vec<String>, Error> {
    parser.expect(TokenKind::LeftSqBracket, "\"[\"")?;

    let mut names = vec![];
    while !matches!(
        parser.peek_kind(0),
        Some(TokenKind::RightSqBracket | TokenKind::Newline) | None
    ) {
        names.push(parser.expect_identifier("an identifier")?.value);
        if parser.consume(&[TokenKind::Comma]).is_none() {
            break;
        }
    }

    parser.expect(TokenKind::RightSqBracket, "\"]\" to match \"[\"")?;
    Ok(names)
}

//! Type annotation parsing.
//!
//! Annotations are a name followed by any number of suffixes:
//!
//! - `.member` selects a type from a namespace, e.g. `chart.point`
//! - `<T, U>` applies type arguments, e.g. `map<string, float>`
//! - `[]` is shorthand for `array<T>`
//!
//! Like expressions, annotations are parsed with NUD/LED handlers.

use std::collections::HashMap;

use crate::{
    ast::ast::{Node, NodeKind},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

pub type TypeNUDHandler = fn(&mut Parser) -> Result<Node, Error>;
pub type TypeLEDHandler = fn(&mut Parser, Node) -> Result<Node, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_led(TokenKind::Dot, parse_sub_type);
    parser.type_led(TokenKind::LeftAngBracket, parse_generic_type);
    parser.type_led(TokenKind::LeftSqBracket, parse_array_type);
}

pub fn parse_type(parser: &mut Parser) -> Result<Node, Error> {
    let Some(kind) = parser.peek_kind(0) else {
        return Err(parser.unexpected("a type"));
    };

    let nud: TypeNUDHandler = match parser.get_type_nud_lookup().get(&kind) {
        Some(handler) => *handler,
        None if kind.is_identifier_like() => parse_symbol_type,
        None => return Err(parser.unexpected("a type")),
    };

    let mut left = nud(parser)?;

    while let Some(led) = parser
        .peek_kind(0)
        .and_then(|kind| parser.get_type_led_lookup().get(&kind).copied())
    {
        left = led(parser, left)?;
    }

    Ok(left)
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<Node, Error> {
    let token = parser.expect_identifier("a type name")?;
    Ok(parser.make_node(NodeKind::SimpleType { name: token.value }, token.span))
}

fn parse_sub_type(parser: &mut Parser, left: Node) -> Result<Node, Error> {
    parser.expect(TokenKind::Dot, "\".\"")?;
    let member = parser.expect_identifier("an identifier as type name")?;

    let span = parser.span_from(left.span.start);
    Ok(parser.make_node(
        NodeKind::SubType {
            name: Box::new(left),
            member: member.value,
        },
        span,
    ))
}

fn parse_generic_type(parser: &mut Parser, left: Node) -> Result<Node, Error> {
    parser.expect(TokenKind::LeftAngBracket, "\"<\"")?;
    let args = parse_type_arg_list(parser)?;
    parser.expect(TokenKind::RightAngBracket, "\">\" to match \"<\"")?;

    let span = parser.span_from(left.span.start);
    Ok(parser.make_node(
        NodeKind::GenericType {
            name: Box::new(left),
            args,
        },
        span,
    ))
}

fn parse_array_type(parser: &mut Parser, left: Node) -> Result<Node, Error> {
    parser.expect(TokenKind::LeftSqBracket, "\"[\"")?;
    parser.expect(TokenKind::RightSqBracket, "\"]\" to match \"[\"")?;

    let span = parser.span_from(left.span.start);
    let name = parser.make_node(
        NodeKind::SimpleType {
            name: String::from("array"),
        },
        left.span,
    );
    Ok(parser.make_node(
        NodeKind::GenericType {
            name: Box::new(name),
            args: vec![left],
        },
        span,
    ))
}

/// Comma separated types, stopping before the closing `>`.
pub fn parse_type_arg_list(parser: &mut Parser) -> Result<Vec<Node>, Error> {
    let mut args = vec![parse_type(parser)?];
    while parser.consume(&[TokenKind::Comma]).is_some() {
        args.push(parse_type(parser)?);
    }
    Ok(args)
}

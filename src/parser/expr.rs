use crate::{
    ast::ast::{Node, NodeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    lookups::{BindingPower, NUDHandler},
    parser::Parser,
    types::parse_type_arg_list,
};

/// Pratt loop: one prefix handler, then infix handlers while they bind
/// tighter than `bp`.
pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Node, Error> {
    let Some(kind) = parser.peek_kind(0) else {
        return Err(parser.unexpected("an expression"));
    };

    let nud: NUDHandler = match parser.get_nud_lookup().get(&kind) {
        Some(handler) => *handler,
        None if kind.is_identifier_like() => parse_primary_expr,
        None => return Err(parser.unexpected("an expression")),
    };

    let mut left = nud(parser)?;

    while let Some(kind) = parser.peek_kind(0) {
        let next_bp = parser
            .get_bp_lookup()
            .get(&kind)
            .copied()
            .unwrap_or(BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let Some(led) = parser.get_led_lookup().get(&kind).copied() else {
            break;
        };
        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

/// A full expression, ternaries included. `a ? b : c ? d : e` nests to
/// the right.
pub fn parse_test_expr(parser: &mut Parser) -> Result<Node, Error> {
    let test = parse_expr(parser, BindingPower::Default)?;
    if parser.consume(&[TokenKind::Question]).is_none() {
        return Ok(test);
    }

    let if_true = parse_test_expr(parser)?;
    parser.expect(TokenKind::Colon, "\":\" to match \"?\"")?;
    let if_false = parse_test_expr(parser)?;

    let span = test.span.to(&if_false.span);
    Ok(parser.make_node(
        NodeKind::Ternary {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        },
        span,
    ))
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Node, Error> {
    let atom = parse_atom(parser)?;
    parse_postfix_expr(parser, atom)
}

/// One literal or identifier token.
pub fn parse_atom(parser: &mut Parser) -> Result<Node, Error> {
    let Some(token) = parser.current_token().cloned() else {
        return Err(parser.unexpected("an expression"));
    };

    let kind = match token.kind {
        TokenKind::Number => parse_number(&token.value).ok_or_else(|| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: token.value.clone(),
                },
                token.span.start,
            )
        })?,
        TokenKind::String => NodeKind::StringLiteral {
            value: unquote(&token.value),
        },
        TokenKind::Color => {
            let (r, g, b, t) = decode_color(&token.value).ok_or_else(|| {
                Error::new(
                    ErrorImpl::InvalidColor {
                        token: token.value.clone(),
                    },
                    token.span.start,
                )
            })?;
            NodeKind::ColorLiteral { r, g, b, t }
        }
        TokenKind::True => NodeKind::BoolLiteral { value: true },
        TokenKind::False => NodeKind::BoolLiteral { value: false },
        kind if kind.is_identifier_like() => NodeKind::Identifier {
            name: token.value.clone(),
        },
        _ => {
            return Err(parser.unexpected(
                "an identifier, a number, string, color, bool, paren or tuple",
            ))
        }
    };

    parser.advance();
    Ok(parser.make_node(kind, token.span))
}

/// Calls, history references, member accesses and explicit
/// instantiations, applied left to right.
pub fn parse_postfix_expr(parser: &mut Parser, mut atom: Node) -> Result<Node, Error> {
    loop {
        atom = match parser.peek_kind(0) {
            Some(TokenKind::LeftParen) => parse_call_expr(parser, atom)?,
            Some(TokenKind::LeftSqBracket) => parse_history_expr(parser, atom)?,
            Some(TokenKind::Dot) => parse_member_expr(parser, atom)?,
            // `a < b` stays a comparison unless the closing `>` is
            // directly followed by a call.
            Some(TokenKind::LeftAngBracket) => match parser.speculate(parse_call_type_args) {
                Some(type_args) => {
                    let span = parser.span_from(atom.span.start);
                    parser.make_node(
                        NodeKind::Instantiation {
                            template: Box::new(atom),
                            type_args,
                        },
                        span,
                    )
                }
                None => break,
            },
            _ => break,
        };
    }

    Ok(atom)
}

fn parse_call_type_args(parser: &mut Parser) -> Result<Vec<Node>, Error> {
    parser.expect(TokenKind::LeftAngBracket, "\"<\"")?;
    let type_args = parse_type_arg_list(parser)?;
    if parser.peek_kind(1) != Some(TokenKind::LeftParen) {
        return Err(parser.unexpected("a call after the type arguments"));
    }
    parser.expect(TokenKind::RightAngBracket, "\">\" to match \"<\"")?;
    Ok(type_args)
}

pub fn parse_call_expr(parser: &mut Parser, func: Node) -> Result<Node, Error> {
    parser.expect(TokenKind::LeftParen, "\"(\"")?;

    let mut args = vec![];
    while !matches!(
        parser.peek_kind(0),
        Some(TokenKind::RightParen | TokenKind::Newline) | None
    ) {
        args.push(parse_argument(parser)?);
        if parser.consume(&[TokenKind::Comma]).is_none() {
            break;
        }
    }

    parser.expect(TokenKind::RightParen, "\")\" to match \"(\"")?;

    let span = parser.span_from(func.span.start);
    Ok(parser.make_node(
        NodeKind::Call {
            func: Box::new(func),
            args,
        },
        span,
    ))
}

/// A positional argument, or `name = value`.
fn parse_argument(parser: &mut Parser) -> Result<Node, Error> {
    let value = parse_test_expr(parser)?;
    if parser.consume(&[TokenKind::Equal]).is_none() {
        return Ok(value);
    }

    let NodeKind::Identifier { name } = &value.kind else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                expected: String::from("an identifier as keyword argument name"),
                found: value.sexpr(),
            },
            value.span.start,
        ));
    };
    let name = name.clone();

    let inner = parse_test_expr(parser)?;
    let span = value.span.to(&inner.span);
    Ok(parser.make_node(
        NodeKind::KwArg {
            name,
            value: Box::new(inner),
        },
        span,
    ))
}

pub fn parse_history_expr(parser: &mut Parser, series: Node) -> Result<Node, Error> {
    parser.expect(TokenKind::LeftSqBracket, "\"[\"")?;
    let offset = parse_test_expr(parser)?;
    parser.expect(TokenKind::RightSqBracket, "\"]\" to match \"[\"")?;

    let span = parser.span_from(series.span.start);
    Ok(parser.make_node(
        NodeKind::HRef {
            series: Box::new(series),
            offset: Box::new(offset),
        },
        span,
    ))
}

pub fn parse_member_expr(parser: &mut Parser, target: Node) -> Result<Node, Error> {
    parser.expect(TokenKind::Dot, "\".\"")?;
    let member = parser.expect_identifier("an identifier as member name")?;

    let span = parser.span_from(target.span.start);
    Ok(parser.make_node(
        NodeKind::Attr {
            target: Box::new(target),
            name: member.value,
        },
        span,
    ))
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: Node,
    bp: BindingPower,
) -> Result<Node, Error> {
    let Some(operator) = parser.advance() else {
        return Err(parser.unexpected("an operator"));
    };

    let right = parse_expr(parser, bp)?;

    let span = left.span.to(&right.span);
    Ok(parser.make_node(
        NodeKind::Binary {
            op: operator.value,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

/// Unary `+` and `-`.
pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Node, Error> {
    let Some(operator) = parser.advance() else {
        return Err(parser.unexpected("an operator"));
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;

    let span = operator.span.to(&operand.span);
    Ok(parser.make_node(
        NodeKind::Unary {
            op: operator.value,
            operand: Box::new(operand),
        },
        span,
    ))
}

/// `not x`, also spelled `!x`.
pub fn parse_not_expr(parser: &mut Parser) -> Result<Node, Error> {
    let Some(operator) = parser.advance() else {
        return Err(parser.unexpected("\"not\""));
    };

    let operand = parse_expr(parser, BindingPower::Not)?;

    let span = operator.span.to(&operand.span);
    Ok(parser.make_node(
        NodeKind::Unary {
            op: String::from("not"),
            operand: Box::new(operand),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Node, Error> {
    let open = parser.expect(TokenKind::LeftParen, "\"(\"")?;
    let mut expr = parse_test_expr(parser)?;
    parser.expect(TokenKind::RightParen, "\")\" to match \"(\"")?;

    expr.span = parser.span_from(open.span.start);
    parse_postfix_expr(parser, expr)
}

pub fn parse_tuple_expr(parser: &mut Parser) -> Result<Node, Error> {
    let open = parser.expect(TokenKind::LeftSqBracket, "\"[\"")?;

    let mut items = vec![];
    while !matches!(
        parser.peek_kind(0),
        Some(TokenKind::RightSqBracket | TokenKind::Newline) | None
    ) {
        items.push(parse_test_expr(parser)?);
        if parser.consume(&[TokenKind::Comma]).is_none() {
            break;
        }
    }

    parser.expect(TokenKind::RightSqBracket, "\"]\" to match \"[\"")?;

    let span = parser.span_from(open.span.start);
    let tuple = parser.make_node(NodeKind::Tuple { items }, span);
    parse_postfix_expr(parser, tuple)
}

/// Lexemes with a fraction or an exponent are floats.
pub fn parse_number(lexeme: &str) -> Option<NodeKind> {
    if lexeme.contains(&['.', 'e', 'E'][..]) {
        lexeme
            .parse::<f64>()
            .ok()
            .map(|value| NodeKind::FloatLiteral { value })
    } else {
        lexeme
            .parse::<i64>()
            .ok()
            .map(|value| NodeKind::IntLiteral { value })
    }
}

/// Strips the quotes of a string lexeme and resolves its escapes.
pub fn unquote(lexeme: &str) -> String {
    let mut chars = lexeme.chars();
    let Some(quote) = chars.next() else {
        return String::new();
    };
    let body = chars.as_str();
    let body = body.strip_suffix(quote).unwrap_or(body);

    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some(escaped) => value.push(escaped),
            None => value.push('\\'),
        }
    }

    value
}

/// Decodes `#RGB`, `#RGBA`, `#RRGGBB` and `#RRGGBBAA`.
///
/// Returns 8 bit channels and a transparency in percent, where an alpha
/// of zero is fully transparent.
pub fn decode_color(lexeme: &str) -> Option<(u8, u8, u8, f64)> {
    let digits = lexeme.strip_prefix('#')?;
    let value = u32::from_str_radix(digits, 16).ok()?;

    let nibble = |shift: u32| ((value >> shift) & 0xf) as u8 * 0x11;
    let byte = |shift: u32| ((value >> shift) & 0xff) as u8;
    let transparency = |alpha: u32, max: u32| 100.0 - f64::from(alpha) / f64::from(max) * 100.0;

    match lexeme.len() {
        4 => Some((nibble(8), nibble(4), nibble(0), 0.0)),
        5 => Some((nibble(12), nibble(8), nibble(4), transparency(value & 0xf, 0xf))),
        7 => Some((byte(16), byte(8), byte(0), 0.0)),
        9 => Some((byte(24), byte(16), byte(8), transparency(value & 0xff, 0xff))),
        _ => None,
    }
}

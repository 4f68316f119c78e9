use std::collections::HashMap;

use crate::{ast::ast::Node, errors::errors::Error, lexer::tokens::TokenKind};

use super::{expr::*, parser::Parser, stmt::*};

/// Precedence levels, loosest first. `Not` sits between the logical and
/// the relational operators: `not a == b` negates the comparison.
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Or,
    And,
    Not,
    Relational,
    Additive,
    Multiplicative,
    Unary,
    Primary,
}

pub type StmtHandler = fn(&mut Parser) -> Result<Node, Error>;
pub type NUDHandler = fn(&mut Parser) -> Result<Node, Error>;
pub type LEDHandler = fn(&mut Parser, Node, BindingPower) -> Result<Node, Error>;

pub fn create_token_lookups(parser: &mut Parser) {
    // Logical
    parser.led(TokenKind::Or, BindingPower::Or, parse_binary_expr);
    parser.led(TokenKind::And, BindingPower::And, parse_binary_expr);

    // Relational
    parser.led(TokenKind::LeftAngBracket, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::RightAngBracket, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::LessEqual, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::GreaterEqual, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::EqualEqual, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::BangEqual, BindingPower::Relational, parse_binary_expr);

    // Additive and multiplicative
    parser.led(TokenKind::Plus, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Minus, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Star, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Slash, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Percent, BindingPower::Multiplicative, parse_binary_expr);

    // Prefix operators
    parser.nud(TokenKind::Minus, parse_prefix_expr);
    parser.nud(TokenKind::Plus, parse_prefix_expr);
    parser.nud(TokenKind::Not, parse_not_expr);

    // Literals, symbols and groupings
    parser.nud(TokenKind::Number, parse_primary_expr);
    parser.nud(TokenKind::String, parse_primary_expr);
    parser.nud(TokenKind::Color, parse_primary_expr);
    parser.nud(TokenKind::True, parse_primary_expr);
    parser.nud(TokenKind::False, parse_primary_expr);
    parser.nud(TokenKind::Identifier, parse_primary_expr);
    parser.nud(TokenKind::LeftParen, parse_grouping_expr);
    parser.nud(TokenKind::LeftSqBracket, parse_tuple_expr);

    // Statements
    parser.stmt(TokenKind::Break, parse_loop_control_stmt);
    parser.stmt(TokenKind::Continue, parse_loop_control_stmt);
    parser.stmt(TokenKind::Import, parse_import_stmt);
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::For, parse_for_stmt);
    parser.stmt(TokenKind::Switch, parse_switch_stmt);
    parser.stmt(TokenKind::Export, parse_export_stmt);
    parser.stmt(TokenKind::Method, parse_fn_decl_stmt);
    parser.stmt(TokenKind::Type, parse_type_keyword_stmt);
    parser.stmt(TokenKind::Var, parse_var_decl_stmt);
    parser.stmt(TokenKind::Varip, parse_var_decl_stmt);
    parser.stmt(TokenKind::Const, parse_var_decl_stmt);
    parser.stmt(TokenKind::Simple, parse_var_decl_stmt);
    parser.stmt(TokenKind::Series, parse_var_decl_stmt);
    parser.stmt(TokenKind::LeftSqBracket, parse_tuple_decl_stmt);
}

// Lookup tables inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
pub type NUDLookup = HashMap<TokenKind, NUDHandler>;
pub type LEDLookup = HashMap<TokenKind, LEDHandler>;
pub type BPLookup = HashMap<TokenKind, BindingPower>;

//! Parser state and the top level driver.
//!
//! The parser is recursive descent over a token cursor that can be saved
//! and restored. Expressions use a Pratt loop driven by the lookup tables
//! in [`super::lookups`]; ambiguous statement starts are resolved by
//! [`Parser::speculate`], which runs a parse and rewinds if it fails.
//!
//! Errors never stop the parse. A failed statement is recorded and the
//! cursor skips to the start of the next one.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::{
        ast::{Node, NodeId, NodeKind},
        parent::mark_parents,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Location, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler,
        NUDLookup, StmtHandler, StmtLookup,
    },
    stmt::{end_statement, parse_stmt_group},
    types::{create_token_type_lookups, TypeLEDHandler, TypeLEDLookup, TypeNUDHandler, TypeNUDLookup},
};

pub struct Parser {
    tokens: Vec<Token>,
    /// Index of the next unread token
    pos: usize,
    stmt_lookup: StmtLookup,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    type_nud_lookup: TypeNUDLookup,
    type_led_lookup: TypeLEDLookup,
    current_id: NodeId,
    errors: Vec<Error>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            type_led_lookup: HashMap::new(),
            current_id: 1,
            errors: vec![],
        }
    }

    pub fn peek(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    pub fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.peek(n).map(|token| token.kind)
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.peek(0)
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Consumes the current token if its kind is one of `kinds`.
    pub fn consume(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        let token = self.current_token()?;
        if !kinds.contains(&token.kind) {
            return None;
        }
        self.advance()
    }

    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    /// The last consumed token.
    pub fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|pos| self.tokens.get(pos))
    }

    pub fn previous_kind(&self) -> Option<TokenKind> {
        self.previous().map(|token| token.kind)
    }

    /// Span running from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: Location) -> Span {
        let end = self.previous().map(|token| token.span.end).unwrap_or(start);
        Span::new(start, end)
    }

    /// Location of the current token, or `Location::INVALID` at the end.
    pub fn location(&self) -> Location {
        self.current_token()
            .map(|token| token.span.start)
            .unwrap_or(Location::INVALID)
    }

    /// The error for "wanted `expected`, found the current token".
    pub fn unexpected(&self, expected: &str) -> Error {
        match self.current_token() {
            Some(token) => Error::new(
                ErrorImpl::UnexpectedToken {
                    expected: expected.to_string(),
                    found: describe(token),
                },
                token.span.start,
            ),
            None => Error::new(
                ErrorImpl::UnexpectedEof {
                    expected: expected.to_string(),
                },
                Location::INVALID,
            ),
        }
    }

    /// Consumes a token of `kind` or fails describing `expected`.
    pub fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, Error> {
        self.consume(&[kind]).ok_or_else(|| self.unexpected(expected))
    }

    /// Consumes an identifier. Soft keywords count as identifiers.
    pub fn expect_identifier(&mut self, expected: &str) -> Result<Token, Error> {
        if self.peek_kind(0).is_some_and(|kind| kind.is_identifier_like()) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.unexpected(expected))
    }

    /// Whether a token of `kind` appears later on the current logical line.
    pub fn has_token_before_newline(&self, kind: TokenKind) -> bool {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .skip(1)
            .take_while(|token| {
                !matches!(
                    token.kind,
                    TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
                )
            })
            .any(|token| token.kind == kind)
    }

    /// Runs `parse` and keeps its result only if it succeeds. On failure the
    /// cursor is restored and the error is dropped.
    pub fn speculate<T>(&mut self, parse: impl FnOnce(&mut Parser) -> Result<T, Error>) -> Option<T> {
        let start = self.tell();
        match parse(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.seek(start);
                None
            }
        }
    }

    /// Records an error that does not abort the current statement.
    pub fn record(&mut self, error: Error) {
        debug!(%error, "parse error");
        self.errors.push(error);
    }

    /// Skips the rest of a statement: everything up to and including the
    /// next newline, together with any indented block opened on the way.
    pub fn synchronize(&mut self) {
        let mut depth = 0usize;

        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent if depth <= 1 => break,
                TokenKind::Dedent => depth -= 1,
                TokenKind::Newline if depth == 0 => break,
                _ => {}
            }
        }

        debug!(position = self.pos, "parser resynchronised");
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    pub fn get_type_led_lookup(&self) -> &TypeLEDLookup {
        &self.type_led_lookup
    }

    /// Registers an infix handler and its binding power.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a prefix handler.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers the handler of a statement starting with `kind`.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    pub fn type_led(&mut self, kind: TokenKind, led_fn: TypeLEDHandler) {
        self.type_led_lookup.insert(kind, led_fn);
    }

    pub fn advance_id(&mut self) -> NodeId {
        let id = self.current_id;
        self.current_id += 1;
        id
    }

    pub fn make_node(&mut self, kind: NodeKind, span: Span) -> Node {
        Node::new(self.advance_id(), kind, span)
    }
}

/// How a token is quoted in messages. Layout tokens have no text.
pub fn describe(token: &Token) -> String {
    if token.value.is_empty() {
        token.kind.to_string()
    } else {
        token.value.clone()
    }
}

/// Parses a whole token stream.
///
/// Every statement that parses is returned, in source order, with parent
/// links assigned. A statement that fails is reported once and skipped.
pub fn parse(tokens: Vec<Token>) -> (Vec<Node>, Vec<Error>) {
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let mut body = vec![];

    while !parser.at_eof() {
        let start = parser.tell();

        match parse_stmt_group(&mut parser) {
            Ok(stmts) => {
                body.extend(stmts);
                if let Err(error) = end_statement(&mut parser) {
                    parser.record(error);
                    parser.synchronize();
                }
            }
            Err(error) => {
                parser.record(error);
                parser.seek(start);
                parser.synchronize();
            }
        }
    }

    mark_parents(&mut body);

    debug!(
        statements = body.len(),
        errors = parser.errors.len(),
        "parsed token stream"
    );

    (body, parser.errors)
}

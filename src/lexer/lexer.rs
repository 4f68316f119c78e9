use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Location, Span, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

/// Width of one indentation level.
pub const INDENT_UNIT: usize = 4;
/// Columns counted for a tab in leading whitespace.
pub const TAB_WIDTH: usize = 4;

pub type RegexHandler = fn(&mut Lexer, String);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    static ref IDENTIFIER_PATTERN: RegexPattern = RegexPattern {
        regex: Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*").unwrap(),
        handler: symbol_handler,
    };
    static ref NUMBER_PATTERN: RegexPattern = RegexPattern {
        regex: Regex::new("^(?:[0-9]+(?:\\.[0-9]*)?|\\.[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap(),
        handler: number_handler,
    };
    static ref COLOR_PATTERN: RegexPattern = RegexPattern {
        regex: Regex::new("^#[0-9a-fA-F]+").unwrap(),
        handler: color_handler,
    };
}

/// Single pass tokenizer that turns leading whitespace into
/// `Indent`, `Dedent` and `Newline` tokens.
pub struct Lexer {
    source: String,
    /// Byte offset of the next unread character
    pos: usize,
    row: i32,
    column: i32,
    /// Where the current lexeme started
    start: Location,
    /// Location of the last consumed character
    prev: Location,
    indents: Vec<usize>,
    tokens: Vec<Token>,
    errors: Vec<Error>,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            source: source.to_string(),
            pos: 0,
            row: 1,
            column: 1,
            start: Location::new(1, 1),
            prev: Location::INVALID,
            indents: vec![0],
            tokens: vec![],
            errors: vec![],
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    #[cfg(test)]
    pub fn indent_stack(&self) -> &[usize] {
        &self.indents
    }

    pub fn location(&self) -> Location {
        Location::new(self.row, self.column)
    }

    pub fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        self.prev = self.location();

        let newline = ch == '\n' || (ch == '\r' && self.peek() != Some('\n'));
        if newline {
            self.row += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    pub fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn mark(&mut self) {
        self.start = self.location();
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Pushes a token spanning from the lexeme bookmark to the last consumed character.
    fn push_lexeme(&mut self, kind: TokenKind, value: String) {
        let span = Span::new(self.start, self.prev);
        self.push(MK_TOKEN!(kind, value, span));
    }

    fn push_layout(&mut self, kind: TokenKind) {
        let here = self.location();
        trace!(?kind, row = here.row, "layout token");
        self.push(MK_TOKEN!(kind, String::new(), Span::new(here, here)));
    }

    fn report(&mut self, error: ErrorImpl, location: Location) {
        let error = Error::new(error, location);
        debug!(%error, "lexical error");
        self.errors.push(error);
    }

    fn single(&mut self, kind: TokenKind) {
        self.mark();
        if let Some(ch) = self.advance() {
            self.push_lexeme(kind, ch.to_string());
        }
    }

    /// Consumes one character and emits `kind`, or two characters and emits
    /// `compound` when the second one is `next`.
    fn one_or_two(&mut self, kind: TokenKind, next: char, compound: TokenKind) {
        self.mark();
        let first = self.advance().unwrap_or_default();
        if self.peek() == Some(next) {
            self.advance();
            self.push_lexeme(compound, format!("{}{}", first, next));
        } else {
            self.push_lexeme(kind, first.to_string());
        }
    }

    fn run_pattern(&mut self, pattern: &RegexPattern) -> bool {
        let Some(matched) = pattern.regex.find(&self.source[self.pos..]) else {
            return false;
        };

        let lexeme = matched.as_str().to_string();
        self.mark();
        self.advance_n(lexeme.chars().count());
        (pattern.handler)(self, lexeme);
        true
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance();
        }
    }

    /// Measures the indentation of a fresh line. Blank and comment-only
    /// lines leave the indentation untouched.
    fn scan_indent(&mut self) {
        let mut width = 0;

        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                '\x0c' => {}
                '/' if self.peek_nth(1) == Some('/') => {
                    self.skip_line();
                    return;
                }
                '\r' | '\n' => return,
                _ => {
                    self.set_indent(width);
                    return;
                }
            }
            self.advance();
        }
    }

    fn set_indent(&mut self, width: usize) {
        if width % INDENT_UNIT != 0 {
            // Misaligned lines continue the previous one.
            if self.tokens.last().map(|t| t.kind) == Some(TokenKind::Newline) {
                self.tokens.pop();
            }
            return;
        }

        let top = self.indents.last().copied().unwrap_or(0);

        if width > top {
            self.indents.push(width);
            self.push_layout(TokenKind::Indent);
        } else if width < top {
            while let Some(&level) = self.indents.last() {
                if level <= width {
                    break;
                }
                self.indents.pop();
                self.push_layout(TokenKind::Dedent);
            }

            if self.indents.last() != Some(&width) {
                // Resync on the enclosing block that is still open.
                self.report(ErrorImpl::InvalidIndent { width }, self.location());
            }
        } else if !self.tokens.is_empty() {
            self.push_layout(TokenKind::Newline);
        }
    }

    fn close_indents(&mut self) {
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_layout(TokenKind::Dedent);
        }
    }

    fn scan_string(&mut self, quote: char) {
        self.mark();
        let begin = self.pos;
        let start = self.start;
        self.advance();

        loop {
            match self.peek() {
                None => {
                    self.report(ErrorImpl::UnterminatedString, start);
                    break;
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        let value = self.source[begin..self.pos].to_string();
        self.push_lexeme(TokenKind::String, value);
    }

    fn scan_token(&mut self, ch: char) {
        match ch {
            '\n' | '\r' => {
                self.advance();
                if ch == '\r' && self.peek() == Some('\n') {
                    self.advance();
                }
                self.scan_indent();
            }
            ' ' | '\t' | '\x0c' => {
                self.advance();
            }
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '[' => self.single(TokenKind::LeftSqBracket),
            ']' => self.single(TokenKind::RightSqBracket),
            ',' => self.single(TokenKind::Comma),
            '?' => self.single(TokenKind::Question),
            '.' => {
                if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.run_pattern(&NUMBER_PATTERN);
                } else {
                    self.single(TokenKind::Dot);
                }
            }
            '=' => {
                if self.peek_nth(1) == Some('>') {
                    self.one_or_two(TokenKind::Equal, '>', TokenKind::RightFatArrow);
                } else {
                    self.one_or_two(TokenKind::Equal, '=', TokenKind::EqualEqual);
                }
            }
            ':' => self.one_or_two(TokenKind::Colon, '=', TokenKind::ColonEqual),
            '!' => self.one_or_two(TokenKind::Not, '=', TokenKind::BangEqual),
            '<' => self.one_or_two(TokenKind::LeftAngBracket, '=', TokenKind::LessEqual),
            '>' => self.one_or_two(TokenKind::RightAngBracket, '=', TokenKind::GreaterEqual),
            '+' => self.one_or_two(TokenKind::Plus, '=', TokenKind::PlusEqual),
            '-' => self.one_or_two(TokenKind::Minus, '=', TokenKind::MinusEqual),
            '*' => self.one_or_two(TokenKind::Star, '=', TokenKind::StarEqual),
            '%' => self.one_or_two(TokenKind::Percent, '=', TokenKind::PercentEqual),
            '/' => {
                if self.peek_nth(1) == Some('/') {
                    self.skip_line();
                } else {
                    self.one_or_two(TokenKind::Slash, '=', TokenKind::SlashEqual);
                }
            }
            '"' | '\'' => self.scan_string(ch),
            '#' => {
                if !self.run_pattern(&COLOR_PATTERN) {
                    self.unrecognised(ch);
                }
            }
            '0'..='9' => {
                self.run_pattern(&NUMBER_PATTERN);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.run_pattern(&IDENTIFIER_PATTERN);
            }
            _ => self.unrecognised(ch),
        }
    }

    fn unrecognised(&mut self, ch: char) {
        self.report(
            ErrorImpl::UnrecognisedCharacter { character: ch },
            self.location(),
        );
        self.skip_line();
    }

    /// Consumes the whole source.
    pub fn scan_all(&mut self) {
        self.scan_indent();
        while let Some(ch) = self.peek() {
            self.scan_token(ch);
        }
        self.close_indents();
    }
}

fn number_handler(lexer: &mut Lexer, matched: String) {
    lexer.push_lexeme(TokenKind::Number, matched);
}

fn color_handler(lexer: &mut Lexer, matched: String) {
    lexer.push_lexeme(TokenKind::Color, matched);
}

fn symbol_handler(lexer: &mut Lexer, matched: String) {
    let kind = RESERVED_LOOKUP
        .get(matched.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);
    lexer.push_lexeme(kind, matched);
}

/// Tokenizes a whole source text.
///
/// Lexical problems never stop the scan: an unrecognised character skips
/// the rest of its line, a dedent to an unknown width resyncs on the
/// enclosing block and an unterminated string runs to the end of input.
/// Each of them is reported in the returned error list.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Error>) {
    let mut lexer = Lexer::new(source);
    lexer.scan_all();

    debug!(
        tokens = lexer.tokens.len(),
        errors = lexer.errors.len(),
        "tokenized source"
    );

    (lexer.tokens, lexer.errors)
}

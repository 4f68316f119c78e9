use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("export", TokenKind::Export);
        map.insert("import", TokenKind::Import);
        map.insert("as", TokenKind::As);
        map.insert("type", TokenKind::Type);
        map.insert("method", TokenKind::Method);
        map.insert("and", TokenKind::And);
        map.insert("or", TokenKind::Or);
        map.insert("not", TokenKind::Not);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("for", TokenKind::For);
        map.insert("to", TokenKind::To);
        map.insert("by", TokenKind::By);
        map.insert("in", TokenKind::In);
        map.insert("while", TokenKind::While);
        map.insert("switch", TokenKind::Switch);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("const", TokenKind::Const);
        map.insert("simple", TokenKind::Simple);
        map.insert("series", TokenKind::Series);
        map.insert("varip", TokenKind::Varip);
        map.insert("var", TokenKind::Var);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        // Reserved for future use, still valid identifiers.
        map.insert("catch", TokenKind::Catch);
        map.insert("class", TokenKind::Class);
        map.insert("do", TokenKind::Do);
        map.insert("ellipse", TokenKind::Ellipse);
        map.insert("is", TokenKind::Is);
        map.insert("polygon", TokenKind::Polygon);
        map.insert("range", TokenKind::Range);
        map.insert("return", TokenKind::Return);
        map.insert("struct", TokenKind::Struct);
        map.insert("text", TokenKind::Text);
        map.insert("throw", TokenKind::Throw);
        map.insert("try", TokenKind::Try);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    // Layout
    Newline,
    Indent,
    Dedent,

    LeftParen,
    RightParen,
    LeftSqBracket,
    RightSqBracket,
    LeftAngBracket,  // <
    RightAngBracket, // >
    Comma,

    Dot,
    Question,
    Colon,
    Equal,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    ColonEqual,    // :=
    EqualEqual,    // ==
    BangEqual,     // !=
    GreaterEqual,  // >=
    LessEqual,     // <=
    PlusEqual,     // +=
    MinusEqual,    // -=
    StarEqual,     // *=
    SlashEqual,    // /=
    PercentEqual,  // %=
    RightFatArrow, // =>

    Identifier,
    String,
    Number,
    Color,

    Export,
    Import,
    As,
    Type,
    Method,
    And,
    Or,
    Not,
    If,
    Else,
    For,
    To,
    By,
    In,
    While,
    Switch,
    Break,
    Continue,
    Const,
    Simple,
    Series,
    Varip,
    Var,
    True,
    False,

    Catch,
    Class,
    Do,
    Ellipse,
    Is,
    Polygon,
    Range,
    Return,
    Struct,
    Text,
    Throw,
    Try,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::Color
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Keywords that may still be used as names.
    pub fn is_soft_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Catch
                | TokenKind::Class
                | TokenKind::Do
                | TokenKind::Ellipse
                | TokenKind::Is
                | TokenKind::Polygon
                | TokenKind::Range
                | TokenKind::Return
                | TokenKind::Struct
                | TokenKind::Text
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Type
        )
    }

    pub fn is_identifier_like(&self) -> bool {
        *self == TokenKind::Identifier || self.is_soft_keyword()
    }

    /// Operators accepted by a reassignment statement.
    pub fn is_reassign_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::ColonEqual
                | TokenKind::PlusEqual
                | TokenKind::MinusEqual
                | TokenKind::StarEqual
                | TokenKind::SlashEqual
                | TokenKind::PercentEqual
        )
    }

    pub fn is_qualifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Const | TokenKind::Simple | TokenKind::Series
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lexeme as it appears in the source. `value` keeps the raw text,
/// quotes included for strings; layout tokens carry an empty value.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.kind, self.value)
        }
    }
}

impl Token {
    pub fn is_one_of_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    pub fn debug(&self) {
        if self.is_one_of_many(&[
            TokenKind::String,
            TokenKind::Identifier,
            TokenKind::Number,
            TokenKind::Color,
        ]) {
            println!("{}:{} {} ({})", self.span.start.row, self.span.start.column, self.kind, self.value);
        } else {
            println!("{}:{} {} ()", self.span.start.row, self.span.start.column, self.kind);
        }
    }
}

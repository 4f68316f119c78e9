//! Unit tests for the lexer module.

use pretty_assertions::assert_eq;

use super::{
    lexer::{tokenize, Lexer},
    tokens::TokenKind,
};

fn kinds(source: &str) -> Vec<TokenKind> {
    let (tokens, errors) = tokenize(source);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    tokens.into_iter().map(|token| token.kind).collect()
}

fn values(source: &str) -> Vec<String> {
    let (tokens, _) = tokenize(source);
    tokens.into_iter().map(|token| token.value).collect()
}

#[test]
fn test_tokenize_declaration() {
    let (tokens, errors) = tokenize("x = 1 + 2.0");

    assert!(errors.is_empty());
    assert_eq!(
        tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::Number,
        ]
    );
    assert_eq!(values("x = 1 + 2.0"), vec!["x", "=", "1", "+", "2.0"]);
}

#[test]
fn test_token_positions() {
    let (tokens, _) = tokenize("x = 1\nfoo = 22");

    assert_eq!(tokens[0].span.start.row, 1);
    assert_eq!(tokens[0].span.start.column, 1);
    assert_eq!(tokens[4].value, "foo");
    assert_eq!(tokens[4].span.start.row, 2);
    assert_eq!(tokens[4].span.start.column, 1);
    assert_eq!(tokens[4].span.end.column, 3);
    assert_eq!(tokens[6].span.start.column, 7);
    assert_eq!(tokens[6].span.end.column, 8);
}

#[test]
fn test_tokenize_keywords() {
    let source = "var varip const simple series if else for to by in while switch \
                  break continue import export as method and or not true false";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Var,
            TokenKind::Varip,
            TokenKind::Const,
            TokenKind::Simple,
            TokenKind::Series,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::For,
            TokenKind::To,
            TokenKind::By,
            TokenKind::In,
            TokenKind::While,
            TokenKind::Switch,
            TokenKind::Break,
            TokenKind::Continue,
            TokenKind::Import,
            TokenKind::Export,
            TokenKind::As,
            TokenKind::Method,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::True,
            TokenKind::False,
        ]
    );
}

#[test]
fn test_soft_keywords() {
    let tokens = kinds("type text range foo");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Type,
            TokenKind::Text,
            TokenKind::Range,
            TokenKind::Identifier
        ]
    );
    assert!(tokens.iter().all(|kind| kind.is_identifier_like()));
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds(":= == != <= >= += -= *= /= %= => ! < > ? : . ="),
        vec![
            TokenKind::ColonEqual,
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::PlusEqual,
            TokenKind::MinusEqual,
            TokenKind::StarEqual,
            TokenKind::SlashEqual,
            TokenKind::PercentEqual,
            TokenKind::RightFatArrow,
            TokenKind::Not,
            TokenKind::LeftAngBracket,
            TokenKind::RightAngBracket,
            TokenKind::Question,
            TokenKind::Colon,
            TokenKind::Dot,
            TokenKind::Equal,
        ]
    );
}

#[test]
fn test_tokenize_numbers() {
    assert_eq!(
        values("1 2.5 1e3 1.5e-3 .5 7."),
        vec!["1", "2.5", "1e3", "1.5e-3", ".5", "7."]
    );
    assert!(kinds("1.5e-3").iter().all(|kind| *kind == TokenKind::Number));
}

#[test]
fn test_tokenize_strings_keep_quotes() {
    let (tokens, errors) = tokenize(r#"a = "he said \"hi\"" + 'it\'s'"#);

    assert!(errors.is_empty());
    assert_eq!(tokens[2].kind, TokenKind::String);
    assert_eq!(tokens[2].value, r#""he said \"hi\"""#);
    assert_eq!(tokens[4].value, r#"'it\'s'"#);
}

#[test]
fn test_tokenize_colors() {
    assert_eq!(
        kinds("#FFF #ffff #00ff00 #000000FF"),
        vec![TokenKind::Color; 4]
    );
    assert_eq!(values("#a1B2c3"), vec!["#a1B2c3"]);
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("x = 1 // trailing\n// whole line\ny = 2"),
        vec![
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Number,
        ]
    );
}

#[test]
fn test_leading_blank_lines_emit_nothing() {
    assert_eq!(kinds("\n\n   \nx"), vec![TokenKind::Identifier]);
}

#[test]
fn test_no_trailing_newline_at_end_of_input() {
    assert_eq!(
        kinds("x\n"),
        vec![TokenKind::Identifier]
    );
}

#[test]
fn test_indent_and_dedent() {
    let source = "if a\n    b\n    if c\n        d\ne";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            TokenKind::Identifier,
            TokenKind::Indent,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::If,
            TokenKind::Identifier,
            TokenKind::Indent,
            TokenKind::Identifier,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn test_indentation_is_balanced_at_end_of_input() {
    let source = "a\n    b\n        c\n            d\n    e\n\tf\n        g";

    let mut lexer = Lexer::new(source);
    lexer.scan_all();

    let indents = lexer
        .tokens()
        .iter()
        .filter(|t| t.kind == TokenKind::Indent)
        .count();
    let dedents = lexer
        .tokens()
        .iter()
        .filter(|t| t.kind == TokenKind::Dedent)
        .count();

    assert!(lexer.errors().is_empty());
    assert_eq!(indents, 4);
    assert_eq!(indents, dedents);
    assert_eq!(lexer.indent_stack(), &[0]);
}

#[test]
fn test_misaligned_line_continues_statement() {
    assert_eq!(
        kinds("x = 1 +\n  2\ny = 3"),
        vec![
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Number,
        ]
    );
}

#[test]
fn test_unrecognised_character_skips_line() {
    let (tokens, errors) = tokenize("x = 1 $ 2\ny = 3");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "UnrecognisedCharacter");
    assert_eq!(errors[0].row(), 1);
    assert_eq!(errors[0].col(), 7);
    assert_eq!(
        tokens.iter().map(|t| t.value.as_str()).collect::<Vec<_>>(),
        vec!["x", "=", "1", "", "y", "=", "3"]
    );
}

#[test]
fn test_invalid_dedent_is_reported() {
    let (tokens, errors) = tokenize("if a\n        b\n    c");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "InvalidIndent");
    assert_eq!(errors[0].row(), 3);

    let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
    let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
    assert_eq!(indents, dedents);
}

#[test]
fn test_unterminated_string() {
    let (tokens, errors) = tokenize("s = \"abc");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "UnterminatedString");
    assert_eq!(errors[0].col(), 5);
    assert_eq!(tokens[2].kind, TokenKind::String);
    assert_eq!(tokens[2].value, "\"abc");
}

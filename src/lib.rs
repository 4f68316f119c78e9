#![allow(clippy::module_inception)]

use std::fmt::Display;

use crate::{
    ast::ast::Node,
    errors::errors::{Error, ErrorTip},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::analyze_types,
    types::namespace::Namespace,
};

pub mod ast;
pub mod builtins;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;
pub mod types;

extern crate regex;

/// A 1-based row/column pair. `Location::INVALID` marks positions that
/// do not exist in the source, such as the end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub row: i32,
    pub column: i32,
}

impl Location {
    pub const INVALID: Location = Location {
        row: -1,
        column: -1,
    };

    pub fn new(row: i32, column: i32) -> Self {
        Location { row, column }
    }

    pub fn is_valid(&self) -> bool {
        self.row > 0 && self.column > 0
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Span { start, end }
    }

    pub fn invalid() -> Self {
        Span {
            start: Location::INVALID,
            end: Location::INVALID,
        }
    }

    /// Span covering `self` through `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

/// Runs the tokenizer, parser and type checker over one source text.
///
/// Lexical, parse and type errors are returned together, in that order.
/// The returned nodes carry their resolved types.
pub fn check_source(namespace: &Namespace, source: &str) -> (Vec<Node>, Vec<Error>) {
    let (tokens, mut errors) = tokenize(source);
    let (mut nodes, parse_errors) = parse(tokens);
    errors.extend(parse_errors);
    errors.extend(analyze_types(namespace, &mut nodes));
    (nodes, errors)
}

/// Returns the line number, the text of the line and the 0-based column
/// for a location, or `None` when it falls outside the source.
pub fn get_line_at_location(source: &str, location: Location) -> Option<(usize, String, usize)> {
    if !location.is_valid() {
        return None;
    }

    let line = source
        .split_inclusive('\n')
        .nth(location.row as usize - 1)?;

    Some((
        location.row as usize,
        line.trim_end_matches(&['\r', '\n'][..]).to_string(),
        location.column as usize - 1,
    ))
}

pub fn display_error(error: &Error, source: &str, file: &str) {
    /*
        error: message
        -> script.pine
           |
        20 | x = #;
           | ----^
    */

    if let ErrorTip::None = error.get_tip() {
        println!("Error: {} ({})", error.get_error_name(), error.message());
    } else {
        println!(
            "Error: {} ({}, {})",
            error.get_error_name(),
            error.message(),
            error.get_tip()
        );
    }

    let Some((line, line_text, line_pos)) = get_line_at_location(source, *error.get_position())
    else {
        println!("-> {}", file);
        return;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    println!("-> {}:{}", file, error.get_position());
    println!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    println!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    println!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string.chars().take_while(|c| *c == ' ').count();
    (String::from(&string[start..]), start)
}

//! Parser module for building the syntax tree.
//!
//! Transforms the token stream into a list of top level statements. It
//! uses a Pratt parser for expressions and handles:
//!
//! - Statement parsing (declarations, functions, types, control flow)
//! - Expression parsing (operators, calls, history references, literals)
//! - Type annotations such as `map<string, float>` and `int[]`
//! - Error recovery: a failed statement is reported and skipped
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;

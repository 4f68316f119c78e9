//! Lexical analysis.
//!
//! Turns source text into tokens. Besides keywords, literals and operators
//! the lexer tracks indentation and emits `Indent`, `Dedent` and `Newline`
//! layout tokens, which is what the parser uses to find blocks and the end
//! of statements.

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;

//! Type analysis of the parsed program.
//!
//! A single walk over the tree resolves every expression and statement to
//! a structural type and stores it in the node's type slot:
//!
//! - Scopes follow suites, loops and function bodies
//! - Identifiers resolve through scopes, script declarations and the
//!   supplied namespace
//! - Operators are checked against a fixed table keyed by lexeme
//! - Calls dispatch over callable overloads, methods receive their target
//! - Namespace macros are expanded in place before analysis
//!
//! Failures never stop the walk. A node that fails keeps an empty type
//! slot and its parent skips the checks depending on it, so every error
//! is reported once.

pub mod operators;
pub mod type_checker;

#[cfg(test)]
mod tests;

//! Syntax tree produced by the parser.
//!
//! Nodes own their children. After parsing, [`parent::mark_parent`] links
//! every node back to its parent so later passes can ask where a node sits,
//! for example whether a case clause belongs to a switch.
pub mod ast;
pub mod parent;

#[cfg(test)]
mod tests;

//! Structural type system.
//!
//! Types are plain values compared by shape, never by name. This module
//! holds the type algebra (equality, implicit conversion, unions), the
//! qualifier lattice, callables with overload dispatch and the namespaces
//! builtins are published through.

pub mod callable;
pub mod namespace;
pub mod qualifiers;
pub mod types;

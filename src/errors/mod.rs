//! Diagnostics shared by every phase of the front end.
//!
//! Lexical, syntax and semantic failures are all reported as an [`errors::Error`]:
//! an [`errors::ErrorImpl`] describing what went wrong plus the source location
//! it points at. None of the phases stop at the first failure, so callers always
//! receive a list.

pub mod errors;

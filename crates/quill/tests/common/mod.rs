//! Test infrastructure for quill.
//!
//! Models shared across test files, a memory driver with the predicates the
//! tests query with, and assertion helpers for matching error causes.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

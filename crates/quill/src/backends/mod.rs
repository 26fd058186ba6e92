//! Driver implementations.
//!
//! | Driver | Module | Description |
//! |--------|--------|-------------|
//! | Memory | [`memory`] | Tables held in process, snapshot-isolated transactions |
//!
//! SQL drivers live outside this crate and implement [`Driver`](crate::core::Driver)
//! by turning the field lists and [`QueryContext::clauses`](crate::QueryContext::clauses)
//! into statements.

pub mod memory;

//! Quill: record mapping over pluggable storage drivers
//!
//! This crate turns typed application records into backend-agnostic field
//! lists, dispatches reads and writes through an abstract [`Driver`], and
//! manages transaction lifecycles the same way for every backend.
//!
//! # Features
//!
//! - **Declarative models**: `#[derive(Model)]` with a [`ModelMetadata`] marker
//!   naming the table and per-field `#[quill(...)]` attributes
//! - **Pluggable drivers**: any [`Driver`] implementation can be installed in a
//!   [`DriverRegistry`] and swapped at runtime
//! - **Transactions**: explicit [`Transaction`] handles, plus
//!   [`Session::transact`] which commits on success and rolls back on error or
//!   panic
//! - **Memory driver**: [`MemoryDriver`] keeps tables in process and gives every
//!   transaction its own snapshot
//!
//! # Architecture
//!
//! - [`value`] / [`field`] - typed values and the field bag drivers exchange
//! - [`model`] - the [`Model`] trait and descriptor resolution
//! - [`context`] - immutable query modifiers
//! - [`core`] - the [`Driver`] contract and [`DriverRegistry`]
//! - [`session`] / [`transaction`] - record operations
//! - [`backends`] - driver implementations
//! - [`error`] - error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use quill::{MemoryDriver, Model, ModelMetadata, Session, Value};
//! use quill::field::by_storage_name;
//!
//! #[derive(Debug, Default, Clone, PartialEq, Model)]
//! struct Post {
//!     #[quill(table = "posts")]
//!     meta: ModelMetadata,
//!     #[quill(primary)]
//!     id: i64,
//!     title: String,
//! }
//!
//! let driver = Arc::new(MemoryDriver::new());
//! driver.register_predicate("title = $1", |row, args| {
//!     Ok(by_storage_name(row, "title").map(|f| f.value()) == args.first())
//! });
//! let session = Session::with_driver(driver);
//!
//! session.transact(|tx| {
//!     let mut post = Post { title: "Hello".into(), ..Default::default() };
//!     tx.save(&mut post)
//! }).unwrap();
//!
//! let found: Post = session.first("title = $1", &[Value::from("Hello")]).unwrap();
//! assert_eq!(found.title, "Hello");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

extern crate self as quill;

pub mod backends;
pub mod context;
pub mod core;
pub mod error;
pub mod field;
pub mod model;
mod ops;
pub mod session;
pub mod transaction;
pub mod value;

// Re-export commonly used types at crate root
pub use context::QueryContext;
pub use error::{StorageError, StorageResult};
pub use field::{Field, Row};
pub use model::{Model, ModelDescriptor, ModelMetadata};
pub use session::{Query, Session};
pub use transaction::{Transaction, TransactionState};
pub use value::{FieldType, FieldValue, Value};

// Re-export the driver contract
pub use core::{Driver, DriverRegistry, TxToken};

pub use backends::memory::{MemoryDriver, MemoryDriverConfig};

/// Derives [`Model`] for a struct with named fields.
///
/// See the [`model`] module for the supported attributes.
pub use quill_macro::Model;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core driver abstractions.
//!
//! - [`Driver`] - the operation set every storage backend implements
//! - [`TxToken`] - transaction scope passed to every driver call
//! - [`DriverRegistry`] - holder of the active driver
//!
//! # Example: Implementing a Driver
//!
//! ```ignore
//! use quill::core::{Driver, TxToken};
//!
//! #[derive(Debug)]
//! struct SqlDriver { /* connection */ }
//!
//! impl Driver for SqlDriver {
//!     fn name(&self) -> &'static str { "sql" }
//!
//!     fn all(&self, table: &str, fields: &[Field], ctx: &QueryContext) -> StorageResult<Vec<Row>> {
//!         let columns = fields.iter().map(Field::storage_name).collect::<Vec<_>>().join(", ");
//!         let sql = format!("SELECT {} FROM {} {}", columns, table, ctx.clauses());
//!         // run `sql` inside the transaction named by ctx.tx()
//!     }
//!
//!     // ...
//! }
//! ```

mod driver;
mod registry;

pub use driver::{BackendTxId, Driver, DriverCapability, SnapshotId, TxToken};
pub use registry::DriverRegistry;

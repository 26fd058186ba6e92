//! In-memory driver with snapshot-isolated transactions.
//!
//! # Example
//!
//! ```
//! use quill::backends::memory::{MemoryDriver, MemoryDriverConfig};
//! use quill::core::Driver;
//! use quill::field::by_storage_name;
//!
//! let driver = MemoryDriver::with_config(MemoryDriverConfig::default().with_id_stride(500));
//! driver.register_predicate("name = $1", |row, args| {
//!     Ok(by_storage_name(row, "name").map(|f| f.value()) == args.first())
//! });
//! assert!(driver.has_transactions());
//! ```

mod config;
mod driver;
mod store;

pub use config::MemoryDriverConfig;
pub use driver::{MemoryDriver, PredicateError, ReceivedExec};

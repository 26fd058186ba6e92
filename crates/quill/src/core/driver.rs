//! The driver contract.
//!
//! This module defines the [`Driver`] trait every storage backend implements,
//! and the [`TxToken`] that identifies a backend transaction across calls.
//! Drivers receive fully resolved tables and field lists; they never see
//! record types.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::QueryContext;
use crate::error::StorageResult;
use crate::field::{Field, Row};
use crate::value::Value;

/// Identifies an in-memory snapshot transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub Uuid);

impl SnapshotId {
    /// Generates a fresh snapshot id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies a transaction owned by an external database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendTxId(pub u64);

/// Transaction scope of a driver call.
///
/// Each driver family issues its own variant and matches the others as
/// unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxToken {
    /// Not inside a transaction.
    #[default]
    None,
    /// A snapshot held by an in-memory driver.
    Snapshot(SnapshotId),
    /// A transaction held by a database engine.
    Backend(BackendTxId),
}

impl TxToken {
    /// Returns true if this token refers to a transaction.
    pub fn is_some(&self) -> bool {
        !matches!(self, TxToken::None)
    }
}

impl fmt::Display for TxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxToken::None => write!(f, "none"),
            TxToken::Snapshot(id) => write!(f, "snapshot:{}", id.0),
            TxToken::Backend(id) => write!(f, "backend:{}", id.0),
        }
    }
}

/// Optional capabilities a driver may lack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverCapability {
    /// Begin/commit/rollback.
    Transactions,
    /// Allocating primary keys of a given type.
    KeyAllocation,
}

impl fmt::Display for DriverCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverCapability::Transactions => "transactions",
            DriverCapability::KeyAllocation => "key-allocation",
        };
        write!(f, "{}", name)
    }
}

/// A pluggable storage backend.
///
/// Every write receives the transaction token explicitly; reads receive it
/// through the [`QueryContext`]. Absent transaction is [`TxToken::None`].
///
/// `predicate` strings are opaque to the caller: a SQL driver treats them as
/// a WHERE fragment with positional placeholders, the memory driver as the key
/// of a registered callback.
pub trait Driver: Send + Sync + Debug {
    /// Returns a short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Loads the row whose primary key equals `primary`'s value.
    ///
    /// `fields` lists the columns to return. Fails with
    /// `ResourceError::NotFound` if no row matches.
    fn get(&self, tx: &TxToken, table: &str, fields: &[Field], primary: &Field)
    -> StorageResult<Row>;

    /// Inserts a row and returns the primary key the driver assigned.
    ///
    /// The value carried by `primary` is ignored.
    fn create(
        &self,
        tx: &TxToken,
        table: &str,
        fields: Vec<Field>,
        primary: &Field,
    ) -> StorageResult<Value>;

    /// Replaces the row identified by `primary` with `fields`.
    fn update(
        &self,
        tx: &TxToken,
        table: &str,
        fields: Vec<Field>,
        primary: &Field,
    ) -> StorageResult<()>;

    /// Returns every row of `table`.
    fn all(&self, table: &str, fields: &[Field], ctx: &QueryContext) -> StorageResult<Vec<Row>>;

    /// Returns every row of `table` matching `predicate` with `args`.
    fn filter(
        &self,
        table: &str,
        fields: &[Field],
        ctx: &QueryContext,
        predicate: &str,
        args: &[Value],
    ) -> StorageResult<Vec<Row>>;

    /// Returns the first row matching `predicate`.
    ///
    /// Fails with `ResourceError::NoMatch` when nothing matches.
    fn first(
        &self,
        table: &str,
        fields: &[Field],
        ctx: &QueryContext,
        predicate: &str,
        args: &[Value],
    ) -> StorageResult<Row>;

    /// Deletes the row identified by `primary`.
    fn remove(&self, tx: &TxToken, table: &str, primary: &Field) -> StorageResult<()>;

    /// Executes a raw statement.
    fn exec(&self, tx: &TxToken, statement: &str, args: &[Value]) -> StorageResult<()>;

    /// Returns true if [`Driver::begin`] can succeed.
    fn has_transactions(&self) -> bool;

    /// Starts a transaction and returns its token.
    fn begin(&self) -> StorageResult<TxToken>;

    /// Discards a transaction. Unknown or finished tokens are ignored.
    fn rollback(&self, tx: &TxToken);

    /// Makes a transaction's writes visible outside it.
    fn commit(&self, tx: &TxToken) -> StorageResult<()>;
}

//! Entry point for record operations.
//!
//! A [`Session`] owns a shared [`DriverRegistry`] and a [`DescriptorCache`].
//! Each call looks up the active driver, resolves the record's descriptor and
//! dispatches to the driver with no transaction, or with the token carried by
//! the query context.
//!
//! ```
//! use std::sync::Arc;
//! use quill::{MemoryDriver, Model, ModelMetadata, Session};
//!
//! #[derive(Debug, Default, Clone, PartialEq, Model)]
//! struct Person {
//!     #[quill(table = "people")]
//!     meta: ModelMetadata,
//!     #[quill(primary)]
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! let session = Session::with_driver(Arc::new(MemoryDriver::new()));
//!
//! let mut john = Person { name: "John".into(), age: 31, ..Default::default() };
//! session.save(&mut john).unwrap();
//! assert_ne!(john.id, 0);
//!
//! let loaded: Person = session.get(john.id).unwrap();
//! assert_eq!(loaded, john);
//! ```

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::context::QueryContext;
use crate::core::{Driver, DriverRegistry, TxToken};
use crate::error::StorageResult;
use crate::model::{DescriptorCache, Model};
use crate::ops;
use crate::transaction::{self, Transaction};
use crate::value::Value;

/// Handle for running record operations against the active driver.
///
/// Cloning a session is cheap; clones share the registry and the descriptor
/// cache.
#[derive(Debug, Clone)]
pub struct Session {
    registry: Arc<DriverRegistry>,
    cache: Arc<DescriptorCache>,
}

impl Session {
    /// Creates a session over an existing registry.
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self {
            registry,
            cache: Arc::new(DescriptorCache::new()),
        }
    }

    /// Creates a session with its own registry holding `driver`.
    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self::new(Arc::new(DriverRegistry::new(driver)))
    }

    /// Installs or replaces the active driver.
    pub fn configure(&self, driver: Arc<dyn Driver>) {
        self.registry.configure(driver);
    }

    /// Returns the registry this session reads the driver from.
    pub fn registry(&self) -> &Arc<DriverRegistry> {
        &self.registry
    }

    /// Returns the active driver.
    pub fn driver(&self) -> StorageResult<Arc<dyn Driver>> {
        self.registry.current()
    }

    /// Loads the record whose primary key equals `id`.
    #[instrument(skip(self, id), fields(model = std::any::type_name::<M>()))]
    pub fn get<M: Model>(&self, id: impl Into<Value>) -> StorageResult<M> {
        let driver = self.driver()?;
        ops::get(driver.as_ref(), &self.cache, &TxToken::None, id.into())
    }

    /// Creates the record if its primary key is zero, otherwise updates it.
    ///
    /// On create the key assigned by the driver is written back to the record.
    #[instrument(skip(self, record), fields(model = std::any::type_name::<M>()))]
    pub fn save<M: Model>(&self, record: &mut M) -> StorageResult<()> {
        let driver = self.driver()?;
        let created = ops::save(driver.as_ref(), &self.cache, &TxToken::None, record)?;
        debug!(created, "Saved record");
        Ok(())
    }

    /// Removes the record identified by its primary key.
    #[instrument(skip(self, record), fields(model = std::any::type_name::<M>()))]
    pub fn remove<M: Model>(&self, record: &M) -> StorageResult<()> {
        let driver = self.driver()?;
        ops::remove(driver.as_ref(), &self.cache, &TxToken::None, record)
    }

    /// Returns every record of `M`.
    pub fn all<M: Model>(&self) -> StorageResult<Vec<M>> {
        self.query(QueryContext::default()).all()
    }

    /// Returns the records of `M` matching `predicate`.
    pub fn filter<M: Model>(&self, predicate: &str, args: &[Value]) -> StorageResult<Vec<M>> {
        self.query(QueryContext::default()).filter(predicate, args)
    }

    /// Returns the first record of `M` matching `predicate`.
    pub fn first<M: Model>(&self, predicate: &str, args: &[Value]) -> StorageResult<M> {
        self.query(QueryContext::default()).first(predicate, args)
    }

    /// Passes a raw statement through to the driver.
    #[instrument(skip(self, args))]
    pub fn exec(&self, statement: &str, args: &[Value]) -> StorageResult<()> {
        let driver = self.driver()?;
        ops::exec(driver.as_ref(), &TxToken::None, statement, args)
    }

    /// Starts a query with the given context.
    ///
    /// A context obtained from [`Transaction::context`] keeps its token, so
    /// the query reads from that transaction.
    pub fn query(&self, ctx: QueryContext) -> Query<'_> {
        Query {
            scope: Scope::Session(self),
            ctx,
        }
    }

    /// Begins a transaction on the active driver.
    pub fn begin(&self) -> StorageResult<Transaction> {
        let driver = self.driver()?;
        Transaction::begin(driver, Arc::clone(&self.cache))
    }

    /// Runs `f` inside a new transaction.
    ///
    /// Commits when `f` returns `Ok` and the transaction is still active.
    /// Rolls back when `f` returns an error, which is passed through
    /// unchanged, or when `f` panics, which is reported as
    /// [`TransactionError::RecoveredFault`](crate::error::TransactionError::RecoveredFault).
    pub fn transact<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Transaction) -> StorageResult<T>,
    {
        let tx = self.begin()?;
        transaction::run(tx, f)
    }
}

enum Scope<'a> {
    Session(&'a Session),
    Transaction(&'a Transaction),
}

/// A read scoped to a [`QueryContext`].
///
/// Obtained from [`Session::query`] or [`Transaction::query`].
pub struct Query<'a> {
    scope: Scope<'a>,
    ctx: QueryContext,
}

impl<'a> Query<'a> {
    pub(crate) fn in_transaction(tx: &'a Transaction, ctx: QueryContext) -> Self {
        Self {
            scope: Scope::Transaction(tx),
            ctx,
        }
    }

    /// Returns the context this query runs with.
    pub fn context(&self) -> &QueryContext {
        &self.ctx
    }

    fn run<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&dyn Driver, &DescriptorCache, &QueryContext) -> StorageResult<T>,
    ) -> StorageResult<T> {
        match self.scope {
            Scope::Session(session) => {
                let driver = session.driver()?;
                f(driver.as_ref(), &session.cache, &self.ctx)
            }
            Scope::Transaction(tx) => {
                tx.ensure_active(operation)?;
                f(tx.driver(), tx.cache(), &self.ctx)
            }
        }
    }

    /// Returns every record of `M`.
    pub fn all<M: Model>(&self) -> StorageResult<Vec<M>> {
        self.run("list", |driver, cache, ctx| ops::all(driver, cache, ctx))
    }

    /// Returns the records of `M` matching `predicate`.
    pub fn filter<M: Model>(&self, predicate: &str, args: &[Value]) -> StorageResult<Vec<M>> {
        self.run("filter", |driver, cache, ctx| {
            ops::filter(driver, cache, ctx, predicate, args)
        })
    }

    /// Returns the first record of `M` matching `predicate`.
    pub fn first<M: Model>(&self, predicate: &str, args: &[Value]) -> StorageResult<M> {
        self.run("find first", |driver, cache, ctx| {
            ops::first(driver, cache, ctx, predicate, args)
        })
    }
}

impl std::fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scope = match self.scope {
            Scope::Session(_) => "session",
            Scope::Transaction(_) => "transaction",
        };
        f.debug_struct("Query")
            .field("scope", &scope)
            .field("ctx", &self.ctx)
            .finish()
    }
}

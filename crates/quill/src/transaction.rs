//! Transaction lifecycle.
//!
//! A [`Transaction`] wraps the token a driver issued at begin. It starts
//! [`TransactionState::Active`] and leaves that state exactly once, through
//! [`Transaction::commit`] or [`Transaction::rollback`]. Dropping an active
//! transaction rolls it back.
//!
//! [`Session::transact`](crate::Session::transact) runs a callback inside a
//! transaction and commits or rolls back depending on its outcome.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::QueryContext;
use crate::core::{Driver, TxToken};
use crate::error::{StorageError, StorageResult, TransactionError};
use crate::model::{DescriptorCache, Model};
use crate::ops;
use crate::session::Query;
use crate::value::Value;

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// Open; reads and writes go to the transaction.
    Active,
    /// Finished by a successful commit.
    Committed,
    /// Finished by a rollback.
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Active => write!(f, "active"),
            TransactionState::Committed => write!(f, "committed"),
            TransactionState::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// An open driver transaction.
///
/// Created by [`Session::begin`](crate::Session::begin). The transaction
/// keeps the driver it was begun on, so reconfiguring the session does not
/// redirect its remaining calls.
pub struct Transaction {
    driver: Arc<dyn Driver>,
    cache: Arc<DescriptorCache>,
    token: TxToken,
    state: TransactionState,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("driver", &self.driver.name())
            .field("token", &self.token)
            .field("state", &self.state)
            .finish()
    }
}

impl Transaction {
    pub(crate) fn begin(driver: Arc<dyn Driver>, cache: Arc<DescriptorCache>) -> StorageResult<Self> {
        let token = driver
            .begin()
            .map_err(|err| err.during("begin", "transaction"))?;
        debug!(driver = driver.name(), token = %token, "Began transaction");

        Ok(Self {
            driver,
            cache,
            token,
            state: TransactionState::Active,
        })
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true until the transaction is committed or rolled back.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the driver-issued token.
    pub fn token(&self) -> &TxToken {
        &self.token
    }

    pub(crate) fn ensure_active(&self, operation: &'static str) -> StorageResult<()> {
        if self.is_active() {
            return Ok(());
        }
        Err(
            StorageError::from(TransactionError::AlreadyFinished { state: self.state })
                .during(operation, format!("transaction {}", self.token)),
        )
    }

    /// Loads a record by primary key from within the transaction.
    pub fn get<M: Model>(&self, id: impl Into<Value>) -> StorageResult<M> {
        self.ensure_active("get")?;
        ops::get(self.driver.as_ref(), &self.cache, &self.token, id.into())
    }

    /// Creates or updates a record inside the transaction.
    pub fn save<M: Model>(&self, record: &mut M) -> StorageResult<()> {
        self.ensure_active("save")?;
        ops::save(self.driver.as_ref(), &self.cache, &self.token, record).map(|_| ())
    }

    /// Removes a record inside the transaction.
    pub fn remove<M: Model>(&self, record: &M) -> StorageResult<()> {
        self.ensure_active("remove")?;
        ops::remove(self.driver.as_ref(), &self.cache, &self.token, record)
    }

    /// Returns every record of `M` visible to the transaction.
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

    /// Executes a raw statement inside the transaction.
    pub fn exec(&self, statement: &str, args: &[Value]) -> StorageResult<()> {
        self.ensure_active("exec")?;
        ops::exec(self.driver.as_ref(), &self.token, statement, args)
    }

    /// Binds `ctx` to this transaction.
    pub fn context(&self, ctx: &QueryContext) -> QueryContext {
        ctx.with_tx(self.token.clone())
    }

    /// Starts a query scoped to this transaction.
    pub fn query(&self, ctx: QueryContext) -> Query<'_> {
        let ctx = self.context(&ctx);
        Query::in_transaction(self, ctx)
    }

    pub(crate) fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub(crate) fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    /// Commits the transaction.
    ///
    /// Fails with [`TransactionError::AlreadyFinished`] if the transaction was
    /// already committed or rolled back. If the driver fails to commit, the
    /// transaction stays active and can still be rolled back.
    pub fn commit(&mut self) -> StorageResult<()> {
        self.ensure_active("commit")?;
        self.driver
            .commit(&self.token)
            .map_err(|err| err.during("commit", format!("transaction {}", self.token)))?;

        self.state = TransactionState::Committed;
        debug!(driver = self.driver.name(), token = %self.token, "Committed transaction");
        Ok(())
    }

    /// Rolls the transaction back. Does nothing if it already finished.
    pub fn rollback(&mut self) {
        if !self.is_active() {
            return;
        }
        self.driver.rollback(&self.token);
        self.state = TransactionState::RolledBack;
        debug!(driver = self.driver.name(), token = %self.token, "Rolled back transaction");
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_active() {
            warn!(
                token = %self.token,
                "Transaction dropped without explicit commit or rollback, rolling back"
            );
            self.rollback();
        }
    }
}

/// Runs `f` inside `tx`, committing on success and rolling back otherwise.
pub(crate) fn run<T, F>(mut tx: Transaction, f: F) -> StorageResult<T>
where
    F: FnOnce(&mut Transaction) -> StorageResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(&mut tx))) {
        Ok(Ok(value)) => {
            if tx.is_active() {
                if let Err(err) = tx.commit() {
                    tx.rollback();
                    return Err(err);
                }
            }
            Ok(value)
        }
        Ok(Err(err)) => {
            debug!(token = %tx.token, error = %err, "Transaction callback failed");
            tx.rollback();
            Err(err)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(token = %tx.token, message = %message, "Transaction callback panicked");
            tx.rollback();
            Err(TransactionError::RecoveredFault { message }.into())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "transaction callback panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(TransactionState::Active.to_string(), "active");
        assert_eq!(TransactionState::Committed.to_string(), "committed");
        assert_eq!(TransactionState::RolledBack.to_string(), "rolled back");
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(format!("code {}", 7));
        assert_eq!(panic_message(payload.as_ref()), "code 7");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "transaction callback panicked");
    }
}

//! The memory driver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::context::QueryContext;
use crate::core::{Driver, DriverCapability, SnapshotId, TxToken};
use crate::error::{DriverError, QueryError, ResourceError, StorageError, StorageResult};
use crate::field::{self, Field, Row};
use crate::value::{FieldType, Value};

use super::config::MemoryDriverConfig;
use super::store::{MemoryStore, row_id};

const BACKEND: &str = "memory";

/// Error type predicate callbacks may return.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

type Predicate = Arc<dyn Fn(&[Field], &[Value]) -> Result<bool, PredicateError> + Send + Sync>;

/// The last statement passed to [`Driver::exec`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedExec {
    /// Transaction the statement was issued in.
    pub tx: TxToken,
    /// Statement text.
    pub statement: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

struct State {
    main: MemoryStore,
    snapshots: HashMap<SnapshotId, MemoryStore>,
    last_exec: Option<ReceivedExec>,
}

/// In-memory driver with snapshot-isolated transactions.
///
/// Committed rows live in one main store. `begin` deep-copies it into a
/// private snapshot; every read and write carrying that snapshot's token is
/// served from the copy alone, so concurrent transactions never see each
/// other's writes. `commit` replays the snapshot's created, updated and
/// removed rows onto the main store; there is no write-write conflict
/// detection, the later commit wins.
///
/// Predicates are callbacks registered with
/// [`MemoryDriver::register_predicate`]; `order`, `group`, `limit` and `skip`
/// are ignored and rows come back in insertion order. Primary keys must be
/// integers.
pub struct MemoryDriver {
    config: MemoryDriverConfig,
    state: Mutex<State>,
    predicates: RwLock<HashMap<String, Predicate>>,
}

impl fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        let mut predicates: Vec<String> = self.predicates.read().keys().cloned().collect();
        predicates.sort();
        f.debug_struct("MemoryDriver")
            .field("config", &self.config)
            .field("max_id", &state.main.max_id())
            .field("snapshots", &state.snapshots.len())
            .field("predicates", &predicates)
            .finish()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    /// Creates an empty driver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryDriverConfig::default())
    }

    /// Creates an empty driver with the given configuration.
    pub fn with_config(config: MemoryDriverConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                main: MemoryStore::default(),
                snapshots: HashMap::new(),
                last_exec: None,
            }),
            predicates: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MemoryDriverConfig {
        &self.config
    }

    /// Registers the callback that evaluates `predicate`.
    ///
    /// The callback receives each stored row, keyed by storage name, and the
    /// positional arguments of the call. Registering the same predicate again
    /// replaces the callback.
    pub fn register_predicate<F>(&self, predicate: impl Into<String>, callback: F)
    where
        F: Fn(&[Field], &[Value]) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        let predicate = predicate.into();
        trace!(predicate = %predicate, "Registering predicate");
        self.predicates.write().insert(predicate, Arc::new(callback));
    }

    /// Returns the last statement received by `exec`.
    pub fn last_exec(&self) -> Option<ReceivedExec> {
        self.state.lock().last_exec.clone()
    }

    /// Returns the number of open transactions.
    pub fn open_transactions(&self) -> usize {
        self.state.lock().snapshots.len()
    }

    /// Returns the committed rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state.lock().main.rows(table).to_vec()
    }

    fn unknown(tx: &TxToken) -> StorageError {
        DriverError::UnknownTransaction {
            backend: BACKEND.to_string(),
            token: tx.to_string(),
        }
        .into()
    }

    fn not_found(table: &str, primary: &Field) -> StorageError {
        ResourceError::NotFound {
            table: table.to_string(),
            key: primary.to_string(),
        }
        .into()
    }

    /// Runs `f` on the store addressed by `tx`.
    fn with_store<T>(
        &self,
        tx: &TxToken,
        f: impl FnOnce(&mut MemoryStore) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let store = match tx {
            TxToken::None => &mut state.main,
            TxToken::Snapshot(id) => state.snapshots.get_mut(id).ok_or_else(|| Self::unknown(tx))?,
            TxToken::Backend(_) => return Err(Self::unknown(tx)),
        };
        f(store)
    }

    fn predicate(&self, predicate: &str) -> StorageResult<Predicate> {
        self.predicates
            .read()
            .get(predicate)
            .cloned()
            .ok_or_else(|| {
                QueryError::NotRegistered {
                    predicate: predicate.to_string(),
                }
                .into()
            })
    }

    fn matching(
        &self,
        table: &str,
        fields: &[Field],
        ctx: &QueryContext,
        predicate: &str,
        args: &[Value],
    ) -> StorageResult<Vec<Row>> {
        let callback = self.predicate(predicate)?;
        // callbacks run without the state lock so they may call back into the driver
        let rows = self.with_store(ctx.tx(), |store| Ok(store.rows(table).to_vec()))?;

        let mut matched = Vec::new();
        for row in &rows {
            let hit = callback(row.as_slice(), args).map_err(|err| DriverError::Failed {
                backend: BACKEND.to_string(),
                operation: format!("evaluate '{}'", predicate),
                message: err.to_string(),
                source: Some(err),
            })?;
            if hit {
                matched.push(project(table, row, fields)?);
            }
        }
        Ok(matched)
    }
}

/// Returns the requested columns of a stored row.
fn project(table: &str, row: &[Field], fields: &[Field]) -> StorageResult<Row> {
    fields
        .iter()
        .map(|wanted| {
            field::by_storage_name(row, wanted.storage_name())
                .map(|stored| wanted.with_value(stored.value().clone()))
                .ok_or_else(|| {
                    StorageError::from(DriverError::Failed {
                        backend: BACKEND.to_string(),
                        operation: format!("read {}", table),
                        message: format!("column {} does not exist", wanted.storage_name()),
                        source: None,
                    })
                })
        })
        .collect()
}

/// Applies a committed snapshot's changes to the main store.
fn replay(main: &mut MemoryStore, mut snapshot: MemoryStore) -> StorageResult<()> {
    let changes = snapshot.take_changes();

    for (table, rows) in snapshot.tables() {
        for row in rows {
            if let Some(id) = row_id(row)
                && changes.created.contains(&(table.clone(), id))
            {
                trace!(table = %table, id, "Replaying create");
                main.append(table, row.clone());
            }
        }
    }

    for (table, rows) in snapshot.tables() {
        for row in rows {
            let Some(id) = row_id(row) else { continue };
            if !changes.updated.contains(&(table.clone(), id)) {
                continue;
            }
            let Some(primary) = field::primary_of(row).cloned() else {
                continue;
            };
            trace!(table = %table, id, "Replaying update");
            if !main.update(table, row.clone(), &primary) {
                return Err(MemoryDriver::not_found(table, &primary));
            }
        }
    }

    for (table, primary) in &changes.removed {
        trace!(table = %table, key = %primary, "Replaying remove");
        if !main.remove(table, primary) {
            return Err(MemoryDriver::not_found(table, primary));
        }
    }

    main.raise_max_id(snapshot.max_id());
    Ok(())
}

impl Driver for MemoryDriver {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn get(
        &self,
        tx: &TxToken,
        table: &str,
        fields: &[Field],
        primary: &Field,
    ) -> StorageResult<Row> {
        self.with_store(tx, |store| match store.find(table, primary) {
            Some(row) => project(table, row, fields),
            None => Err(Self::not_found(table, primary)),
        })
    }

    fn create(
        &self,
        tx: &TxToken,
        table: &str,
        fields: Vec<Field>,
        primary: &Field,
    ) -> StorageResult<Value> {
        if primary.field_type() != FieldType::Int {
            return Err(DriverError::Unsupported {
                backend: BACKEND.to_string(),
                capability: format!(
                    "{} for {} keys",
                    DriverCapability::KeyAllocation,
                    primary.field_type()
                ),
            }
            .into());
        }

        self.with_store(tx, |store| {
            let id = store.insert(table, fields, primary);
            trace!(table, id, tx = %tx, "Created row");
            Ok(Value::Int(id))
        })
    }

    fn update(
        &self,
        tx: &TxToken,
        table: &str,
        fields: Vec<Field>,
        primary: &Field,
    ) -> StorageResult<()> {
        self.with_store(tx, |store| {
            if store.update(table, fields, primary) {
                Ok(())
            } else {
                Err(Self::not_found(table, primary))
            }
        })
    }

    fn all(&self, table: &str, fields: &[Field], ctx: &QueryContext) -> StorageResult<Vec<Row>> {
        self.with_store(ctx.tx(), |store| {
            store
                .rows(table)
                .iter()
                .map(|row| project(table, row, fields))
                .collect()
        })
    }

    fn filter(
        &self,
        table: &str,
        fields: &[Field],
        ctx: &QueryContext,
        predicate: &str,
        args: &[Value],
    ) -> StorageResult<Vec<Row>> {
        self.matching(table, fields, ctx, predicate, args)
    }

    fn first(
        &self,
        table: &str,
        fields: &[Field],
        ctx: &QueryContext,
        predicate: &str,
        args: &[Value],
    ) -> StorageResult<Row> {
        self.matching(table, fields, ctx, predicate, args)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ResourceError::NoMatch {
                    table: table.to_string(),
                    predicate: predicate.to_string(),
                }
                .into()
            })
    }

    fn remove(&self, tx: &TxToken, table: &str, primary: &Field) -> StorageResult<()> {
        self.with_store(tx, |store| {
            if store.remove(table, primary) {
                Ok(())
            } else {
                Err(Self::not_found(table, primary))
            }
        })
    }

    fn exec(&self, tx: &TxToken, statement: &str, args: &[Value]) -> StorageResult<()> {
        let mut state = self.state.lock();
        match tx {
            TxToken::None => {}
            TxToken::Snapshot(id) if state.snapshots.contains_key(id) => {}
            _ => return Err(Self::unknown(tx)),
        }

        state.last_exec = Some(ReceivedExec {
            tx: tx.clone(),
            statement: statement.to_string(),
            args: args.to_vec(),
        });
        Ok(())
    }

    fn has_transactions(&self) -> bool {
        self.config.transactions
    }

    fn begin(&self) -> StorageResult<TxToken> {
        if !self.config.transactions {
            return Err(DriverError::Unsupported {
                backend: BACKEND.to_string(),
                capability: DriverCapability::Transactions.to_string(),
            }
            .into());
        }

        let mut state = self.state.lock();
        let snapshot = state.main.snapshot();
        state.main.advance_max_id(self.config.key_stride());

        let id = SnapshotId::new();
        debug!(
            snapshot = %id.0,
            base_id = snapshot.max_id(),
            "Opened memory snapshot"
        );
        state.snapshots.insert(id, snapshot);
        Ok(TxToken::Snapshot(id))
    }

    fn rollback(&self, tx: &TxToken) {
        if let TxToken::Snapshot(id) = tx
            && self.state.lock().snapshots.remove(id).is_some()
        {
            debug!(snapshot = %id.0, "Discarded memory snapshot");
        }
    }

    fn commit(&self, tx: &TxToken) -> StorageResult<()> {
        let TxToken::Snapshot(id) = tx else {
            return Err(Self::unknown(tx));
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let snapshot = state.snapshots.remove(id).ok_or_else(|| Self::unknown(tx))?;

        replay(&mut state.main, snapshot).map_err(|err| DriverError::ReplayFailed {
            backend: BACKEND.to_string(),
            token: tx.to_string(),
            source: Box::new(err),
        })?;
        debug!(snapshot = %id.0, max_id = state.main.max_id(), "Committed memory snapshot");
        Ok(())
    }
}

//! Table storage for the memory driver.
//!
//! The driver keeps one [`MemoryStore`] for committed data and one per open
//! transaction. A transaction's store is a deep copy taken at begin that also
//! records which rows it created, updated and removed, so the commit can
//! replay exactly those effects onto the main store.

use std::collections::{BTreeMap, HashSet};

use crate::field::{self, Field, Row};
use crate::value::Value;

/// Row keys touched by a transaction, qualified by table.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChangeSet {
    pub(crate) created: HashSet<(String, i64)>,
    pub(crate) updated: HashSet<(String, i64)>,
    /// Removed rows as `(table, primary field)`, in removal order.
    pub(crate) removed: Vec<(String, Field)>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStore {
    tables: BTreeMap<String, Vec<Row>>,
    max_id: i64,
    changes: Option<ChangeSet>,
}

fn matches(row: &[Field], primary: &Field) -> bool {
    field::by_storage_name(row, primary.storage_name())
        .is_some_and(|stored| stored.value() == primary.value())
}

/// Returns the integer key of a stored row.
pub(crate) fn row_id(row: &[Field]) -> Option<i64> {
    field::primary_of(row).and_then(|f| f.value().as_int())
}

impl MemoryStore {
    /// Deep-copies the tables into a store that tracks changes.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            tables: self.tables.clone(),
            max_id: self.max_id,
            changes: Some(ChangeSet::default()),
        }
    }

    pub(crate) fn max_id(&self) -> i64 {
        self.max_id
    }

    /// Raises the key counter; never lowers it.
    pub(crate) fn raise_max_id(&mut self, to: i64) {
        self.max_id = self.max_id.max(to);
    }

    pub(crate) fn advance_max_id(&mut self, by: i64) {
        self.max_id = self.max_id.saturating_add(by);
    }

    pub(crate) fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn find(&self, table: &str, primary: &Field) -> Option<&Row> {
        self.rows(table).iter().find(|row| matches(row, primary))
    }

    /// Appends a row under a newly allocated key and returns the key.
    pub(crate) fn insert(&mut self, table: &str, mut row: Row, primary: &Field) -> i64 {
        self.max_id += 1;
        let id = self.max_id;

        match row
            .iter_mut()
            .find(|f| f.storage_name() == primary.storage_name())
        {
            Some(slot) => slot.set_value(Value::Int(id)),
            None => row.push(primary.with_value(id)),
        }

        self.tables.entry(table.to_string()).or_default().push(row);
        if let Some(changes) = &mut self.changes {
            changes.created.insert((table.to_string(), id));
        }
        id
    }

    /// Appends a row as-is, keeping its key.
    pub(crate) fn append(&mut self, table: &str, row: Row) {
        if let Some(id) = row_id(&row) {
            self.raise_max_id(id);
        }
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    /// Replaces the row matching `primary`. Returns false if none matches.
    pub(crate) fn update(&mut self, table: &str, row: Row, primary: &Field) -> bool {
        let Some(slot) = self
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| matches(r, primary)))
        else {
            return false;
        };
        *slot = row;

        if let (Some(changes), Some(id)) = (&mut self.changes, primary.value().as_int()) {
            let key = (table.to_string(), id);
            if !changes.created.contains(&key) {
                changes.updated.insert(key);
            }
        }
        true
    }

    /// Deletes the row matching `primary`. Returns false if none matches.
    pub(crate) fn remove(&mut self, table: &str, primary: &Field) -> bool {
        let Some(rows) = self.tables.get_mut(table) else {
            return false;
        };
        let Some(index) = rows.iter().position(|r| matches(r, primary)) else {
            return false;
        };
        rows.remove(index);

        if let (Some(changes), Some(id)) = (&mut self.changes, primary.value().as_int()) {
            let key = (table.to_string(), id);
            if !changes.created.remove(&key) {
                changes.updated.remove(&key);
                changes.removed.push((table.to_string(), primary.clone()));
            }
        }
        true
    }

    pub(crate) fn tables(&self) -> impl Iterator<Item = (&String, &Vec<Row>)> {
        self.tables.iter()
    }

    pub(crate) fn take_changes(&mut self) -> ChangeSet {
        self.changes.take().unwrap_or_default()
    }
}

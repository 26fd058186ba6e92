//! Record operations shared by sessions and transactions.
//!
//! Each function resolves the record's descriptor, builds the field list and
//! hands it to the driver. Errors leave here wrapped with the operation name
//! and the `Type (table)` label.

use crate::context::QueryContext;
use crate::core::{Driver, TxToken};
use crate::error::{StorageError, StorageResult};
use crate::model::{DescriptorCache, Model, mapping};
use crate::value::Value;

/// Returns the `Type (table)` label of `M`, or the bare type name if it does not resolve.
fn target<M: Model>(cache: &DescriptorCache) -> String {
    match cache.descriptor::<M>() {
        Ok(descriptor) => descriptor.label(),
        Err(_) => {
            let full = std::any::type_name::<M>();
            full.rsplit("::").next().unwrap_or(full).to_string()
        }
    }
}

fn annotate<M: Model, T>(
    cache: &DescriptorCache,
    operation: &'static str,
    result: StorageResult<T>,
) -> StorageResult<T> {
    result.map_err(|err: StorageError| err.during(operation, target::<M>(cache)))
}

pub(crate) fn get<M: Model>(
    driver: &dyn Driver,
    cache: &DescriptorCache,
    tx: &TxToken,
    id: Value,
) -> StorageResult<M> {
    let result = (|| -> StorageResult<M> {
        let descriptor = cache.descriptor::<M>()?;
        let primary = descriptor.primary()?.with_value(id);
        let row = driver.get(tx, descriptor.table(), descriptor.fields(), &primary)?;
        let mut record = M::default();
        mapping::populate(&mut record, row)?;
        Ok(record)
    })();
    annotate::<M, _>(cache, "get", result)
}

/// Inserts a new record and writes the assigned key back, or updates an existing one.
///
/// Returns true if the record was created.
pub(crate) fn save<M: Model>(
    driver: &dyn Driver,
    cache: &DescriptorCache,
    tx: &TxToken,
    record: &mut M,
) -> StorageResult<bool> {
    let result = (|| -> StorageResult<bool> {
        let descriptor = cache.descriptor::<M>()?;
        let primary = descriptor.primary()?;
        let fields = mapping::extract(record, &descriptor)?;

        if mapping::is_new(record, primary)? {
            let key = driver.create(tx, descriptor.table(), fields, primary)?;
            record.load_field(primary.name(), key)?;
            Ok(true)
        } else {
            let current = mapping::primary_field_of(record, primary)?;
            driver.update(tx, descriptor.table(), fields, &current)?;
            Ok(false)
        }
    })();
    annotate::<M, _>(cache, "save", result)
}

pub(crate) fn remove<M: Model>(
    driver: &dyn Driver,
    cache: &DescriptorCache,
    tx: &TxToken,
    record: &M,
) -> StorageResult<()> {
    let result = (|| -> StorageResult<()> {
        let descriptor = cache.descriptor::<M>()?;
        let primary = mapping::primary_field_of(record, descriptor.primary()?)?;
        driver.remove(tx, descriptor.table(), &primary)
    })();
    annotate::<M, _>(cache, "remove", result)
}

pub(crate) fn all<M: Model>(
    driver: &dyn Driver,
    cache: &DescriptorCache,
    ctx: &QueryContext,
) -> StorageResult<Vec<M>> {
    let result = (|| -> StorageResult<Vec<M>> {
        let descriptor = cache.descriptor::<M>()?;
        let rows = driver.all(descriptor.table(), descriptor.fields(), ctx)?;
        let mut records = Vec::new();
        mapping::populate_rows(&mut records, rows)?;
        Ok(records)
    })();
    annotate::<M, _>(cache, "list", result)
}

pub(crate) fn filter<M: Model>(
    driver: &dyn Driver,
    cache: &DescriptorCache,
    ctx: &QueryContext,
    predicate: &str,
    args: &[Value],
) -> StorageResult<Vec<M>> {
    let result = (|| -> StorageResult<Vec<M>> {
        let descriptor = cache.descriptor::<M>()?;
        let rows = driver.filter(
            descriptor.table(),
            descriptor.fields(),
            ctx,
            predicate,
            args,
        )?;
        let mut records = Vec::new();
        mapping::populate_rows(&mut records, rows)?;
        Ok(records)
    })();
    annotate::<M, _>(cache, "filter", result)
}

pub(crate) fn first<M: Model>(
    driver: &dyn Driver,
    cache: &DescriptorCache,
    ctx: &QueryContext,
    predicate: &str,
    args: &[Value],
) -> StorageResult<M> {
    let result = (|| -> StorageResult<M> {
        let descriptor = cache.descriptor::<M>()?;
        let row = driver.first(
            descriptor.table(),
            descriptor.fields(),
            ctx,
            predicate,
            args,
        )?;
        let mut record = M::default();
        mapping::populate(&mut record, row)?;
        Ok(record)
    })();
    annotate::<M, _>(cache, "find first", result)
}

pub(crate) fn exec(
    driver: &dyn Driver,
    tx: &TxToken,
    statement: &str,
    args: &[Value],
) -> StorageResult<()> {
    driver
        .exec(tx, statement, args)
        .map_err(|err| err.during("exec", format!("'{}'", statement)))
}

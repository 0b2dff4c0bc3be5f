// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Secondary index maintenance.

use std::marker::PhantomData;

use tracing::debug;

use crate::storage::{
    build_key, partial_key, prefix_upper_bound, split_key, Key, OrderedStore, Value,
    MAX_KEY_SIZE,
};
use crate::txn::{UnitOfWork, WriteOrigin};

use super::{index_values, IndexSpec, Record, RecordError, INDEX_SENTINEL};

/// Stages index entries of kind `R` alongside primary writes.
#[derive(Debug)]
pub struct IndexMaintainer<R> {
    _kind: PhantomData<fn() -> R>,
}

impl<R> Default for IndexMaintainer<R> {
    fn default() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<R: Record> IndexMaintainer<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages one sentinel entry per spec, keyed by the record's current
    /// field values followed by its id.
    pub fn add_indexes<S: OrderedStore + ?Sized>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        record: &R,
        specs: &[IndexSpec],
    ) -> Result<(), RecordError> {
        for spec in specs {
            let values = index_values(record, spec)?;
            self.put_entry(uow, record.id(), spec, &values)?;
        }
        Ok(())
    }

    /// Stages removal of every entry [`add_indexes`](Self::add_indexes)
    /// would write. Absent entries are ignored.
    pub fn remove_indexes<S: OrderedStore + ?Sized>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        record: &R,
        specs: &[IndexSpec],
    ) -> Result<(), RecordError> {
        for spec in specs {
            let values = index_values(record, spec)?;
            self.delete_entry(uow, record.id(), spec, &values)?;
        }
        Ok(())
    }

    /// Moves the entry of `spec` for `id` from `old_values` to `new_values`.
    ///
    /// The delete and the put are two staged writes. They only land together
    /// when the unit of work commits atomically.
    pub fn rekey_index<S: OrderedStore + ?Sized>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        id: &str,
        spec: &IndexSpec,
        old_values: &[String],
        new_values: &[String],
    ) -> Result<(), RecordError> {
        if old_values == new_values {
            return Ok(());
        }

        debug!(index = spec.name, id, "Rekeying index entry");
        self.delete_entry(uow, id, spec, old_values)?;
        self.put_entry(uow, id, spec, new_values)
    }

    /// Checks that every entry [`add_indexes`](Self::add_indexes) would
    /// write for `record` fits within the store's key size limit.
    pub fn check_key_sizes(&self, record: &R, specs: &[IndexSpec]) -> Result<(), RecordError> {
        for spec in specs {
            let values = index_values(record, spec)?;
            let key = Self::entry_key(record.id(), spec, &values)?;
            if key.len() > MAX_KEY_SIZE {
                return Err(RecordError::InvalidArgument(format!(
                    "index {} entry for {} {} is {} bytes, max {MAX_KEY_SIZE}",
                    spec.name,
                    R::DOC_TYPE,
                    record.id(),
                    key.len()
                )));
            }
        }
        Ok(())
    }

    /// Resolves the ids of every entry of `spec` whose leading segments equal
    /// `leading_values`, in key order.
    ///
    /// Reads committed state only. Works on any store that can range scan.
    pub fn index_ids<S: OrderedStore + ?Sized>(
        &self,
        store: &S,
        spec: &IndexSpec,
        leading_values: &[&str],
    ) -> Result<Vec<String>, RecordError> {
        if leading_values.len() > spec.fields.len() {
            return Err(RecordError::InvalidArgument(format!(
                "index {} has {} fields, got {} values",
                spec.name,
                spec.fields.len(),
                leading_values.len()
            )));
        }

        let prefix = partial_key(spec.name, leading_values)?;
        let end = prefix_upper_bound(&prefix).unwrap_or_default();

        let mut ids = Vec::new();
        for entry in store.scan(&prefix, &end)? {
            let (key, _) = entry?;
            let (_, mut segments) = split_key(&key)?;
            // Entries hold every field plus the id
            if segments.len() != spec.fields.len() + 1 {
                continue;
            }
            if let Some(id) = segments.pop() {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn entry_key(id: &str, spec: &IndexSpec, values: &[String]) -> Result<Key, RecordError> {
        if values.len() != spec.fields.len() {
            return Err(RecordError::InvalidArgument(format!(
                "index {} has {} fields, got {} values",
                spec.name,
                spec.fields.len(),
                values.len()
            )));
        }

        let mut segments: Vec<&str> = values.iter().map(String::as_str).collect();
        segments.push(id);
        Ok(build_key(spec.name, segments.as_slice())?)
    }

    fn put_entry<S: OrderedStore + ?Sized>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        id: &str,
        spec: &IndexSpec,
        values: &[String],
    ) -> Result<(), RecordError> {
        let key = Self::entry_key(id, spec, values)?;
        uow.put(key, Value::from(INDEX_SENTINEL), origin(spec, id))?;
        Ok(())
    }

    fn delete_entry<S: OrderedStore + ?Sized>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        id: &str,
        spec: &IndexSpec,
        values: &[String],
    ) -> Result<(), RecordError> {
        let key = Self::entry_key(id, spec, values)?;
        uow.delete(key, origin(spec, id))?;
        Ok(())
    }
}

fn origin(spec: &IndexSpec, id: &str) -> WriteOrigin {
    WriteOrigin::Index {
        index: spec.name,
        id: id.to_string(),
    }
}

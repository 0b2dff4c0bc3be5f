// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Primary entries: id to serialized record.

use std::marker::PhantomData;

use crate::storage::{validate_primary_id, Key, OrderedStore};
use crate::txn::{UnitOfWork, WriteOrigin};

use super::{decode_record_strict, encode_record, Record, RecordError};

/// Reads and stages primary entries of kind `R`.
#[derive(Debug)]
pub struct RecordStore<R> {
    _kind: PhantomData<fn() -> R>,
}

impl<R> Default for RecordStore<R> {
    fn default() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<R: Record> RecordStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any record is stored under `id`.
    pub fn exists<S: OrderedStore + ?Sized>(
        &self,
        uow: &UnitOfWork<'_, S>,
        id: &str,
    ) -> Result<bool, RecordError> {
        validate_primary_id(id)?;
        Ok(uow.get(&Key::from(id))?.is_some())
    }

    /// Reads the record stored under `id`.
    pub fn get<S: OrderedStore + ?Sized>(
        &self,
        uow: &UnitOfWork<'_, S>,
        id: &str,
    ) -> Result<R, RecordError> {
        validate_primary_id(id)?;
        match uow.get(&Key::from(id))? {
            Some(value) => decode_record_strict(id, value.as_bytes()),
            None => Err(RecordError::NotFound {
                kind: R::DOC_TYPE,
                id: id.to_string(),
            }),
        }
    }

    /// Stages an unconditional overwrite of the primary entry.
    pub fn put<S: OrderedStore + ?Sized>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        record: &R,
    ) -> Result<(), RecordError> {
        validate_primary_id(record.id())?;
        let value = encode_record(record)?;
        uow.put(
            Key::from(record.id()),
            value,
            WriteOrigin::Primary {
                id: record.id().to_string(),
            },
        )?;
        Ok(())
    }

    /// Stages removal of the primary entry. Fails with `NotFound` if absent.
    pub fn delete<S: OrderedStore + ?Sized>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        id: &str,
    ) -> Result<(), RecordError> {
        if !self.exists(uow, id)? {
            return Err(RecordError::NotFound {
                kind: R::DOC_TYPE,
                id: id.to_string(),
            });
        }

        uow.delete(Key::from(id), WriteOrigin::Primary { id: id.to_string() })?;
        Ok(())
    }
}

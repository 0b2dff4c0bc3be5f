// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! In-memory ordered store backed by a `BTreeMap`.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use super::{
    validate_key, validate_value, Atomicity, Key, KeyLocks, KvIter, Mutation, OrderedStore,
    StoreError, Value,
};

/// In-memory ordered store.
///
/// Scans iterate over a snapshot taken under the read lock, so a scan never
/// observes half of a concurrent batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Key, Value>>,
    atomicity: Atomicity,
    locks: KeyLocks,
}

impl MemoryStore {
    /// Creates an empty store with atomic batches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that advertises the given batch atomicity.
    ///
    /// With [`Atomicity::PerWrite`] batches are applied entry by entry and a
    /// failing entry leaves the earlier ones in place.
    pub fn with_atomicity(atomicity: Atomicity) -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            atomicity,
            locks: KeyLocks::new(),
        }
    }

    /// Returns the number of stored entries, index entries included.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns a copy of every entry in key order.
    pub fn dump(&self) -> Vec<(Key, Value)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
        validate_key(&key)?;
        validate_value(&value)?;

        self.data.write().insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<(), StoreError> {
        validate_key(key)?;

        self.data.write().remove(key);
        Ok(())
    }

    fn write_batch(&self, batch: Vec<Mutation>) -> Result<(), StoreError> {
        if self.atomicity == Atomicity::PerWrite {
            for mutation in batch {
                match mutation {
                    Mutation::Put { key, value } => self.put(key, value)?,
                    Mutation::Delete { key } => self.delete(&key)?,
                }
            }
            return Ok(());
        }

        // Validate everything before touching the map
        for mutation in &batch {
            validate_key(mutation.key())?;
            if let Mutation::Put { value, .. } = mutation {
                validate_value(value)?;
            }
        }

        let mut data = self.data.write();
        for mutation in batch {
            match mutation {
                Mutation::Put { key, value } => {
                    data.insert(key, value);
                }
                Mutation::Delete { key } => {
                    data.remove(&key);
                }
            }
        }

        Ok(())
    }

    fn atomicity(&self) -> Atomicity {
        self.atomicity
    }

    fn key_locks(&self) -> &KeyLocks {
        &self.locks
    }

    fn scan<'a>(&'a self, start: &Key, end: &Key) -> Result<KvIter<'a>, StoreError> {
        validate_key(start)?;
        validate_key(end)?;

        if !end.is_empty() && start >= end {
            return Ok(Box::new(std::iter::empty()));
        }

        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end.clone())
        };

        let snapshot: Vec<_> = self
            .data
            .read()
            .range((Bound::Included(start.clone()), upper))
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();

        Ok(Box::new(snapshot.into_iter()))
    }
}

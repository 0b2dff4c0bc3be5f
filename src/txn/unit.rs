// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Unit-of-work staging and commit.

use std::fmt;

use tracing::{debug, error, warn};

use crate::storage::{
    validate_key, validate_value, Atomicity, Key, Mutation, OrderedStore, StoreError, Value,
};

use super::TxnError;

/// Unit-of-work state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Active,
    Committed,
    Aborted,
}

/// What a staged write belongs to. Used to attribute commit failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOrigin {
    /// The primary entry of a record.
    Primary { id: String },
    /// An index entry of a record.
    Index { index: &'static str, id: String },
}

impl WriteOrigin {
    /// Returns the id of the record the write belongs to.
    pub fn record_id(&self) -> &str {
        match self {
            WriteOrigin::Primary { id } | WriteOrigin::Index { id, .. } => id,
        }
    }
}

impl fmt::Display for WriteOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOrigin::Primary { id } => write!(f, "record {id}"),
            WriteOrigin::Index { index, id } => write!(f, "index {index} of record {id}"),
        }
    }
}

#[derive(Debug)]
struct StagedWrite {
    key: Key,
    /// `None` stages a delete.
    value: Option<Value>,
    origin: WriteOrigin,
}

/// A set of writes staged against one store and committed together.
#[derive(Debug)]
pub struct UnitOfWork<'s, S: OrderedStore + ?Sized> {
    store: &'s S,
    state: UnitState,
    writes: Vec<StagedWrite>,
}

impl<'s, S: OrderedStore + ?Sized> UnitOfWork<'s, S> {
    /// Begins a new unit of work.
    pub fn begin(store: &'s S) -> Self {
        Self {
            store,
            state: UnitState::Active,
            writes: Vec::new(),
        }
    }

    /// Returns the underlying store.
    #[inline]
    pub fn store(&self) -> &'s S {
        self.store
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Returns the number of staged writes.
    #[inline]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Reads a key, seeing writes staged in this unit first.
    pub fn get(&self, key: &Key) -> Result<Option<Value>, TxnError> {
        self.ensure_active()?;

        if let Some(staged) = self.writes.iter().find(|w| &w.key == key) {
            return Ok(staged.value.clone());
        }

        Ok(self.store.get(key)?)
    }

    /// Stages a put.
    pub fn put(&mut self, key: Key, value: Value, origin: WriteOrigin) -> Result<(), TxnError> {
        self.ensure_active()?;

        if let Err(source) = validate_key(&key).and_then(|_| validate_value(&value)) {
            return Err(TxnError::Staging { origin, source });
        }

        self.stage(key, Some(value), origin);
        Ok(())
    }

    /// Stages a delete. Deleting a key that does not exist is not an error.
    pub fn delete(&mut self, key: Key, origin: WriteOrigin) -> Result<(), TxnError> {
        self.ensure_active()?;

        if let Err(source) = validate_key(&key) {
            return Err(TxnError::Staging { origin, source });
        }

        self.stage(key, None, origin);
        Ok(())
    }

    /// Commits every staged write. Returns the number of writes applied.
    pub fn commit(&mut self) -> Result<usize, TxnError> {
        self.ensure_active()?;

        let count = self.writes.len();
        let result = if count == 0 {
            Ok(())
        } else {
            match self.store.atomicity() {
                Atomicity::Atomic => self.apply_atomic(),
                Atomicity::PerWrite => self.apply_with_undo(),
            }
        };

        match result {
            Ok(()) => {
                self.state = UnitState::Committed;
                debug!(writes = count, "Committed unit of work");
                Ok(count)
            }
            Err(e) => {
                self.state = UnitState::Aborted;
                Err(e)
            }
        }
    }

    /// Discards every staged write.
    pub fn abort(&mut self) -> Result<(), TxnError> {
        self.ensure_active()?;

        self.writes.clear();
        self.state = UnitState::Aborted;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), TxnError> {
        match self.state {
            UnitState::Active => Ok(()),
            UnitState::Committed => Err(TxnError::AlreadyCommitted),
            UnitState::Aborted => Err(TxnError::AlreadyAborted),
        }
    }

    fn stage(&mut self, key: Key, value: Option<Value>, origin: WriteOrigin) {
        // Last write to a key wins
        if let Some(existing) = self.writes.iter_mut().find(|w| w.key == key) {
            existing.value = value;
            existing.origin = origin;
        } else {
            self.writes.push(StagedWrite { key, value, origin });
        }
    }

    fn apply_atomic(&self) -> Result<(), TxnError> {
        let batch = self
            .writes
            .iter()
            .map(|w| match &w.value {
                Some(value) => Mutation::Put {
                    key: w.key.clone(),
                    value: value.clone(),
                },
                None => Mutation::Delete { key: w.key.clone() },
            })
            .collect();

        self.store.write_batch(batch).map_err(TxnError::Batch)
    }

    fn apply_with_undo(&self) -> Result<(), TxnError> {
        let mut undo: Vec<(Key, Option<Value>)> = Vec::with_capacity(self.writes.len());

        for write in &self.writes {
            let prior = match self.store.get(&write.key) {
                Ok(prior) => prior,
                Err(source) => return Err(self.compensate(undo, &write.origin, source)),
            };

            let applied = match &write.value {
                Some(value) => self.store.put(write.key.clone(), value.clone()),
                None => self.store.delete(&write.key),
            };
            if let Err(source) = applied {
                return Err(self.compensate(undo, &write.origin, source));
            }

            undo.push((write.key.clone(), prior));
        }

        Ok(())
    }

    fn compensate(
        &self,
        undo: Vec<(Key, Option<Value>)>,
        origin: &WriteOrigin,
        source: StoreError,
    ) -> TxnError {
        for (key, prior) in undo.into_iter().rev() {
            let restored = match prior {
                Some(value) => self.store.put(key, value),
                None => self.store.delete(&key),
            };

            if let Err(undo_err) = restored {
                error!(
                    origin = %origin,
                    error = %source,
                    undo_error = %undo_err,
                    "Rollback failed, record and indexes may be inconsistent"
                );
                return TxnError::RepairRequired {
                    origin: origin.clone(),
                    source,
                    undo: undo_err,
                };
            }
        }

        warn!(origin = %origin, error = %source, "Rolled back partially applied unit of work");
        TxnError::Compensated {
            origin: origin.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KvIter, MemoryStore};
    use parking_lot::Mutex;

    /// Per-write store that fails puts on keys with a given prefix, and
    /// optionally fails every delete.
    struct FlakyStore {
        inner: MemoryStore,
        fail_put_prefix: Mutex<Option<Vec<u8>>>,
        fail_deletes: Mutex<bool>,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::with_atomicity(Atomicity::PerWrite),
                fail_put_prefix: Mutex::new(None),
                fail_deletes: Mutex::new(false),
            }
        }

        fn fail_puts_under(&self, prefix: &str) {
            *self.fail_put_prefix.lock() = Some(prefix.as_bytes().to_vec());
        }
    }

    impl OrderedStore for FlakyStore {
        fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
            if let Some(prefix) = self.fail_put_prefix.lock().as_ref() {
                if key.as_bytes().starts_with(prefix) {
                    return Err(StoreError::Io(std::io::Error::other("injected put failure")));
                }
            }
            self.inner.put(key, value)
        }

        fn delete(&self, key: &Key) -> Result<(), StoreError> {
            if *self.fail_deletes.lock() {
                return Err(StoreError::Io(std::io::Error::other("injected delete failure")));
            }
            self.inner.delete(key)
        }

        fn write_batch(&self, _batch: Vec<Mutation>) -> Result<(), StoreError> {
            Err(StoreError::Unsupported("write_batch"))
        }

        fn atomicity(&self) -> Atomicity {
            Atomicity::PerWrite
        }

        fn scan<'a>(&'a self, start: &Key, end: &Key) -> Result<KvIter<'a>, StoreError> {
            self.inner.scan(start, end)
        }
    }

    fn primary(id: &str) -> WriteOrigin {
        WriteOrigin::Primary { id: id.to_string() }
    }

    fn index(id: &str) -> WriteOrigin {
        WriteOrigin::Index {
            index: "classID~name",
            id: id.to_string(),
        }
    }

    #[test]
    fn test_begin() {
        let store = MemoryStore::new();
        let unit = UnitOfWork::begin(&store);

        assert_eq!(unit.state(), UnitState::Active);
        assert_eq!(unit.write_count(), 0);
    }

    #[test]
    fn test_read_your_writes() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::begin(&store);

        let key = Key::from("lab1");
        unit.put(key.clone(), Value::from("v1"), primary("lab1")).unwrap();

        assert_eq!(unit.get(&key).unwrap(), Some(Value::from("v1")));
        // Nothing reaches the store before commit
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn test_staged_delete_hides_stored_value() {
        let store = MemoryStore::new();
        store.put(Key::from("lab1"), Value::from("v1")).unwrap();

        let mut unit = UnitOfWork::begin(&store);
        unit.delete(Key::from("lab1"), primary("lab1")).unwrap();
        assert_eq!(unit.get(&Key::from("lab1")).unwrap(), None);
    }

    #[test]
    fn test_write_updates_existing() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::begin(&store);

        let key = Key::from("key");
        unit.put(key.clone(), Value::from("v1"), primary("key")).unwrap();
        unit.put(key.clone(), Value::from("v2"), primary("key")).unwrap();

        assert_eq!(unit.get(&key).unwrap(), Some(Value::from("v2")));
        assert_eq!(unit.write_count(), 1);
    }

    #[test]
    fn test_commit_atomic() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::begin(&store);

        unit.put(Key::from("lab1"), Value::from("v"), primary("lab1")).unwrap();
        unit.put(Key::from("idx"), Value::new(vec![0]), index("lab1")).unwrap();

        assert_eq!(unit.commit().unwrap(), 2);
        assert_eq!(unit.state(), UnitState::Committed);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_abort_discards_writes() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::begin(&store);

        unit.put(Key::from("lab1"), Value::from("v"), primary("lab1")).unwrap();
        unit.abort().unwrap();

        assert!(store.is_empty());
        assert!(matches!(unit.get(&Key::from("lab1")), Err(TxnError::AlreadyAborted)));
        assert!(matches!(unit.commit(), Err(TxnError::AlreadyAborted)));
    }

    #[test]
    fn test_double_commit() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::begin(&store);
        unit.commit().unwrap();

        assert!(matches!(unit.commit(), Err(TxnError::AlreadyCommitted)));
    }

    #[test]
    fn test_staging_rejects_oversized_key() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::begin(&store);

        let key = Key::new(vec![b'k'; crate::storage::MAX_KEY_SIZE + 1]);
        let result = unit.put(key, Value::from("v"), index("lab1"));

        assert!(matches!(
            result,
            Err(TxnError::Staging {
                origin: WriteOrigin::Index { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_per_write_commit_applies_in_order() {
        let store = FlakyStore::new();
        let mut unit = UnitOfWork::begin(&store);

        unit.put(Key::from("lab1"), Value::from("v"), primary("lab1")).unwrap();
        unit.put(Key::from("idx1"), Value::new(vec![0]), index("lab1")).unwrap();

        unit.commit().unwrap();
        assert_eq!(store.inner.len(), 2);
    }

    #[test]
    fn test_per_write_failure_is_compensated() {
        let store = FlakyStore::new();
        store.inner.put(Key::from("lab1"), Value::from("old")).unwrap();
        store.fail_puts_under("idx");

        let mut unit = UnitOfWork::begin(&store);
        unit.put(Key::from("lab1"), Value::from("new"), primary("lab1")).unwrap();
        unit.put(Key::from("lab2"), Value::from("fresh"), primary("lab2")).unwrap();
        unit.put(Key::from("idx1"), Value::new(vec![0]), index("lab1")).unwrap();

        let err = unit.commit().unwrap_err();
        assert!(matches!(
            err,
            TxnError::Compensated {
                origin: WriteOrigin::Index { .. },
                ..
            }
        ));
        assert_eq!(unit.state(), UnitState::Aborted);

        // Earlier writes were undone
        assert_eq!(store.get(&Key::from("lab1")).unwrap(), Some(Value::from("old")));
        assert_eq!(store.get(&Key::from("lab2")).unwrap(), None);
    }

    #[test]
    fn test_failed_rollback_requires_repair() {
        let store = FlakyStore::new();
        store.fail_puts_under("idx");

        let mut unit = UnitOfWork::begin(&store);
        unit.put(Key::from("lab1"), Value::from("v"), primary("lab1")).unwrap();
        unit.put(Key::from("idx1"), Value::new(vec![0]), index("lab1")).unwrap();

        // Undoing the primary put needs a delete, which now fails
        *store.fail_deletes.lock() = true;

        let err = unit.commit().unwrap_err();
        assert!(matches!(err, TxnError::RepairRequired { .. }));
        assert!(store.get(&Key::from("lab1")).unwrap().is_some());
    }

    #[test]
    fn test_atomic_batch_failure_writes_nothing() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::begin(&store);

        unit.put(Key::from("lab1"), Value::from("v"), primary("lab1")).unwrap();
        // Bypass staging validation to force a store-side rejection
        unit.writes.push(StagedWrite {
            key: Key::new(vec![b'k'; crate::storage::MAX_KEY_SIZE + 1]),
            value: Some(Value::from("v")),
            origin: index("lab1"),
        });

        assert!(matches!(unit.commit(), Err(TxnError::Batch(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(primary("lab1").to_string(), "record lab1");
        assert_eq!(index("lab1").to_string(), "index classID~name of record lab1");
        assert_eq!(index("lab1").record_id(), "lab1");
    }
}

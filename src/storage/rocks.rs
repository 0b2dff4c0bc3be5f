// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! RocksDB-backed ordered store implementation.

use std::path::Path;

use rocksdb::{
    DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options, WriteBatch, WriteOptions,
};
use tracing::info;

use crate::config::StoreConfig;

use super::{
    validate_key, validate_value, Atomicity, Key, KeyLocks, KvIter, Mutation, OrderedStore,
    StoreError, Value,
};

/// Durability mode for write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Writes are synced to WAL but not fsynced to disk.
    /// Durable against process crashes but not power failures.
    #[default]
    WalOnly,
    /// Writes are fsynced to disk on every operation.
    FsyncEveryWrite,
}

/// RocksDB-backed ordered store.
///
/// Batches go through a single `WriteBatch`, so they are atomic.
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    write_opts: WriteOptions,
    locks: KeyLocks,
}

impl RocksStore {
    /// Opens or creates a RocksDB database at the given path.
    ///
    /// Uses `DurabilityMode::WalOnly` by default (fast, durable against process crash).
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_config(&StoreConfig::new(path))
    }

    /// Opens a database according to `config`.
    pub fn open_with_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(4);
        opts.set_level_compaction_dynamic_level_bytes(true);

        // Bloom filters for point lookups
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);

        if config.create_if_missing {
            std::fs::create_dir_all(&config.path)?;
        }
        let db = DBWithThreadMode::open(&opts, &config.path)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(config.durability == DurabilityMode::FsyncEveryWrite);

        info!(path = %config.path.display(), durability = ?config.durability, "Opened record store");

        Ok(Self {
            db,
            write_opts,
            locks: KeyLocks::new(),
        })
    }

    /// Forces a flush of memtables to disk.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl OrderedStore for RocksStore {
    fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        Ok(self.db.get(key.as_bytes())?.map(Value::new))
    }

    fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
        validate_key(&key)?;
        validate_value(&value)?;

        self.db.put_opt(key.as_bytes(), value.as_bytes(), &self.write_opts)?;
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<(), StoreError> {
        validate_key(key)?;

        self.db.delete_opt(key.as_bytes(), &self.write_opts)?;
        Ok(())
    }

    fn write_batch(&self, batch: Vec<Mutation>) -> Result<(), StoreError> {
        let mut wb = WriteBatch::default();

        for mutation in batch {
            validate_key(mutation.key())?;
            match mutation {
                Mutation::Put { key, value } => {
                    validate_value(&value)?;
                    wb.put(key.as_bytes(), value.as_bytes());
                }
                Mutation::Delete { key } => wb.delete(key.as_bytes()),
            }
        }

        self.db.write_opt(wb, &self.write_opts)?;
        Ok(())
    }

    fn atomicity(&self) -> Atomicity {
        Atomicity::Atomic
    }

    fn key_locks(&self) -> &KeyLocks {
        &self.locks
    }

    fn scan<'a>(&'a self, start: &Key, end: &Key) -> Result<KvIter<'a>, StoreError> {
        validate_key(start)?;
        validate_key(end)?;

        let end = end.clone();
        let iter = self
            .db
            .iterator(IteratorMode::From(start.as_bytes(), Direction::Forward))
            .map(|item| {
                item.map(|(k, v)| (Key::new(k.into_vec()), Value::new(v.into_vec())))
                    .map_err(StoreError::from)
            })
            .take_while(move |item| match item {
                Ok((key, _)) => end.is_empty() || *key < end,
                Err(_) => true,
            });

        Ok(Box::new(iter))
    }
}

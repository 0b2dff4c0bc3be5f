// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Sharded key locks for read-check-write sequences.
//!
//! A record mutation reads the primary entry, checks it, and commits a batch.
//! Holding the key's lock across those steps serializes mutations of one
//! record without blocking mutations of other records in other shards.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use parking_lot::{Mutex, MutexGuard};

use super::Key;

const NUM_SHARDS: usize = 256;

/// Lock table keyed by store key.
///
/// Keys hashing to the same shard share one mutex. A thread must not hold two
/// guards at once, since two keys may map to the same shard.
pub struct KeyLocks {
    shards: [Mutex<()>; NUM_SHARDS],
}

impl KeyLocks {
    /// Creates a new lock table.
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Blocks until the lock covering `key` is free and returns its guard.
    pub fn lock(&self, key: &Key) -> MutexGuard<'_, ()> {
        self.shards[self.shard_index(key)].lock()
    }

    /// Process-wide table for stores that do not carry their own.
    pub(crate) fn shared() -> &'static KeyLocks {
        static SHARED: OnceLock<KeyLocks> = OnceLock::new();
        SHARED.get_or_init(KeyLocks::new)
    }

    /// Computes the shard index for a key.
    #[inline]
    fn shard_index(&self, key: &Key) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as usize % NUM_SHARDS
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLocks")
            .field("shards", &NUM_SHARDS)
            .finish()
    }
}

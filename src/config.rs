// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for stores and queries.

use std::path::PathBuf;

use crate::storage::DurabilityMode;

/// Configuration for opening a [`RocksStore`](crate::storage::RocksStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database directory.
    pub path: PathBuf,
    /// Durability of individual writes and batches.
    pub durability: DurabilityMode,
    /// Create the database if it does not exist.
    pub create_if_missing: bool,
    /// Memtable size in bytes.
    pub write_buffer_size: usize,
}

impl StoreConfig {
    /// Creates a configuration for the database at `path` with defaults.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            durability: DurabilityMode::default(),
            create_if_missing: true,
            write_buffer_size: 64 * 1024 * 1024, // 64MB
        }
    }

    /// Sets the durability mode.
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Fails on open instead of creating a missing database.
    pub fn must_exist(mut self) -> Self {
        self.create_if_missing = false;
        self
    }

    /// Sets the memtable size.
    pub fn with_write_buffer_size(mut self, bytes: usize) -> Self {
        self.write_buffer_size = bytes;
        self
    }
}

/// Limits applied by the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Largest page a paginated query may request.
    pub max_page_size: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
        }
    }
}

impl QueryLimits {
    /// Sets the largest accepted page size.
    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }
}

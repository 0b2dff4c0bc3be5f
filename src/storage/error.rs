// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Storage error types.

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key too large: {size} > {max}")]
    KeyTooLarge { size: usize, max: usize },

    #[error("value too large: {size} > {max}")]
    ValueTooLarge { size: usize, max: usize },

    #[error("invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

/// Errors produced by the composite key codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("index name must not be empty")]
    EmptyIndexName,

    #[error("index name {name:?} contains the reserved 0x00 byte")]
    ReservedByte { name: String },

    #[error("record id must not be empty")]
    EmptyId,

    #[error("record id {id:?} starts with the index namespace byte")]
    IdInIndexNamespace { id: String },

    #[error("malformed composite key: {0}")]
    Malformed(String),

    #[error("composite key segment is not valid UTF-8")]
    InvalidUtf8,
}

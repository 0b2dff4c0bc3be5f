// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Ordered key-value storage layer.
//!
//! This module provides the store abstraction the record layer is built on:
//! bytewise-ordered keys, range scans with opaque bookmarks, equality rich
//! queries over JSON documents, and write batches whose atomicity is an
//! explicit capability of the backend.
//!
//! # Keyspaces
//!
//! Primary records live under their id. Index entries live under composite
//! keys starting with `0x00` (see [`build_key`]), which sort below every
//! primary id. Scans over the primary keyspace start at
//! [`PRIMARY_KEYSPACE_START`] and never see index entries.
//!
//! # Example
//!
//! ```no_run
//! use labstore::storage::{build_key, Key, MemoryStore, OrderedStore, Selector, Value};
//!
//! let store = MemoryStore::new();
//! store.put(Key::from("lab1"), Value::from(r#"{"docType":"lab","classID":"c1"}"#)).unwrap();
//! store.put(build_key("classID~name", &["c1", "lab1"]).unwrap(), Value::new(vec![0])).unwrap();
//!
//! let selector = Selector::new().eq("docType", "lab").eq("classID", "c1");
//! for entry in store.rich_query(&selector).unwrap() {
//!     let (key, _) = entry.unwrap();
//!     println!("matched {:?}", key);
//! }
//! ```

mod error;
mod key;
mod locks;
mod memory;
mod ordered;
mod page;
mod rocks;
mod selector;

pub use error::{KeyError, StoreError};
pub use key::{
    build_key, is_index_key, partial_key, prefix_upper_bound, split_key, validate_primary_id,
    INDEX_NAMESPACE, PRIMARY_KEYSPACE_START,
};
pub use locks::KeyLocks;
pub use memory::MemoryStore;
pub(crate) use ordered::{validate_key, validate_value};
pub use ordered::{
    Atomicity, Key, KvIter, KvPage, Mutation, OrderedStore, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE,
};
pub use rocks::{DurabilityMode, RocksStore};
pub use selector::Selector;

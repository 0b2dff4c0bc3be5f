// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Ordered key-value store types and trait definitions.

use super::error::StoreError;
use super::key::PRIMARY_KEYSPACE_START;
use super::locks::KeyLocks;
use super::page::{collect_page, exhausted_page, resume_key};
use super::selector::{filter_matching, Selector};

/// Maximum key size in bytes.
pub const MAX_KEY_SIZE: usize = 8 * 1024; // 8KB

/// Maximum value size in bytes.
pub const MAX_VALUE_SIZE: usize = 64 * 1024 * 1024; // 64MB

/// A key in the ordered store.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(pub Vec<u8>);

impl Key {
    /// Creates a new key from bytes.
    #[inline]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the key bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the key.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A value in the ordered store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value(pub Vec<u8>);

impl Value {
    /// Creates a new value from bytes.
    #[inline]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the value bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the value.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Value {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A single write in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put { key: Key, value: Value },
    Delete { key: Key },
}

impl Mutation {
    /// Returns the key this mutation touches.
    #[inline]
    pub fn key(&self) -> &Key {
        match self {
            Mutation::Put { key, .. } | Mutation::Delete { key } => key,
        }
    }
}

/// How a store applies a batch of writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Atomicity {
    /// The whole batch becomes visible at once or not at all.
    #[default]
    Atomic,
    /// Writes land one at a time; a failure can leave a prefix applied.
    PerWrite,
}

/// One page of a paginated scan or query.
#[derive(Debug, Clone, Default)]
pub struct KvPage {
    pub entries: Vec<(Key, Value)>,
    /// Number of entries the store fetched for this page.
    pub fetched_count: u32,
    /// Opaque resume token. Pass it back verbatim to fetch the next page.
    pub bookmark: String,
}

/// Lazy sequence of raw entries in key order.
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<(Key, Value), StoreError>> + 'a>;

/// An ordered key-value store.
///
/// Keys are compared bytewise. An empty `end` key means "unbounded".
/// Rich queries match stored JSON objects in the primary keyspace against an
/// equality [`Selector`]; the provided methods implement paging and rich
/// queries on top of [`OrderedStore::scan`], and a backend with a native query
/// engine may override them.
pub trait OrderedStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &Key) -> Result<Option<Value>, StoreError>;

    /// Writes `value` under `key`, overwriting any previous value.
    fn put(&self, key: Key, value: Value) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, key: &Key) -> Result<(), StoreError>;

    /// Applies a batch of writes according to [`OrderedStore::atomicity`].
    fn write_batch(&self, batch: Vec<Mutation>) -> Result<(), StoreError>;

    /// Reports whether [`OrderedStore::write_batch`] is all-or-nothing.
    fn atomicity(&self) -> Atomicity;

    /// Lock table guarding read-check-write sequences on this store.
    ///
    /// Every writer that reads a key and commits based on what it saw must
    /// hold the key's lock until the commit returns. The default is a table
    /// shared by every store in the process.
    fn key_locks(&self) -> &KeyLocks {
        KeyLocks::shared()
    }

    /// Scans keys in range `[start, end)`.
    fn scan<'a>(&'a self, start: &Key, end: &Key) -> Result<KvIter<'a>, StoreError>;

    /// Scans one page of `[start, end)`, resuming after `bookmark`.
    fn scan_paginated(
        &self,
        start: &Key,
        end: &Key,
        page_size: u32,
        bookmark: &str,
    ) -> Result<KvPage, StoreError> {
        match resume_key(start, bookmark)? {
            Some(resume) => collect_page(self.scan(&resume, end)?, page_size, bookmark),
            None => exhausted_page(page_size, bookmark),
        }
    }

    /// Returns every primary entry whose value matches `selector`, in key order.
    fn rich_query<'a>(&'a self, selector: &Selector) -> Result<KvIter<'a>, StoreError> {
        let start = Key::from(PRIMARY_KEYSPACE_START);
        let iter = self.scan(&start, &Key::default())?;
        Ok(filter_matching(iter, selector.clone()))
    }

    /// Returns one page of entries matching `selector`, resuming after `bookmark`.
    fn rich_query_paginated(
        &self,
        selector: &Selector,
        page_size: u32,
        bookmark: &str,
    ) -> Result<KvPage, StoreError> {
        let Some(start) = resume_key(&Key::from(PRIMARY_KEYSPACE_START), bookmark)? else {
            return exhausted_page(page_size, bookmark);
        };
        let iter = filter_matching(self.scan(&start, &Key::default())?, selector.clone());
        collect_page(iter, page_size, bookmark)
    }
}

/// Validates key size.
pub(crate) fn validate_key(key: &Key) -> Result<(), StoreError> {
    if key.len() > MAX_KEY_SIZE {
        return Err(StoreError::KeyTooLarge {
            size: key.len(),
            max: MAX_KEY_SIZE,
        });
    }
    Ok(())
}

/// Validates value size.
pub(crate) fn validate_value(value: &Value) -> Result<(), StoreError> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(StoreError::ValueTooLarge {
            size: value.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

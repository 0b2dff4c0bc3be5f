// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Range scans and equality queries materialized into records.

use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::config::QueryLimits;
use crate::storage::{
    Key, KvIter, KvPage, OrderedStore, Selector, StoreError, PRIMARY_KEYSPACE_START,
};

use super::{decode_record, Record, RecordError, DOC_TYPE_FIELD};

/// A conjunction of field equalities over one record kind.
///
/// The `docType` constraint is always set to the queried kind, whatever the
/// predicate says.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    fields: Map<String, JsonValue>,
}

impl Predicate {
    /// A predicate matching every record of the kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Parses a selector string such as `{"selector":{"classID":"class1"}}`.
    pub fn parse(query: &str) -> Result<Self, RecordError> {
        let selector = Selector::parse(query).map_err(caller_error)?;
        let fields = selector
            .fields()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect();
        Ok(Self { fields })
    }

    /// Builds the store selector for kind `R`.
    pub fn to_selector<R: Record>(&self) -> Selector {
        self.fields
            .iter()
            .filter(|(field, _)| field.as_str() != DOC_TYPE_FIELD)
            .fold(
                Selector::new().eq(DOC_TYPE_FIELD, R::DOC_TYPE),
                |selector, (field, value)| selector.eq(field.clone(), value.clone()),
            )
    }
}

/// One page of query results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<R> {
    pub records: Vec<R>,
    /// Entries the store returned for this page. Zero means exhausted.
    #[serde(rename = "fetchedRecordsCount")]
    pub fetched_count: u32,
    /// Pass back verbatim to fetch the next page.
    pub bookmark: String,
}

/// Lazy sequence of records decoded from a store scan.
///
/// Entries that do not decode as `R` are skipped.
pub struct Records<'s, R> {
    inner: KvIter<'s>,
    _kind: PhantomData<fn() -> R>,
}

impl<'s, R> Records<'s, R> {
    fn new(inner: KvIter<'s>) -> Self {
        Self {
            inner,
            _kind: PhantomData,
        }
    }
}

impl<R: Record> Iterator for Records<'_, R> {
    type Item = Result<R, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok((_, value)) => {
                    if let Some(record) = decode_record(value.as_bytes()) {
                        return Some(Ok(record));
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Read-side queries of kind `R` against a store.
pub struct QueryEngine<'s, S: OrderedStore + ?Sized, R> {
    store: &'s S,
    limits: QueryLimits,
    _kind: PhantomData<fn() -> R>,
}

impl<'s, S: OrderedStore + ?Sized, R: Record> QueryEngine<'s, S, R> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            limits: QueryLimits::default(),
            _kind: PhantomData,
        }
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Scans records with ids in `[start, end)`. Empty bounds are unbounded.
    pub fn range_scan(&self, start: &str, end: &str) -> Result<Records<'s, R>, RecordError> {
        let (start, end) = primary_range(start, end);
        Ok(Records::new(self.store.scan(&start, &end)?))
    }

    /// One page of [`range_scan`](Self::range_scan), resuming after `bookmark`.
    pub fn range_scan_paginated(
        &self,
        start: &str,
        end: &str,
        page_size: i32,
        bookmark: &str,
    ) -> Result<Page<R>, RecordError> {
        let page_size = self.check_page_size(page_size)?;
        let (start, end) = primary_range(start, end);

        let page = self
            .store
            .scan_paginated(&start, &end, page_size, bookmark)
            .map_err(caller_error)?;

        debug!(kind = R::DOC_TYPE, page_size, fetched = page.fetched_count, "Range page");
        Ok(materialize(page))
    }

    /// Returns every record of kind `R` matching `predicate`, in id order.
    pub fn find(&self, predicate: &Predicate) -> Result<Records<'s, R>, RecordError> {
        let selector = predicate.to_selector::<R>();
        debug!(selector = %selector, "Rich query");
        Ok(Records::new(self.store.rich_query(&selector)?))
    }

    /// One page of [`find`](Self::find), resuming after `bookmark`.
    pub fn find_paginated(
        &self,
        predicate: &Predicate,
        page_size: i32,
        bookmark: &str,
    ) -> Result<Page<R>, RecordError> {
        let page_size = self.check_page_size(page_size)?;
        let selector = predicate.to_selector::<R>();

        let page = self
            .store
            .rich_query_paginated(&selector, page_size, bookmark)
            .map_err(caller_error)?;

        debug!(
            selector = %selector,
            page_size,
            fetched = page.fetched_count,
            "Rich query page"
        );
        Ok(materialize(page))
    }

    fn check_page_size(&self, page_size: i32) -> Result<u32, RecordError> {
        if page_size <= 0 {
            return Err(RecordError::InvalidArgument(format!(
                "page size must be positive, got {page_size}"
            )));
        }

        let page_size = page_size as u32;
        if page_size > self.limits.max_page_size {
            return Err(RecordError::InvalidArgument(format!(
                "page size {page_size} exceeds limit {}",
                self.limits.max_page_size
            )));
        }
        Ok(page_size)
    }
}

/// Clamps a caller range to the primary keyspace.
fn primary_range(start: &str, end: &str) -> (Key, Key) {
    let start = std::cmp::max(Key::from(start), Key::from(PRIMARY_KEYSPACE_START));
    (start, Key::from(end))
}

fn materialize<R: Record>(page: KvPage) -> Page<R> {
    let records = page
        .entries
        .iter()
        .filter_map(|(_, value)| decode_record(value.as_bytes()))
        .collect();

    Page {
        records,
        fetched_count: page.fetched_count,
        bookmark: page.bookmark,
    }
}

/// Store errors caused by caller input become `InvalidArgument`.
fn caller_error(err: StoreError) -> RecordError {
    match err {
        StoreError::InvalidBookmark(msg) => {
            RecordError::InvalidArgument(format!("invalid bookmark: {msg}"))
        }
        StoreError::InvalidQuery(msg) => RecordError::InvalidArgument(format!("invalid query: {msg}")),
        other => RecordError::StoreUnavailable(other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::record::testing::{Memo, Note};
    use crate::record::{encode_record, IndexMaintainer};
    use crate::storage::{MemoryStore, Value};
    use crate::txn::UnitOfWork;

    fn put<R: Record>(store: &MemoryStore, record: &R) {
        store
            .put(Key::from(record.id()), encode_record(record).unwrap())
            .unwrap();
    }

    fn populated() -> MemoryStore {
        let store = MemoryStore::new();
        for i in 1..=7 {
            let topic = if i % 2 == 0 { "go" } else { "rust" };
            put(&store, &Note::new(&format!("n{i}"), topic, "Tom"));
        }
        put(&store, &Memo::new("m1", "rust", "Tom"));
        store.put(Key::from("junk"), Value::from("not json")).unwrap();

        let mut uow = UnitOfWork::begin(&store);
        IndexMaintainer::<Note>::new()
            .add_indexes(&mut uow, &Note::new("n1", "rust", "Tom"), Note::INDEXES)
            .unwrap();
        uow.commit().unwrap();
        store
    }

    fn ids(records: Vec<Note>) -> Vec<String> {
        records.into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_range_scan_skips_other_entries() {
        let store = populated();
        let engine = QueryEngine::<_, Note>::new(&store);

        let all: Vec<Note> = engine.range_scan("", "").unwrap().map(Result::unwrap).collect();
        assert_eq!(ids(all), vec!["n1", "n2", "n3", "n4", "n5", "n6", "n7"]);

        let some: Vec<Note> = engine
            .range_scan("n2", "n5")
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(ids(some), vec!["n2", "n3", "n4"]);
    }

    #[test]
    fn test_range_scan_never_enters_index_namespace() {
        let store = populated();
        let engine = QueryEngine::<_, Note>::new(&store);

        let from_zero: Vec<Note> = engine
            .range_scan("\0", "n2")
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(ids(from_zero), vec!["n1"]);
    }

    #[test]
    fn test_find_forces_doc_type() {
        let store = populated();
        let engine = QueryEngine::<_, Note>::new(&store);

        let predicate = Predicate::new().eq("topic", "rust").eq("docType", "memo");
        let found: Vec<Note> = engine.find(&predicate).unwrap().map(Result::unwrap).collect();
        assert_eq!(ids(found), vec!["n1", "n3", "n5", "n7"]);
    }

    #[test]
    fn test_find_paginated_matches_find() {
        let store = populated();
        let engine = QueryEngine::<_, Note>::new(&store);
        let predicate = Predicate::new();

        let expected: BTreeSet<String> = engine
            .find(&predicate)
            .unwrap()
            .map(|r| r.unwrap().id)
            .collect();
        assert_eq!(expected.len(), 7);

        let mut seen = Vec::new();
        let mut bookmark = String::new();
        loop {
            let page = engine.find_paginated(&predicate, 2, &bookmark).unwrap();
            if page.fetched_count == 0 {
                // Exhausted cursors hand the bookmark back unchanged
                assert_eq!(page.bookmark, bookmark);
                break;
            }
            assert!(page.records.len() <= 2);
            seen.extend(ids(page.records));
            bookmark = page.bookmark;
        }

        let unique: BTreeSet<String> = seen.iter().cloned().collect();
        assert_eq!(unique.len(), seen.len());
        assert_eq!(unique, expected);
    }

    #[test]
    fn test_range_paginated_counts_fetched_entries() {
        let store = populated();
        let engine = QueryEngine::<_, Note>::new(&store);

        // "junk" and "m1" are fetched but are not notes
        let page = engine.range_scan_paginated("", "n", 10, "").unwrap();
        assert_eq!(page.fetched_count, 2);
        assert!(page.records.is_empty());

        let page = engine.range_scan_paginated("", "", 3, "").unwrap();
        assert_eq!(page.fetched_count, 3);
        assert_eq!(ids(page.records), vec!["n1"]);
        let next = engine.range_scan_paginated("", "", 3, &page.bookmark).unwrap();
        assert_eq!(ids(next.records), vec!["n2", "n3", "n4"]);
    }

    #[test]
    fn test_page_size_limits() {
        let store = populated();
        let engine = QueryEngine::<_, Note>::new(&store)
            .with_limits(QueryLimits::default().with_max_page_size(5));

        for size in [0, -1, 6] {
            assert!(matches!(
                engine.find_paginated(&Predicate::new(), size, ""),
                Err(RecordError::InvalidArgument(_))
            ));
        }
        assert!(engine.range_scan_paginated("", "", 5, "").is_ok());
    }

    #[test]
    fn test_bad_bookmark() {
        let store = populated();
        let engine = QueryEngine::<_, Note>::new(&store);

        assert!(matches!(
            engine.range_scan_paginated("", "", 2, "zz-not-hex"),
            Err(RecordError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_predicate_parse() {
        let predicate = Predicate::parse(r#"{"selector":{"topic":"go"}}"#).unwrap();
        assert_eq!(
            predicate.to_selector::<Note>().to_query_string(),
            r#"{"selector":{"docType":"note","topic":"go"}}"#
        );

        assert!(matches!(
            Predicate::parse(r#"{"selector":{"topic":{"$ne":"go"}}}"#),
            Err(RecordError::InvalidArgument(_))
        ));
    }
}

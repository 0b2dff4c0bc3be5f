// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Ownership-gated record operations.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::QueryLimits;
use crate::storage::{validate_primary_id, Key, OrderedStore, MAX_KEY_SIZE};
use crate::txn::UnitOfWork;

use super::{
    index_values, Caller, CreatePolicy, IndexMaintainer, Page, Predicate, QueryEngine, Record,
    RecordError, RecordStore,
};

/// Create, read, update, transfer, delete and query records of kind `R`.
///
/// Every mutation loads the current record, checks the caller against its
/// owner, and stages the primary write together with every affected index
/// entry in one unit of work. A rejected call writes nothing.
///
/// Mutations of one id are serialized through the store's key locks, so
/// contracts of different kinds sharing a store never interleave on an id.
pub struct RecordContract<R, S: OrderedStore + ?Sized> {
    store: Arc<S>,
    limits: QueryLimits,
    records: RecordStore<R>,
    indexes: IndexMaintainer<R>,
}

impl<R: Record, S: OrderedStore + ?Sized> RecordContract<R, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            limits: QueryLimits::default(),
            records: RecordStore::new(),
            indexes: IndexMaintainer::new(),
        }
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns a query engine over the backing store.
    pub fn queries(&self) -> QueryEngine<'_, S, R> {
        QueryEngine::new(self.store.as_ref()).with_limits(self.limits)
    }

    /// Stores a new record and its index entries.
    ///
    /// Kinds with [`CreatePolicy::CallerWithAttribute`] require the caller to
    /// carry the attribute and record the caller as owner.
    #[instrument(skip(self, caller, record), fields(kind = R::DOC_TYPE, id = %record.id(), caller = %caller))]
    pub fn create(&self, caller: &Caller, mut record: R) -> Result<R, RecordError> {
        validate_primary_id(record.id())?;
        if record.doc_type() != R::DOC_TYPE {
            return Err(RecordError::InvalidArgument(format!(
                "docType {:?} does not match kind {}",
                record.doc_type(),
                R::DOC_TYPE
            )));
        }

        match R::CREATE_POLICY {
            CreatePolicy::ExplicitOwner => {
                if record.owner().is_empty() {
                    return Err(RecordError::InvalidArgument(format!(
                        "{} {} has no owner",
                        R::DOC_TYPE,
                        record.id()
                    )));
                }
            }
            CreatePolicy::CallerWithAttribute { name, value } => {
                if caller.attribute(name) != Some(value) {
                    warn!(attribute = name, "Caller lacks create attribute");
                    return Err(RecordError::Unauthorized {
                        kind: R::DOC_TYPE,
                        id: record.id().to_string(),
                        caller: caller.id().to_string(),
                    });
                }
                record.set_owner(caller.id().to_string());
            }
        }

        self.check_key_sizes(&record)?;

        let _guard = self.store.key_locks().lock(&Key::from(record.id()));
        let mut uow = UnitOfWork::begin(self.store.as_ref());
        if self.records.exists(&uow, record.id())? {
            return Err(RecordError::AlreadyExists {
                kind: R::DOC_TYPE,
                id: record.id().to_string(),
            });
        }

        self.records.put(&mut uow, &record)?;
        self.indexes.add_indexes(&mut uow, &record, R::INDEXES)?;
        uow.commit()?;

        info!(owner = record.owner(), "Created record");
        Ok(record)
    }

    /// Reads the record stored under `id`.
    pub fn read(&self, id: &str) -> Result<R, RecordError> {
        let uow = UnitOfWork::begin(self.store.as_ref());
        self.records.get(&uow, id)
    }

    /// Returns true if any record is stored under `id`.
    pub fn exists(&self, id: &str) -> Result<bool, RecordError> {
        let uow = UnitOfWork::begin(self.store.as_ref());
        self.records.exists(&uow, id)
    }

    /// Applies `change` to the record and stores the result.
    ///
    /// The change may not alter the id, the `docType` or the owner. Index
    /// entries whose fields changed are rekeyed. `change` runs while the
    /// record is locked and must not call back into a contract.
    #[instrument(skip(self, caller, change), fields(kind = R::DOC_TYPE, caller = %caller))]
    pub fn update<F>(&self, id: &str, caller: &Caller, change: F) -> Result<R, RecordError>
    where
        F: FnOnce(&mut R),
    {
        let updated = self.modify(id, caller, |record| {
            let owner = record.owner().to_string();
            change(record);
            if record.owner() != owner {
                return Err(RecordError::InvalidArgument(format!(
                    "{} {id}: ownership changes go through transfer",
                    R::DOC_TYPE
                )));
            }
            Ok(())
        })?;

        info!("Updated record");
        Ok(updated)
    }

    /// Hands the record over to `new_owner`.
    #[instrument(skip(self, caller), fields(kind = R::DOC_TYPE, caller = %caller))]
    pub fn transfer(&self, id: &str, caller: &Caller, new_owner: &str) -> Result<R, RecordError> {
        if new_owner.is_empty() {
            return Err(RecordError::InvalidArgument(
                "new owner must not be empty".to_string(),
            ));
        }

        let updated = self.modify(id, caller, |record| {
            record.set_owner(new_owner.to_string());
            Ok(())
        })?;

        info!("Transferred record");
        Ok(updated)
    }

    /// Removes the record and every index entry pointing at it.
    #[instrument(skip(self, caller), fields(kind = R::DOC_TYPE, caller = %caller))]
    pub fn delete(&self, id: &str, caller: &Caller) -> Result<(), RecordError> {
        validate_primary_id(id)?;
        let _guard = self.store.key_locks().lock(&Key::from(id));
        let mut uow = UnitOfWork::begin(self.store.as_ref());
        let record = self.load_owned(&uow, id, caller)?;

        self.records.delete(&mut uow, id)?;
        self.indexes.remove_indexes(&mut uow, &record, R::INDEXES)?;
        uow.commit()?;

        info!("Deleted record");
        Ok(())
    }

    /// Lists records with ids in `[start, end)`. Empty bounds are unbounded.
    pub fn list_by_range(&self, start: &str, end: &str) -> Result<Vec<R>, RecordError> {
        self.queries().range_scan(start, end)?.collect()
    }

    /// Lists every record of this kind.
    pub fn list_all(&self) -> Result<Vec<R>, RecordError> {
        self.list_by_range("", "")
    }

    /// Returns every record of this kind matching `predicate`.
    pub fn query(&self, predicate: &Predicate) -> Result<Vec<R>, RecordError> {
        self.queries().find(predicate)?.collect()
    }

    /// Runs an ad hoc selector string such as `{"selector":{"owner":"Tom"}}`.
    pub fn query_string(&self, query: &str) -> Result<Vec<R>, RecordError> {
        self.query(&Predicate::parse(query)?)
    }

    /// One page of [`query`](Self::query).
    pub fn query_paginated(
        &self,
        predicate: &Predicate,
        page_size: i32,
        bookmark: &str,
    ) -> Result<Page<R>, RecordError> {
        self.queries().find_paginated(predicate, page_size, bookmark)
    }

    /// One page of [`list_by_range`](Self::list_by_range).
    pub fn range_paginated(
        &self,
        start: &str,
        end: &str,
        page_size: i32,
        bookmark: &str,
    ) -> Result<Page<R>, RecordError> {
        self.queries()
            .range_scan_paginated(start, end, page_size, bookmark)
    }

    /// Resolves records through an index prefix scan instead of a rich query.
    ///
    /// Entries that belong to another kind sharing the index name are skipped.
    pub fn query_by_index(&self, index: &str, values: &[&str]) -> Result<Vec<R>, RecordError> {
        let spec = R::index(index).ok_or_else(|| {
            RecordError::InvalidArgument(format!("{} has no index {index:?}", R::DOC_TYPE))
        })?;

        let ids = self.indexes.index_ids(self.store.as_ref(), spec, values)?;
        debug!(index, fetched = ids.len(), "Index scan");

        let uow = UnitOfWork::begin(self.store.as_ref());
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.records.get(&uow, &id) {
                Ok(record) => records.push(record),
                Err(RecordError::Serialization { .. }) => continue,
                Err(RecordError::NotFound { .. }) => {
                    warn!(index, id = %id, "Index entry points at a missing record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Creates each record that does not exist yet. Returns how many were
    /// created.
    #[instrument(skip(self, caller, records), fields(kind = R::DOC_TYPE))]
    pub fn seed(&self, caller: &Caller, records: Vec<R>) -> Result<usize, RecordError> {
        let mut created = 0;
        for record in records {
            match self.create(caller, record) {
                Ok(_) => created += 1,
                Err(RecordError::AlreadyExists { id, .. }) => {
                    debug!(id = %id, "Seed record already present");
                }
                Err(e) => return Err(e),
            }
        }

        info!(created, "Seeded records");
        Ok(created)
    }

    fn check_key_sizes(&self, record: &R) -> Result<(), RecordError> {
        if record.id().len() > MAX_KEY_SIZE {
            return Err(RecordError::InvalidArgument(format!(
                "{} id is {} bytes, max {MAX_KEY_SIZE}",
                R::DOC_TYPE,
                record.id().len()
            )));
        }
        self.indexes.check_key_sizes(record, R::INDEXES)
    }

    fn load_owned(
        &self,
        uow: &UnitOfWork<'_, S>,
        id: &str,
        caller: &Caller,
    ) -> Result<R, RecordError> {
        let record = self.records.get(uow, id)?;
        if record.owner() != caller.id() {
            warn!(id, owner = record.owner(), "Caller is not the owner");
            return Err(RecordError::Unauthorized {
                kind: R::DOC_TYPE,
                id: id.to_string(),
                caller: caller.id().to_string(),
            });
        }
        Ok(record)
    }

    fn modify<F>(&self, id: &str, caller: &Caller, change: F) -> Result<R, RecordError>
    where
        F: FnOnce(&mut R) -> Result<(), RecordError>,
    {
        validate_primary_id(id)?;
        let _guard = self.store.key_locks().lock(&Key::from(id));
        let mut uow = UnitOfWork::begin(self.store.as_ref());
        let current = self.load_owned(&uow, id, caller)?;

        let mut updated = current.clone();
        change(&mut updated)?;
        if updated.id() != current.id() || updated.doc_type() != R::DOC_TYPE {
            return Err(RecordError::InvalidArgument(format!(
                "{} {id}: id and docType are immutable",
                R::DOC_TYPE
            )));
        }

        self.check_key_sizes(&updated)?;

        self.records.put(&mut uow, &updated)?;
        for spec in R::INDEXES {
            let old_values = index_values(&current, spec)?;
            let new_values = index_values(&updated, spec)?;
            self.indexes
                .rekey_index(&mut uow, id, spec, &old_values, &new_values)?;
        }
        uow.commit()?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::record::testing::{Memo, Note};
    use crate::storage::{
        build_key, Atomicity, Key, KvIter, MemoryStore, Mutation, StoreError, Value,
    };

    fn contract() -> RecordContract<Note, MemoryStore> {
        RecordContract::new(Arc::new(MemoryStore::new()))
    }

    fn tom() -> Caller {
        Caller::new("Tom")
    }

    fn sam() -> Caller {
        Caller::new("Sam")
    }

    fn index_ids(
        contract: &RecordContract<Note, MemoryStore>,
        index: &str,
        value: &str,
    ) -> Vec<String> {
        let spec = Note::index(index).unwrap();
        IndexMaintainer::<Note>::new()
            .index_ids(contract.store().as_ref(), spec, &[value])
            .unwrap()
    }

    #[test]
    fn test_create_writes_record_and_indexes() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();

        assert!(contract.exists("n1").unwrap());
        assert_eq!(contract.read("n1").unwrap(), Note::new("n1", "rust", "Tom"));
        assert_eq!(index_ids(&contract, "topic~name", "rust"), vec!["n1"]);
        assert_eq!(index_ids(&contract, "owner~name", "Tom"), vec!["n1"]);
        assert_eq!(contract.store().len(), 3);
    }

    #[test]
    fn test_create_twice_keeps_first() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();

        let err = contract
            .create(&sam(), Note::new("n1", "go", "Sam"))
            .unwrap_err();
        assert!(matches!(err, RecordError::AlreadyExists { kind: "note", .. }));
        assert_eq!(contract.read("n1").unwrap().topic, "rust");
        assert!(index_ids(&contract, "topic~name", "go").is_empty());
    }

    #[test]
    fn test_create_validates_input() {
        let contract = contract();

        assert!(matches!(
            contract.create(&tom(), Note::new("", "rust", "Tom")),
            Err(RecordError::Encoding(_))
        ));
        assert!(matches!(
            contract.create(&tom(), Note::new("n1", "rust", "")),
            Err(RecordError::InvalidArgument(_))
        ));

        let mut wrong_kind = Note::new("n1", "rust", "Tom");
        wrong_kind.doc_type = "memo".to_string();
        assert!(matches!(
            contract.create(&tom(), wrong_kind),
            Err(RecordError::InvalidArgument(_))
        ));
        assert!(contract.store().is_empty());
    }

    #[test]
    fn test_oversized_keys_rejected_before_staging() {
        let contract = contract();

        let too_long = "n".repeat(MAX_KEY_SIZE + 1);
        assert!(matches!(
            contract.create(&tom(), Note::new(&too_long, "rust", "Tom")),
            Err(RecordError::InvalidArgument(_))
        ));

        // The primary key fits but the index entries do not
        let near_limit = "n".repeat(MAX_KEY_SIZE - 4);
        assert!(matches!(
            contract.create(&tom(), Note::new(&near_limit, "rust", "Tom")),
            Err(RecordError::InvalidArgument(_))
        ));
        assert!(contract.store().is_empty());

        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
        let err = contract
            .update("n1", &tom(), |note| note.topic = "t".repeat(MAX_KEY_SIZE))
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidArgument(_)));
        assert_eq!(contract.read("n1").unwrap().topic, "rust");
        assert_eq!(index_ids(&contract, "topic~name", "rust"), vec!["n1"]);
    }

    #[test]
    fn test_concurrent_creates_of_one_id() {
        for round in 0..200 {
            let contract = contract();
            let barrier = Barrier::new(2);

            let results: Vec<_> = thread::scope(|s| {
                let handles: Vec<_> = ["rust", "go"]
                    .into_iter()
                    .map(|topic| {
                        let (contract, barrier) = (&contract, &barrier);
                        s.spawn(move || {
                            barrier.wait();
                            contract.create(&tom(), Note::new("n1", topic, "Tom"))
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "round {round}");
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(RecordError::AlreadyExists { .. }))));

            let topic = contract.read("n1").unwrap().topic;
            let other = if topic == "rust" { "go" } else { "rust" };
            assert_eq!(index_ids(&contract, "topic~name", &topic), vec!["n1"]);
            assert!(index_ids(&contract, "topic~name", other).is_empty());
            assert_eq!(contract.store().len(), 3);
        }
    }

    #[test]
    fn test_concurrent_transfers_of_one_record() {
        for round in 0..200 {
            let contract = contract();
            contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
            let barrier = Barrier::new(2);

            let results: Vec<_> = thread::scope(|s| {
                let handles: Vec<_> = ["Sam", "Ann"]
                    .into_iter()
                    .map(|new_owner| {
                        let (contract, barrier) = (&contract, &barrier);
                        s.spawn(move || {
                            barrier.wait();
                            contract.transfer("n1", &tom(), new_owner)
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "round {round}");
            assert!(results.iter().any(|r| matches!(r, Err(e) if e.is_unauthorized())));

            let owner = contract.read("n1").unwrap().owner;
            let mut owned = index_ids(&contract, "owner~name", "Sam");
            owned.extend(index_ids(&contract, "owner~name", "Ann"));
            assert_eq!(owned, vec!["n1"]);
            assert_eq!(index_ids(&contract, "owner~name", &owner), vec!["n1"]);
            assert!(index_ids(&contract, "owner~name", "Tom").is_empty());
            assert_eq!(contract.store().len(), 3);
        }
    }

    #[test]
    fn test_concurrent_update_and_delete() {
        for _ in 0..200 {
            let contract = contract();
            contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
            let barrier = Barrier::new(2);

            thread::scope(|s| {
                s.spawn(|| {
                    barrier.wait();
                    let _ = contract.update("n1", &tom(), |note| note.topic = "go".to_string());
                });
                s.spawn(|| {
                    barrier.wait();
                    let _ = contract.delete("n1", &tom());
                });
            });

            assert!(!contract.exists("n1").unwrap());
            assert!(index_ids(&contract, "topic~name", "rust").is_empty());
            assert!(index_ids(&contract, "topic~name", "go").is_empty());
            assert!(contract.store().is_empty());
        }
    }

    #[test]
    fn test_ids_are_shared_across_kinds() {
        let store = Arc::new(MemoryStore::new());
        let memos = RecordContract::<Memo, _>::new(store.clone());
        let notes = RecordContract::<Note, _>::new(store);

        memos.create(&tom(), Memo::new("x1", "rust", "Tom")).unwrap();
        assert!(matches!(
            notes.create(&tom(), Note::new("x1", "rust", "Tom")),
            Err(RecordError::AlreadyExists { .. })
        ));

        // Both kinds index topic~name; each only resolves its own records
        notes.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
        let found = notes.query_by_index("topic~name", &["rust"]).unwrap();
        assert_eq!(found, vec![Note::new("n1", "rust", "Tom")]);
        assert!(notes.list_all().unwrap().iter().all(|n| n.id != "x1"));
    }

    #[test]
    fn test_non_owner_changes_nothing() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
        let before = contract.store().dump();

        assert!(contract
            .update("n1", &sam(), |n| n.body = "hacked".to_string())
            .unwrap_err()
            .is_unauthorized());
        assert!(contract.transfer("n1", &sam(), "Sam").unwrap_err().is_unauthorized());
        assert!(contract.delete("n1", &sam()).unwrap_err().is_unauthorized());

        assert_eq!(contract.store().dump(), before);
    }

    #[test]
    fn test_missing_record() {
        let contract = contract();

        assert!(contract.read("n1").unwrap_err().is_not_found());
        assert!(contract.delete("n1", &tom()).unwrap_err().is_not_found());
        assert!(contract
            .update("n1", &tom(), |_| {})
            .unwrap_err()
            .is_not_found());
        assert!(contract.transfer("n1", &tom(), "Sam").unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_rekeys_changed_index() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();

        let updated = contract
            .update("n1", &tom(), |n| {
                n.topic = "go".to_string();
                n.body = "moved".to_string();
            })
            .unwrap();

        assert_eq!(updated.body, "moved");
        assert!(index_ids(&contract, "topic~name", "rust").is_empty());
        assert_eq!(index_ids(&contract, "topic~name", "go"), vec!["n1"]);
        assert_eq!(contract.store().len(), 3);
    }

    #[test]
    fn test_update_rejects_identity_changes() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
        let before = contract.store().dump();

        for change in [
            (|n: &mut Note| n.id = "n2".to_string()) as fn(&mut Note),
            |n: &mut Note| n.doc_type = "memo".to_string(),
            |n: &mut Note| n.owner = "Sam".to_string(),
        ] {
            assert!(matches!(
                contract.update("n1", &tom(), change),
                Err(RecordError::InvalidArgument(_))
            ));
        }
        assert_eq!(contract.store().dump(), before);
    }

    #[test]
    fn test_transfer_rekeys_owner_index() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();

        let moved = contract.transfer("n1", &tom(), "Sam").unwrap();
        assert_eq!(moved.owner, "Sam");
        assert!(index_ids(&contract, "owner~name", "Tom").is_empty());
        assert_eq!(index_ids(&contract, "owner~name", "Sam"), vec!["n1"]);

        // The new owner holds the record now
        assert!(contract.delete("n1", &tom()).unwrap_err().is_unauthorized());
        contract.delete("n1", &sam()).unwrap();
    }

    #[test]
    fn test_delete_removes_indexes() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
        contract.delete("n1", &tom()).unwrap();

        assert!(!contract.exists("n1").unwrap());
        assert!(index_ids(&contract, "topic~name", "rust").is_empty());
        assert!(index_ids(&contract, "owner~name", "Tom").is_empty());
        assert!(contract.store().is_empty());
    }

    #[test]
    fn test_query_and_pagination() {
        let contract = contract();
        for i in 1..=6 {
            let owner = if i <= 5 { "Tom" } else { "Sam" };
            contract
                .create(&tom(), Note::new(&format!("n{i}"), "rust", owner))
                .unwrap();
        }

        let predicate = Predicate::new().eq("owner", "Tom");
        let all = contract.query(&predicate).unwrap();
        assert_eq!(all.len(), 5);

        let mut paged = Vec::new();
        let mut bookmark = String::new();
        loop {
            let page = contract.query_paginated(&predicate, 2, &bookmark).unwrap();
            if page.fetched_count == 0 {
                break;
            }
            paged.extend(page.records);
            bookmark = page.bookmark;
        }
        assert_eq!(paged, all);

        let by_string = contract
            .query_string(r#"{"selector":{"owner":"Sam"}}"#)
            .unwrap();
        assert_eq!(by_string.len(), 1);

        let range = contract.range_paginated("n2", "n4", 10, "").unwrap();
        assert_eq!(range.records.len(), 2);
        assert_eq!(contract.list_by_range("n5", "").unwrap().len(), 2);
    }

    #[test]
    fn test_query_by_unknown_index() {
        assert!(matches!(
            contract().query_by_index("nope~name", &["x"]),
            Err(RecordError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_seed_is_idempotent() {
        let contract = contract();
        let seed = vec![Note::new("n1", "rust", "Tom"), Note::new("n2", "go", "Sam")];

        assert_eq!(contract.seed(&tom(), seed.clone()).unwrap(), 2);
        assert_eq!(contract.seed(&tom(), seed).unwrap(), 0);
        assert_eq!(contract.list_all().unwrap().len(), 2);
    }

    /// Per-write store whose index writes can be made to fail.
    struct BrokenIndexStore {
        inner: MemoryStore,
        fail_index_writes: bool,
    }

    impl OrderedStore for BrokenIndexStore {
        fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
            if self.fail_index_writes && crate::storage::is_index_key(&key) {
                return Err(StoreError::Io(std::io::Error::other("index write refused")));
            }
            self.inner.put(key, value)
        }

        fn delete(&self, key: &Key) -> Result<(), StoreError> {
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

    #[test]
    fn test_per_write_store_happy_path() {
        let store = Arc::new(BrokenIndexStore {
            inner: MemoryStore::with_atomicity(Atomicity::PerWrite),
            fail_index_writes: false,
        });
        let contract = RecordContract::<Note, _>::new(store.clone());

        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();
        contract.transfer("n1", &tom(), "Sam").unwrap();
        assert_eq!(store.inner.len(), 3);
    }

    #[test]
    fn test_index_failure_is_compensated() {
        let store = Arc::new(BrokenIndexStore {
            inner: MemoryStore::with_atomicity(Atomicity::PerWrite),
            fail_index_writes: true,
        });
        let contract = RecordContract::<Note, _>::new(store.clone());

        let err = contract
            .create(&tom(), Note::new("n1", "rust", "Tom"))
            .unwrap_err();
        match err {
            RecordError::IndexWrite {
                index,
                id,
                rolled_back,
                ..
            } => {
                assert_eq!(index, "topic~name");
                assert_eq!(id, "n1");
                assert!(rolled_back);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The primary write was undone
        assert!(store.inner.is_empty());
        assert!(!contract.exists("n1").unwrap());
    }

    #[test]
    fn test_index_key_layout() {
        let contract = contract();
        contract.create(&tom(), Note::new("n1", "rust", "Tom")).unwrap();

        let key = build_key("topic~name", &["rust", "n1"]).unwrap();
        assert_eq!(
            contract.store().get(&key).unwrap(),
            Some(Value::new(vec![0x00]))
        );
    }
}

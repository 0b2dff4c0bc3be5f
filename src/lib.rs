// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! labstore: index-consistent records over an ordered key-value store
//!
//! This crate stores classes, labs, lab instances and submissions as JSON
//! documents, keeps their secondary indexes consistent with every mutation,
//! and answers range scans and paginated equality queries over them. Only a
//! record's owner may change it.

pub mod config;
pub mod kinds;
pub mod record;
pub mod storage;
pub mod txn;

pub use config::{QueryLimits, StoreConfig};
pub use kinds::{
    seed_demo, Class, ClassContract, Instance, InstanceContract, Lab, LabContract, Submission,
    SubmissionContract,
};
pub use record::{
    Caller, IndexSpec, Page, Predicate, Record, RecordContract, RecordError, RecordStore,
};
pub use storage::{
    Atomicity, DurabilityMode, Key, KeyError, MemoryStore, OrderedStore, RocksStore, Selector,
    StoreError, Value,
};
pub use txn::{TxnError, UnitOfWork};

// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Units of work over an ordered store.
//!
//! Every record mutation (a primary write plus its index writes) is staged in
//! a [`UnitOfWork`] and committed in one step:
//!
//! - On a store reporting [`Atomicity::Atomic`](crate::storage::Atomicity) the
//!   staged writes go out as a single batch, so other readers see either all of
//!   them or none.
//! - On a store reporting [`Atomicity::PerWrite`](crate::storage::Atomicity)
//!   writes are applied in staging order while an undo log records each key's
//!   previous value. If a write fails, the undo log is replayed in reverse and
//!   the failure is reported as [`TxnError::Compensated`]. If the rollback fails
//!   as well the error is [`TxnError::RepairRequired`] and the store may hold a
//!   primary record without all of its index entries.
//!
//! Reads inside a unit of work see its own staged writes.
//!
//! # Isolation
//!
//! The unit of work does not lock anything. Callers that read a key and
//! commit based on what they saw hold that key's guard from
//! [`OrderedStore::key_locks`](crate::storage::OrderedStore::key_locks) until
//! `commit` returns. Readers that take no lock may still observe a
//! remove-then-add of an index entry halfway on a per-write store.

mod error;
mod unit;

pub use error::TxnError;
pub use unit::{UnitOfWork, UnitState, WriteOrigin};

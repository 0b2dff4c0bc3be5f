// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Index-consistent records over an ordered store.
//!
//! A record kind implements [`Record`]: a serde type with a `docType` tag, an
//! owner, and a static list of [`IndexSpec`]s. The generic pieces of this
//! module then handle every kind the same way:
//!
//! - [`RecordStore`] maps ids to serialized records.
//! - [`IndexMaintainer`] keeps one sentinel entry per index spec per record.
//! - [`QueryEngine`] materializes range scans and equality queries.
//! - [`RecordContract`] stages each mutation (primary write plus index writes)
//!   in one [`UnitOfWork`](crate::txn::UnitOfWork) and gates it on ownership.
//!
//! # Index layout
//!
//! The entry for spec `S` over record `R` lives under
//! `build_key(S.name, [R.field_1, ..., R.field_n, R.ID])` and holds the single
//! byte `0x00`. Its payload is always re-read from the primary entry. Kinds
//! may share an index name; entries are resolved by id and filtered by
//! `docType`.

mod caller;
mod contract;
mod error;
mod index;
mod query;
mod store;

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::storage::Value;

pub use caller::Caller;
pub use contract::RecordContract;
pub use error::RecordError;
pub use index::IndexMaintainer;
pub use query::{Page, Predicate, QueryEngine, Records};
pub use store::RecordStore;

/// Name of the JSON field carrying the record kind.
pub const DOC_TYPE_FIELD: &str = "docType";

/// Value stored under every index entry.
pub const INDEX_SENTINEL: &[u8] = &[0x00];

/// A secondary index over a record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name, e.g. `classID~name`.
    pub name: &'static str,
    /// JSON field names forming the leading segments. The record id is
    /// always appended as the last segment.
    pub fields: &'static [&'static str],
}

impl IndexSpec {
    pub const fn new(name: &'static str, fields: &'static [&'static str]) -> Self {
        Self { name, fields }
    }
}

/// Who may create a record of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Any caller; the owner is taken from the submitted record.
    ExplicitOwner,
    /// Only callers carrying the attribute; the caller becomes the owner.
    CallerWithAttribute {
        name: &'static str,
        value: &'static str,
    },
}

/// A record kind stored by [`RecordContract`].
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + Send + Sync {
    /// Value of the `docType` field for this kind.
    const DOC_TYPE: &'static str;

    /// Secondary indexes maintained for this kind.
    const INDEXES: &'static [IndexSpec];

    /// Who may create records of this kind.
    const CREATE_POLICY: CreatePolicy = CreatePolicy::ExplicitOwner;

    /// Primary id.
    fn id(&self) -> &str;

    /// The `docType` tag carried by this value.
    fn doc_type(&self) -> &str;

    /// Identity allowed to mutate the record.
    fn owner(&self) -> &str;

    /// Replaces the owner. Only create and transfer call this.
    fn set_owner(&mut self, owner: String);

    /// Looks up an index spec of this kind by name.
    fn index(name: &str) -> Option<&'static IndexSpec> {
        Self::INDEXES.iter().find(|spec| spec.name == name)
    }
}

/// Serializes a record for the primary entry.
pub(crate) fn encode_record<R: Record>(record: &R) -> Result<Value, RecordError> {
    serde_json::to_vec(record)
        .map(Value::new)
        .map_err(|source| RecordError::Serialization {
            kind: R::DOC_TYPE,
            id: record.id().to_string(),
            source,
        })
}

/// Decodes a stored value as `R`.
///
/// Returns `None` for values that are not an `R`, including values of
/// another kind.
pub(crate) fn decode_record<R: Record>(bytes: &[u8]) -> Option<R> {
    serde_json::from_slice::<R>(bytes)
        .ok()
        .filter(|record| record.doc_type() == R::DOC_TYPE)
}

/// Decodes the value stored under `id`, failing if it is not an `R`.
pub(crate) fn decode_record_strict<R: Record>(id: &str, bytes: &[u8]) -> Result<R, RecordError> {
    let record: R = serde_json::from_slice(bytes).map_err(|source| RecordError::Serialization {
        kind: R::DOC_TYPE,
        id: id.to_string(),
        source,
    })?;

    if record.doc_type() != R::DOC_TYPE {
        return Err(RecordError::Serialization {
            kind: R::DOC_TYPE,
            id: id.to_string(),
            source: <serde_json::Error as serde::de::Error>::custom(format!(
                "stored docType is {:?}",
                record.doc_type()
            )),
        });
    }

    Ok(record)
}

/// Extracts the leading segment values of `spec` from `record`, in declared
/// order. The record id is not included.
pub(crate) fn index_values<R: Record>(
    record: &R,
    spec: &IndexSpec,
) -> Result<Vec<String>, RecordError> {
    let document = to_document(record)?;
    spec.fields
        .iter()
        .map(|field| field_value::<R>(&document, record.id(), field))
        .collect()
}

fn to_document<R: Record>(record: &R) -> Result<Map<String, JsonValue>, RecordError> {
    match serde_json::to_value(record) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(_) => Err(RecordError::InvalidArgument(format!(
            "{} {} does not serialize to a JSON object",
            R::DOC_TYPE,
            record.id()
        ))),
        Err(source) => Err(RecordError::Serialization {
            kind: R::DOC_TYPE,
            id: record.id().to_string(),
            source,
        }),
    }
}

fn field_value<R: Record>(
    document: &Map<String, JsonValue>,
    id: &str,
    field: &str,
) -> Result<String, RecordError> {
    match document.get(field) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        Some(JsonValue::Bool(b)) => Ok(b.to_string()),
        Some(_) => Err(RecordError::InvalidArgument(format!(
            "{} {id}: indexed field {field:?} is not a scalar",
            R::DOC_TYPE
        ))),
        None => Err(RecordError::InvalidArgument(format!(
            "{} {id}: indexed field {field:?} is missing",
            R::DOC_TYPE
        ))),
    }
}

// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Record layer error types.

use crate::storage::{KeyError, StoreError};
use crate::txn::{TxnError, WriteOrigin};

/// Errors returned by record operations. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("{kind} {id} does not exist")]
    NotFound { kind: &'static str, id: String },

    #[error("caller {caller} is not authorized to modify {kind} {id}")]
    Unauthorized {
        kind: &'static str,
        id: String,
        caller: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("key encoding error: {0}")]
    Encoding(#[from] KeyError),

    #[error("failed to write index {index} for record {id} (rolled back: {rolled_back}): {source}")]
    IndexWrite {
        index: &'static str,
        id: String,
        #[source]
        source: StoreError,
        rolled_back: bool,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("cannot (de)serialize {kind} {id}: {source}")]
    Serialization {
        kind: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<TxnError> for RecordError {
    fn from(err: TxnError) -> Self {
        match err {
            TxnError::AlreadyCommitted => {
                RecordError::InvalidArgument("unit of work already committed".to_string())
            }
            TxnError::AlreadyAborted => {
                RecordError::InvalidArgument("unit of work already aborted".to_string())
            }
            TxnError::Staging {
                origin: WriteOrigin::Index { index, id },
                source,
            } => RecordError::IndexWrite {
                index,
                id,
                source,
                rolled_back: true,
            },
            TxnError::Compensated {
                origin: WriteOrigin::Index { index, id },
                source,
            } => RecordError::IndexWrite {
                index,
                id,
                source,
                rolled_back: true,
            },
            TxnError::RepairRequired {
                origin: WriteOrigin::Index { index, id },
                source,
                ..
            } => RecordError::IndexWrite {
                index,
                id,
                source,
                rolled_back: false,
            },
            TxnError::Staging {
                origin: WriteOrigin::Primary { id },
                source,
            } => RecordError::InvalidArgument(format!("record {id}: {source}")),
            TxnError::Compensated { source, .. }
            | TxnError::RepairRequired { source, .. }
            | TxnError::Batch(source)
            | TxnError::Read(source) => RecordError::StoreUnavailable(source),
        }
    }
}

impl RecordError {
    /// Returns true if the error means the record was not found.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordError::NotFound { .. })
    }

    /// Returns true if the error is an authorization denial.
    #[inline]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RecordError::Unauthorized { .. })
    }
}

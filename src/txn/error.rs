// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Unit-of-work error types.

use crate::storage::StoreError;

use super::WriteOrigin;

/// Errors that can occur while staging or committing a unit of work.
#[derive(Debug, thiserror::Error)]
pub enum TxnError {
    #[error("unit of work already committed")]
    AlreadyCommitted,

    #[error("unit of work already aborted")]
    AlreadyAborted,

    #[error("cannot stage write for {origin}: {source}")]
    Staging {
        origin: WriteOrigin,
        #[source]
        source: StoreError,
    },

    #[error("atomic batch rejected, nothing was written: {0}")]
    Batch(#[source] StoreError),

    #[error("write for {origin} failed and earlier writes were rolled back: {source}")]
    Compensated {
        origin: WriteOrigin,
        #[source]
        source: StoreError,
    },

    #[error("write for {origin} failed and rollback failed too ({undo}); store needs repair: {source}")]
    RepairRequired {
        origin: WriteOrigin,
        #[source]
        source: StoreError,
        undo: StoreError,
    },

    #[error("read failed: {0}")]
    Read(#[from] StoreError),
}

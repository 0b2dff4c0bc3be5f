// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Composite key encoding and decoding.
//!
//! Index entries live in their own namespace below the primary keyspace.
//! Format: `[0x00][index name][0x00 0x01]([escaped segment][0x00 0x01])*`
//!
//! Inside a segment every `0x00` byte is written as `0x00 0xFF`. The terminator
//! `0x00 0x01` sorts below every escaped or literal continuation, so byte order
//! of encoded keys matches segment-wise byte order of the inputs, and a key
//! built from a prefix of the segments is a byte prefix of the full key.

use super::{Key, KeyError};

/// First byte of every composite key.
pub const INDEX_NAMESPACE: u8 = 0x00;

/// Smallest key in the primary keyspace. Primary ids never start with
/// [`INDEX_NAMESPACE`], so scans starting here skip every index entry.
pub const PRIMARY_KEYSPACE_START: &[u8] = &[0x01];

const ESCAPE: u8 = 0x00;
const TERMINATOR: u8 = 0x01;
const ESCAPED_NUL: u8 = 0xFF;

/// Builds a composite key from an index name and ordered segments.
///
/// Calling this with a leading subset of a record's segments yields the
/// prefix under which all matching entries sort contiguously.
pub fn build_key<S: AsRef<str>>(index_name: &str, segments: &[S]) -> Result<Key, KeyError> {
    if index_name.is_empty() {
        return Err(KeyError::EmptyIndexName);
    }
    if index_name.as_bytes().contains(&ESCAPE) {
        return Err(KeyError::ReservedByte {
            name: index_name.to_string(),
        });
    }

    let payload: usize = segments.iter().map(|s| s.as_ref().len() + 2).sum();
    let mut encoded = Vec::with_capacity(1 + index_name.len() + 2 + payload);

    encoded.push(INDEX_NAMESPACE);
    encoded.extend_from_slice(index_name.as_bytes());
    encoded.extend_from_slice(&[ESCAPE, TERMINATOR]);

    for segment in segments {
        for &byte in segment.as_ref().as_bytes() {
            if byte == ESCAPE {
                encoded.extend_from_slice(&[ESCAPE, ESCAPED_NUL]);
            } else {
                encoded.push(byte);
            }
        }
        encoded.extend_from_slice(&[ESCAPE, TERMINATOR]);
    }

    Ok(Key::new(encoded))
}

/// Builds the scan prefix for every key of `index_name` whose leading
/// segments equal `segments`.
#[inline]
pub fn partial_key<S: AsRef<str>>(index_name: &str, segments: &[S]) -> Result<Key, KeyError> {
    build_key(index_name, segments)
}

/// Decodes a composite key back into its index name and segments.
pub fn split_key(key: &Key) -> Result<(String, Vec<String>), KeyError> {
    let bytes = key.as_bytes();
    if bytes.first() != Some(&INDEX_NAMESPACE) {
        return Err(KeyError::Malformed(
            "missing index namespace byte".to_string(),
        ));
    }

    let mut parts = Vec::new();
    let mut current = Vec::new();
    let mut pos = 1;

    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte != ESCAPE {
            current.push(byte);
            pos += 1;
            continue;
        }

        match bytes.get(pos + 1) {
            Some(&TERMINATOR) => {
                let part = String::from_utf8(std::mem::take(&mut current))
                    .map_err(|_| KeyError::InvalidUtf8)?;
                parts.push(part);
            }
            Some(&ESCAPED_NUL) if !parts.is_empty() => current.push(ESCAPE),
            Some(other) => {
                return Err(KeyError::Malformed(format!(
                    "unexpected byte {other:#04x} after escape at offset {pos}"
                )));
            }
            None => {
                return Err(KeyError::Malformed("dangling escape byte".to_string()));
            }
        }
        pos += 2;
    }

    if !current.is_empty() {
        return Err(KeyError::Malformed("unterminated segment".to_string()));
    }

    let mut parts = parts.into_iter();
    let index_name = parts
        .next()
        .ok_or_else(|| KeyError::Malformed("missing index name".to_string()))?;
    if index_name.is_empty() {
        return Err(KeyError::EmptyIndexName);
    }

    Ok((index_name, parts.collect()))
}

/// Returns the exclusive upper bound of all keys starting with `prefix`.
///
/// Returns `None` when no such bound exists (the prefix is all `0xFF`).
pub fn prefix_upper_bound(prefix: &Key) -> Option<Key> {
    let mut bound = prefix.as_bytes().to_vec();
    while let Some(last) = bound.pop() {
        if last < u8::MAX {
            bound.push(last + 1);
            return Some(Key::new(bound));
        }
    }
    None
}

/// Checks that a primary record id is addressable in the primary keyspace.
pub fn validate_primary_id(id: &str) -> Result<(), KeyError> {
    match id.as_bytes().first() {
        None => Err(KeyError::EmptyId),
        Some(&INDEX_NAMESPACE) => Err(KeyError::IdInIndexNamespace { id: id.to_string() }),
        Some(_) => Ok(()),
    }
}

/// Returns true if the raw key belongs to the index namespace.
#[inline]
pub fn is_index_key(key: &Key) -> bool {
    key.as_bytes().first() == Some(&INDEX_NAMESPACE)
}

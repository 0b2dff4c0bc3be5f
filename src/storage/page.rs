// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Bookmark handling for paginated scans.
//!
//! A bookmark is the hex encoding of the last key returned. Resuming starts at
//! the immediate successor of that key, so an exhausted cursor keeps returning
//! empty pages instead of wrapping around.

use super::key::prefix_upper_bound;
use super::{Key, KvIter, KvPage, StoreError, MAX_KEY_SIZE};

/// Encodes the resume token for a page ending at `last`.
#[inline]
pub(crate) fn encode_bookmark(last: &Key) -> String {
    hex::encode(last.as_bytes())
}

/// Computes where a scan starting at `start` resumes for `bookmark`.
///
/// Returns `None` when no storable key sorts after the bookmarked one.
pub(crate) fn resume_key(start: &Key, bookmark: &str) -> Result<Option<Key>, StoreError> {
    if bookmark.is_empty() {
        return Ok(Some(start.clone()));
    }

    let last = hex::decode(bookmark).map_err(|e| StoreError::InvalidBookmark(e.to_string()))?;
    if last.len() > MAX_KEY_SIZE {
        return Err(StoreError::InvalidBookmark(format!(
            "bookmarked key is {} bytes, max {MAX_KEY_SIZE}",
            last.len()
        )));
    }

    // A key of maximum size has no storable extension, so the next key lies
    // past every key it prefixes.
    let successor = if last.len() < MAX_KEY_SIZE {
        let mut successor = last;
        successor.push(0x00);
        Key::new(successor)
    } else {
        match prefix_upper_bound(&Key::new(last)) {
            Some(bound) => bound,
            None => return Ok(None),
        }
    };

    Ok(Some(std::cmp::max(start.clone(), successor)))
}

/// Returns an empty page for an exhausted cursor.
pub(crate) fn exhausted_page(page_size: u32, bookmark: &str) -> Result<KvPage, StoreError> {
    collect_page(Box::new(std::iter::empty()), page_size, bookmark)
}

/// Drains up to `page_size` entries from `iter` into a page.
///
/// An empty page hands back the caller's bookmark unchanged.
pub(crate) fn collect_page(
    iter: KvIter<'_>,
    page_size: u32,
    bookmark: &str,
) -> Result<KvPage, StoreError> {
    if page_size == 0 {
        return Err(StoreError::InvalidQuery(
            "page size must be positive".to_string(),
        ));
    }

    let mut entries = Vec::with_capacity((page_size as usize).min(1000));
    for item in iter.take(page_size as usize) {
        entries.push(item?);
    }

    let bookmark = match entries.last() {
        Some((key, _)) => encode_bookmark(key),
        None => bookmark.to_string(),
    };

    Ok(KvPage {
        fetched_count: entries.len() as u32,
        entries,
        bookmark,
    })
}

// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Caller identity.

use std::collections::BTreeMap;
use std::fmt;

/// The identity presenting a request, plus any attributes its credential
/// carries. The identity string is opaque and compared byte-for-byte with
/// record owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    id: String,
    attributes: BTreeMap<String, String>,
}

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds a credential attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the value of a credential attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

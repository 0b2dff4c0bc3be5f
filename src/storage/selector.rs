// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Equality selectors for rich queries over stored JSON documents.
//!
//! A selector serializes to the familiar `{"selector":{"field":"value",...}}`
//! query string. Only field equality is supported; operator objects such as
//! `{"$gt": 1}` are rejected at parse time.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{KvIter, StoreError};

/// A conjunction of `field == value` constraints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    selector: Map<String, JsonValue>,
}

impl Selector {
    /// Creates an empty selector that matches every JSON object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint, replacing any previous one on `field`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.selector.insert(field.into(), value.into());
        self
    }

    /// Parses a query string such as `{"selector":{"docType":"lab"}}`.
    pub fn parse(query: &str) -> Result<Self, StoreError> {
        let selector: Selector =
            serde_json::from_str(query).map_err(|e| StoreError::InvalidQuery(e.to_string()))?;

        for (field, value) in &selector.selector {
            if value.is_object() || value.is_array() {
                return Err(StoreError::InvalidQuery(format!(
                    "field {field:?}: only equality on scalar values is supported"
                )));
            }
        }

        Ok(selector)
    }

    /// Returns the constraint on `field`, if any.
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.selector.get(field)
    }

    /// Returns the constrained fields and their required values.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.selector.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if `document` is a JSON object satisfying every constraint.
    pub fn matches(&self, document: &[u8]) -> bool {
        match serde_json::from_slice::<Map<String, JsonValue>>(document) {
            Ok(doc) => self
                .selector
                .iter()
                .all(|(field, expected)| doc.get(field) == Some(expected)),
            Err(_) => false,
        }
    }

    /// Renders the selector as a query string.
    pub fn to_query_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"selector\":{}}"))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Keeps only entries whose value matches `selector`. Store errors pass through.
pub(crate) fn filter_matching<'a>(iter: KvIter<'a>, selector: Selector) -> KvIter<'a> {
    Box::new(iter.filter(move |item| match item {
        Ok((_, value)) => selector.matches(value.as_bytes()),
        Err(_) => true,
    }))
}

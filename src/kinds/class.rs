// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Classes.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::record::{Caller, CreatePolicy, IndexSpec, Record, RecordContract, RecordError};
use crate::storage::OrderedStore;

/// Credential attribute that allows creating classes.
pub const CLASS_CREATOR_ATTRIBUTE: &str = "class.creator";

/// A class. Owned by the caller that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    #[serde(rename = "docType")]
    pub doc_type: String,
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub content: String,
    pub owner: String,
}

impl Class {
    /// Creates an unowned class. The owner is assigned on create.
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            doc_type: Self::DOC_TYPE.to_string(),
            id: id.into(),
            name: name.into(),
            content: content.into(),
            owner: String::new(),
        }
    }

    fn owned_by(mut self, owner: &str) -> Self {
        self.owner = owner.to_string();
        self
    }
}

impl Record for Class {
    const DOC_TYPE: &'static str = "class";
    const INDEXES: &'static [IndexSpec] = &[];
    const CREATE_POLICY: CreatePolicy = CreatePolicy::CallerWithAttribute {
        name: CLASS_CREATOR_ATTRIBUTE,
        value: "true",
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn doc_type(&self) -> &str {
        &self.doc_type
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn set_owner(&mut self, owner: String) {
        self.owner = owner;
    }
}

impl<S: OrderedStore + ?Sized> RecordContract<Class, S> {
    /// Replaces the name and content of a class.
    #[instrument(skip(self, caller, content), fields(caller = %caller))]
    pub fn update_class(
        &self,
        id: &str,
        caller: &Caller,
        name: &str,
        content: &str,
    ) -> Result<Class, RecordError> {
        self.update(id, caller, |class| {
            class.name = name.to_string();
            class.content = content.to_string();
        })
    }
}

/// Demo classes, one per instructor.
pub fn seed_classes() -> Vec<Class> {
    [
        ("class1", "Tomoko"),
        ("class2", "Brad"),
        ("class3", "Jin Soo"),
        ("class4", "Max"),
        ("class5", "Adriana"),
        ("class6", "Michel"),
    ]
    .into_iter()
    .map(|(id, owner)| Class::new(id, id, "test").owned_by(owner))
    .collect()
}

// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Lab submissions and their scores.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::record::{Caller, IndexSpec, Record, RecordContract, RecordError};
use crate::storage::OrderedStore;

use super::{ClassScoped, LabScoped, LAB_SCOPED_INDEXES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "docType")]
    pub doc_type: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "classID")]
    pub class_id: String,
    #[serde(rename = "labID")]
    pub lab_id: String,
    pub content: String,
    pub owner: String,
    pub score: u32,
}

impl Submission {
    /// Creates an unscored submission.
    pub fn new(
        id: impl Into<String>,
        class_id: impl Into<String>,
        lab_id: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: Self::DOC_TYPE.to_string(),
            id: id.into(),
            class_id: class_id.into(),
            lab_id: lab_id.into(),
            content: String::new(),
            owner: owner.into(),
            score: 0,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl Record for Submission {
    const DOC_TYPE: &'static str = "submission";
    const INDEXES: &'static [IndexSpec] = LAB_SCOPED_INDEXES;

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

impl ClassScoped for Submission {}
impl LabScoped for Submission {}

impl<S: OrderedStore + ?Sized> RecordContract<Submission, S> {
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub fn update_score(
        &self,
        id: &str,
        caller: &Caller,
        score: u32,
    ) -> Result<Submission, RecordError> {
        let submission = self.update(id, caller, |submission| submission.score = score)?;
        info!(score, "Scored submission");
        Ok(submission)
    }
}

pub fn seed_submissions() -> Vec<Submission> {
    [
        ("submission1", "lab1", "Tom"),
        ("submission2", "lab1", "Tom"),
        ("submission3", "lab2", "Sam"),
    ]
    .into_iter()
    .map(|(id, lab, owner)| Submission::new(id, "class1", lab, owner).with_content("test"))
    .collect()
}

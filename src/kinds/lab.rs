// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Labs, scheduled within a class.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::record::{Caller, IndexSpec, Record, RecordContract, RecordError};
use crate::storage::OrderedStore;

use super::{ClassScoped, CLASS_INDEX};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lab {
    #[serde(rename = "docType")]
    pub doc_type: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "classID")]
    pub class_id: String,
    pub name: String,
    pub content: String,
    pub image: String,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    pub owner: String,
}

impl Lab {
    pub fn new(
        id: impl Into<String>,
        class_id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: Self::DOC_TYPE.to_string(),
            id: id.into(),
            class_id: class_id.into(),
            name: name.into(),
            content: String::new(),
            image: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            owner: owner.into(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_schedule(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = start.into();
        self.end_time = end.into();
        self
    }
}

impl Record for Lab {
    const DOC_TYPE: &'static str = "lab";
    const INDEXES: &'static [IndexSpec] = &[IndexSpec::new(CLASS_INDEX, &["classID"])];

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

impl ClassScoped for Lab {}

/// Editable fields of a lab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabDetails {
    pub name: String,
    pub content: String,
    pub image: String,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
}

impl<S: OrderedStore + ?Sized> RecordContract<Lab, S> {
    #[instrument(skip(self, caller, content), fields(caller = %caller))]
    pub fn update_content(
        &self,
        id: &str,
        caller: &Caller,
        content: &str,
    ) -> Result<Lab, RecordError> {
        self.update(id, caller, |lab| lab.content = content.to_string())
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub fn update_image(&self, id: &str, caller: &Caller, image: &str) -> Result<Lab, RecordError> {
        self.update(id, caller, |lab| lab.image = image.to_string())
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub fn update_end_time(
        &self,
        id: &str,
        caller: &Caller,
        end_time: &str,
    ) -> Result<Lab, RecordError> {
        self.update(id, caller, |lab| lab.end_time = end_time.to_string())
    }

    /// Replaces every editable field at once.
    #[instrument(skip(self, caller, details), fields(caller = %caller))]
    pub fn update_lab(
        &self,
        id: &str,
        caller: &Caller,
        details: LabDetails,
    ) -> Result<Lab, RecordError> {
        self.update(id, caller, |lab| {
            lab.name = details.name;
            lab.content = details.content;
            lab.image = details.image;
            lab.start_time = details.start_time;
            lab.end_time = details.end_time;
        })
    }
}

/// Demo labs: three labs of `class1` owned by Tom.
pub fn seed_labs() -> Vec<Lab> {
    ["lab1", "lab2", "lab3"]
        .into_iter()
        .map(|id| {
            Lab::new(id, "class1", "class1", "Tom")
                .with_content("test")
                .with_image("1")
                .with_schedule("2022", "2022")
        })
        .collect()
}

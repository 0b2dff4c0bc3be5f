// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Lab instances provisioned for a student.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::record::{Caller, IndexSpec, Record, RecordContract, RecordError};
use crate::storage::OrderedStore;

use super::{ClassScoped, LabScoped, LAB_SCOPED_INDEXES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(rename = "docType")]
    pub doc_type: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "classID")]
    pub class_id: String,
    #[serde(rename = "labID")]
    pub lab_id: String,
    pub config: String,
    pub owner: String,
}

impl Instance {
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
            config: String::new(),
            owner: owner.into(),
        }
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }
}

impl Record for Instance {
    const DOC_TYPE: &'static str = "instance";
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

impl ClassScoped for Instance {}
impl LabScoped for Instance {}

impl<S: OrderedStore + ?Sized> RecordContract<Instance, S> {
    /// Replaces the provisioning config of an instance.
    #[instrument(skip(self, caller, config), fields(caller = %caller))]
    pub fn update_config(
        &self,
        id: &str,
        caller: &Caller,
        config: &str,
    ) -> Result<Instance, RecordError> {
        self.update(id, caller, |instance| instance.config = config.to_string())
    }
}

pub fn seed_instances() -> Vec<Instance> {
    [
        ("instance1", "lab1", "Tom"),
        ("instance2", "lab1", "Tom"),
        ("instance3", "lab2", "Sam"),
    ]
    .into_iter()
    .map(|(id, lab, owner)| Instance::new(id, "class1", lab, owner).with_config("test"))
    .collect()
}

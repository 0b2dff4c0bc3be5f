// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The record kinds of the lab platform.
//!
//! | Kind         | Indexes                                        |
//! |--------------|------------------------------------------------|
//! | `class`      | none                                           |
//! | `lab`        | `classID~name`                                 |
//! | `instance`   | `labID~name`, `classID~name`, `owner~name`     |
//! | `submission` | `labID~name`, `classID~name`, `owner~name`     |
//!
//! Kinds that belong to a class or a lab get the `query_by_*` (rich query)
//! and `list_by_*` (index scan) lookups through [`ClassScoped`] and
//! [`LabScoped`].

mod class;
mod instance;
mod lab;
mod submission;

use std::sync::Arc;

use tracing::info;

use crate::record::{Caller, IndexSpec, Predicate, Record, RecordContract, RecordError};
use crate::storage::OrderedStore;

pub use class::{seed_classes, Class, CLASS_CREATOR_ATTRIBUTE};
pub use instance::{seed_instances, Instance};
pub use lab::{seed_labs, Lab, LabDetails};
pub use submission::{seed_submissions, Submission};

pub type ClassContract<S> = RecordContract<Class, S>;
pub type LabContract<S> = RecordContract<Lab, S>;
pub type InstanceContract<S> = RecordContract<Instance, S>;
pub type SubmissionContract<S> = RecordContract<Submission, S>;

pub const CLASS_INDEX: &str = "classID~name";
pub const LAB_INDEX: &str = "labID~name";
pub const OWNER_INDEX: &str = "owner~name";

/// Indexes shared by instances and submissions.
pub(crate) const LAB_SCOPED_INDEXES: &[IndexSpec] = &[
    IndexSpec::new(LAB_INDEX, &["labID"]),
    IndexSpec::new(CLASS_INDEX, &["classID"]),
    IndexSpec::new(OWNER_INDEX, &["owner"]),
];

/// A kind carrying a `classID` field indexed by `classID~name`.
pub trait ClassScoped: Record {}

/// A kind carrying a `labID` field indexed by `labID~name`, and indexed by
/// owner.
pub trait LabScoped: ClassScoped {}

impl<R: ClassScoped, S: OrderedStore + ?Sized> RecordContract<R, S> {
    /// Records of this kind in `class_id`, via rich query.
    pub fn query_by_class(&self, class_id: &str) -> Result<Vec<R>, RecordError> {
        self.query(&Predicate::new().eq("classID", class_id))
    }

    /// Records of this kind in `class_id`, via the class index.
    pub fn list_by_class(&self, class_id: &str) -> Result<Vec<R>, RecordError> {
        self.query_by_index(CLASS_INDEX, &[class_id])
    }
}

impl<R: LabScoped, S: OrderedStore + ?Sized> RecordContract<R, S> {
    /// Records of this kind for `lab_id`, via rich query.
    pub fn query_by_lab(&self, lab_id: &str) -> Result<Vec<R>, RecordError> {
        self.query(&Predicate::new().eq("labID", lab_id))
    }

    /// Records of this kind owned by `owner`, via rich query.
    pub fn query_by_owner(&self, owner: &str) -> Result<Vec<R>, RecordError> {
        self.query(&Predicate::new().eq("owner", owner))
    }

    /// Records of this kind for `lab_id`, via the lab index.
    pub fn list_by_lab(&self, lab_id: &str) -> Result<Vec<R>, RecordError> {
        self.query_by_index(LAB_INDEX, &[lab_id])
    }

    /// Records of this kind owned by `owner`, via the owner index.
    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<R>, RecordError> {
        self.query_by_index(OWNER_INDEX, &[owner])
    }
}

/// Number of demo records created per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SeedReport {
    pub classes: usize,
    pub labs: usize,
    pub instances: usize,
    pub submissions: usize,
}

/// Loads the demo records of every kind. Records already present are kept.
pub fn seed_demo<S: OrderedStore + ?Sized>(store: Arc<S>) -> Result<SeedReport, RecordError> {
    let mut report = SeedReport::default();

    // Classes are owned by whoever creates them
    let classes = ClassContract::new(store.clone());
    for class in seed_classes() {
        let creator =
            Caller::new(class.owner.clone()).with_attribute(CLASS_CREATOR_ATTRIBUTE, "true");
        report.classes += classes.seed(&creator, vec![class])?;
    }

    let loader = Caller::new("seed");
    report.labs = LabContract::new(store.clone()).seed(&loader, seed_labs())?;
    report.instances = InstanceContract::new(store.clone()).seed(&loader, seed_instances())?;
    report.submissions = SubmissionContract::new(store).seed(&loader, seed_submissions())?;

    info!(
        classes = report.classes,
        labs = report.labs,
        instances = report.instances,
        submissions = report.submissions,
        "Seeded demo records"
    );
    Ok(report)
}

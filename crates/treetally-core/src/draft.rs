//! In-progress tree submission shared between the wizard steps.
//!
//! A [`DraftSession`] is created when a record flow starts and dropped when it
//! ends. Screens receive it by reference; navigation only carries its
//! [`DraftId`].

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::record::StudentDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftId(Uuid);

impl DraftId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One validated stem; serialized as `{"height", "diameter"}` in the submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StemMeasurement {
    pub height: f64,
    pub diameter: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftRecord {
    pub tree_id: String,
    pub num_branches: u32,
    pub stem_data: Vec<StemMeasurement>,
    pub student_name: String,
    pub student_roll_no: String,
    pub student_group: String,
    pub is_admin: bool,
}

impl DraftRecord {
    pub fn student_details(&self) -> Option<StudentDetails> {
        let details = StudentDetails {
            name: self.student_name.clone(),
            roll_no: self.student_roll_no.clone(),
            group: self.student_group.clone(),
        };
        details.is_complete().then_some(details)
    }
}

/// Partial update; `None` fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    pub tree_id: Option<String>,
    pub num_branches: Option<u32>,
    pub stem_data: Option<Vec<StemMeasurement>>,
    pub student_name: Option<String>,
    pub student_roll_no: Option<String>,
    pub student_group: Option<String>,
    pub is_admin: Option<bool>,
}

impl DraftPatch {
    pub fn with_student(mut self, details: &StudentDetails) -> Self {
        self.student_name = Some(details.name.clone());
        self.student_roll_no = Some(details.roll_no.clone());
        self.student_group = Some(details.group.clone());
        self
    }
}

#[derive(Debug)]
pub struct DraftSession {
    id: DraftId,
    record: DraftRecord,
}

impl DraftSession {
    pub fn begin() -> Self {
        Self {
            id: DraftId::generate(),
            record: DraftRecord::default(),
        }
    }

    pub fn id(&self) -> DraftId {
        self.id
    }

    pub fn read(&self) -> DraftRecord {
        self.record.clone()
    }

    pub fn record(&self) -> &DraftRecord {
        &self.record
    }

    pub fn update(&mut self, patch: DraftPatch) {
        let record = &mut self.record;
        if let Some(value) = patch.tree_id {
            record.tree_id = value;
        }
        if let Some(value) = patch.num_branches {
            record.num_branches = value;
        }
        if let Some(value) = patch.stem_data {
            record.stem_data = value;
        }
        if let Some(value) = patch.student_name {
            record.student_name = value;
        }
        if let Some(value) = patch.student_roll_no {
            record.student_roll_no = value;
        }
        if let Some(value) = patch.student_group {
            record.student_group = value;
        }
        if let Some(value) = patch.is_admin {
            record.is_admin = value;
        }
    }

    pub fn reset(&mut self) {
        self.record = DraftRecord::default();
    }
}

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::draft::StemMeasurement;

pub const STUDENT_DETAILS_KEY_PREFIX: &str = "studentDetails_";

pub fn student_details_key(email: &str) -> String {
    format!("{STUDENT_DETAILS_KEY_PREFIX}{email}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDetails {
    #[serde(rename = "studentName")]
    pub name: String,
    #[serde(rename = "studentRollNo")]
    pub roll_no: String,
    #[serde(rename = "studentGroup")]
    pub group: String,
}

impl StudentDetails {
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.roll_no, &self.group]
            .iter()
            .all(|value| !value.trim().is_empty())
    }
}

/// Local reference to a captured or selected photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// The record handed to the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub tree_id: String,
    pub num_branches: u32,
    pub stem_data: Vec<StemMeasurement>,
    pub student_name: String,
    pub student_roll_no: String,
    pub student_group: String,
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_details_use_camel_case_json() {
        let details = StudentDetails {
            name: "Asha".to_string(),
            roll_no: "42".to_string(),
            group: "B".to_string(),
        };
        let raw = serde_json::to_string(&details).expect("serialize");
        assert_eq!(
            raw,
            r#"{"studentName":"Asha","studentRollNo":"42","studentGroup":"B"}"#
        );
        let parsed: StudentDetails = serde_json::from_str(&raw).expect("parse");
        assert_eq!(parsed, details);
    }

    #[test]
    fn student_details_blank_field_is_incomplete() {
        let details = StudentDetails {
            name: "Asha".to_string(),
            roll_no: "  ".to_string(),
            group: "B".to_string(),
        };
        assert!(!details.is_complete());
    }

    #[test]
    fn submission_record_serializes_wire_field_names() {
        let record = SubmissionRecord {
            tree_id: "T100".to_string(),
            num_branches: 1,
            stem_data: vec![StemMeasurement {
                height: 12.5,
                diameter: 30.0,
            }],
            student_name: "Asha".to_string(),
            student_roll_no: "42".to_string(),
            student_group: "B".to_string(),
            user_email: "asha@example.edu".to_string(),
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["treeId"], "T100");
        assert_eq!(value["numBranches"], 1);
        assert_eq!(value["stemData"][0]["height"], 12.5);
        assert_eq!(value["stemData"][0]["diameter"], 30.0);
        assert_eq!(value["userEmail"], "asha@example.edu");
    }

    #[test]
    fn key_is_prefixed_with_email() {
        assert_eq!(
            student_details_key("a@b.c"),
            "studentDetails_a@b.c".to_string()
        );
    }
}

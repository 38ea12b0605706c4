use thiserror::Error;

use crate::draft::DraftRecord;
use crate::record::{StudentDetails, SubmissionRecord};
use crate::services::ServiceFailure;

/// Reasons a save attempt stops before or at the persistence call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("Please select or capture a photo before saving.")]
    NoImage,
    #[error("No signed-in user. Set identity.email in the treetally config.")]
    NotSignedIn,
    #[error("Student details are missing for {email}. Open Student details to add them.")]
    StudentDetailsMissing { email: String },
    #[error("Stem data is missing. Go back and enter every stem's measurements.")]
    MissingStemData,
    #[error("A save is already in progress.")]
    SaveInFlight,
    #[error("{message}")]
    Service { message: String },
}

impl From<ServiceFailure> for SaveError {
    fn from(value: ServiceFailure) -> Self {
        Self::Service {
            message: value.message,
        }
    }
}

/// Builds the persisted record from a draft whose student fields are already resolved.
pub fn assemble_submission(
    record: &DraftRecord,
    student: &StudentDetails,
    email: &str,
) -> Result<SubmissionRecord, SaveError> {
    let expected = usize::try_from(record.num_branches).unwrap_or(usize::MAX);
    if record.stem_data.is_empty() || record.stem_data.len() != expected {
        return Err(SaveError::MissingStemData);
    }

    Ok(SubmissionRecord {
        tree_id: record.tree_id.clone(),
        num_branches: record.num_branches,
        stem_data: record.stem_data.clone(),
        student_name: student.name.clone(),
        student_roll_no: student.roll_no.clone(),
        student_group: student.group.clone(),
        user_email: email.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crate::draft::StemMeasurement;

    use super::*;

    fn student() -> StudentDetails {
        StudentDetails {
            name: "Asha".to_string(),
            roll_no: "42".to_string(),
            group: "B".to_string(),
        }
    }

    fn draft(num_branches: u32, stems: usize) -> DraftRecord {
        DraftRecord {
            tree_id: "T100".to_string(),
            num_branches,
            stem_data: vec![
                StemMeasurement {
                    height: 4.5,
                    diameter: 0.3,
                };
                stems
            ],
            ..DraftRecord::default()
        }
    }

    #[test]
    fn assembles_record_with_user_email() {
        let record = assemble_submission(&draft(2, 2), &student(), "asha@example.edu")
            .expect("assemble");

        assert_eq!(record.tree_id, "T100");
        assert_eq!(record.stem_data.len(), 2);
        assert_eq!(record.student_roll_no, "42");
        assert_eq!(record.user_email, "asha@example.edu");

        let json = serde_json::to_value(&record).expect("json");
        assert_eq!(json["numBranches"], 2);
        assert_eq!(json["stemData"][0]["height"], 4.5);
        assert_eq!(json["userEmail"], "asha@example.edu");
    }

    #[test]
    fn empty_or_mismatched_stem_data_is_rejected() {
        assert_eq!(
            assemble_submission(&draft(2, 0), &student(), "a@b.c"),
            Err(SaveError::MissingStemData)
        );
        assert_eq!(
            assemble_submission(&draft(3, 2), &student(), "a@b.c"),
            Err(SaveError::MissingStemData)
        );
    }

    #[test]
    fn service_failure_message_is_shown_verbatim() {
        let error = SaveError::from(ServiceFailure::new("network unavailable"));
        assert_eq!(error.to_string(), "network unavailable");
    }
}

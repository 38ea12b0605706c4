use anyhow::{Context, Result};
use treetally_core::draft::DraftPatch;
use treetally_core::record::StudentDetails;
use treetally_core::store::{load_student_details, save_student_details};
use treetally_core::validation::validate_student_details;

use crate::App;
use crate::record::RecordSession;

impl<'a> App<'a> {
    pub fn student_details(&self, email: &str) -> Result<Option<StudentDetails>> {
        load_student_details(self.services.store.as_ref(), email)
            .with_context(|| format!("failed to load student details for {email}"))
    }

    /// Validates and stores the details for `email`, returning what was written.
    pub fn save_student_details(
        &self,
        email: &str,
        name: &str,
        roll_no: &str,
        group: &str,
    ) -> Result<StudentDetails> {
        let details = validate_student_details(name, roll_no, group)?;
        save_student_details(self.services.store.as_ref(), email, &details)
            .with_context(|| format!("failed to save student details for {email}"))?;
        tracing::info!(email, "student details saved");
        Ok(details)
    }

    pub fn apply_student_details(&self, session: &mut RecordSession, details: &StudentDetails) {
        session
            .draft
            .update(DraftPatch::default().with_student(details));
    }
}

use anyhow::Result;
use treetally_core::draft::{DraftPatch, DraftSession};
use treetally_core::navigation::{Navigator, Route};
use treetally_core::record::{ImageRef, StudentDetails, SubmissionRecord};
use treetally_core::save_gate::SaveTicket;
use treetally_core::services::PersistenceService;
use treetally_core::store::load_student_details;
use treetally_core::submission::{SaveError, assemble_submission};
use treetally_core::validation::{StemEntryInput, validate_stem_entries, validate_tree_identity};

use crate::App;

/// One pass through the wizard: the draft, where the user is, and the chosen photo.
#[derive(Debug)]
pub struct RecordSession {
    pub draft: DraftSession,
    pub navigator: Navigator,
    pub image: Option<ImageRef>,
}

impl RecordSession {
    pub fn current_route(&self) -> Route {
        self.navigator.current()
    }

    /// Pops one screen. Draft contents are kept so returning forward shows them again.
    pub fn back(&mut self) -> Option<Route> {
        self.navigator.back()
    }

    /// On success the draft and photo are cleared and the wizard restarts at
    /// step one. A failure leaves everything as it was.
    pub fn apply_save_result(&mut self, result: Result<(), SaveError>) -> Result<(), SaveError> {
        match result {
            Ok(()) => {
                self.draft.reset();
                self.image = None;
                self.navigator.reset_to(Route::TreeIdentity);
                tracing::info!(draft = %self.draft.id(), "save succeeded");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "save failed");
                Err(error)
            }
        }
    }
}

/// A validated submission holding the save slot until it is persisted or dropped.
#[derive(Debug)]
pub struct PreparedSave {
    pub record: SubmissionRecord,
    pub image: ImageRef,
    ticket: SaveTicket,
}

impl PreparedSave {
    pub fn persist(self, persistence: &dyn PersistenceService) -> Result<(), SaveError> {
        let Self {
            record,
            image,
            ticket,
        } = self;
        let result = persistence.save(&record, &image).map_err(SaveError::from);
        drop(ticket);
        result
    }
}

impl<'a> App<'a> {
    /// Starts a draft, carrying the signed-in user's saved details into it.
    pub fn begin_record(&self, email: Option<&str>) -> Result<RecordSession> {
        let mut draft = DraftSession::begin();

        if let Some(email) = email
            && let Some(details) = load_student_details(self.services.store.as_ref(), email)?
        {
            draft.update(DraftPatch::default().with_student(&details));
        }

        tracing::info!(draft = %draft.id(), "record session started");
        Ok(RecordSession {
            draft,
            navigator: Navigator::new(Route::TreeIdentity),
            image: None,
        })
    }

    pub fn submit_tree_identity(
        &self,
        session: &mut RecordSession,
        tree_id: &str,
        branch_count: &str,
    ) -> Result<Route> {
        let identity = validate_tree_identity(tree_id, branch_count)?;

        let mut patch = DraftPatch {
            tree_id: Some(identity.tree_id.clone()),
            num_branches: Some(identity.num_branches),
            ..DraftPatch::default()
        };
        if let Some(details) = session.draft.record().student_details() {
            patch = patch.with_student(&details);
        }
        session.draft.update(patch);

        let route = Route::StemMeasurements {
            draft: session.draft.id(),
        };
        session.navigator.push(route);
        tracing::info!(
            tree_id = %identity.tree_id,
            num_branches = identity.num_branches,
            "tree identity accepted"
        );
        Ok(route)
    }

    /// Exactly one entry per stem, prefilled when the draft already holds that many.
    pub fn stem_entries_for(&self, session: &RecordSession) -> Vec<StemEntryInput> {
        let record = session.draft.record();
        let count = usize::try_from(record.num_branches).unwrap_or_default();

        if record.stem_data.len() == count {
            return record
                .stem_data
                .iter()
                .map(|stem| StemEntryInput::new(stem.height.to_string(), stem.diameter.to_string()))
                .collect();
        }

        vec![StemEntryInput::default(); count]
    }

    pub fn submit_stems(
        &self,
        session: &mut RecordSession,
        entries: &[StemEntryInput],
    ) -> Result<Route> {
        let measurements = validate_stem_entries(entries)?;
        let record = session.draft.record();

        let mut patch = DraftPatch {
            tree_id: Some(record.tree_id.clone()),
            num_branches: Some(record.num_branches),
            stem_data: Some(measurements),
            ..DraftPatch::default()
        };
        if let Some(details) = record.student_details() {
            patch = patch.with_student(&details);
        }
        session.draft.update(patch);

        let route = Route::PhotoAndSave {
            draft: session.draft.id(),
        };
        session.navigator.push(route);
        tracing::info!(stems = entries.len(), "stem measurements accepted");
        Ok(route)
    }

    /// Runs the pre-save checks and claims the save slot.
    ///
    /// Errors carry a [`SaveError`] when the attempt is rejected. The session is
    /// only read; stored student details go into the record, not the draft.
    pub fn prepare_save(
        &self,
        session: &RecordSession,
        email: Option<&str>,
    ) -> Result<PreparedSave> {
        let ticket = self
            .save_gate
            .try_acquire()
            .ok_or(SaveError::SaveInFlight)?;

        let image = session.image.clone().ok_or(SaveError::NoImage)?;
        let email = email.ok_or(SaveError::NotSignedIn)?;
        let student = self.resolve_student(session, email)?;
        let record = assemble_submission(session.draft.record(), &student, email)?;

        tracing::info!(tree_id = %record.tree_id, image = %image, "save started");
        Ok(PreparedSave {
            record,
            image,
            ticket,
        })
    }

    /// Applies the outcome of a persistence call to the session.
    pub fn finish_save(
        &self,
        session: &mut RecordSession,
        result: Result<(), SaveError>,
    ) -> Result<(), SaveError> {
        session.apply_save_result(result)
    }

    /// Prepares, persists and finishes a save on the calling thread.
    pub fn save(&self, session: &mut RecordSession, email: Option<&str>) -> Result<()> {
        let prepared = self.prepare_save(session, email)?;
        let result = prepared.persist(self.services.persistence.as_ref());
        self.finish_save(session, result)?;
        Ok(())
    }

    /// Draft fields win when complete; otherwise the details stored for `email`.
    fn resolve_student(&self, session: &RecordSession, email: &str) -> Result<StudentDetails> {
        if let Some(details) = session.draft.record().student_details() {
            return Ok(details);
        }

        let details = load_student_details(self.services.store.as_ref(), email)?
            .filter(StudentDetails::is_complete)
            .ok_or_else(|| SaveError::StudentDetailsMissing {
                email: email.to_string(),
            })?;
        Ok(details)
    }
}

mod keys;
mod render;

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Result;
use crossterm::event::KeyEvent;
use treetally_app::{App, RecordSession};
use treetally_core::draft::DraftPatch;
use treetally_core::navigation::Route;
use treetally_core::record::{ImageRef, StudentDetails};
use treetally_core::services::IdentityState;
use treetally_core::validation::{StemEntryInput, StemError, StemErrorKind, StemField};

use crate::UiExit;
use crate::details_flow::details_form;
use crate::ui::binary_choice::BinaryChoice;
use crate::ui::field::{FieldFilter, FieldForm, TextField};
use crate::ui::loading::{
    FlowLoader, IdentityResult, LoadingState, SaveResult, SystemFlowLoader,
};
use crate::ui::picker::PickerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowSignal {
    Continue,
    Exit(UiExit),
}

/// Blocking layer drawn over the current step; it takes every key until dismissed.
#[derive(Debug, Clone)]
enum Overlay {
    Error(String),
    Notice(String),
    DetailsPrompt { message: String, choice: BinaryChoice },
    Gallery(PickerState<ImageRef>),
}

#[derive(Debug)]
struct SavingState {
    tree_id: String,
    loading: LoadingState,
    receiver: Receiver<SaveResult>,
}

struct RecordFlow {
    loader: Arc<dyn FlowLoader>,
    identity: IdentityState,
    identity_loading: LoadingState,
    identity_receiver: Option<Receiver<IdentityResult>>,
    session: RecordSession,
    tree_form: FieldForm,
    stem_form: FieldForm,
    details_form: FieldForm,
    overlay: Option<Overlay>,
    saving: Option<SavingState>,
}

pub(crate) struct RecordScreen {
    flow: RecordFlow,
}

impl RecordScreen {
    pub(crate) fn new(app: &App<'_>) -> Result<Self> {
        Ok(Self {
            flow: RecordFlow::new_with_loader(app, Arc::new(SystemFlowLoader::new()))?,
        })
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        self.flow.render(frame);
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent, app: &App<'_>) -> Result<Option<UiExit>> {
        match self.flow.on_key(key, app)? {
            FlowSignal::Continue => Ok(None),
            FlowSignal::Exit(exit) => Ok(Some(exit)),
        }
    }

    pub(crate) fn on_tick(&mut self) -> Result<()> {
        self.flow.on_tick();
        Ok(())
    }

    pub(crate) fn should_drain_loader_after_input(&self) -> bool {
        self.flow.should_drain_loader_after_input()
    }
}

fn tree_form() -> FieldForm {
    FieldForm::new(vec![
        TextField::new("Tree ID", FieldFilter::Text),
        TextField::new("Number of branches", FieldFilter::Digits),
    ])
}

fn stem_form(entries: &[StemEntryInput]) -> FieldForm {
    let fields = entries
        .iter()
        .enumerate()
        .flat_map(|(offset, entry)| {
            let stem = offset + 1;
            [
                TextField::with_value(
                    format!("Stem {stem} height"),
                    FieldFilter::Decimal,
                    entry.height.clone(),
                ),
                TextField::with_value(
                    format!("Stem {stem} diameter"),
                    FieldFilter::Decimal,
                    entry.diameter.clone(),
                ),
            ]
        })
        .collect();
    FieldForm::new(fields)
}

/// Field position of the value a stem error points at.
fn stem_error_field(error: &StemError) -> usize {
    let field = match error.kind() {
        StemErrorKind::Missing(field) | StemErrorKind::NotPositive(field) => field,
    };
    let offset = match field {
        StemField::Height => 0,
        StemField::Diameter => 1,
    };
    error.index().saturating_sub(1) * 2 + offset
}

impl RecordFlow {
    fn new_with_loader(app: &App<'_>, loader: Arc<dyn FlowLoader>) -> Result<Self> {
        let session = app.begin_record(None)?;
        let identity_receiver = loader.spawn_identity(
            app.services.identity.clone(),
            app.services.store.clone(),
        );

        Ok(Self {
            loader,
            identity: IdentityState::loading(),
            identity_loading: LoadingState::default(),
            identity_receiver: Some(identity_receiver),
            session,
            tree_form: tree_form(),
            stem_form: FieldForm::new(Vec::new()),
            details_form: details_form(None),
            overlay: None,
            saving: None,
        })
    }

    fn route(&self) -> Route {
        self.session.current_route()
    }

    fn should_drain_loader_after_input(&self) -> bool {
        self.identity_receiver.is_some() || self.saving.is_some()
    }

    fn on_tick(&mut self) {
        self.drain_identity();
        self.drain_save();
    }

    fn drain_identity(&mut self) {
        let Some(receiver) = &self.identity_receiver else {
            return;
        };
        self.identity_loading.next_frame();

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err("identity worker ended unexpectedly".to_string())
            }
        };
        self.identity_receiver = None;

        match result {
            Ok(resolved) => {
                self.identity = IdentityState::resolved(resolved.email);
                if let Some(details) = resolved.details {
                    self.apply_details(&details);
                }
            }
            Err(message) => {
                tracing::warn!(%message, "identity resolution failed");
                self.identity = IdentityState::resolved(None);
                self.overlay = Some(Overlay::Error(format!(
                    "Could not resolve the signed-in user.\n\n{message}"
                )));
            }
        }
    }

    fn drain_save(&mut self) {
        let Some(saving) = &mut self.saving else {
            return;
        };
        saving.loading.next_frame();

        let result = match saving.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => None,
        };
        let tree_id = std::mem::take(&mut saving.tree_id);
        self.saving = None;

        let Some(result) = result else {
            self.overlay = Some(Overlay::Error(
                "save worker ended unexpectedly".to_string(),
            ));
            return;
        };

        match self.session.apply_save_result(result) {
            Ok(()) => {
                self.tree_form = tree_form();
                self.stem_form = FieldForm::new(Vec::new());
                self.overlay = Some(Overlay::Notice(format!("Tree {tree_id} saved.")));
            }
            Err(error) => {
                self.overlay = Some(Overlay::Error(error.to_string()));
            }
        }
    }

    fn apply_details(&mut self, details: &StudentDetails) {
        self.session
            .draft
            .update(DraftPatch::default().with_student(details));
        self.details_form = details_form(Some(details));
    }

    /// Rebuilds the stem fields when the branch count no longer matches them.
    fn sync_stem_form(&mut self, app: &App<'_>) {
        let entries = app.stem_entries_for(&self.session);
        if self.stem_form.len() != entries.len() * 2 {
            self.stem_form = stem_form(&entries);
        }
    }

    fn stem_entries(&self) -> Vec<StemEntryInput> {
        (0..self.stem_form.len() / 2)
            .map(|stem| {
                StemEntryInput::new(
                    self.stem_form.value(stem * 2),
                    self.stem_form.value(stem * 2 + 1),
                )
            })
            .collect()
    }
}

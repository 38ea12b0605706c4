use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use ratatui::Frame;
use ratatui::text::{Line, Text};
use treetally_app::PreparedSave;
use treetally_core::record::StudentDetails;
use treetally_core::services::{IdentityProvider, KeyValueStore, PersistenceService};
use treetally_core::store::load_student_details;
use treetally_core::submission::SaveError;

use crate::theme;
use crate::ui::modal::{ModalSpec, render_modal};

const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

#[derive(Debug, Clone, Default)]
pub(crate) struct LoadingState {
    frame_index: usize,
}

impl LoadingState {
    pub(crate) fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAMES.len();
    }

    fn current_frame(&self) -> &'static str {
        FRAMES[self.frame_index]
    }
}

/// The signed-in user and whatever student details are stored for them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ResolvedIdentity {
    pub(crate) email: Option<String>,
    pub(crate) details: Option<StudentDetails>,
}

pub(crate) type IdentityResult = Result<ResolvedIdentity, String>;
pub(crate) type SaveResult = Result<(), SaveError>;

/// Runs slow collaborator calls off the event loop; results arrive on the receiver.
pub(crate) trait FlowLoader: Send + Sync {
    fn spawn_identity(
        &self,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Receiver<IdentityResult>;

    fn spawn_save(
        &self,
        prepared: PreparedSave,
        persistence: Arc<dyn PersistenceService>,
    ) -> Receiver<SaveResult>;
}

#[derive(Debug, Default)]
pub(crate) struct SystemFlowLoader;

impl SystemFlowLoader {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl FlowLoader for SystemFlowLoader {
    fn spawn_identity(
        &self,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Receiver<IdentityResult> {
        let (sender, receiver) = mpsc::channel();
        std::thread::spawn(move || {
            let result = resolve_identity(identity.as_ref(), store.as_ref())
                .map_err(|error| format!("{error:#}"));
            let _ = sender.send(result);
        });
        receiver
    }

    fn spawn_save(
        &self,
        prepared: PreparedSave,
        persistence: Arc<dyn PersistenceService>,
    ) -> Receiver<SaveResult> {
        let (sender, receiver) = mpsc::channel();
        std::thread::spawn(move || {
            let result = prepared.persist(persistence.as_ref());
            let _ = sender.send(result);
        });
        receiver
    }
}

fn resolve_identity(
    identity: &dyn IdentityProvider,
    store: &dyn KeyValueStore,
) -> anyhow::Result<ResolvedIdentity> {
    let email = identity.resolve()?;
    let details = match &email {
        Some(email) => load_student_details(store, email)?,
        None => None,
    };
    Ok(ResolvedIdentity { email, details })
}

pub(crate) fn render_loading_modal(
    frame: &mut Frame<'_>,
    title: &str,
    message: &str,
    key_hint: &str,
    loading: &LoadingState,
) {
    let body = Text::from(vec![
        Line::from(""),
        Line::from(format!("{} {}", loading.current_frame(), message)),
    ]);
    render_modal(
        frame,
        ModalSpec {
            title,
            title_style: Some(theme::focus_prompt()),
            body,
            key_hint: Some(key_hint),
            width_pct: 64,
            height_pct: 36,
        },
    );
}

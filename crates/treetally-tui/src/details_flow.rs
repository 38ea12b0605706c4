use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::text::Text;
use treetally_app::App;
use treetally_core::record::StudentDetails;
use treetally_core::services::IdentityState;
use treetally_core::submission::SaveError;

use crate::UiExit;
use crate::keymap;
use crate::ui::field::{FieldFilter, FieldForm, FormEvent, TextField};
use crate::ui::loading::{
    FlowLoader, IdentityResult, LoadingState, SystemFlowLoader, render_loading_modal,
};
use crate::ui::modal::{render_error_modal, render_success_modal};
use crate::ui::screen::render_screen_frame;
use crate::ui::text::{compact_hint, focus_line, label_value_line};

pub(crate) fn details_form(details: Option<&StudentDetails>) -> FieldForm {
    let (name, roll_no, group) = match details {
        Some(details) => (
            details.name.as_str(),
            details.roll_no.as_str(),
            details.group.as_str(),
        ),
        None => ("", "", ""),
    };
    FieldForm::new(vec![
        TextField::with_value("Student name", FieldFilter::Text, name),
        TextField::with_value("Roll number", FieldFilter::Text, roll_no),
        TextField::with_value("Group", FieldFilter::Text, group),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Message {
    Error(String),
    Saved,
}

/// Standalone editor for the signed-in user's student details.
struct DetailsFlow {
    identity: IdentityState,
    loading: LoadingState,
    receiver: Option<Receiver<IdentityResult>>,
    form: FieldForm,
    message: Option<Message>,
}

pub(crate) struct DetailsScreen {
    flow: DetailsFlow,
}

impl DetailsScreen {
    pub(crate) fn new(app: &App<'_>) -> Self {
        Self {
            flow: DetailsFlow::new_with_loader(app, &SystemFlowLoader::new()),
        }
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        self.flow.render(frame);
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent, app: &App<'_>) -> Result<Option<UiExit>> {
        Ok(self.flow.on_key(key, app))
    }

    pub(crate) fn on_tick(&mut self) -> Result<()> {
        self.flow.on_tick();
        Ok(())
    }

    pub(crate) fn should_drain_loader_after_input(&self) -> bool {
        self.flow.receiver.is_some()
    }
}

impl DetailsFlow {
    fn new_with_loader(app: &App<'_>, loader: &dyn FlowLoader) -> Self {
        let receiver =
            loader.spawn_identity(app.services.identity.clone(), app.services.store.clone());
        Self {
            identity: IdentityState::loading(),
            loading: LoadingState::default(),
            receiver: Some(receiver),
            form: details_form(None),
            message: None,
        }
    }

    fn on_tick(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        self.loading.next_frame();

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err("identity worker ended unexpectedly".to_string())
            }
        };
        self.receiver = None;

        match result {
            Ok(resolved) => {
                self.identity = IdentityState::resolved(resolved.email);
                if let Some(details) = resolved.details {
                    self.form = details_form(Some(&details));
                }
            }
            Err(message) => {
                self.identity = IdentityState::resolved(None);
                self.message = Some(Message::Error(format!(
                    "Could not resolve the signed-in user.\n\n{message}"
                )));
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent, app: &App<'_>) -> Option<UiExit> {
        if self.identity.loading {
            return keymap::is_back(key).then_some(UiExit::BackAtRoot);
        }

        if self.message.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                self.message = None;
            }
            return None;
        }

        match self.form.on_key(key) {
            FormEvent::Back => return Some(UiExit::BackAtRoot),
            FormEvent::Submit => self.submit(app),
            FormEvent::Edited | FormEvent::Moved | FormEvent::Ignored => {}
        }
        None
    }

    fn submit(&mut self, app: &App<'_>) {
        let Some(email) = self.identity.email.as_deref() else {
            self.message = Some(Message::Error(SaveError::NotSignedIn.to_string()));
            return;
        };

        let saved = app.save_student_details(
            email,
            self.form.value(0),
            self.form.value(1),
            self.form.value(2),
        );
        self.message = Some(match saved {
            Ok(_) => Message::Saved,
            Err(error) => Message::Error(format!("{error:#}")),
        });
    }

    fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let key_text = compact_hint(
            frame.area().width,
            "Type to edit    Tab/Down: next field    Shift+Tab/Up: previous    Enter: continue    Esc: back",
            "Type    Tab: next    Shift+Tab: previous    Enter: continue    Esc: back",
            "Tab next | Enter continue | Esc back",
        );
        let user = match (self.identity.loading, &self.identity.email) {
            (true, _) => "resolving...".to_string(),
            (false, Some(email)) => email.clone(),
            (false, None) => "not signed in".to_string(),
        };
        let header = Text::from(vec![
            label_value_line("Signed in as", user),
            focus_line("Details stored on this device and attached to every record"),
        ]);
        let body = render_screen_frame(frame, "Student details", header, key_text);
        let editing = !self.identity.loading && self.message.is_none();
        self.form.render(frame, body, editing);

        if self.identity.loading {
            render_loading_modal(
                frame,
                "Loading",
                "Resolving the signed-in user...",
                "Esc: back",
                &self.loading,
            );
            return;
        }

        match &self.message {
            Some(Message::Error(message)) => {
                render_error_modal(frame, message, "Enter/Esc: continue");
            }
            Some(Message::Saved) => {
                render_success_modal(frame, "Student details saved.", "Enter/Esc: continue");
            }
            None => {}
        }
    }
}

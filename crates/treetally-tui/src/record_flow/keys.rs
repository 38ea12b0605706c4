use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use treetally_app::App;
use treetally_core::navigation::Route;
use treetally_core::submission::SaveError;
use treetally_core::validation::StemError;

use crate::UiExit;
use crate::keymap;
use crate::ui::binary_choice::{BinaryChoice, BinaryChoiceEvent};
use crate::ui::field::FormEvent;
use crate::ui::loading::LoadingState;
use crate::ui::picker::PickerState;

use super::{FlowSignal, Overlay, RecordFlow, SavingState, stem_error_field};

impl RecordFlow {
    pub(super) fn on_key(&mut self, key: KeyEvent, app: &App<'_>) -> Result<FlowSignal> {
        if self.identity.loading {
            if keymap::is_back(key) {
                return Ok(FlowSignal::Exit(UiExit::BackAtRoot));
            }
            return Ok(FlowSignal::Continue);
        }

        if self.saving.is_some() {
            return Ok(FlowSignal::Continue);
        }

        if let Some(overlay) = self.overlay.take() {
            self.on_key_overlay(overlay, key, app);
            return Ok(FlowSignal::Continue);
        }

        match self.route() {
            Route::TreeIdentity => self.on_key_tree_identity(key, app),
            Route::StemMeasurements { .. } => self.on_key_stems(key, app),
            Route::PhotoAndSave { .. } => self.on_key_photo(key, app),
            Route::StudentDetails => self.on_key_details(key, app),
        }
    }

    /// Consumes the key for the overlay; puts the overlay back unless it was dismissed.
    fn on_key_overlay(&mut self, overlay: Overlay, key: KeyEvent, app: &App<'_>) {
        match overlay {
            Overlay::Error(_) | Overlay::Notice(_) => {
                if !(keymap::is_confirm(key) || keymap::is_back(key)) {
                    self.overlay = Some(overlay);
                }
            }
            Overlay::DetailsPrompt {
                message,
                mut choice,
            } => match choice.on_key(key) {
                BinaryChoiceEvent::ConfirmYes => {
                    self.session.navigator.push(Route::StudentDetails);
                }
                BinaryChoiceEvent::ConfirmNo | BinaryChoiceEvent::Back => {}
                BinaryChoiceEvent::Continue => {
                    self.overlay = Some(Overlay::DetailsPrompt { message, choice });
                }
            },
            Overlay::Gallery(mut picker) => {
                if keymap::is_back(key) {
                    app.choose_image(&mut self.session, None);
                } else if keymap::is_confirm(key) {
                    app.choose_image(&mut self.session, picker.current().cloned());
                } else {
                    if keymap::is_up(key) {
                        picker.move_up();
                    } else if keymap::is_down(key) {
                        picker.move_down();
                    }
                    self.overlay = Some(Overlay::Gallery(picker));
                }
            }
        }
    }

    fn on_key_tree_identity(&mut self, key: KeyEvent, app: &App<'_>) -> Result<FlowSignal> {
        match self.tree_form.on_key(key) {
            FormEvent::Back => return Ok(FlowSignal::Exit(UiExit::BackAtRoot)),
            FormEvent::Submit => {
                let tree_id = self.tree_form.value(0).to_string();
                let branch_count = self.tree_form.value(1).to_string();
                match app.submit_tree_identity(&mut self.session, &tree_id, &branch_count) {
                    Ok(_) => {
                        self.sync_stem_form(app);
                        self.stem_form.focus(0);
                    }
                    Err(error) => self.show_error(&error),
                }
            }
            FormEvent::Edited | FormEvent::Moved | FormEvent::Ignored => {}
        }
        Ok(FlowSignal::Continue)
    }

    fn on_key_stems(&mut self, key: KeyEvent, app: &App<'_>) -> Result<FlowSignal> {
        match self.stem_form.on_key(key) {
            FormEvent::Back => {
                self.session.back();
            }
            FormEvent::Submit => {
                let entries = self.stem_entries();
                if let Err(error) = app.submit_stems(&mut self.session, &entries) {
                    if let Some(stem_error) = error.downcast_ref::<StemError>() {
                        self.stem_form.focus(stem_error_field(stem_error));
                    }
                    self.show_error(&error);
                }
            }
            FormEvent::Edited | FormEvent::Moved | FormEvent::Ignored => {}
        }
        Ok(FlowSignal::Continue)
    }

    fn on_key_photo(&mut self, key: KeyEvent, app: &App<'_>) -> Result<FlowSignal> {
        if keymap::is_back(key) {
            self.session.back();
            return Ok(FlowSignal::Continue);
        }

        if keymap::is_confirm(key) || key.code == KeyCode::Char('s') {
            self.start_save(app);
            return Ok(FlowSignal::Continue);
        }

        match key.code {
            KeyCode::Char('g') => match app.list_gallery() {
                Ok(images) if images.is_empty() => {
                    self.overlay = Some(Overlay::Error(
                        "No photos found in the gallery.".to_string(),
                    ));
                }
                Ok(images) => {
                    self.overlay = Some(Overlay::Gallery(PickerState::from_items(images)));
                }
                Err(error) => self.show_error(&error),
            },
            KeyCode::Char('c') => {
                if let Err(error) = app.capture_photo(&mut self.session) {
                    self.show_error(&error);
                }
            }
            _ => {}
        }
        Ok(FlowSignal::Continue)
    }

    fn on_key_details(&mut self, key: KeyEvent, app: &App<'_>) -> Result<FlowSignal> {
        match self.details_form.on_key(key) {
            FormEvent::Back => {
                self.session.back();
            }
            FormEvent::Submit => {
                let Some(email) = self.identity.email.clone() else {
                    self.overlay = Some(Overlay::Error(SaveError::NotSignedIn.to_string()));
                    return Ok(FlowSignal::Continue);
                };
                let saved = app.save_student_details(
                    &email,
                    self.details_form.value(0),
                    self.details_form.value(1),
                    self.details_form.value(2),
                );
                match saved {
                    Ok(details) => {
                        app.apply_student_details(&mut self.session, &details);
                        self.session.back();
                        self.overlay = Some(Overlay::Notice("Student details saved.".to_string()));
                    }
                    Err(error) => self.show_error(&error),
                }
            }
            FormEvent::Edited | FormEvent::Moved | FormEvent::Ignored => {}
        }
        Ok(FlowSignal::Continue)
    }

    /// Hands a validated record to the worker. Rejections never reach the service.
    fn start_save(&mut self, app: &App<'_>) {
        if self.saving.is_some() {
            return;
        }

        let tree_id = self.session.draft.record().tree_id.clone();
        match app.prepare_save(&self.session, self.identity.email.as_deref()) {
            Ok(prepared) => {
                let receiver = self
                    .loader
                    .spawn_save(prepared, app.services.persistence.clone());
                self.saving = Some(SavingState {
                    tree_id,
                    loading: LoadingState::default(),
                    receiver,
                });
            }
            Err(error) => match error.downcast_ref::<SaveError>() {
                Some(missing @ SaveError::StudentDetailsMissing { .. }) => {
                    self.overlay = Some(Overlay::DetailsPrompt {
                        message: missing.to_string(),
                        choice: BinaryChoice::new(true),
                    });
                }
                _ => self.show_error(&error),
            },
        }
    }

    fn show_error(&mut self, error: &anyhow::Error) {
        self.overlay = Some(Overlay::Error(format!("{error:#}")));
    }
}

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::Color;
use ratatui::text::{Line, Text};
use ratatui::widgets::{List, ListItem, ListState};
use treetally_core::navigation::Route;
use treetally_core::record::ImageRef;

use super::{Overlay, RecordFlow};
use crate::theme;
use crate::ui::loading::render_loading_modal;
use crate::ui::modal::{ModalSpec, render_error_modal, render_modal, render_success_modal};
use crate::ui::picker::PickerState;
use crate::ui::screen::render_screen_frame;
use crate::ui::text::{
    compact_hint, focus_line, highlighted_label_value_line, label_value_line, wrapped_paragraph,
};

const FORM_KEYS: (&str, &str, &str) = (
    "Type to edit    Tab/Down: next field    Shift+Tab/Up: previous    Enter: continue    Esc: back",
    "Type    Tab: next    Shift+Tab: previous    Enter: continue    Esc: back",
    "Tab next | Enter continue | Esc back",
);

const PHOTO_KEYS: (&str, &str, &str) = (
    "g: pick from gallery    c: take photo    Enter/s: save    Esc: back",
    "g: gallery    c: camera    Enter/s: save    Esc: back",
    "g gallery | c camera | s save | Esc back",
);

impl RecordFlow {
    pub(super) fn render(&self, frame: &mut Frame<'_>) {
        let route = self.route();
        let keys = match route {
            Route::PhotoAndSave { .. } => PHOTO_KEYS,
            _ => FORM_KEYS,
        };
        let key_text = compact_hint(frame.area().width, keys.0, keys.1, keys.2);
        let body = render_screen_frame(frame, "Record tree", self.header(route), key_text);

        match route {
            Route::TreeIdentity => self.tree_form.render(frame, body, self.accepts_input()),
            Route::StemMeasurements { .. } => self.render_stems(frame, body),
            Route::PhotoAndSave { .. } => self.render_photo(frame, body),
            Route::StudentDetails => self.details_form.render(frame, body, self.accepts_input()),
        }

        self.render_overlay(frame);
    }

    fn accepts_input(&self) -> bool {
        self.overlay.is_none() && self.saving.is_none() && !self.identity.loading
    }

    fn header(&self, route: Route) -> Text<'static> {
        let step = match route {
            Route::TreeIdentity => "Step 1 of 3: ".to_string(),
            Route::StemMeasurements { .. } => "Step 2 of 3: ".to_string(),
            Route::PhotoAndSave { .. } => "Step 3 of 3: ".to_string(),
            Route::StudentDetails => String::new(),
        };
        let user = match (self.identity.loading, &self.identity.email) {
            (true, _) => "resolving...".to_string(),
            (false, Some(email)) => email.clone(),
            (false, None) => "not signed in".to_string(),
        };
        Text::from(vec![
            label_value_line("Signed in as", user),
            focus_line(format!("{step}{}", route.title())),
        ])
    }

    fn render_stems(&self, frame: &mut Frame<'_>, area: Rect) {
        let record = self.session.draft.record();
        let [summary, fields] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .areas(area);
        frame.render_widget(
            wrapped_paragraph(label_value_line(
                format!("Tree {}", record.tree_id),
                format!("{} stem(s)", record.num_branches),
            )),
            summary,
        );
        self.stem_form.render(frame, fields, self.accepts_input());
    }

    fn render_photo(&self, frame: &mut Frame<'_>, area: Rect) {
        let record = self.session.draft.record();
        let student = match record.student_details() {
            Some(details) => format!(
                "{} (roll no {}, group {})",
                details.name, details.roll_no, details.group
            ),
            None => "not set".to_string(),
        };
        let photo = self
            .session
            .image
            .as_ref()
            .map(ImageRef::file_name)
            .unwrap_or_else(|| "none selected".to_string());

        let mut lines = vec![
            label_value_line("Tree ID", record.tree_id.clone()),
            label_value_line("Branches", record.num_branches.to_string()),
        ];
        lines.extend(record.stem_data.iter().enumerate().map(|(offset, stem)| {
            label_value_line(
                format!("Stem {}", offset + 1),
                format!("height {}, diameter {}", stem.height, stem.diameter),
            )
        }));
        lines.push(label_value_line("Student", student));
        lines.push(Line::from(""));
        lines.push(highlighted_label_value_line("Photo", photo));

        frame.render_widget(
            wrapped_paragraph(Text::from(lines)).block(theme::chrome(focus_line("Review"))),
            area,
        );
    }

    fn render_overlay(&self, frame: &mut Frame<'_>) {
        if self.identity.loading {
            render_loading_modal(
                frame,
                "Loading",
                "Resolving the signed-in user...",
                "Esc: back",
                &self.identity_loading,
            );
            return;
        }

        if let Some(saving) = &self.saving {
            render_loading_modal(
                frame,
                "Saving",
                &format!("Saving tree {}...", saving.tree_id),
                "Please wait",
                &saving.loading,
            );
            return;
        }

        match &self.overlay {
            Some(Overlay::Error(message)) => {
                render_error_modal(frame, message, "Enter/Esc: continue");
            }
            Some(Overlay::Notice(message)) => {
                render_success_modal(frame, message, "Enter/Esc: continue");
            }
            Some(Overlay::DetailsPrompt { message, choice }) => {
                let key_text = compact_hint(
                    frame.area().width,
                    "Space: toggle    Enter: confirm    Esc: cancel",
                    "Space: toggle    Enter: confirm    Esc: cancel",
                    "Space toggle | Enter confirm | Esc cancel",
                );
                render_modal(
                    frame,
                    ModalSpec {
                        title: "Student details missing",
                        title_style: Some(theme::error_prompt()),
                        body: Text::from(vec![
                            Line::from(message.clone()),
                            Line::from(""),
                            highlighted_label_value_line(
                                "Open Student details now?",
                                choice.selected_label(),
                            ),
                        ]),
                        key_hint: Some(key_text),
                        width_pct: 72,
                        height_pct: 40,
                    },
                );
            }
            Some(Overlay::Gallery(picker)) => render_gallery(frame, picker),
            None => {}
        }
    }
}

fn render_gallery(frame: &mut Frame<'_>, picker: &PickerState<ImageRef>) {
    let key_text = compact_hint(
        frame.area().width,
        "Up/Down or j/k: move    Enter: choose    Esc: cancel",
        "j/k: move    Enter: choose    Esc: cancel",
        "j/k move | Enter choose | Esc cancel",
    );
    let rendered = render_modal(
        frame,
        ModalSpec {
            title: "Gallery",
            title_style: Some(theme::focus_prompt()),
            body: Text::from(""),
            key_hint: Some(key_text),
            width_pct: 70,
            height_pct: 60,
        },
    );

    let inner = rendered.body_area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let items: Vec<ListItem<'_>> = picker
        .items
        .iter()
        .map(|image| ListItem::new(image.file_name()))
        .collect();
    let list = List::new(items).highlight_style(theme::list_highlight(Color::Cyan));
    let mut state = ListState::default();
    state.select(Some(picker.selected));
    frame.render_stateful_widget(list, inner, &mut state);
}

use crossterm::event::{Event, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use treetally_core::validation::{filter_decimal, filter_digits};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::keymap;
use crate::theme;
use crate::ui::text::focus_line;

const FIELD_HEIGHT: u16 = 3;

/// Characters a field keeps while the user types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldFilter {
    Text,
    Digits,
    Decimal,
}

impl FieldFilter {
    fn apply(self, raw: &str) -> String {
        match self {
            Self::Text => raw.to_string(),
            Self::Digits => filter_digits(raw),
            Self::Decimal => filter_decimal(raw),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TextField {
    pub(crate) label: String,
    filter: FieldFilter,
    input: Input,
}

impl TextField {
    pub(crate) fn new(label: impl Into<String>, filter: FieldFilter) -> Self {
        Self::with_value(label, filter, "")
    }

    pub(crate) fn with_value(
        label: impl Into<String>,
        filter: FieldFilter,
        value: impl Into<String>,
    ) -> Self {
        let value: String = value.into();
        let value = filter.apply(&value);
        Self {
            label: label.into(),
            filter,
            input: Input::new(value),
        }
    }

    pub(crate) fn value(&self) -> &str {
        self.input.value()
    }

    /// Feeds a key to the input, dropping characters the filter rejects.
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> bool {
        if self.input.handle_event(&Event::Key(key)).is_none() {
            return false;
        }

        let filtered = self.filter.apply(self.input.value());
        if filtered != self.input.value() {
            self.input = Input::new(filtered);
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormEvent {
    Edited,
    Moved,
    Submit,
    Back,
    Ignored,
}

/// A column of fields with one focused; Enter on the last field submits.
#[derive(Debug, Clone)]
pub(crate) struct FieldForm {
    fields: Vec<TextField>,
    pub(crate) focused: usize,
}

impl FieldForm {
    pub(crate) fn new(fields: Vec<TextField>) -> Self {
        Self { fields, focused: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(TextField::value).unwrap_or("")
    }

    pub(crate) fn focus(&mut self, index: usize) {
        self.focused = index.min(self.fields.len().saturating_sub(1));
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> FormEvent {
        if keymap::is_back(key) {
            return FormEvent::Back;
        }

        if keymap::is_next_field(key) {
            self.focus(self.focused + 1);
            return FormEvent::Moved;
        }

        if keymap::is_previous_field(key) {
            self.focused = self.focused.saturating_sub(1);
            return FormEvent::Moved;
        }

        if keymap::is_confirm(key) {
            if self.focused + 1 >= self.fields.len() {
                return FormEvent::Submit;
            }
            self.focused += 1;
            return FormEvent::Moved;
        }

        match self.fields.get_mut(self.focused) {
            Some(field) => {
                if field.on_key(key) {
                    FormEvent::Edited
                } else {
                    FormEvent::Ignored
                }
            }
            _ => FormEvent::Ignored,
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, area: Rect, show_cursor: bool) {
        let fields: Vec<&TextField> = self.fields.iter().collect();
        render_field_column(frame, area, &fields, show_cursor.then_some(self.focused));
    }
}

/// Stacks fields vertically, scrolling so the focused one stays visible.
pub(crate) fn render_field_column(
    frame: &mut Frame<'_>,
    area: Rect,
    fields: &[&TextField],
    focused: Option<usize>,
) {
    let visible = usize::from((area.height / FIELD_HEIGHT).max(1));
    let first = first_visible_field(fields.len(), visible, focused.unwrap_or(0));

    for (row, (index, field)) in fields
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .enumerate()
    {
        let y = area.y + FIELD_HEIGHT * row as u16;
        let height = FIELD_HEIGHT.min(area.y + area.height - y);
        if height == 0 {
            break;
        }
        let field_area = Rect::new(area.x, y, area.width, height);
        render_field(frame, field_area, field, focused == Some(index));
    }
}

fn first_visible_field(total: usize, visible: usize, focused: usize) -> usize {
    if total <= visible {
        return 0;
    }
    focused
        .saturating_sub(visible.saturating_sub(1))
        .min(total - visible)
}

fn render_field(frame: &mut Frame<'_>, area: Rect, field: &TextField, focused: bool) {
    let title = if focused {
        focus_line(field.label.clone())
    } else {
        Line::from(field.label.clone())
    };
    let width = area.width.saturating_sub(2) as usize;
    let scroll = field.input.visual_scroll(width);
    let paragraph = Paragraph::new(field.value())
        .scroll((0, scroll as u16))
        .block(theme::chrome(title));
    frame.render_widget(paragraph, area);

    if focused && width > 0 && area.height > 1 {
        let visual = field.input.visual_cursor();
        let relative = visual.saturating_sub(scroll).min(width.saturating_sub(1));
        frame.set_cursor_position((area.x + 1 + relative as u16, area.y + 1));
    }
}

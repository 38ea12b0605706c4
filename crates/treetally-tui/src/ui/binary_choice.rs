use crossterm::event::KeyEvent;

use crate::keymap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BinaryChoice {
    pub(crate) yes_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryChoiceEvent {
    Continue,
    ConfirmYes,
    ConfirmNo,
    Back,
}

impl BinaryChoice {
    pub(crate) fn new(default_yes: bool) -> Self {
        Self {
            yes_selected: default_yes,
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> BinaryChoiceEvent {
        if keymap::is_back(key) {
            return BinaryChoiceEvent::Back;
        }

        if keymap::is_toggle(key) {
            self.yes_selected = !self.yes_selected;
            return BinaryChoiceEvent::Continue;
        }

        if !keymap::is_confirm(key) {
            return BinaryChoiceEvent::Continue;
        }

        if self.yes_selected {
            BinaryChoiceEvent::ConfirmYes
        } else {
            BinaryChoiceEvent::ConfirmNo
        }
    }

    pub(crate) fn selected_label(&self) -> &'static str {
        if self.yes_selected { "Yes" } else { "No" }
    }
}

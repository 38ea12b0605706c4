use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) fn is_back(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Esc)
}

pub(crate) fn is_confirm(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter)
}

pub(crate) fn is_up(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Up | KeyCode::Char('k'))
}

pub(crate) fn is_down(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Down | KeyCode::Char('j'))
}

pub(crate) fn is_toggle(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char(' '))
}

pub(crate) fn is_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q'))
}

/// Field movement inside forms, where letters are text input.
pub(crate) fn is_next_field(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Tab | KeyCode::Down)
}

pub(crate) fn is_previous_field(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::BackTab | KeyCode::Up)
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

#[derive(Debug, Clone)]
pub(crate) struct PickerState<T> {
    pub(crate) items: Vec<T>,
    pub(crate) selected: usize,
}

impl<T> PickerState<T> {
    pub(crate) fn from_items(items: Vec<T>) -> Self {
        Self { items, selected: 0 }
    }

    pub(crate) fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub(crate) fn move_down(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    /// The highlighted item, `None` when the list is empty.
    pub(crate) fn current(&self) -> Option<&T> {
        self.items.get(self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::PickerState;

    #[test]
    fn current_follows_selection() {
        let mut picker = PickerState::from_items(vec!["a.jpg", "b.jpg"]);
        assert_eq!(picker.current(), Some(&"a.jpg"));

        picker.move_down();
        assert_eq!(picker.current(), Some(&"b.jpg"));
    }

    #[test]
    fn empty_picker_has_no_current_item() {
        let picker = PickerState::from_items(Vec::<&str>::new());
        assert_eq!(picker.current(), None);
    }

    #[test]
    fn movement_is_bounded() {
        let mut picker = PickerState::from_items(vec!["a"]);
        picker.move_down();
        picker.move_down();
        assert_eq!(picker.selected, 0);

        picker.move_up();
        assert_eq!(picker.selected, 0);
    }
}

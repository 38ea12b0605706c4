pub(crate) mod binary_choice;
pub(crate) mod field;
pub(crate) mod loading;
pub(crate) mod modal;
pub(crate) mod picker;
pub(crate) mod screen;
pub(crate) mod text;

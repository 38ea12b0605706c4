pub mod command_runner;
pub mod config;
pub mod doctor;
pub mod draft;
pub mod identity;
pub mod media;
pub mod navigation;
pub mod outbox;
pub mod record;
pub mod save_gate;
pub mod services;
pub mod store;
pub mod submission;
#[cfg(test)]
pub(crate) mod test_support;
pub mod time;
pub mod validation;

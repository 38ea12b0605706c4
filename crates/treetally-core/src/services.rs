//! Seams to the collaborators the wizard does not own.

use thiserror::Error;

use crate::record::{ImageRef, SubmissionRecord};

/// Failure reported by the persistence backend; `message` is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceFailure {
    pub message: String,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait PersistenceService: Send + Sync {
    fn save(&self, record: &SubmissionRecord, image: &ImageRef) -> Result<(), ServiceFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Cancelled,
    Captured(ImageRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPermission {
    Granted,
    Denied,
}

pub trait MediaLibrary: Send + Sync {
    fn list_images(&self) -> anyhow::Result<Vec<ImageRef>>;
}

pub trait Camera: Send + Sync {
    fn request_permission(&self) -> anyhow::Result<CameraPermission>;
    fn capture(&self) -> anyhow::Result<CaptureOutcome>;
}

pub trait IdentityProvider: Send + Sync {
    /// Email of the signed-in user, `None` when nobody is signed in.
    fn resolve(&self) -> anyhow::Result<Option<String>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityState {
    pub loading: bool,
    pub email: Option<String>,
}

impl IdentityState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            email: None,
        }
    }

    pub fn resolved(email: Option<String>) -> Self {
        Self {
            loading: false,
            email,
        }
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

use anyhow::{Context, Result};
use thiserror::Error;
use treetally_core::record::ImageRef;
use treetally_core::services::{CameraPermission, CaptureOutcome};

use crate::App;
use crate::record::RecordSession;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Camera permission is required to take a photo.")]
    PermissionDenied,
}

impl<'a> App<'a> {
    pub fn list_gallery(&self) -> Result<Vec<ImageRef>> {
        self.services
            .library
            .list_images()
            .context("failed to load photos from the gallery")
    }

    /// `None` means the picker was cancelled; the previous photo stays selected.
    pub fn choose_image(&self, session: &mut RecordSession, picked: Option<ImageRef>) {
        if let Some(image) = picked {
            tracing::debug!(image = %image, "photo selected");
            session.image = Some(image);
        }
    }

    pub fn capture_photo(&self, session: &mut RecordSession) -> Result<CaptureOutcome> {
        let permission = self
            .services
            .camera
            .request_permission()
            .context("failed to request camera permission")?;
        if permission == CameraPermission::Denied {
            return Err(CaptureError::PermissionDenied.into());
        }

        let outcome = self
            .services
            .camera
            .capture()
            .context("failed to capture photo")?;
        if let CaptureOutcome::Captured(image) = &outcome {
            tracing::debug!(image = %image, "photo captured");
            session.image = Some(image.clone());
        }
        Ok(outcome)
    }
}

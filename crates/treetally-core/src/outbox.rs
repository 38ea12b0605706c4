use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::record::{ImageRef, SubmissionRecord};
use crate::services::{PersistenceService, ServiceFailure};

pub const RECORD_FILE_NAME: &str = "record.json";

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("photo {0} no longer exists")]
    MissingImage(PathBuf),
    #[error("failed to prepare outbox entry {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy photo from {from} to {to}: {source}")]
    CopyImage {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Persists each submission as a directory holding `record.json` and the photo.
#[derive(Debug, Clone)]
pub struct OutboxPersistence {
    root: PathBuf,
}

impl OutboxPersistence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_entry(
        &self,
        record: &SubmissionRecord,
        image: &ImageRef,
    ) -> Result<PathBuf, OutboxError> {
        if !image.path().is_file() {
            return Err(OutboxError::MissingImage(image.path().to_path_buf()));
        }

        let entry_name = format!(
            "{}-{}-{}",
            crate::time::now_utc_compact()?,
            sanitize_path_component(&record.tree_id),
            Uuid::new_v4().simple()
        );
        let staging = self.root.join(format!(".{entry_name}.partial"));
        let target = self.root.join(&entry_name);

        fs::create_dir_all(&staging).map_err(|source| OutboxError::Prepare {
            path: staging.clone(),
            source,
        })?;

        let result = write_entry_files(&staging, record, image).and_then(|()| {
            fs::rename(&staging, &target).map_err(|source| OutboxError::Write {
                path: target.clone(),
                source,
            })
        });

        if result.is_err() {
            let _ = fs::remove_dir_all(&staging);
        }
        result.map(|()| target)
    }
}

impl PersistenceService for OutboxPersistence {
    fn save(&self, record: &SubmissionRecord, image: &ImageRef) -> Result<(), ServiceFailure> {
        self.write_entry(record, image)
            .map(|_| ())
            .map_err(|error| ServiceFailure::new(error.to_string()))
    }
}

fn write_entry_files(
    directory: &Path,
    record: &SubmissionRecord,
    image: &ImageRef,
) -> Result<(), OutboxError> {
    let record_path = directory.join(RECORD_FILE_NAME);
    let raw = serde_json::to_string_pretty(record)?;
    fs::write(&record_path, raw).map_err(|source| OutboxError::Write {
        path: record_path,
        source,
    })?;

    let extension = image
        .path()
        .extension()
        .map(|value| value.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| "img".to_string());
    let photo_path = directory.join(format!("photo.{extension}"));
    fs::copy(image.path(), &photo_path).map_err(|source| OutboxError::CopyImage {
        from: image.path().to_path_buf(),
        to: photo_path,
        source,
    })?;

    Ok(())
}

pub fn sanitize_path_component(value: &str) -> String {
    let mut output = String::with_capacity(value.len());

    for character in value.trim().chars() {
        if character.is_ascii_alphanumeric() || character == '_' || character == '-' {
            output.push(character.to_ascii_lowercase());
        } else {
            output.push('-');
        }
    }

    if output.is_empty() {
        return "tree".to_string();
    }

    output
}

#[cfg(test)]
mod tests {
    use crate::draft::StemMeasurement;

    use super::*;

    fn record() -> SubmissionRecord {
        SubmissionRecord {
            tree_id: "Oak 7/B".to_string(),
            num_branches: 1,
            stem_data: vec![StemMeasurement {
                height: 4.0,
                diameter: 9.5,
            }],
            student_name: "Asha".to_string(),
            student_roll_no: "42".to_string(),
            student_group: "B".to_string(),
            user_email: "asha@example.edu".to_string(),
        }
    }

    #[test]
    fn sanitize_path_component_normalizes_characters() {
        assert_eq!(sanitize_path_component("Oak 7/B"), "oak-7-b");
        assert_eq!(sanitize_path_component("t_100"), "t_100");
        assert_eq!(sanitize_path_component("   "), "tree");
    }

    #[test]
    fn write_entry_creates_record_and_photo() {
        let temp = tempfile::tempdir().expect("temp dir");
        let photo = temp.path().join("IMG_0001.JPG");
        fs::write(&photo, [0xFF, 0xD8, 0xFF, 0xE0]).expect("write photo");

        let outbox = OutboxPersistence::new(temp.path().join("outbox"));
        let entry = outbox
            .write_entry(&record(), &ImageRef::new(&photo))
            .expect("write entry");

        let name = entry
            .file_name()
            .expect("entry name")
            .to_string_lossy()
            .to_string();
        assert!(name.contains("-oak-7-b-"), "unexpected entry name {name}");

        let raw = fs::read_to_string(entry.join(RECORD_FILE_NAME)).expect("record");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["treeId"], "Oak 7/B");
        assert_eq!(value["stemData"][0]["diameter"], 9.5);
        assert!(entry.join("photo.jpg").is_file());

        let leftovers = fs::read_dir(outbox.root())
            .expect("outbox listing")
            .filter_map(Result::ok)
            .filter(|item| item.file_name().to_string_lossy().ends_with(".partial"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn save_reports_missing_photo_as_service_failure() {
        let temp = tempfile::tempdir().expect("temp dir");
        let outbox = OutboxPersistence::new(temp.path().join("outbox"));

        let failure = outbox
            .save(&record(), &ImageRef::new(temp.path().join("gone.jpg")))
            .expect_err("missing photo");

        assert!(failure.message.contains("no longer exists"));
        assert!(!temp.path().join("outbox").exists());
    }
}

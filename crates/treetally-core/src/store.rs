use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{StudentDetails, student_details_key};
use crate::services::KeyValueStore;

const STORE_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoreFile {
    version: i64,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize store: {0}")]
    Serialize(toml::ser::Error),
    #[error("unsupported store version {found} in {path}; expected {STORE_VERSION}")]
    Version { path: PathBuf, found: i64 },
    #[error("stored value for '{key}' is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value store persisted as a TOML file. Values are opaque strings
/// (serialized JSON for student details).
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreFile, StoreError> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let parsed: StoreFile = toml::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if parsed.version != STORE_VERSION {
            return Err(StoreError::Version {
                path: self.path.clone(),
                found: parsed.version,
            });
        }

        Ok(parsed)
    }

    fn write(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let raw = toml::to_string(file).map_err(StoreError::Serialize)?;
        let temp_path = self.path.with_extension("toml.tmp");
        fs::write(&temp_path, raw).map_err(|source| StoreError::Write {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = self.load()?;
        file.entries.insert(key.to_string(), value.to_string());
        self.write(&file)?;
        Ok(())
    }
}

pub fn load_student_details(
    store: &dyn KeyValueStore,
    email: &str,
) -> anyhow::Result<Option<StudentDetails>> {
    let key = student_details_key(email);
    let Some(raw) = store.get(&key)? else {
        return Ok(None);
    };

    let details = serde_json::from_str(&raw).map_err(|source| StoreError::Decode { key, source })?;
    Ok(Some(details))
}

pub fn save_student_details(
    store: &dyn KeyValueStore,
    email: &str,
    details: &StudentDetails,
) -> anyhow::Result<()> {
    let key = student_details_key(email);
    let raw = serde_json::to_string(details).map_err(|source| StoreError::Encode {
        key: key.clone(),
        source,
    })?;
    store.set(&key, &raw)
}

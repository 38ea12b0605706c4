use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreetallyConfig {
    pub version: u32,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub camera: Option<CameraConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub outbox_dir: PathBuf,
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    pub gallery_dir: PathBuf,
    pub capture_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl TreetallyConfig {
    pub fn capture_dir(&self) -> &Path {
        self.media
            .capture_dir
            .as_deref()
            .unwrap_or(self.media.gallery_dir.as_path())
    }

    /// Key-value store location; defaults to `store.toml` beside the config file.
    pub fn store_path(&self, config_path: &Path) -> PathBuf {
        match &self.storage.store_path {
            Some(path) => path.clone(),
            None => config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("store.toml"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs
        .home_dir()
        .join(".config")
        .join("treetally")
        .join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<TreetallyConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: TreetallyConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

pub fn validate_config(config: &TreetallyConfig) -> Result<(), ConfigError> {
    if config.version != 1 {
        return Err(invalid("version must be 1"));
    }

    let email = config.identity.email.trim();
    if email.is_empty() {
        return Err(invalid("identity.email must be non-empty"));
    }
    if !email.contains('@') {
        return Err(invalid(format!(
            "identity.email '{email}' is not an email address"
        )));
    }

    if config.storage.outbox_dir.as_os_str().is_empty() {
        return Err(invalid("storage.outbox_dir must be non-empty"));
    }

    if config.media.gallery_dir.as_os_str().is_empty() {
        return Err(invalid("media.gallery_dir must be non-empty"));
    }

    if let Some(camera) = &config.camera {
        if camera.program.trim().is_empty() {
            return Err(invalid("camera.program must be non-empty"));
        }
        if !camera
            .args
            .iter()
            .any(|arg| arg.contains(OUTPUT_PLACEHOLDER))
        {
            return Err(invalid(format!(
                "camera.args must contain the {OUTPUT_PLACEHOLDER} placeholder"
            )));
        }
    }

    Ok(())
}

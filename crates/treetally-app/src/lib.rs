mod details;
mod photo;
mod record;
mod runtime;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use treetally_core::command_runner::SystemCommandRunner;
use treetally_core::config::{TreetallyConfig, load_config, resolve_config_path};
use treetally_core::doctor::{DoctorReport, run_doctor};
use treetally_core::identity::ConfigIdentity;
use treetally_core::media::{CommandCamera, DirectoryLibrary};
use treetally_core::outbox::OutboxPersistence;
use treetally_core::save_gate::SaveGate;
use treetally_core::services::{
    Camera, IdentityProvider, KeyValueStore, MediaLibrary, PersistenceService,
};
use treetally_core::store::FileKeyValueStore;

pub use photo::CaptureError;
pub use record::{PreparedSave, RecordSession};
pub use runtime::ReadyConfig;

/// The collaborators a record flow talks to.
#[derive(Clone)]
pub struct Services {
    pub persistence: Arc<dyn PersistenceService>,
    pub library: Arc<dyn MediaLibrary>,
    pub camera: Arc<dyn Camera>,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn KeyValueStore>,
}

impl Services {
    pub fn from_config(config: &TreetallyConfig, config_path: &Path) -> Self {
        Self {
            persistence: Arc::new(OutboxPersistence::new(&config.storage.outbox_dir)),
            library: Arc::new(DirectoryLibrary::new(&config.media.gallery_dir)),
            camera: Arc::new(CommandCamera::new(
                SystemCommandRunner::new(),
                config.camera.clone(),
                config.capture_dir(),
            )),
            identity: Arc::new(ConfigIdentity::new(config.identity.email.clone())),
            store: Arc::new(FileKeyValueStore::new(config.store_path(config_path))),
        }
    }
}

pub struct App<'a> {
    pub services: &'a Services,
    save_gate: SaveGate,
}

impl<'a> App<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self {
            services,
            save_gate: SaveGate::new(),
        }
    }

    pub fn doctor() -> Result<DoctorReport> {
        Ok(run_doctor())
    }

    pub fn ensure_config_ready() -> Result<ReadyConfig> {
        let config_path = resolve_config_path().context("failed to resolve config path")?;

        if !config_path.exists() {
            bail!(
                "missing config at {}\nCreate ~/.config/treetally/config.toml and see README.md for setup instructions.",
                config_path.display()
            );
        }

        let config = load_config(&config_path).map_err(|error| {
            anyhow!(
                "invalid config at {}: {error}\nFix the config and retry. See README.md for setup instructions.",
                config_path.display()
            )
        })?;

        Ok(ReadyConfig {
            path: config_path,
            config,
        })
    }

    /// Whether a save is currently waiting on the persistence service.
    pub fn is_saving(&self) -> bool {
        self.save_gate.is_busy()
    }

    pub fn resolve_identity(&self) -> Result<Option<String>> {
        self.services
            .identity
            .resolve()
            .context("failed to resolve the signed-in user")
    }
}

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use treetally_app::Services;
use treetally_core::record::{ImageRef, StudentDetails, SubmissionRecord, student_details_key};
use treetally_core::services::{
    Camera, CameraPermission, CaptureOutcome, IdentityProvider, KeyValueStore, MediaLibrary,
    PersistenceService, ServiceFailure,
};

pub static ENV_LOCK: Mutex<()> = Mutex::new(());

pub const EMAIL: &str = "asha@example.edu";

#[derive(Default)]
pub struct RecordingPersistence {
    failures: Mutex<VecDeque<String>>,
    saves: Mutex<Vec<(SubmissionRecord, ImageRef)>>,
}

impl RecordingPersistence {
    pub fn failing_once(message: &str) -> Self {
        Self {
            failures: Mutex::new(VecDeque::from([message.to_string()])),
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn saves(&self) -> Vec<(SubmissionRecord, ImageRef)> {
        self.saves.lock().expect("saves lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.saves.lock().expect("saves lock").len()
    }
}

impl PersistenceService for RecordingPersistence {
    fn save(&self, record: &SubmissionRecord, image: &ImageRef) -> Result<(), ServiceFailure> {
        self.saves
            .lock()
            .expect("saves lock")
            .push((record.clone(), image.clone()));

        match self.failures.lock().expect("failures lock").pop_front() {
            Some(message) => Err(ServiceFailure::new(message)),
            None => Ok(()),
        }
    }
}

pub struct ScriptedCamera {
    permission: CameraPermission,
    outcomes: Mutex<VecDeque<anyhow::Result<CaptureOutcome>>>,
    captures: Mutex<usize>,
}

impl ScriptedCamera {
    pub fn new(permission: CameraPermission, outcomes: Vec<anyhow::Result<CaptureOutcome>>) -> Self {
        Self {
            permission,
            outcomes: Mutex::new(outcomes.into()),
            captures: Mutex::new(0),
        }
    }

    pub fn captures(&self) -> usize {
        *self.captures.lock().expect("captures lock")
    }
}

impl Camera for ScriptedCamera {
    fn request_permission(&self) -> anyhow::Result<CameraPermission> {
        Ok(self.permission)
    }

    fn capture(&self) -> anyhow::Result<CaptureOutcome> {
        *self.captures.lock().expect("captures lock") += 1;
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("missing scripted capture")))
    }
}

pub struct StaticLibrary {
    images: Option<Vec<ImageRef>>,
}

impl StaticLibrary {
    pub fn with_images(images: Vec<ImageRef>) -> Self {
        Self {
            images: Some(images),
        }
    }

    pub fn unavailable() -> Self {
        Self { images: None }
    }
}

impl MediaLibrary for StaticLibrary {
    fn list_images(&self) -> anyhow::Result<Vec<ImageRef>> {
        self.images
            .clone()
            .ok_or_else(|| anyhow!("gallery is unavailable"))
    }
}

pub struct FixedIdentity(pub Option<String>);

impl IdentityProvider for FixedIdentity {
    fn resolve(&self) -> anyhow::Result<Option<String>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn with_details(email: &str, details: &StudentDetails) -> Self {
        let store = Self::default();
        store.entries.lock().expect("store lock").insert(
            student_details_key(email),
            serde_json::to_string(details).expect("encode details"),
        );
        store
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("store lock").get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct Fakes {
    pub persistence: Arc<RecordingPersistence>,
    pub camera: Arc<ScriptedCamera>,
    pub store: Arc<MemoryStore>,
    pub library: Arc<StaticLibrary>,
}

impl Fakes {
    pub fn new(persistence: RecordingPersistence, store: MemoryStore) -> Self {
        Self {
            persistence: Arc::new(persistence),
            camera: Arc::new(ScriptedCamera::new(CameraPermission::Granted, Vec::new())),
            store: Arc::new(store),
            library: Arc::new(StaticLibrary::with_images(Vec::new())),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            persistence: self.persistence.clone(),
            library: self.library.clone(),
            camera: self.camera.clone(),
            identity: Arc::new(FixedIdentity(Some(EMAIL.to_string()))),
            store: self.store.clone(),
        }
    }
}

pub fn student() -> StudentDetails {
    StudentDetails {
        name: "Asha".to_string(),
        roll_no: "42".to_string(),
        group: "B".to_string(),
    }
}

pub fn write_valid_config(home: &Path) {
    let config_dir = home.join(".config").join("treetally");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::create_dir_all(home.join("photos")).expect("create gallery");

    let config = format!(
        r#"
version = 1

[identity]
email = "{EMAIL}"

[storage]
outbox_dir = "{}"

[media]
gallery_dir = "{}"
"#,
        home.join("outbox").display(),
        home.join("photos").display()
    );

    fs::write(config_dir.join("config.toml"), config).expect("write config");
}

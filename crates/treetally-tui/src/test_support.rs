use std::collections::{BTreeMap, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use treetally_app::{PreparedSave, Services};
use treetally_core::identity::ConfigIdentity;
use treetally_core::record::{ImageRef, StudentDetails, SubmissionRecord};
use treetally_core::services::{
    Camera, CameraPermission, CaptureOutcome, IdentityProvider, KeyValueStore, MediaLibrary,
    PersistenceService, ServiceFailure,
};
use treetally_core::store::save_student_details;

use crate::ui::loading::{FlowLoader, IdentityResult, SaveResult};

pub(crate) const EMAIL: &str = "asha@example.edu";

pub(crate) fn student() -> StudentDetails {
    StudentDetails {
        name: "Asha".to_string(),
        roll_no: "42".to_string(),
        group: "B".to_string(),
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub(crate) fn with_details(email: &str, details: &StudentDetails) -> Self {
        let store = Self::default();
        save_student_details(&store, email, details).expect("seed details");
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().expect("store lock").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingPersistence {
    pub(crate) saved: Mutex<Vec<SubmissionRecord>>,
}

impl PersistenceService for RecordingPersistence {
    fn save(&self, record: &SubmissionRecord, _image: &ImageRef) -> Result<(), ServiceFailure> {
        self.saved.lock().expect("saved lock").push(record.clone());
        Ok(())
    }
}

pub(crate) struct StaticLibrary(pub(crate) Vec<ImageRef>);

impl MediaLibrary for StaticLibrary {
    fn list_images(&self) -> anyhow::Result<Vec<ImageRef>> {
        Ok(self.0.clone())
    }
}

pub(crate) struct ScriptedCamera {
    pub(crate) permission: CameraPermission,
    pub(crate) outcomes: Mutex<VecDeque<anyhow::Result<CaptureOutcome>>>,
}

impl Camera for ScriptedCamera {
    fn request_permission(&self) -> anyhow::Result<CameraPermission> {
        Ok(self.permission)
    }

    fn capture(&self) -> anyhow::Result<CaptureOutcome> {
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("missing scripted capture")))
    }
}

pub(crate) struct FakeServices {
    pub(crate) persistence: Arc<RecordingPersistence>,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) library: Vec<ImageRef>,
    pub(crate) camera_permission: CameraPermission,
    pub(crate) captures: Vec<anyhow::Result<CaptureOutcome>>,
}

impl FakeServices {
    pub(crate) fn new(store: MemoryStore) -> Self {
        Self {
            persistence: Arc::new(RecordingPersistence::default()),
            store: Arc::new(store),
            library: vec![
                ImageRef::new("/photos/a.jpg"),
                ImageRef::new("/photos/b.jpg"),
            ],
            camera_permission: CameraPermission::Granted,
            captures: Vec::new(),
        }
    }

    pub(crate) fn build(self) -> (Services, Arc<RecordingPersistence>, Arc<MemoryStore>) {
        let identity: Arc<dyn IdentityProvider> = Arc::new(ConfigIdentity::new(EMAIL));
        let services = Services {
            persistence: self.persistence.clone(),
            library: Arc::new(StaticLibrary(self.library)),
            camera: Arc::new(ScriptedCamera {
                permission: self.camera_permission,
                outcomes: Mutex::new(self.captures.into()),
            }),
            identity,
            store: self.store.clone(),
        };
        (services, self.persistence, self.store)
    }
}

/// Hands out channels the test drives by hand instead of spawning threads.
#[derive(Default)]
pub(crate) struct ScriptedLoader {
    identity_senders: Mutex<Vec<Sender<IdentityResult>>>,
    save_senders: Mutex<Vec<Sender<SaveResult>>>,
    pending_saves: Mutex<Vec<(PreparedSave, Arc<dyn PersistenceService>)>>,
}

impl ScriptedLoader {
    pub(crate) fn identity_calls(&self) -> usize {
        self.identity_senders.lock().expect("identity lock").len()
    }

    pub(crate) fn save_calls(&self) -> usize {
        self.save_senders.lock().expect("save lock").len()
    }

    pub(crate) fn send_identity(&self, result: IdentityResult) {
        let sender = self
            .identity_senders
            .lock()
            .expect("identity lock")
            .last()
            .cloned()
            .expect("identity sender should exist");
        sender.send(result).expect("send identity");
    }

    /// Runs the oldest pending save against its persistence service and
    /// reports the outcome, as the worker thread would.
    pub(crate) fn complete_save(&self) {
        let (prepared, persistence) = self.pending_saves.lock().expect("pending lock").remove(0);
        let result = prepared.persist(persistence.as_ref());
        self.send_save(result);
    }

    /// Drops the pending save and reports `result` without calling the service.
    pub(crate) fn fail_save(&self, result: SaveResult) {
        drop(self.pending_saves.lock().expect("pending lock").remove(0));
        self.send_save(result);
    }

    pub(crate) fn abandon_save(&self) {
        drop(self.pending_saves.lock().expect("pending lock").remove(0));
        self.save_senders.lock().expect("save lock").clear();
    }

    fn send_save(&self, result: SaveResult) {
        let sender = self
            .save_senders
            .lock()
            .expect("save lock")
            .last()
            .cloned()
            .expect("save sender should exist");
        sender.send(result).expect("send save");
    }
}

impl FlowLoader for ScriptedLoader {
    fn spawn_identity(
        &self,
        _identity: Arc<dyn IdentityProvider>,
        _store: Arc<dyn KeyValueStore>,
    ) -> Receiver<IdentityResult> {
        let (sender, receiver) = mpsc::channel();
        self.identity_senders
            .lock()
            .expect("identity lock")
            .push(sender);
        receiver
    }

    fn spawn_save(
        &self,
        prepared: PreparedSave,
        persistence: Arc<dyn PersistenceService>,
    ) -> Receiver<SaveResult> {
        let (sender, receiver) = mpsc::channel();
        self.save_senders.lock().expect("save lock").push(sender);
        self.pending_saves
            .lock()
            .expect("pending lock")
            .push((prepared, persistence));
        receiver
    }
}

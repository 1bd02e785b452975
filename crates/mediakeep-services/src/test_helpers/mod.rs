//! Test helpers
//!
//! In-memory blob store and repositories that share one [`EventLog`], so tests can
//! assert on the order of blob and row operations across both sides. No database
//! or object store is needed.

pub mod mock_blob_store;
pub mod mock_repositories;

pub use mock_blob_store::MockBlobStore;
pub use mock_repositories::{
    MockAudioRepository, MockTranscriptionRepository, MockUserRepository, MockVideoRepository,
};

use mediakeep_core::{DeleteSettings, ProvisionSettings};
use std::sync::{Arc, Mutex};

use crate::provision::Provisioner;
use crate::resource::{AudioService, AvatarService, TranscriptionService, VideoService};
use crate::status::VideoStatusService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BlobUploaded(String),
    /// Logged before the mock decides whether the delete succeeds.
    BlobDeleteAttempted(String),
    RowCreated { table: &'static str, id: i64 },
    /// Logged before the mock decides whether the delete succeeds.
    RowDeleteAttempted { table: &'static str, id: i64 },
    RowDeleted { table: &'static str, id: i64 },
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Index of the first event equal to `event`.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }

    /// Index of the last blob delete attempt.
    pub fn last_blob_delete(&self) -> Option<usize> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .rposition(|e| matches!(e, Event::BlobDeleteAttempted(_)))
    }

    pub fn blob_deletes(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::BlobDeleteAttempted(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }
}

/// All mocks wired to one event log, plus constructors for the services under test.
pub struct TestContext {
    pub log: EventLog,
    pub store: Arc<MockBlobStore>,
    pub videos: Arc<MockVideoRepository>,
    pub audios: Arc<MockAudioRepository>,
    pub transcriptions: Arc<MockTranscriptionRepository>,
    pub users: Arc<MockUserRepository>,
    pub provision: ProvisionSettings,
    pub delete: DeleteSettings,
}

impl TestContext {
    pub fn new() -> Self {
        let log = EventLog::default();
        Self {
            store: Arc::new(MockBlobStore::with_log(log.clone())),
            videos: Arc::new(MockVideoRepository::new(log.clone())),
            audios: Arc::new(MockAudioRepository::new(log.clone())),
            transcriptions: Arc::new(MockTranscriptionRepository::new(log.clone())),
            users: Arc::new(MockUserRepository::new(log.clone())),
            provision: ProvisionSettings::default(),
            delete: DeleteSettings::default(),
            log,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.provision.concurrency = concurrency;
        self
    }

    pub fn video_service(&self) -> VideoService {
        VideoService::new(self.videos.clone(), self.store.clone(), self.delete.clone())
    }

    pub fn audio_service(&self) -> AudioService {
        AudioService::new(self.audios.clone(), self.store.clone(), self.delete.clone())
    }

    pub fn transcription_service(&self) -> TranscriptionService {
        TranscriptionService::new(
            self.transcriptions.clone(),
            self.store.clone(),
            self.delete.clone(),
        )
    }

    pub fn avatar_service(&self) -> AvatarService {
        AvatarService::new(self.users.clone(), self.store.clone(), self.delete.clone())
    }

    pub fn status_service(&self) -> VideoStatusService {
        VideoStatusService::new(self.videos.clone())
    }

    pub fn provisioner(&self) -> Provisioner {
        Provisioner::new(
            self.users.clone(),
            self.videos.clone(),
            self.audios.clone(),
            self.transcriptions.clone(),
            self.store.clone(),
            self.provision.clone(),
            self.delete.clone(),
        )
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

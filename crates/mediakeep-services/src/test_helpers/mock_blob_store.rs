//! In-memory blob store for tests

use async_trait::async_trait;
use mediakeep_storage::{object_key, BlobStore, StorageBackend, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{Event, EventLog};

/// Blob store that keeps objects in memory and records every call in an [`EventLog`].
///
/// Failures can be injected per key (deletes), per file-name suffix (uploads), or
/// for the whole store.
pub struct MockBlobStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing_deletes: Mutex<HashSet<String>>,
    sticky: Mutex<HashSet<String>>,
    failing_upload_suffixes: Mutex<Vec<String>>,
    unavailable: AtomicBool,
    log: EventLog,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::with_log(EventLog::default())
    }

    pub fn with_log(log: EventLog) -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            failing_deletes: Mutex::new(HashSet::new()),
            sticky: Mutex::new(HashSet::new()),
            failing_upload_suffixes: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            log,
        }
    }

    /// Place an object directly, bypassing the log.
    pub fn put_object(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    /// Remove an object out-of-band, bypassing the log.
    pub fn remove_object(&self, key: &str) {
        self.objects.lock().unwrap().remove(key);
    }

    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn get_object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Deletes of `key` fail with `Unavailable`.
    pub fn fail_deletes_for(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    /// Deletes of `key` succeed but the object stays visible.
    pub fn keep_after_delete(&self, key: &str) {
        self.sticky.lock().unwrap().insert(key.to_string());
    }

    /// Uploads whose file name ends with `suffix` fail with `Unavailable`.
    pub fn fail_uploads_ending_with(&self, suffix: &str) {
        self.failing_upload_suffixes
            .lock()
            .unwrap()
            .push(suffix.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("mock store offline".to_string()));
        }
        Ok(())
    }

    fn signed(key: &str, method: &str) -> String {
        format!("https://blobs.test/{}?method={}&expires=900", key, method)
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn presign_upload(
        &self,
        folder: &str,
        file_name: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        let key = object_key(folder, file_name)?;
        self.check_available()?;
        Ok(Self::signed(&key, "PUT"))
    }

    async fn presign_download(
        &self,
        folder: &str,
        file_name: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        let key = object_key(folder, file_name)?;
        self.check_available()?;
        Ok(Self::signed(&key, "GET"))
    }

    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let key = object_key(folder, file_name)?;
        self.check_available()?;
        let failing = self
            .failing_upload_suffixes
            .lock()
            .unwrap()
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()));
        if failing {
            return Err(StorageError::Unavailable(format!("upload of {} failed", key)));
        }
        self.objects.lock().unwrap().insert(key.clone(), data);
        self.log.push(Event::BlobUploaded(key.clone()));
        Ok(key)
    }

    async fn delete(&self, folder: &str, file_name: &str) -> StorageResult<()> {
        let key = object_key(folder, file_name)?;
        self.log.push(Event::BlobDeleteAttempted(key.clone()));
        self.check_available()?;
        if self.failing_deletes.lock().unwrap().contains(&key) {
            return Err(StorageError::Unavailable(format!("delete of {} failed", key)));
        }
        if self.sticky.lock().unwrap().contains(&key) {
            return Ok(());
        }
        match self.objects.lock().unwrap().remove(&key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key)),
        }
    }

    async fn exists(&self, folder: &str, file_name: &str) -> StorageResult<bool> {
        let key = object_key(folder, file_name)?;
        self.check_available()?;
        Ok(self.objects.lock().unwrap().contains_key(&key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

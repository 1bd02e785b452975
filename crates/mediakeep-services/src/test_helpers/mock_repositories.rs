//! In-memory repositories for tests

use async_trait::async_trait;
use chrono::Utc;
use mediakeep_core::models::{
    Audio, BlobPointer, NewAudio, NewTranscription, NewUser, NewVideo, Transcription, User,
    UserStatus, Video, VideoStatus,
};
use mediakeep_core::AppError;
use mediakeep_db::{AudioRepository, TranscriptionRepository, UserRepository, VideoRepository};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use super::{Event, EventLog};

/// Shared shape of every mock table: rows keyed by id, an id sequence, and a
/// switch that makes deletes fail the way a constraint violation would.
struct Table<T> {
    name: &'static str,
    rows: Mutex<BTreeMap<i64, T>>,
    next_id: AtomicI64,
    fail_deletes: AtomicBool,
    log: EventLog,
}

impl<T: Clone> Table<T> {
    fn new(name: &'static str, log: EventLog) -> Self {
        Self {
            name,
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            fail_deletes: AtomicBool::new(false),
            log,
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn insert(&self, id: i64, row: T) -> T {
        self.rows.lock().unwrap().insert(id, row.clone());
        self.log.push(Event::RowCreated {
            table: self.name,
            id,
        });
        row
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| pred(row))
            .cloned()
            .collect()
    }

    fn replace(&self, id: i64, f: impl FnOnce(&mut T)) -> bool {
        match self.rows.lock().unwrap().get_mut(&id) {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: i64) -> Result<bool, AppError> {
        self.log.push(Event::RowDeleteAttempted {
            table: self.name,
            id,
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(format!(
                "update or delete on table \"{}\" violates foreign key constraint",
                self.name
            )));
        }
        let removed = self.rows.lock().unwrap().remove(&id).is_some();
        if removed {
            self.log.push(Event::RowDeleted {
                table: self.name,
                id,
            });
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

macro_rules! table_controls {
    ($repo:ty) => {
        impl $repo {
            /// Make every subsequent delete fail.
            pub fn fail_deletes(&self, fail: bool) {
                self.table.fail_deletes.store(fail, Ordering::SeqCst);
            }

            pub fn row_count(&self) -> usize {
                self.table.len()
            }
        }
    };
}

pub struct MockVideoRepository {
    table: Table<Video>,
    drop_after_status_read: AtomicBool,
}

impl MockVideoRepository {
    pub fn new(log: EventLog) -> Self {
        Self {
            table: Table::new("videos", log),
            drop_after_status_read: AtomicBool::new(false),
        }
    }

    /// The next `get_status` returns the row's status, then removes the row, as a
    /// concurrent delete landing between a read and a write would.
    pub fn drop_after_next_status_read(&self) {
        self.drop_after_status_read.store(true, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Video> {
        self.table.filter(|_| true)
    }
}

table_controls!(MockVideoRepository);

#[async_trait]
impl VideoRepository for MockVideoRepository {
    async fn create(&self, video: NewVideo) -> Result<Video, AppError> {
        if let Some(ref key) = video.provision_key {
            if !self
                .table
                .filter(|v| v.provision_key.as_deref() == Some(key.as_str()))
                .is_empty()
            {
                return Err(AppError::InvalidInput(format!(
                    "duplicate provision key {}",
                    key
                )));
            }
        }
        let id = self.table.next_id();
        let now = Utc::now();
        Ok(self.table.insert(
            id,
            Video {
                id,
                user_id: video.user_id,
                title: video.title,
                duration: video.duration,
                description: video.description,
                blob: video.blob,
                image: video.image,
                status: VideoStatus::Raw,
                provision_key: video.provision_key,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Video>, AppError> {
        Ok(self.table.get(id))
    }

    async fn get_by_provision_key(&self, key: &str) -> Result<Option<Video>, AppError> {
        Ok(self
            .table
            .filter(|v| v.provision_key.as_deref() == Some(key))
            .into_iter()
            .next())
    }

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Video>, AppError> {
        Ok(self.table.filter(|v| v.user_id == user_id))
    }

    async fn update(&self, video: &Video) -> Result<bool, AppError> {
        Ok(self.table.replace(video.id, |row| {
            row.title = video.title.clone();
            row.duration = video.duration;
            row.description = video.description.clone();
            row.blob = video.blob.clone();
            row.image = video.image.clone();
            row.updated_at = Utc::now();
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        self.table.remove(id)
    }

    async fn get_status(&self, id: i64) -> Result<Option<VideoStatus>, AppError> {
        let status = self.table.get(id).map(|v| v.status);
        if self.drop_after_status_read.swap(false, Ordering::SeqCst) {
            self.table.rows.lock().unwrap().remove(&id);
        }
        Ok(status)
    }

    async fn update_status(&self, id: i64, status: VideoStatus) -> Result<u64, AppError> {
        let updated = self.table.replace(id, |row| {
            row.status = status;
            row.updated_at = Utc::now();
        });
        Ok(u64::from(updated))
    }
}

pub struct MockAudioRepository {
    table: Table<Audio>,
}

impl MockAudioRepository {
    pub fn new(log: EventLog) -> Self {
        Self {
            table: Table::new("audios", log),
        }
    }
}

table_controls!(MockAudioRepository);

#[async_trait]
impl AudioRepository for MockAudioRepository {
    async fn create(&self, audio: NewAudio) -> Result<Audio, AppError> {
        let id = self.table.next_id();
        let now = Utc::now();
        Ok(self.table.insert(
            id,
            Audio {
                id,
                video_id: audio.video_id,
                user_id: audio.user_id,
                duration: audio.duration,
                lang: audio.lang,
                blob: audio.blob,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Audio>, AppError> {
        Ok(self.table.get(id))
    }

    async fn get_by_video(&self, video_id: i64, id: i64) -> Result<Option<Audio>, AppError> {
        Ok(self.table.get(id).filter(|a| a.video_id == video_id))
    }

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Audio>, AppError> {
        Ok(self.table.filter(|a| a.user_id == user_id))
    }

    async fn list_by_video(&self, video_id: i64) -> Result<Vec<Audio>, AppError> {
        Ok(self.table.filter(|a| a.video_id == video_id))
    }

    async fn update(&self, audio: &Audio) -> Result<bool, AppError> {
        Ok(self.table.replace(audio.id, |row| {
            row.duration = audio.duration;
            row.lang = audio.lang.clone();
            row.blob = audio.blob.clone();
            row.updated_at = Utc::now();
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        self.table.remove(id)
    }
}

pub struct MockTranscriptionRepository {
    table: Table<Transcription>,
}

impl MockTranscriptionRepository {
    pub fn new(log: EventLog) -> Self {
        Self {
            table: Table::new("transcriptions", log),
        }
    }
}

table_controls!(MockTranscriptionRepository);

#[async_trait]
impl TranscriptionRepository for MockTranscriptionRepository {
    async fn create(&self, transcription: NewTranscription) -> Result<Transcription, AppError> {
        let id = self.table.next_id();
        let now = Utc::now();
        Ok(self.table.insert(
            id,
            Transcription {
                id,
                video_id: transcription.video_id,
                user_id: transcription.user_id,
                text: transcription.text,
                lang: transcription.lang,
                blob: transcription.blob,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Transcription>, AppError> {
        Ok(self.table.get(id))
    }

    async fn get_by_video(
        &self,
        video_id: i64,
        id: i64,
    ) -> Result<Option<Transcription>, AppError> {
        Ok(self.table.get(id).filter(|t| t.video_id == video_id))
    }

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Transcription>, AppError> {
        Ok(self.table.filter(|t| t.user_id == user_id))
    }

    async fn list_by_video(&self, video_id: i64) -> Result<Vec<Transcription>, AppError> {
        Ok(self.table.filter(|t| t.video_id == video_id))
    }

    async fn update(&self, transcription: &Transcription) -> Result<bool, AppError> {
        Ok(self.table.replace(transcription.id, |row| {
            row.text = transcription.text.clone();
            row.lang = transcription.lang.clone();
            row.blob = transcription.blob.clone();
            row.updated_at = Utc::now();
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        self.table.remove(id)
    }
}

pub struct MockUserRepository {
    table: Table<User>,
}

impl MockUserRepository {
    pub fn new(log: EventLog) -> Self {
        Self {
            table: Table::new("users", log),
        }
    }

    pub fn all(&self) -> Vec<User> {
        self.table.filter(|_| true)
    }
}

table_controls!(MockUserRepository);

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        if !self.table.filter(|u| u.email == user.email).is_empty() {
            return Err(AppError::InvalidInput(format!(
                "duplicate email {}",
                user.email
            )));
        }
        let id = self.table.next_id();
        let now = Utc::now();
        Ok(self.table.insert(
            id,
            User {
                id,
                first_name: user.first_name,
                last_name: user.last_name,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                status: UserStatus::Available,
                avatar: user.avatar,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.table.get(id))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.table.filter(|u| u.email == email).into_iter().next())
    }

    async fn list_by_email_suffix(&self, suffix: &str) -> Result<Vec<User>, AppError> {
        Ok(self.table.filter(|u| u.email.ends_with(suffix)))
    }

    async fn update(&self, user: &User) -> Result<bool, AppError> {
        Ok(self.table.replace(user.id, |row| {
            row.first_name = user.first_name.clone();
            row.last_name = user.last_name.clone();
            row.username = user.username.clone();
            row.avatar = user.avatar.clone();
            row.updated_at = Utc::now();
        }))
    }

    async fn update_avatar(&self, id: i64, avatar: &BlobPointer) -> Result<bool, AppError> {
        Ok(self.table.replace(id, |row| {
            row.avatar = avatar.clone();
            row.updated_at = Utc::now();
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.table.replace(id, |row| {
            row.status = UserStatus::Deleted;
            row.updated_at = Utc::now();
        }))
    }

    async fn purge(&self, id: i64) -> Result<bool, AppError> {
        self.table.remove(id)
    }
}

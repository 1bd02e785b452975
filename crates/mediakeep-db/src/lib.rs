//! Mediakeep metadata store
//!
//! One repository trait per entity ([`VideoRepository`], [`AudioRepository`],
//! [`TranscriptionRepository`], [`UserRepository`]) and a Postgres implementation of
//! each. Repositories only read and write `(folder, file_name)` pointer columns; they
//! never touch the blob store.
//!
//! Lookups by id return `Ok(None)` for absent rows so callers can tell "absent" from
//! "database failure".

pub mod db;
pub mod repository;

pub use db::pool::{connect, run_migrations};
pub use db::{
    PgAudioRepository, PgTranscriptionRepository, PgUserRepository, PgVideoRepository,
};
pub use repository::{
    AudioRepository, TranscriptionRepository, UserRepository, VideoRepository,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::blob::{AssociatedBlob, BlobKind, BlobPointer, HasBlobs};

/// Account status. Deleting a user only moves it to `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum UserStatus {
    Available = 1,
    Suspended = 9,
    Deleted = 10,
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserStatus::Available => write!(f, "available"),
            UserStatus::Suspended => write!(f, "suspended"),
            UserStatus::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: UserStatus,
    pub avatar: BlobPointer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.status == UserStatus::Deleted
    }
}

impl HasBlobs for User {
    fn blobs(&self) -> Vec<AssociatedBlob> {
        if !self.avatar.is_set() {
            return Vec::new();
        }
        vec![AssociatedBlob {
            kind: BlobKind::Avatar,
            pointer: self.avatar.clone(),
        }]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: BlobPointer,
}

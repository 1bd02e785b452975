use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use mediakeep_core::constants::AVATAR_CONTENT_TYPE;
use mediakeep_core::models::{BlobPointer, NewUser};
use mediakeep_core::AppError;
use rand::distr::Alphanumeric;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::report::{BulkReport, ItemOutcome, ItemReport, SkipReason};
use super::scan::{content_type_for, SourceFile, UserIdentity};
use super::{source_label, Provisioner};

const PASSWORD_LENGTH: usize = 12;

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Hash a fresh random password off the async workers; argon2 is CPU-bound.
async fn random_password_hash() -> Result<String, AppError> {
    tokio::task::spawn_blocking(|| hash_password(&generate_password()))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
}

impl Provisioner {
    /// One user per avatar image. The email derived from the file name is the
    /// natural key, so a re-run skips users it already created.
    pub(super) async fn provision_users(
        &self,
        files: Vec<SourceFile>,
        cancel: &CancellationToken,
    ) -> BulkReport {
        self.run_bounded(files, cancel, source_label, |file| self.provision_user(file))
            .await
    }

    #[tracing::instrument(skip(self, file), fields(file = %file.file_name))]
    async fn provision_user(&self, file: SourceFile) -> ItemReport {
        let identity = UserIdentity::derive(&file, &self.settings.email_domain);

        match self.users.get_by_email(&identity.email).await {
            Ok(Some(existing)) => {
                tracing::info!(email = %identity.email, user_id = existing.id, "User already exists, skipping");
                return ItemReport::skipped(file.file_name, SkipReason::AlreadyExists);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, email = %identity.email, "Failed to check existing user");
                return ItemReport::failed(file.file_name, e);
            }
        }

        let data = match tokio::fs::read(&file.path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, path = %file.path.display(), "Failed to read avatar file");
                return ItemReport::failed(file.file_name, e);
            }
        };

        let password_hash = match random_password_hash().await {
            Ok(hash) => hash,
            Err(e) => return ItemReport::failed(file.file_name, e),
        };

        let user = match self
            .users
            .create(NewUser {
                first_name: identity.first_name,
                last_name: identity.last_name,
                username: identity.username,
                email: identity.email,
                password_hash,
                avatar: BlobPointer::unset(),
            })
            .await
        {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create user");
                return ItemReport::failed(file.file_name, e);
            }
        };

        let folder = self.settings.avatar_folder.as_str();
        let unique_name = format!("{}_{}", Uuid::new_v4(), file.file_name);
        let content_type = content_type_for(&file.extension, AVATAR_CONTENT_TYPE);

        if let Err(e) = self
            .store
            .upload(folder, &unique_name, content_type, data)
            .await
        {
            tracing::warn!(error = %e, user_id = user.id, "Failed to upload avatar, removing user");
            let warnings = self.discard_user(user.id, None).await;
            return ItemReport::failed(file.file_name, e).with_warnings(warnings);
        }

        let linked = self.link_avatar(user.id, folder, &unique_name).await;

        match linked {
            Ok(()) => {
                tracing::info!(user_id = user.id, avatar = %unique_name, "Provisioned user");
                ItemReport::new(file.file_name, ItemOutcome::Created { id: user.id })
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = user.id, "Failed to link avatar, removing user");
                let warnings = self.discard_user(user.id, Some(&unique_name)).await;
                ItemReport::failed(file.file_name, e).with_warnings(warnings)
            }
        }
    }

    async fn link_avatar(&self, user_id: i64, folder: &str, file_name: &str) -> Result<(), AppError> {
        let pointer = BlobPointer::new(folder, file_name)?;
        if !self.users.update_avatar(user_id, &pointer).await? {
            return Err(AppError::ResourceNotFound(format!("user {} not found", user_id)));
        }
        Ok(())
    }

    /// Undo a half-provisioned user so the next run retries it. Problems are
    /// returned as warnings.
    async fn discard_user(&self, user_id: i64, avatar: Option<&str>) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(file_name) = avatar {
            if let Err(e) = self
                .store
                .delete(&self.settings.avatar_folder, file_name)
                .await
            {
                warnings.push(format!("avatar {} not removed: {}", file_name, e));
            }
        }
        if let Err(e) = self.users.purge(user_id).await {
            tracing::error!(error = %e, user_id, "Failed to remove half-provisioned user");
            warnings.push(format!("user {} not removed: {}", user_id, e));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[test]
    fn password_is_alphanumeric() {
        let password = generate_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2hunter").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2hunter", &parsed)
            .is_ok());
    }

    #[tokio::test]
    async fn random_password_hash_runs_on_blocking_pool() {
        let first = random_password_hash().await.unwrap();
        let second = random_password_hash().await.unwrap();
        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
    }
}

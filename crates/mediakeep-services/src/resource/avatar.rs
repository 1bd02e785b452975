//! Avatar access. The avatar is a pointer on the user row, not a child entity.

use mediakeep_core::models::{BlobPointer, HasBlobs, User};
use mediakeep_core::{AppError, DeleteSettings};
use mediakeep_db::UserRepository;
use mediakeep_storage::BlobStore;
use std::sync::Arc;

use super::{
    issue_upload_url, not_found, sign_blob, sign_blobs, BlobDeletion, CascadeDeleter,
    ResourceAccess, SignedBlob, UploadUrlRequest,
};

const RESOURCE: &str = "user";

#[derive(Clone)]
pub struct AvatarService {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn BlobStore>,
    cascade: CascadeDeleter,
}

impl AvatarService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn BlobStore>,
        delete: DeleteSettings,
    ) -> Self {
        Self {
            users,
            cascade: CascadeDeleter::new(store.clone(), delete),
            store,
        }
    }

    pub async fn upload_url(&self, request: &UploadUrlRequest) -> Result<String, AppError> {
        issue_upload_url(self.store.as_ref(), request).await
    }

    /// The user with a download URL for the avatar, if one is set.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: i64) -> Result<ResourceAccess<User>, AppError> {
        let user = self.load(user_id).await?;
        let urls = sign_blobs(self.store.as_ref(), &user.blobs()).await?;
        Ok(ResourceAccess {
            resource: user,
            urls,
        })
    }

    pub async fn download_url(&self, user_id: i64) -> Result<SignedBlob, AppError> {
        let user = self.load(user_id).await?;
        let avatar = user.blobs().into_iter().next().ok_or_else(|| {
            AppError::ResourceNotFound(format!("user {} has no avatar", user_id))
        })?;
        sign_blob(self.store.as_ref(), &avatar).await
    }

    /// Point the user at an uploaded avatar. Both parts must be set or both empty.
    #[tracing::instrument(skip(self, folder, file_name))]
    pub async fn set_avatar(
        &self,
        user_id: i64,
        folder: &str,
        file_name: &str,
    ) -> Result<User, AppError> {
        let pointer = BlobPointer::new(folder, file_name)?;
        if !self.users.update_avatar(user_id, &pointer).await? {
            return Err(not_found(RESOURCE, user_id));
        }
        tracing::info!(user_id, avatar = %pointer, "Avatar updated");
        self.load(user_id).await
    }

    /// Delete the avatar blob, then clear the pointer.
    #[tracing::instrument(skip(self))]
    pub async fn delete_avatar(&self, user_id: i64) -> Result<Vec<BlobDeletion>, AppError> {
        let user = self.load(user_id).await?;
        let blobs = self.cascade.delete_blobs(&user).await;
        let cleared = self
            .users
            .update_avatar(user_id, &BlobPointer::unset())
            .await;
        self.cascade
            .finish(RESOURCE, user_id, blobs, cleared)
            .map(|outcome| outcome.blobs)
    }

    /// Soft delete. The row and its avatar blob are kept.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i64) -> Result<(), AppError> {
        if !self.users.delete(user_id).await? {
            return Err(not_found(RESOURCE, user_id));
        }
        tracing::info!(user_id, "User marked deleted");
        Ok(())
    }

    async fn load(&self, user_id: i64) -> Result<User, AppError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| not_found(RESOURCE, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestContext;
    use mediakeep_core::models::{BlobKind, NewUser, UserStatus};
    use mediakeep_db::UserRepository;

    async fn seed_user(ctx: &TestContext) -> User {
        ctx.users
            .create(NewUser {
                first_name: "Bob".to_string(),
                last_name: "Smith".to_string(),
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password_hash: "x".to_string(),
                avatar: BlobPointer::unset(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn download_url_without_avatar_is_not_found() {
        let ctx = TestContext::new();
        let user = seed_user(&ctx).await;

        let err = ctx.avatar_service().download_url(user.id).await.unwrap_err();
        assert!(err.is_not_found());
        let err = ctx.avatar_service().download_url(999).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn set_then_download() {
        let ctx = TestContext::new();
        let user = seed_user(&ctx).await;
        let service = ctx.avatar_service();

        let updated = service.set_avatar(user.id, "avatars", "bob.png").await.unwrap();
        assert!(updated.avatar.is_set());

        let signed = service.download_url(user.id).await.unwrap();
        assert_eq!(signed.kind, BlobKind::Avatar);
        assert!(signed.url.contains("avatars/bob.png"));
    }

    #[tokio::test]
    async fn get_returns_user_with_avatar_url() {
        let ctx = TestContext::new();
        let user = seed_user(&ctx).await;
        let service = ctx.avatar_service();

        let bare = service.get(user.id).await.unwrap();
        assert_eq!(bare.resource.email, "bob@example.com");
        assert!(bare.urls.is_empty());

        service.set_avatar(user.id, "avatars", "bob.png").await.unwrap();
        let access = service.get(user.id).await.unwrap();
        assert_eq!(access.resource.id, user.id);
        assert!(access
            .url(BlobKind::Avatar)
            .unwrap()
            .contains("avatars/bob.png"));

        assert!(service.get(999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn set_avatar_rejects_half_pointer() {
        let ctx = TestContext::new();
        let user = seed_user(&ctx).await;

        let err = ctx
            .avatar_service()
            .set_avatar(user.id, "avatars", "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn delete_avatar_removes_blob_and_clears_pointer() {
        let ctx = TestContext::new();
        let user = seed_user(&ctx).await;
        let service = ctx.avatar_service();
        service.set_avatar(user.id, "avatars", "bob.png").await.unwrap();
        ctx.store.put_object("avatars/bob.png", b"img".to_vec());

        let blobs = service.delete_avatar(user.id).await.unwrap();
        assert_eq!(blobs.len(), 1);
        assert!(!ctx.store.has_object("avatars/bob.png"));
        assert!(service.download_url(user.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_user_is_soft() {
        let ctx = TestContext::new();
        let user = seed_user(&ctx).await;
        let service = ctx.avatar_service();
        service.set_avatar(user.id, "avatars", "bob.png").await.unwrap();
        ctx.store.put_object("avatars/bob.png", b"img".to_vec());

        service.delete_user(user.id).await.unwrap();

        let stored = ctx.users.all().into_iter().next().unwrap();
        assert_eq!(stored.status, UserStatus::Deleted);
        assert!(ctx.store.has_object("avatars/bob.png"));
    }
}

//! Provisioning and cleanup against the in-memory store and repositories.

use mediakeep_core::models::UserStatus;
use mediakeep_db::UserRepository;
use mediakeep_services::test_helpers::TestContext;
use mediakeep_services::{ItemOutcome, ProvisionSources, SkipReason};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn write_files(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), format!("bytes of {}", name)).unwrap();
    }
}

fn avatars_only(dir: &TempDir) -> ProvisionSources {
    ProvisionSources {
        avatar_dir: Some(dir.path().to_path_buf()),
        video_dir: None,
    }
}

#[tokio::test]
async fn alice_is_provisioned_and_cleaned_up() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png"]);
    let provisioner = ctx.provisioner();
    let cancel = CancellationToken::new();

    let report = provisioner
        .provision(&avatars_only(&avatars), &cancel)
        .await
        .unwrap();
    assert_eq!(report.users.created(), 1);

    let users = ctx.users.all();
    assert_eq!(users.len(), 1);
    let alice = &users[0];
    assert_eq!(alice.email, "alice_seeder@seeder.com");
    assert_eq!(alice.first_name, "Alice");
    assert_eq!(alice.last_name, "Seeder");
    assert_eq!(alice.username, "alice_seeder");
    assert_eq!(alice.status, UserStatus::Available);
    assert!(alice.avatar.is_set());
    assert_eq!(alice.avatar.folder(), "avatars");
    assert!(alice.avatar.file_name().ends_with("_alice.png"));
    assert!(alice.password_hash.starts_with("$argon2"));

    let avatar_key = format!("avatars/{}", alice.avatar.file_name());
    assert_eq!(
        ctx.store.get_object(&avatar_key).unwrap(),
        b"bytes of alice.png".to_vec()
    );

    let cleanup = provisioner.cleanup(&cancel).await.unwrap();
    assert_eq!(cleanup.removed(), 1);
    assert!(!ctx.store.has_object(&avatar_key));
    assert!(ctx.users.get_by_id(alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn second_run_skips_everything_created_by_the_first() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    let videos = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png", "bob.jpg"]);
    write_files(videos.path(), &["intro.mp4", "intro_thumbnail.jpg"]);
    let sources = ProvisionSources {
        avatar_dir: Some(avatars.path().to_path_buf()),
        video_dir: Some(videos.path().to_path_buf()),
    };
    let provisioner = ctx.provisioner();
    let cancel = CancellationToken::new();

    let first = provisioner.provision(&sources, &cancel).await.unwrap();
    assert_eq!(first.users.created(), 2);
    assert_eq!(first.videos.created(), 1);
    let objects = ctx.store.object_count();

    let second = provisioner.provision(&sources, &cancel).await.unwrap();
    assert_eq!(second.users.skipped_for(SkipReason::AlreadyExists), 2);
    assert_eq!(second.videos.skipped_for(SkipReason::AlreadyExists), 1);
    assert_eq!(ctx.users.row_count(), 2);
    assert_eq!(ctx.videos.row_count(), 1);
    assert_eq!(ctx.store.object_count(), objects);
}

#[tokio::test]
async fn videos_need_a_frame_and_a_provisioned_owner() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    let videos = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png", "bob.png"]);
    write_files(
        videos.path(),
        &["intro.mp4", "intro_thumbnail.jpg", "outro.mov", "notes.txt"],
    );
    let sources = ProvisionSources {
        avatar_dir: Some(avatars.path().to_path_buf()),
        video_dir: Some(videos.path().to_path_buf()),
    };

    let report = ctx
        .provisioner()
        .provision(&sources, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.videos.items.len(), 2);
    assert_eq!(
        report.videos.item("outro.mov").unwrap().outcome,
        ItemOutcome::Skipped {
            reason: SkipReason::MissingFrame
        }
    );

    let provisioned: Vec<i64> = ctx.users.all().iter().map(|u| u.id).collect();
    let stored = ctx.videos.all();
    assert_eq!(stored.len(), 1);
    let intro = &stored[0];
    assert!(provisioned.contains(&intro.user_id));
    assert_eq!(intro.title, "Intro");
    assert_eq!(intro.duration, 120);
    assert_eq!(intro.description, "Seeder video description");
    assert_eq!(intro.provision_key.as_deref(), Some("seed:intro.mp4"));

    // Media and frame share a prefix and the videos folder.
    let prefix = intro
        .blob
        .file_name()
        .strip_suffix("_intro.mp4")
        .unwrap()
        .to_string();
    assert_eq!(intro.image, format!("{}_intro_thumbnail.jpg", prefix));
    assert!(ctx
        .store
        .has_object(&format!("videos/{}", intro.blob.file_name())));
    assert!(ctx.store.has_object(&format!("videos/{}", intro.image)));
}

#[tokio::test]
async fn videos_without_provisioned_users_are_skipped() {
    let ctx = TestContext::new();
    let videos = tempfile::tempdir().unwrap();
    write_files(videos.path(), &["intro.mp4", "intro_thumbnail.jpg"]);

    let report = ctx
        .provisioner()
        .provision(
            &ProvisionSources {
                avatar_dir: None,
                video_dir: Some(videos.path().to_path_buf()),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.videos.skipped_for(SkipReason::NoProvisionedUsers), 1);
    assert_eq!(ctx.videos.row_count(), 0);
}

#[tokio::test]
async fn failed_upload_removes_the_created_row() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png", "bob.png"]);
    ctx.store.fail_uploads_ending_with("_bob.png");
    let provisioner = ctx.provisioner();
    let cancel = CancellationToken::new();

    let first = provisioner
        .provision(&avatars_only(&avatars), &cancel)
        .await
        .unwrap();
    assert_eq!(first.users.created(), 1);
    assert!(matches!(
        first.users.item("bob.png").unwrap().outcome,
        ItemOutcome::Failed { .. }
    ));
    assert_eq!(ctx.users.row_count(), 1);
    assert_eq!(ctx.users.all()[0].email, "alice_seeder@seeder.com");
    assert!(ctx
        .users
        .get_by_email("bob_seeder@seeder.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn rerun_after_failed_upload_creates_the_missing_user() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png", "bob.png"]);
    let cancel = CancellationToken::new();

    ctx.store.set_unavailable(true);
    let first = ctx
        .provisioner()
        .provision(&avatars_only(&avatars), &cancel)
        .await
        .unwrap();
    assert_eq!(first.users.failed(), 2);
    assert_eq!(ctx.users.row_count(), 0);

    ctx.store.set_unavailable(false);
    let second = ctx
        .provisioner()
        .provision(&avatars_only(&avatars), &cancel)
        .await
        .unwrap();
    assert_eq!(second.users.created(), 2);
    assert_eq!(ctx.users.row_count(), 2);
}

#[tokio::test]
async fn cleanup_twice_is_safe() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    let videos = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png"]);
    write_files(videos.path(), &["intro.mp4", "intro_thumbnail.jpg"]);
    let provisioner = ctx.provisioner();
    let cancel = CancellationToken::new();
    provisioner
        .provision(
            &ProvisionSources {
                avatar_dir: Some(avatars.path().to_path_buf()),
                video_dir: Some(videos.path().to_path_buf()),
            },
            &cancel,
        )
        .await
        .unwrap();

    let first = provisioner.cleanup(&cancel).await.unwrap();
    assert_eq!(first.removed(), 1);
    assert!(first.is_clean());
    assert_eq!(ctx.store.object_count(), 0);
    assert_eq!(ctx.videos.row_count(), 0);

    let second = provisioner.cleanup(&cancel).await.unwrap();
    assert!(second.items.is_empty());
    assert!(second.is_clean());
}

#[tokio::test]
async fn concurrent_run_matches_sequential_result() {
    let ctx = TestContext::new().with_concurrency(4);
    let avatars = tempfile::tempdir().unwrap();
    let names: Vec<String> = (0..6).map(|i| format!("user{:02}.png", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    write_files(avatars.path(), &refs);
    let provisioner = ctx.provisioner();
    let cancel = CancellationToken::new();

    let report = provisioner
        .provision(&avatars_only(&avatars), &cancel)
        .await
        .unwrap();
    assert_eq!(report.users.created(), 6);
    let reported: Vec<&str> = report.users.items.iter().map(|i| i.item.as_str()).collect();
    assert_eq!(reported, refs);

    let cleanup = provisioner.cleanup(&cancel).await.unwrap();
    assert_eq!(cleanup.removed(), 6);
    assert_eq!(ctx.users.row_count(), 0);
    assert_eq!(ctx.store.object_count(), 0);
}

#[tokio::test]
async fn cancelled_run_reports_unstarted_items() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png", "bob.png"]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = ctx
        .provisioner()
        .provision(&avatars_only(&avatars), &cancel)
        .await
        .unwrap();

    assert!(report.cancelled());
    assert_eq!(report.users.skipped_for(SkipReason::Cancelled), 2);
    assert_eq!(ctx.users.row_count(), 0);
}

#[tokio::test]
async fn soft_deleted_users_do_not_receive_videos() {
    let ctx = TestContext::new();
    let avatars = tempfile::tempdir().unwrap();
    let videos = tempfile::tempdir().unwrap();
    write_files(avatars.path(), &["alice.png"]);
    write_files(videos.path(), &["intro.mp4", "intro_thumbnail.jpg"]);
    let provisioner = ctx.provisioner();
    let cancel = CancellationToken::new();

    provisioner
        .provision(&avatars_only(&avatars), &cancel)
        .await
        .unwrap();
    let alice = ctx.users.all()[0].id;
    ctx.avatar_service().delete_user(alice).await.unwrap();

    let report = provisioner
        .provision(
            &ProvisionSources {
                avatar_dir: None,
                video_dir: Some(videos.path().to_path_buf()),
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(report.videos.skipped_for(SkipReason::NoProvisionedUsers), 1);
}

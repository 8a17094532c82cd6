//! Editorial workflow for blog posts against the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use portal_core::media::{MediaError, MediaFile, MediaHost, TransformOptions, UploadOptions, UploadedMedia};
use portal_core::types::{NewPost, PostFilter, PostPatch, PostStatus};
use portal_core::{ActorContext, PortalError, WorkflowService};
use uuid::Uuid;

fn new_post(title: &str, content: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: content.to_string(),
        tags: vec!["planning".to_string()],
        author_name: Some("Ada Advisor".to_string()),
        ..NewPost::default()
    }
}

/// Media host that accepts uploads but fails every delete.
#[derive(Default)]
struct FlakyMedia {
    uploads: AtomicUsize,
    delete_attempts: AtomicUsize,
}

#[async_trait]
impl MediaHost for FlakyMedia {
    async fn upload(&self, file: MediaFile, _options: UploadOptions) -> Result<UploadedMedia, MediaError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(UploadedMedia {
            id: format!("img-{n}"),
            url: format!("https://media.test/img-{n}/{}", file.file_name),
            download_url: None,
            thumbnail_url: None,
            file_size: Some(file.bytes.len() as u64),
            file_type: Some(file.content_type),
            width: Some(800),
            height: Some(600),
            duration: None,
        })
    }

    async fn delete(&self, media_id: &str) -> Result<(), MediaError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        Err(MediaError::Unreachable(format!("cannot delete {media_id}")))
    }

    fn transform_url(&self, media_id: &str, options: &TransformOptions) -> Result<String, MediaError> {
        Ok(format!(
            "https://media.test/{media_id}?w={}",
            options.width.unwrap_or_default()
        ))
    }
}

fn image() -> MediaFile {
    MediaFile {
        file_name: "cover.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0u8; 16],
    }
}

#[tokio::test]
async fn create_derives_slug_excerpt_and_read_time() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let content = format!("<p>{}</p>", "word ".repeat(400));

    let post = svc
        .create_post(&author, new_post("Five Retirement Myths!", &content))
        .await
        .unwrap();

    assert_eq!(post.slug, "five-retirement-myths");
    assert_eq!(post.read_time, 2);
    assert!(post.excerpt.ends_with("..."));
    assert!(!post.excerpt.contains('<'));
    assert_eq!(post.status, PostStatus::Draft);
    assert!(post.published_at.is_none());
    assert_eq!(Some(post.author_id), author.actor_id);
}

#[tokio::test]
async fn explicit_excerpt_is_kept() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let mut new = new_post("Budgeting", "Long body text here.");
    new.excerpt = Some("Custom teaser".to_string());

    let post = svc.create_post(&author, new).await.unwrap();
    assert_eq!(post.excerpt, "Custom teaser");
}

#[tokio::test]
async fn anonymous_cannot_create_posts() {
    let svc = WorkflowService::in_memory();
    let err = svc
        .create_post(&ActorContext::anonymous(), new_post("Hello", "body"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Forbidden(_)));
}

#[tokio::test]
async fn empty_title_is_a_validation_error() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    for title in ["   ", "!!!"] {
        let err = svc.create_post(&author, new_post(title, "body")).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)), "{title}: {err}");
    }
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    svc.create_post(&author, new_post("Market Update", "a")).await.unwrap();

    let err = svc
        .create_post(&author, new_post("Market  update!", "b"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Conflict(_)));
    assert_eq!(err.http_status(), 409);
}

#[tokio::test]
async fn update_regenerates_derived_fields() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("Old Title", "short")).await.unwrap();

    let updated = svc
        .update_post(
            &author,
            post.post_id,
            PostPatch {
                title: Some("New Title".to_string()),
                content: Some("word ".repeat(600)),
                ..PostPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.slug, "new-title");
    assert_eq!(updated.read_time, 3);
    assert!(updated.excerpt.starts_with("word word"));
    assert!(updated.updated_at >= post.updated_at);

    // Tags-only update leaves derived fields alone.
    let tagged = svc
        .update_post(
            &author,
            post.post_id,
            PostPatch {
                tags: Some(vec!["tax".to_string(), " tax ".to_string()]),
                ..PostPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged.tags, vec!["tax"]);
    assert_eq!(tagged.slug, "new-title");
    assert_eq!(tagged.excerpt, updated.excerpt);
}

#[tokio::test]
async fn other_professionals_cannot_edit() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let intruder = ActorContext::professional(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("Mine", "body")).await.unwrap();

    let err = svc
        .update_post(
            &intruder,
            post.post_id,
            PostPatch {
                title: Some("Theirs".to_string()),
                ..PostPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Forbidden(_)));
}

#[tokio::test]
async fn publish_unpublish_round_trip() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("Round Trip", "body")).await.unwrap();

    let submitted = svc.submit_post(&author, post.post_id).await.unwrap();
    assert_eq!(submitted.status, PostStatus::Submitted);

    let approved = svc.approve_post(&admin, post.post_id).await.unwrap();
    assert_eq!(approved.status, PostStatus::Approved);
    assert!(approved.published_at.is_none());

    let published = svc.publish_post(&admin, post.post_id).await.unwrap();
    assert_eq!(published.status, PostStatus::Published);
    let first_published_at = published.published_at.expect("published_at set");

    let again = svc.publish_post(&admin, post.post_id).await.unwrap();
    assert_eq!(again.status, PostStatus::Published);
    assert_eq!(again.published_at, Some(first_published_at));

    let unpublished = svc.unpublish_post(&admin, post.post_id).await.unwrap();
    assert_eq!(unpublished.status, PostStatus::Approved);
    assert!(unpublished.published_at.is_none());
}

#[tokio::test]
async fn non_admin_gates_are_forbidden_and_leave_status_unchanged() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("Guarded", "body")).await.unwrap();

    for result in [
        svc.approve_post(&author, post.post_id).await,
        svc.reject_post(&author, post.post_id).await,
        svc.publish_post(&author, post.post_id).await,
        svc.unpublish_post(&author, post.post_id).await,
    ] {
        assert!(matches!(result, Err(PortalError::Forbidden(_))));
    }
    let err = svc.delete_post(&author, post.post_id).await.unwrap_err();
    assert!(matches!(err, PortalError::Forbidden(_)));

    let stored = svc.get_post(&author, post.post_id).await.unwrap();
    assert_eq!(stored.status, PostStatus::Draft);
    assert!(stored.published_at.is_none());
}

#[tokio::test]
async fn author_cannot_resubmit_a_published_post() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());
    let public = ActorContext::anonymous();
    let post = svc.create_post(&author, new_post("Live Already", "body")).await.unwrap();
    let published = svc.publish_post(&admin, post.post_id).await.unwrap();

    let err = svc.submit_post(&author, post.post_id).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));

    let stored = svc.get_post(&admin, post.post_id).await.unwrap();
    assert_eq!(stored.status, PostStatus::Published);
    assert_eq!(stored.published_at, published.published_at);
    assert_eq!(svc.published_posts(&public).await.unwrap().len(), 1);

    svc.approve_post(&admin, post.post_id).await.unwrap();
    assert!(matches!(
        svc.submit_post(&author, post.post_id).await,
        Err(PortalError::Validation(_))
    ));
}

#[tokio::test]
async fn rejected_posts_can_be_resubmitted() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("Second Draft", "body")).await.unwrap();

    svc.submit_post(&author, post.post_id).await.unwrap();
    let again = svc.submit_post(&author, post.post_id).await.unwrap();
    assert_eq!(again.status, PostStatus::Submitted);

    svc.reject_post(&admin, post.post_id).await.unwrap();
    let resubmitted = svc.submit_post(&author, post.post_id).await.unwrap();
    assert_eq!(resubmitted.status, PostStatus::Submitted);
}

#[tokio::test]
async fn repeated_editorial_gates_leave_the_post_untouched() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("Steady State", "body")).await.unwrap();

    let approved = svc.approve_post(&admin, post.post_id).await.unwrap();
    let approved_again = svc.approve_post(&admin, post.post_id).await.unwrap();
    assert_eq!(approved_again.status, PostStatus::Approved);
    assert_eq!(approved_again.updated_at, approved.updated_at);

    let rejected = svc.reject_post(&admin, post.post_id).await.unwrap();
    let rejected_again = svc.reject_post(&admin, post.post_id).await.unwrap();
    assert_eq!(rejected_again.status, PostStatus::Rejected);
    assert_eq!(rejected_again.updated_at, rejected.updated_at);

    let stored = svc.get_post(&author, post.post_id).await.unwrap();
    assert_eq!(stored.updated_at, rejected.updated_at);
}

#[tokio::test]
async fn public_visibility_follows_publication() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());
    let public = ActorContext::anonymous();
    let post = svc.create_post(&author, new_post("Visible Soon", "body")).await.unwrap();

    let err = svc.get_post(&public, post.post_id).await.unwrap_err();
    assert!(matches!(err, PortalError::NotFound(_)));
    assert!(svc.get_post_by_slug(&public, "visible-soon").await.is_err());
    assert!(svc.list_posts(&public, &PostFilter::default()).await.unwrap().is_empty());

    svc.publish_post(&admin, post.post_id).await.unwrap();

    let seen = svc.get_post_by_slug(&public, "visible-soon").await.unwrap();
    assert_eq!(seen.post_id, post.post_id);
    assert_eq!(svc.list_posts(&public, &PostFilter::default()).await.unwrap().len(), 1);
    assert_eq!(svc.published_posts(&public).await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_scopes_by_role() {
    let svc = WorkflowService::in_memory();
    let alice = ActorContext::professional(Uuid::new_v4());
    let bob = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());

    let a1 = svc.create_post(&alice, new_post("Alice One", "x")).await.unwrap();
    svc.create_post(&alice, new_post("Alice Two", "x")).await.unwrap();
    svc.create_post(&bob, new_post("Bob One", "x")).await.unwrap();
    svc.submit_post(&alice, a1.post_id).await.unwrap();

    let own = PostFilter {
        author_id: alice.actor_id,
        ..PostFilter::default()
    };
    let alice_posts = svc.list_posts(&alice, &own).await.unwrap();
    assert_eq!(alice_posts.len(), 2);
    assert_eq!(alice_posts[0].title, "Alice Two");

    // Bob looking at Alice's drafts sees only what is published.
    assert!(svc.list_posts(&bob, &own).await.unwrap().is_empty());

    let submitted = PostFilter {
        status: Some(PostStatus::Submitted),
        ..PostFilter::default()
    };
    let queue = svc.list_posts(&admin, &submitted).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].post_id, a1.post_id);

    let counts = svc.post_status_counts(&admin, None).await.unwrap();
    assert!(counts.contains(&(PostStatus::Draft, 2)));
    assert!(counts.contains(&(PostStatus::Submitted, 1)));
    assert!(counts.contains(&(PostStatus::Published, 0)));
    assert!(matches!(
        svc.post_status_counts(&bob, None).await,
        Err(PortalError::Forbidden(_))
    ));
}

#[tokio::test]
async fn media_delete_failure_does_not_block_post_delete() {
    let media = Arc::new(FlakyMedia::default());
    let svc = WorkflowService::in_memory().with_media(media.clone());
    let author = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("With Image", "body")).await.unwrap();

    let first = svc.attach_post_image(&author, post.post_id, image()).await.unwrap();
    assert_eq!(first.featured_image_id.as_deref(), Some("img-0"));

    // Replacing tries to drop the old remote file; the failure is swallowed.
    let second = svc.attach_post_image(&author, post.post_id, image()).await.unwrap();
    assert_eq!(second.featured_image_id.as_deref(), Some("img-1"));
    assert_eq!(media.delete_attempts.load(Ordering::SeqCst), 1);

    let url = svc
        .post_image_url(
            &second,
            &TransformOptions {
                width: Some(320),
                ..TransformOptions::default()
            },
        )
        .unwrap();
    assert_eq!(url.as_deref(), Some("https://media.test/img-1?w=320"));

    svc.delete_post(&admin, post.post_id).await.unwrap();
    assert_eq!(media.delete_attempts.load(Ordering::SeqCst), 2);
    assert!(matches!(
        svc.get_post(&admin, post.post_id).await,
        Err(PortalError::NotFound(_))
    ));
}

#[tokio::test]
async fn upload_without_media_host_is_external_service_error() {
    let svc = WorkflowService::in_memory();
    let author = ActorContext::professional(Uuid::new_v4());
    let post = svc.create_post(&author, new_post("No Host", "body")).await.unwrap();

    let err = svc.attach_post_image(&author, post.post_id, image()).await.unwrap_err();
    assert!(matches!(err, PortalError::ExternalService(_)));

    let stored = svc.get_post(&author, post.post_id).await.unwrap();
    assert!(stored.featured_image_id.is_none());
}

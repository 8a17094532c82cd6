use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{normalize_tags, optional_text, require_text, WorkflowService};
use crate::context::ActorContext;
use crate::derive::{excerpt, read_time, slugify, DEFAULT_EXCERPT_LEN};
use crate::error::PortalError;
use crate::media::{MediaFile, TransformOptions, UploadOptions};
use crate::permissions::{authorize, can, EntityKind, Operation};
use crate::ports::Result;
use crate::types::{NewPost, Post, PostFilter, PostPatch, PostStatus};

const POST_MEDIA_FOLDER: &str = "blog";

fn slug_for(title: &str) -> Result<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(PortalError::Validation(
            "title must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

fn visible(ctx: &ActorContext, post: &Post) -> bool {
    post.status == PostStatus::Published
        || can(ctx, EntityKind::Post, Operation::ReadAnyStatus, Some(post.author_id))
}

impl WorkflowService {
    pub async fn create_post(&self, ctx: &ActorContext, new: NewPost) -> Result<Post> {
        let author_id = ctx.require_actor()?;
        authorize(ctx, EntityKind::Post, Operation::Create, Some(author_id))?;

        let title = require_text("title", &new.title)?;
        let slug = slug_for(&title)?;
        let excerpt_text = optional_text(new.excerpt.as_deref())
            .unwrap_or_else(|| excerpt(&new.content, DEFAULT_EXCERPT_LEN));
        let now = Utc::now();

        let post = Post {
            post_id: Uuid::new_v4(),
            author_id,
            author_name: optional_text(new.author_name.as_deref()),
            author_avatar_url: optional_text(new.author_avatar_url.as_deref()),
            read_time: read_time(&new.content),
            title,
            slug,
            content: new.content,
            excerpt: excerpt_text,
            tags: normalize_tags(&new.tags),
            featured_image_id: None,
            featured_image_url: None,
            status: PostStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.posts.insert_post(ctx, &post).await?;
        info!(post_id = %stored.post_id, slug = %stored.slug, actor = %ctx.label(), "created post");
        Ok(stored)
    }

    /// Row as stored, for callers that check permissions themselves.
    pub(crate) async fn load_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        self.posts
            .get_post(ctx, post_id)
            .await?
            .ok_or_else(|| PortalError::not_found("post", post_id))
    }

    /// Public callers only ever see published posts; anything else reads as missing.
    pub async fn get_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        debug!(%post_id, actor = %ctx.label(), "get post");
        match self.posts.get_post(ctx, post_id).await? {
            Some(post) if visible(ctx, &post) => Ok(post),
            _ => Err(PortalError::not_found("post", post_id)),
        }
    }

    pub async fn get_post_by_slug(&self, ctx: &ActorContext, slug: &str) -> Result<Post> {
        debug!(slug, actor = %ctx.label(), "get post by slug");
        match self.posts.get_post_by_slug(ctx, slug).await? {
            Some(post) if visible(ctx, &post) => Ok(post),
            _ => Err(PortalError::not_found("post", slug)),
        }
    }

    /// Admins see every status; authors see every status of their own
    /// posts; everyone else is pinned to published.
    pub async fn list_posts(&self, ctx: &ActorContext, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut filter = filter.clone();
        let unrestricted = can(ctx, EntityKind::Post, Operation::ReadAnyStatus, filter.author_id);
        if !unrestricted {
            match filter.status {
                Some(status) if status != PostStatus::Published => return Ok(Vec::new()),
                _ => filter.status = Some(PostStatus::Published),
            }
        }
        self.posts.list_posts(ctx, &filter).await
    }

    pub async fn published_posts(&self, ctx: &ActorContext) -> Result<Vec<Post>> {
        let filter = PostFilter {
            status: Some(PostStatus::Published),
            ..PostFilter::default()
        };
        self.posts.list_posts(ctx, &filter).await
    }

    /// Merge `patch`, regenerating slug on title change, read time on
    /// content change, and the excerpt on content change unless one is given.
    pub async fn update_post(&self, ctx: &ActorContext, post_id: Uuid, patch: PostPatch) -> Result<Post> {
        let mut post = self.load_post(ctx, post_id).await?;
        authorize(ctx, EntityKind::Post, Operation::Update, Some(post.author_id))?;

        if let Some(title) = patch.title.as_deref() {
            let title = require_text("title", title)?;
            if title != post.title {
                post.slug = slug_for(&title)?;
                post.title = title;
            }
        }

        let content_changed = match patch.content {
            Some(content) if content != post.content => {
                post.read_time = read_time(&content);
                post.content = content;
                true
            }
            _ => false,
        };

        match patch.excerpt.as_deref() {
            Some(explicit) if !explicit.trim().is_empty() => post.excerpt = explicit.trim().to_string(),
            Some(_) => post.excerpt = excerpt(&post.content, DEFAULT_EXCERPT_LEN),
            None if content_changed => post.excerpt = excerpt(&post.content, DEFAULT_EXCERPT_LEN),
            None => {}
        }

        if let Some(tags) = patch.tags.as_deref() {
            post.tags = normalize_tags(tags);
        }
        if let Some(name) = patch.author_name.as_deref() {
            post.author_name = optional_text(Some(name));
        }
        if let Some(avatar) = patch.author_avatar_url.as_deref() {
            post.author_avatar_url = optional_text(Some(avatar));
        }
        post.updated_at = Utc::now();

        let saved = self.posts.save_post(ctx, &post).await?;
        info!(%post_id, slug = %saved.slug, actor = %ctx.label(), "updated post");
        Ok(saved)
    }

    /// Admin-only hard delete. The remote featured image is removed on a
    /// best-effort basis after the row is gone.
    pub async fn delete_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<()> {
        let post = self.load_post(ctx, post_id).await?;
        authorize(ctx, EntityKind::Post, Operation::Delete, Some(post.author_id))?;

        if !self.posts.delete_post(ctx, post_id).await? {
            return Err(PortalError::not_found("post", post_id));
        }
        info!(%post_id, actor = %ctx.label(), "deleted post");

        if let Some(media_id) = post.featured_image_id.as_deref() {
            self.discard_media(media_id).await;
        }
        Ok(())
    }

    /// Upload `file` as the featured image, replacing any previous one.
    pub async fn attach_post_image(&self, ctx: &ActorContext, post_id: Uuid, file: MediaFile) -> Result<Post> {
        let mut post = self.load_post(ctx, post_id).await?;
        authorize(ctx, EntityKind::Post, Operation::Update, Some(post.author_id))?;

        let media = self.media()?;
        let uploaded = media
            .upload(
                file,
                UploadOptions {
                    title: Some(post.title.clone()),
                    description: None,
                    tags: post.tags.clone(),
                    folder: Some(POST_MEDIA_FOLDER.to_string()),
                    private: false,
                },
            )
            .await?;

        let previous = post.featured_image_id.replace(uploaded.id.clone());
        post.featured_image_url = Some(uploaded.url.clone());
        post.updated_at = Utc::now();

        let saved = match self.posts.save_post(ctx, &post).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(%post_id, media_id = %uploaded.id, "post save failed, discarding upload");
                self.discard_media(&uploaded.id).await;
                return Err(e);
            }
        };
        info!(%post_id, media_id = %uploaded.id, actor = %ctx.label(), "attached featured image");

        if let Some(old) = previous.as_deref() {
            self.discard_media(old).await;
        }
        Ok(saved)
    }

    pub async fn remove_post_image(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        let mut post = self.load_post(ctx, post_id).await?;
        authorize(ctx, EntityKind::Post, Operation::Update, Some(post.author_id))?;

        let Some(media_id) = post.featured_image_id.take() else {
            return Ok(post);
        };
        post.featured_image_url = None;
        post.updated_at = Utc::now();

        let saved = self.posts.save_post(ctx, &post).await?;
        self.discard_media(&media_id).await;
        Ok(saved)
    }

    /// Resized delivery URL for the featured image, if the post has one.
    pub fn post_image_url(&self, post: &Post, options: &TransformOptions) -> Result<Option<String>> {
        match post.featured_image_id.as_deref() {
            Some(media_id) => Ok(Some(self.media()?.transform_url(media_id, options)?)),
            None => Ok(None),
        }
    }
}

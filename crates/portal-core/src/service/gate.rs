//! Named status transitions for posts and reviews.
//!
//! Each gate is a permission check plus a status write with its derived
//! timestamp. Calling a gate on a row already in the target state returns
//! the row untouched.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::WorkflowService;
use crate::context::ActorContext;
use crate::error::PortalError;
use crate::permissions::{authorize, EntityKind, Operation};
use crate::ports::Result;
use crate::types::{Post, PostStatus, Review, ReviewStatus};

/// Source states for `submit_post`; `Submitted` keeps the gate idempotent.
const SUBMITTABLE: [PostStatus; 3] = [PostStatus::Draft, PostStatus::Rejected, PostStatus::Submitted];

impl WorkflowService {
    async fn transition_post(
        &self,
        ctx: &ActorContext,
        post_id: Uuid,
        operation: Operation,
        target: PostStatus,
    ) -> Result<Post> {
        let mut post = self.load_post(ctx, post_id).await?;
        authorize(ctx, EntityKind::Post, operation, Some(post.author_id))?;

        let settled = post.status == target && (target == PostStatus::Published) == post.published_at.is_some();
        if settled {
            debug!(%post_id, status = target.as_str(), "post already in target status");
            return Ok(post);
        }

        let now = Utc::now();
        let from = post.status;
        post.status = target;
        post.published_at = match target {
            PostStatus::Published => post.published_at.or(Some(now)),
            _ => None,
        };
        post.updated_at = now;

        let saved = self.posts.save_post(ctx, &post).await?;
        info!(
            %post_id,
            from = from.as_str(),
            to = target.as_str(),
            actor = %ctx.label(),
            "post transition"
        );
        Ok(saved)
    }

    /// Author hands a draft (or a rejected post) to the editors. Posts past
    /// review only move through the admin gates.
    pub async fn submit_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        let post = self.load_post(ctx, post_id).await?;
        authorize(ctx, EntityKind::Post, Operation::Submit, Some(post.author_id))?;
        if !SUBMITTABLE.contains(&post.status) {
            return Err(PortalError::Validation(format!(
                "only draft or rejected posts can be submitted (post is {})",
                post.status.as_str()
            )));
        }
        self.transition_post(ctx, post_id, Operation::Submit, PostStatus::Submitted)
            .await
    }

    pub async fn approve_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        self.transition_post(ctx, post_id, Operation::Approve, PostStatus::Approved)
            .await
    }

    pub async fn reject_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        self.transition_post(ctx, post_id, Operation::Reject, PostStatus::Rejected)
            .await
    }

    /// Sets `published_at` on the first publish; republishing keeps it.
    pub async fn publish_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        self.transition_post(ctx, post_id, Operation::Publish, PostStatus::Published)
            .await
    }

    /// Back to approved with `published_at` cleared.
    pub async fn unpublish_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Post> {
        self.transition_post(ctx, post_id, Operation::Unpublish, PostStatus::Approved)
            .await
    }

    // ── Reviews ────────────────────────────────────────────────

    async fn transition_review(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        operation: Operation,
        target: ReviewStatus,
    ) -> Result<Review> {
        let mut review = self.load_review(ctx, review_id).await?;
        authorize(ctx, EntityKind::Review, operation, Some(review.professional_id))?;

        if review.status == target {
            debug!(%review_id, status = target.as_str(), "review already in target status");
            return Ok(review);
        }

        let from = review.status;
        review.status = target;
        if target != ReviewStatus::Approved {
            review.featured = false;
        }
        review.updated_at = Utc::now();

        let saved = self.reviews.save_review(ctx, &review).await?;
        info!(
            %review_id,
            from = from.as_str(),
            to = target.as_str(),
            actor = %ctx.label(),
            "review transition"
        );
        Ok(saved)
    }

    pub async fn approve_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<Review> {
        self.transition_review(ctx, review_id, Operation::Approve, ReviewStatus::Approved)
            .await
    }

    /// Rejecting also drops the review from the featured set.
    pub async fn reject_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<Review> {
        self.transition_review(ctx, review_id, Operation::Reject, ReviewStatus::Rejected)
            .await
    }

    /// Only approved reviews can be featured; unfeaturing is always allowed.
    pub async fn set_review_featured(
        &self,
        ctx: &ActorContext,
        review_id: Uuid,
        featured: bool,
    ) -> Result<Review> {
        let mut review = self.load_review(ctx, review_id).await?;
        authorize(ctx, EntityKind::Review, Operation::Feature, Some(review.professional_id))?;

        if review.featured == featured {
            return Ok(review);
        }
        if featured && review.status != ReviewStatus::Approved {
            return Err(PortalError::Validation(format!(
                "only approved reviews can be featured (review is {})",
                review.status.as_str()
            )));
        }

        review.featured = featured;
        review.updated_at = Utc::now();
        let saved = self.reviews.save_review(ctx, &review).await?;
        info!(%review_id, featured, actor = %ctx.label(), "review featured flag changed");
        Ok(saved)
    }
}

//! Storage port traits.
//! Implemented by portal_postgres; core logic depends only on these traits.
//!
//! Stores persist exactly what they are given: permission checks, derived
//! fields and timestamps are the service's job. Every method receives the
//! request's `ActorContext` so adapters can stamp it into their session for
//! database-side row security.

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::ActorContext;
use crate::error::PortalError;
use crate::types::*;

pub type Result<T> = std::result::Result<T, PortalError>;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a fully-populated row. Duplicate slug → `Conflict`.
    async fn insert_post(&self, ctx: &ActorContext, post: &Post) -> Result<Post>;

    async fn get_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Option<Post>>;

    async fn get_post_by_slug(&self, ctx: &ActorContext, slug: &str) -> Result<Option<Post>>;

    /// Newest first.
    async fn list_posts(&self, ctx: &ActorContext, filter: &PostFilter) -> Result<Vec<Post>>;

    /// Replace the stored row. Missing row → `NotFound`, duplicate slug → `Conflict`.
    async fn save_post(&self, ctx: &ActorContext, post: &Post) -> Result<Post>;

    /// Returns false when no row existed.
    async fn delete_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<bool>;

    async fn count_posts_by_status(
        &self,
        ctx: &ActorContext,
        author_id: Option<Uuid>,
    ) -> Result<Vec<(PostStatus, i64)>>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert_lead(&self, ctx: &ActorContext, lead: &Lead) -> Result<Lead>;

    async fn get_lead(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Option<Lead>>;

    /// Leads owned by `owner_id`, newest first.
    async fn list_leads(
        &self,
        ctx: &ActorContext,
        owner_id: Uuid,
        filter: &LeadFilter,
    ) -> Result<Vec<Lead>>;

    async fn save_lead(&self, ctx: &ActorContext, lead: &Lead) -> Result<Lead>;

    /// Deletes the lead with its notes and tasks.
    async fn delete_lead(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<bool>;

    async fn count_leads_by_status(
        &self,
        ctx: &ActorContext,
        owner_id: Uuid,
    ) -> Result<Vec<(LeadStatus, i64)>>;

    // ── Notes (append-only) ────────────────────────────────────

    async fn insert_note(&self, ctx: &ActorContext, note: &LeadNote) -> Result<LeadNote>;

    /// Newest first.
    async fn list_notes(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadNote>>;

    // ── Tasks ──────────────────────────────────────────────────

    async fn insert_task(&self, ctx: &ActorContext, task: &LeadTask) -> Result<LeadTask>;

    async fn get_task(&self, ctx: &ActorContext, task_id: Uuid) -> Result<Option<LeadTask>>;

    /// Due date ascending, undated tasks last.
    async fn list_tasks(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadTask>>;

    async fn save_task(&self, ctx: &ActorContext, task: &LeadTask) -> Result<LeadTask>;

    async fn delete_task(&self, ctx: &ActorContext, task_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, ctx: &ActorContext, review: &Review) -> Result<Review>;

    async fn get_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<Option<Review>>;

    /// Newest submission first.
    async fn list_reviews(&self, ctx: &ActorContext, filter: &ReviewFilter) -> Result<Vec<Review>>;

    async fn save_review(&self, ctx: &ActorContext, review: &Review) -> Result<Review>;

    async fn delete_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<bool>;

    /// Average and count over approved reviews of one professional.
    async fn rating_summary(&self, ctx: &ActorContext, professional_id: Uuid) -> Result<RatingSummary>;

    async fn count_reviews_by_status(
        &self,
        ctx: &ActorContext,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<(ReviewStatus, i64)>>;
}

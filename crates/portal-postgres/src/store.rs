//! Postgres implementations of the portal_core store traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.
//! Every call runs in its own transaction with the actor context stamped.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use portal_core::context::ActorContext;
use portal_core::error::PortalError;
use portal_core::ports::{LeadStore, PostStore, Result, ReviewStore};
use portal_core::types::*;

use crate::sqlx_types::{status_counts, PgLeadNoteRow, PgLeadRow, PgLeadTaskRow, PgPostRow, PgReviewRow};
use crate::stamp::{begin_stamped, commit, db_error};

const POST_COLUMNS: &str = "post_id, author_id, author_name, author_avatar_url, title, slug, \
     content, excerpt, tags, featured_image_id, featured_image_url, read_time, status, \
     published_at, created_at, updated_at";

const LEAD_COLUMNS: &str =
    "lead_id, owner_id, full_name, email, phone, status, lead_source, notes, created_at, updated_at";

const NOTE_COLUMNS: &str = "note_id, lead_id, author_id, content, created_at";

const TASK_COLUMNS: &str = "task_id, lead_id, owner_id, title, description, due_date, completed, \
     completed_at, created_at, updated_at";

const REVIEW_COLUMNS: &str = "review_id, professional_id, professional_username, reviewer_name, \
     reviewer_email, rating, review_text, status, featured, submitted_at, updated_at";

// ── PgPostStore ───────────────────────────────────────────────

pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert_post(&self, ctx: &ActorContext, post: &Post) -> Result<Post> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        sqlx::query(
            r#"
            INSERT INTO posts (
                post_id, author_id, author_name, author_avatar_url, title, slug,
                content, excerpt, tags, featured_image_id, featured_image_url,
                read_time, status, published_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(post.post_id)
        .bind(post.author_id)
        .bind(post.author_name.as_deref())
        .bind(post.author_avatar_url.as_deref())
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.tags)
        .bind(post.featured_image_id.as_deref())
        .bind(post.featured_image_url.as_deref())
        .bind(post.read_time)
        .bind(post.status.as_str())
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(post.clone())
    }

    async fn get_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<Option<Post>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let row = sqlx::query_as::<_, PgPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE post_id = $1"
        ))
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        row.map(Post::try_from).transpose()
    }

    async fn get_post_by_slug(&self, ctx: &ActorContext, slug: &str) -> Result<Option<Post>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let row = sqlx::query_as::<_, PgPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        row.map(Post::try_from).transpose()
    }

    async fn list_posts(&self, ctx: &ActorContext, filter: &PostFilter) -> Result<Vec<Post>> {
        debug!(?filter, "list posts");
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, PgPostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR $3 = ANY(tags))
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.author_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.tag.as_deref())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn save_post(&self, ctx: &ActorContext, post: &Post) -> Result<Post> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query(
            r#"
            UPDATE posts SET
                author_name = $2, author_avatar_url = $3, title = $4, slug = $5,
                content = $6, excerpt = $7, tags = $8, featured_image_id = $9,
                featured_image_url = $10, read_time = $11, status = $12,
                published_at = $13, updated_at = $14
            WHERE post_id = $1
            "#,
        )
        .bind(post.post_id)
        .bind(post.author_name.as_deref())
        .bind(post.author_avatar_url.as_deref())
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.tags)
        .bind(post.featured_image_id.as_deref())
        .bind(post.featured_image_url.as_deref())
        .bind(post.read_time)
        .bind(post.status.as_str())
        .bind(post.published_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("post", post.post_id));
        }
        commit(tx).await?;
        Ok(post.clone())
    }

    async fn delete_post(&self, ctx: &ActorContext, post_id: Uuid) -> Result<bool> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        commit(tx).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_posts_by_status(
        &self,
        ctx: &ActorContext,
        author_id: Option<Uuid>,
    ) -> Result<Vec<(PostStatus, i64)>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*) FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
            GROUP BY status
            "#,
        )
        .bind(author_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        status_counts(rows, "post status", PostStatus::parse)
    }
}

// ── PgLeadStore ───────────────────────────────────────────────

/// Leads with their notes and tasks. Child rows go with the lead through
/// `ON DELETE CASCADE`.
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn insert_lead(&self, ctx: &ActorContext, lead: &Lead) -> Result<Lead> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        sqlx::query(
            r#"
            INSERT INTO leads (
                lead_id, owner_id, full_name, email, phone, status, lead_source,
                notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(lead.lead_id)
        .bind(lead.owner_id)
        .bind(&lead.full_name)
        .bind(lead.email.as_deref())
        .bind(lead.phone.as_deref())
        .bind(lead.status.as_str())
        .bind(lead.lead_source.as_str())
        .bind(lead.notes.as_deref())
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(lead.clone())
    }

    async fn get_lead(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Option<Lead>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let row = sqlx::query_as::<_, PgLeadRow>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE lead_id = $1"
        ))
        .bind(lead_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        row.map(Lead::try_from).transpose()
    }

    async fn list_leads(&self, ctx: &ActorContext, owner_id: Uuid, filter: &LeadFilter) -> Result<Vec<Lead>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, PgLeadRow>(&format!(
            r#"
            SELECT {LEAD_COLUMNS} FROM leads
            WHERE owner_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        rows.into_iter().map(Lead::try_from).collect()
    }

    async fn save_lead(&self, ctx: &ActorContext, lead: &Lead) -> Result<Lead> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                full_name = $2, email = $3, phone = $4, status = $5,
                lead_source = $6, notes = $7, updated_at = $8
            WHERE lead_id = $1
            "#,
        )
        .bind(lead.lead_id)
        .bind(&lead.full_name)
        .bind(lead.email.as_deref())
        .bind(lead.phone.as_deref())
        .bind(lead.status.as_str())
        .bind(lead.lead_source.as_str())
        .bind(lead.notes.as_deref())
        .bind(lead.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("lead", lead.lead_id));
        }
        commit(tx).await?;
        Ok(lead.clone())
    }

    async fn delete_lead(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<bool> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query("DELETE FROM leads WHERE lead_id = $1")
            .bind(lead_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        commit(tx).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_leads_by_status(&self, ctx: &ActorContext, owner_id: Uuid) -> Result<Vec<(LeadStatus, i64)>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM leads WHERE owner_id = $1 GROUP BY status",
        )
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        status_counts(rows, "lead status", LeadStatus::parse)
    }

    async fn insert_note(&self, ctx: &ActorContext, note: &LeadNote) -> Result<LeadNote> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        sqlx::query(
            "INSERT INTO lead_notes (note_id, lead_id, author_id, content, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(note.note_id)
        .bind(note.lead_id)
        .bind(note.author_id)
        .bind(&note.content)
        .bind(note.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(note.clone())
    }

    async fn list_notes(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadNote>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, PgLeadNoteRow>(&format!(
            "SELECT {NOTE_COLUMNS} FROM lead_notes WHERE lead_id = $1 ORDER BY created_at DESC"
        ))
        .bind(lead_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(rows.into_iter().map(LeadNote::from).collect())
    }

    async fn insert_task(&self, ctx: &ActorContext, task: &LeadTask) -> Result<LeadTask> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        sqlx::query(
            r#"
            INSERT INTO lead_tasks (
                task_id, lead_id, owner_id, title, description, due_date,
                completed, completed_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.task_id)
        .bind(task.lead_id)
        .bind(task.owner_id)
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.due_date)
        .bind(task.completed)
        .bind(task.completed_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(task.clone())
    }

    async fn get_task(&self, ctx: &ActorContext, task_id: Uuid) -> Result<Option<LeadTask>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let row = sqlx::query_as::<_, PgLeadTaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM lead_tasks WHERE task_id = $1"
        ))
        .bind(task_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(row.map(LeadTask::from))
    }

    async fn list_tasks(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadTask>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, PgLeadTaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM lead_tasks WHERE lead_id = $1 \
             ORDER BY due_date ASC NULLS LAST, created_at ASC"
        ))
        .bind(lead_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(rows.into_iter().map(LeadTask::from).collect())
    }

    async fn save_task(&self, ctx: &ActorContext, task: &LeadTask) -> Result<LeadTask> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query(
            r#"
            UPDATE lead_tasks SET
                title = $2, description = $3, due_date = $4, completed = $5,
                completed_at = $6, updated_at = $7
            WHERE task_id = $1
            "#,
        )
        .bind(task.task_id)
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.due_date)
        .bind(task.completed)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("lead task", task.task_id));
        }
        commit(tx).await?;
        Ok(task.clone())
    }

    async fn delete_task(&self, ctx: &ActorContext, task_id: Uuid) -> Result<bool> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query("DELETE FROM lead_tasks WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        commit(tx).await?;
        Ok(result.rows_affected() > 0)
    }
}

// ── PgReviewStore ─────────────────────────────────────────────

pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn insert_review(&self, ctx: &ActorContext, review: &Review) -> Result<Review> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        sqlx::query(
            r#"
            INSERT INTO reviews (
                review_id, professional_id, professional_username, reviewer_name,
                reviewer_email, rating, review_text, status, featured,
                submitted_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(review.review_id)
        .bind(review.professional_id)
        .bind(&review.professional_username)
        .bind(&review.reviewer_name)
        .bind(review.reviewer_email.as_deref())
        .bind(review.rating)
        .bind(&review.review_text)
        .bind(review.status.as_str())
        .bind(review.featured)
        .bind(review.submitted_at)
        .bind(review.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(review.clone())
    }

    async fn get_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<Option<Review>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let row = sqlx::query_as::<_, PgReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE review_id = $1"
        ))
        .bind(review_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        row.map(Review::try_from).transpose()
    }

    async fn list_reviews(&self, ctx: &ActorContext, filter: &ReviewFilter) -> Result<Vec<Review>> {
        debug!(?filter, "list reviews");
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, PgReviewRow>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS} FROM reviews
            WHERE ($1::uuid IS NULL OR professional_id = $1)
              AND ($2::text IS NULL OR professional_username = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::boolean IS NULL OR featured = $4)
            ORDER BY submitted_at DESC
            "#
        ))
        .bind(filter.professional_id)
        .bind(filter.professional_username.as_deref())
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.featured)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        rows.into_iter().map(Review::try_from).collect()
    }

    async fn save_review(&self, ctx: &ActorContext, review: &Review) -> Result<Review> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query(
            r#"
            UPDATE reviews SET
                reviewer_name = $2, reviewer_email = $3, rating = $4,
                review_text = $5, status = $6, featured = $7, updated_at = $8
            WHERE review_id = $1
            "#,
        )
        .bind(review.review_id)
        .bind(&review.reviewer_name)
        .bind(review.reviewer_email.as_deref())
        .bind(review.rating)
        .bind(&review.review_text)
        .bind(review.status.as_str())
        .bind(review.featured)
        .bind(review.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("review", review.review_id));
        }
        commit(tx).await?;
        Ok(review.clone())
    }

    async fn delete_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<bool> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let result = sqlx::query("DELETE FROM reviews WHERE review_id = $1")
            .bind(review_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        commit(tx).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rating_summary(&self, ctx: &ActorContext, professional_id: Uuid) -> Result<RatingSummary> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let (average, count) = sqlx::query_as::<_, (Option<f64>, i64)>(
            r#"
            SELECT AVG(rating)::float8, COUNT(*)
            FROM reviews
            WHERE professional_id = $1 AND status = 'approved'
            "#,
        )
        .bind(professional_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        Ok(RatingSummary {
            average: average.unwrap_or(0.0),
            count,
        })
    }

    async fn count_reviews_by_status(
        &self,
        ctx: &ActorContext,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<(ReviewStatus, i64)>> {
        let mut tx = begin_stamped(&self.pool, ctx).await?;
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*) FROM reviews
            WHERE ($1::uuid IS NULL OR professional_id = $1)
            GROUP BY status
            "#,
        )
        .bind(professional_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        commit(tx).await?;
        status_counts(rows, "review status", ReviewStatus::parse)
    }
}

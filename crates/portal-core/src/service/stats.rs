//! Read-only rollups, computed on demand from the current rows.

use uuid::Uuid;

use super::WorkflowService;
use crate::context::ActorContext;
use crate::permissions::{authorize, EntityKind, Operation};
use crate::ports::Result;
use crate::types::{zero_filled, LeadStats, LeadStatus, PostStatus, RatingSummary, ReviewStatus};

impl WorkflowService {
    /// Pipeline counts for one owner's leads.
    pub async fn lead_stats(&self, ctx: &ActorContext, owner_id: Uuid) -> Result<LeadStats> {
        authorize(ctx, EntityKind::Lead, Operation::ReadAnyStatus, Some(owner_id))?;
        let counts = self.leads.count_leads_by_status(ctx, owner_id).await?;
        Ok(LeadStats::from_counts(&counts))
    }

    /// Average over approved reviews only. Public.
    pub async fn rating_summary(&self, ctx: &ActorContext, professional_id: Uuid) -> Result<RatingSummary> {
        self.reviews.rating_summary(ctx, professional_id).await
    }

    /// Editorial dashboard. `None` means every author and needs admin.
    pub async fn post_status_counts(
        &self,
        ctx: &ActorContext,
        author_id: Option<Uuid>,
    ) -> Result<Vec<(PostStatus, i64)>> {
        authorize(ctx, EntityKind::Post, Operation::ReadAnyStatus, author_id)?;
        let counts = self.posts.count_posts_by_status(ctx, author_id).await?;
        Ok(zero_filled(&PostStatus::ALL, &counts))
    }

    /// Moderation dashboard. `None` means every professional and needs admin.
    pub async fn review_status_counts(
        &self,
        ctx: &ActorContext,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<(ReviewStatus, i64)>> {
        authorize(ctx, EntityKind::Review, Operation::ReadAnyStatus, professional_id)?;
        let counts = self.reviews.count_reviews_by_status(ctx, professional_id).await?;
        Ok(zero_filled(&ReviewStatus::ALL, &counts))
    }

    /// Per-status lead counts, zero-filled, for the CRM board header.
    pub async fn lead_status_counts(&self, ctx: &ActorContext, owner_id: Uuid) -> Result<Vec<(LeadStatus, i64)>> {
        authorize(ctx, EntityKind::Lead, Operation::ReadAnyStatus, Some(owner_id))?;
        let counts = self.leads.count_leads_by_status(ctx, owner_id).await?;
        Ok(zero_filled(&LeadStatus::ALL, &counts))
    }
}

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{optional_text, require_text, validate_email, validate_rating, WorkflowService};
use crate::context::ActorContext;
use crate::error::PortalError;
use crate::permissions::{authorize, can, EntityKind, Operation};
use crate::ports::Result;
use crate::types::{NewReview, Review, ReviewFilter, ReviewPatch, ReviewStatus};

fn visible(ctx: &ActorContext, review: &Review) -> bool {
    review.status == ReviewStatus::Approved
        || can(
            ctx,
            EntityKind::Review,
            Operation::ReadAnyStatus,
            Some(review.professional_id),
        )
}

impl WorkflowService {
    /// Public review form. Reviewers are not system accounts, so any context
    /// (including anonymous) may submit; the review starts out pending.
    pub async fn submit_review(&self, ctx: &ActorContext, new: NewReview) -> Result<Review> {
        authorize(ctx, EntityKind::Review, Operation::Create, None)?;

        let now = Utc::now();
        let review = Review {
            review_id: Uuid::new_v4(),
            professional_id: new.professional_id,
            professional_username: require_text("professional username", &new.professional_username)?,
            reviewer_name: require_text("reviewer name", &new.reviewer_name)?,
            reviewer_email: validate_email(optional_text(new.reviewer_email.as_deref()))?,
            rating: validate_rating(new.rating)?,
            review_text: require_text("review text", &new.review_text)?,
            status: ReviewStatus::Pending,
            featured: false,
            submitted_at: now,
            updated_at: now,
        };

        let stored = self.reviews.insert_review(ctx, &review).await?;
        info!(
            review_id = %stored.review_id,
            professional_id = %stored.professional_id,
            rating = stored.rating,
            "review submitted"
        );
        Ok(stored)
    }

    pub(crate) async fn load_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<Review> {
        self.reviews
            .get_review(ctx, review_id)
            .await?
            .ok_or_else(|| PortalError::not_found("review", review_id))
    }

    pub async fn get_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<Review> {
        debug!(%review_id, actor = %ctx.label(), "get review");
        match self.reviews.get_review(ctx, review_id).await? {
            Some(review) if visible(ctx, &review) => Ok(review),
            _ => Err(PortalError::not_found("review", review_id)),
        }
    }

    /// Admins see every status, a professional sees every status of their
    /// own reviews, everyone else only approved ones.
    pub async fn list_reviews(&self, ctx: &ActorContext, filter: &ReviewFilter) -> Result<Vec<Review>> {
        let mut filter = filter.clone();
        let unrestricted = can(
            ctx,
            EntityKind::Review,
            Operation::ReadAnyStatus,
            filter.professional_id,
        );
        if !unrestricted {
            match filter.status {
                Some(status) if status != ReviewStatus::Approved => return Ok(Vec::new()),
                _ => filter.status = Some(ReviewStatus::Approved),
            }
        }
        self.reviews.list_reviews(ctx, &filter).await
    }

    /// Public profile listing.
    pub async fn approved_reviews(&self, ctx: &ActorContext, professional_id: Uuid) -> Result<Vec<Review>> {
        let filter = ReviewFilter {
            professional_id: Some(professional_id),
            status: Some(ReviewStatus::Approved),
            ..ReviewFilter::default()
        };
        self.reviews.list_reviews(ctx, &filter).await
    }

    /// Homepage carousel: approved and featured, newest first.
    pub async fn featured_reviews(&self, ctx: &ActorContext, limit: Option<usize>) -> Result<Vec<Review>> {
        let filter = ReviewFilter {
            status: Some(ReviewStatus::Approved),
            featured: Some(true),
            ..ReviewFilter::default()
        };
        let mut reviews = self.reviews.list_reviews(ctx, &filter).await?;
        if let Some(limit) = limit {
            reviews.truncate(limit);
        }
        Ok(reviews)
    }

    pub async fn update_review(&self, ctx: &ActorContext, review_id: Uuid, patch: ReviewPatch) -> Result<Review> {
        let mut review = self.load_review(ctx, review_id).await?;
        authorize(ctx, EntityKind::Review, Operation::Update, Some(review.professional_id))?;

        if let Some(name) = patch.reviewer_name.as_deref() {
            review.reviewer_name = require_text("reviewer name", name)?;
        }
        if let Some(email) = patch.reviewer_email.as_deref() {
            review.reviewer_email = validate_email(optional_text(Some(email)))?;
        }
        if let Some(rating) = patch.rating {
            review.rating = validate_rating(rating)?;
        }
        if let Some(text) = patch.review_text.as_deref() {
            review.review_text = require_text("review text", text)?;
        }
        review.updated_at = Utc::now();

        let saved = self.reviews.save_review(ctx, &review).await?;
        info!(%review_id, actor = %ctx.label(), "updated review");
        Ok(saved)
    }

    pub async fn delete_review(&self, ctx: &ActorContext, review_id: Uuid) -> Result<()> {
        let review = self.load_review(ctx, review_id).await?;
        authorize(ctx, EntityKind::Review, Operation::Delete, Some(review.professional_id))?;

        if !self.reviews.delete_review(ctx, review_id).await? {
            return Err(PortalError::not_found("review", review_id));
        }
        info!(%review_id, actor = %ctx.label(), "deleted review");
        Ok(())
    }
}

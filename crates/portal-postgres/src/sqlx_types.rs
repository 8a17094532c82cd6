//! Row structs as they come off the wire, converted into domain types.
//!
//! Status columns are TEXT; an unknown value in the database surfaces as a
//! conversion error rather than a panic.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use portal_core::error::PortalError;
use portal_core::types::*;

#[derive(Debug, sqlx::FromRow)]
pub struct PgPostRow {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub featured_image_id: Option<String>,
    pub featured_image_url: Option<String>,
    pub read_time: i32,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgPostRow> for Post {
    type Error = PortalError;

    fn try_from(r: PgPostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            status: parse_wire("post status", &r.status, PostStatus::parse)?,
            post_id: r.post_id,
            author_id: r.author_id,
            author_name: r.author_name,
            author_avatar_url: r.author_avatar_url,
            title: r.title,
            slug: r.slug,
            content: r.content,
            excerpt: r.excerpt,
            tags: r.tags,
            featured_image_id: r.featured_image_id,
            featured_image_url: r.featured_image_url,
            read_time: r.read_time,
            published_at: r.published_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PgLeadRow {
    pub lead_id: Uuid,
    pub owner_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub lead_source: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgLeadRow> for Lead {
    type Error = PortalError;

    fn try_from(r: PgLeadRow) -> Result<Self, Self::Error> {
        Ok(Lead {
            status: parse_wire("lead status", &r.status, LeadStatus::parse)?,
            lead_source: parse_wire("lead source", &r.lead_source, LeadSource::parse)?,
            lead_id: r.lead_id,
            owner_id: r.owner_id,
            full_name: r.full_name,
            email: r.email,
            phone: r.phone,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PgLeadNoteRow {
    pub note_id: Uuid,
    pub lead_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<PgLeadNoteRow> for LeadNote {
    fn from(r: PgLeadNoteRow) -> Self {
        LeadNote {
            note_id: r.note_id,
            lead_id: r.lead_id,
            author_id: r.author_id,
            content: r.content,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PgLeadTaskRow {
    pub task_id: Uuid,
    pub lead_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PgLeadTaskRow> for LeadTask {
    fn from(r: PgLeadTaskRow) -> Self {
        LeadTask {
            task_id: r.task_id,
            lead_id: r.lead_id,
            owner_id: r.owner_id,
            title: r.title,
            description: r.description,
            due_date: r.due_date,
            completed: r.completed,
            completed_at: r.completed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PgReviewRow {
    pub review_id: Uuid,
    pub professional_id: Uuid,
    pub professional_username: String,
    pub reviewer_name: String,
    pub reviewer_email: Option<String>,
    pub rating: i32,
    pub review_text: String,
    pub status: String,
    pub featured: bool,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PgReviewRow> for Review {
    type Error = PortalError;

    fn try_from(r: PgReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            status: parse_wire("review status", &r.status, ReviewStatus::parse)?,
            review_id: r.review_id,
            professional_id: r.professional_id,
            professional_username: r.professional_username,
            reviewer_name: r.reviewer_name,
            reviewer_email: r.reviewer_email,
            rating: r.rating,
            review_text: r.review_text,
            featured: r.featured,
            submitted_at: r.submitted_at,
            updated_at: r.updated_at,
        })
    }
}

/// `(status, count)` pairs from a `GROUP BY status` query.
pub fn status_counts<S>(
    rows: Vec<(String, i64)>,
    kind: &str,
    parse: fn(&str) -> Option<S>,
) -> Result<Vec<(S, i64)>, PortalError> {
    rows.into_iter()
        .map(|(status, n)| Ok((parse_wire(kind, &status, parse)?, n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_row(status: &str) -> PgReviewRow {
        let now = Utc::now();
        PgReviewRow {
            review_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            professional_username: "ada".into(),
            reviewer_name: "Client".into(),
            reviewer_email: None,
            rating: 4,
            review_text: "Great".into(),
            status: status.into(),
            featured: false,
            submitted_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn known_status_converts() {
        let review = Review::try_from(review_row("approved")).unwrap();
        assert_eq!(review.status, ReviewStatus::Approved);
    }

    #[test]
    fn unknown_status_is_an_error() {
        assert!(Review::try_from(review_row("hidden")).is_err());
    }

    #[test]
    fn status_counts_parse_wire_values() {
        let counts = status_counts(
            vec![("new".into(), 2), ("closed_won".into(), 1)],
            "lead status",
            LeadStatus::parse,
        )
        .unwrap();
        assert_eq!(counts, vec![(LeadStatus::New, 2), (LeadStatus::ClosedWon, 1)]);
        assert!(status_counts(vec![("lost".into(), 1)], "lead status", LeadStatus::parse).is_err());
    }
}

//! Domain types for posts, leads and reviews.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PortalError;

// ── Status vocabularies ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Submitted,
    Approved,
    Published,
    Rejected,
}

impl PostStatus {
    pub const ALL: [PostStatus; 5] = [
        Self::Draft,
        Self::Submitted,
        Self::Approved,
        Self::Published,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "published" => Some(Self::Published),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    MeetingScheduled,
    FollowUp,
    ClosedWon,
    ClosedLost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        Self::New,
        Self::Contacted,
        Self::MeetingScheduled,
        Self::FollowUp,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::MeetingScheduled => "meeting_scheduled",
            Self::FollowUp => "follow_up",
            Self::ClosedWon => "closed_won",
            Self::ClosedLost => "closed_lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "meeting_scheduled" => Some(Self::MeetingScheduled),
            "follow_up" => Some(Self::FollowUp),
            "closed_won" => Some(Self::ClosedWon),
            "closed_lost" => Some(Self::ClosedLost),
            _ => None,
        }
    }

    /// Open pipeline stages between first contact and close.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Contacted | Self::MeetingScheduled | Self::FollowUp
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    #[default]
    ManualEntry,
    WebsiteForm,
    Referral,
    SocialMedia,
    NetworkingEvent,
    ColdOutreach,
    Other,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManualEntry => "manual_entry",
            Self::WebsiteForm => "website_form",
            Self::Referral => "referral",
            Self::SocialMedia => "social_media",
            Self::NetworkingEvent => "networking_event",
            Self::ColdOutreach => "cold_outreach",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual_entry" => Some(Self::ManualEntry),
            "website_form" => Some(Self::WebsiteForm),
            "referral" => Some(Self::Referral),
            "social_media" => Some(Self::SocialMedia),
            "networking_event" => Some(Self::NetworkingEvent),
            "cold_outreach" => Some(Self::ColdOutreach),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Parse a stored wire value, reporting unknown values as validation errors.
pub fn parse_wire<T>(kind: &str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T, PortalError> {
    parse(value).ok_or_else(|| PortalError::Validation(format!("unknown {kind} '{value}'")))
}

// ── Posts ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
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
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

/// Partial post update. Status moves only through the transition gates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub status: Option<PostStatus>,
    pub tag: Option<String>,
}

// ── Leads ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: Uuid,
    pub owner_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub lead_source: LeadSource,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLead {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<LeadStatus>,
    pub lead_source: Option<LeadSource>,
    pub notes: Option<String>,
}

/// Partial lead update. An empty string clears an optional text field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<LeadStatus>,
    pub lead_source: Option<LeadSource>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadNote {
    pub note_id: Uuid,
    pub lead_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTask {
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLeadTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadTaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

/// A lead with its notes (newest first) and tasks (by due date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadDetail {
    pub lead: Lead,
    pub notes: Vec<LeadNote>,
    pub tasks: Vec<LeadTask>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
}

// ── Reviews ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: Uuid,
    pub professional_id: Uuid,
    pub professional_username: String,
    pub reviewer_name: String,
    pub reviewer_email: Option<String>,
    pub rating: i32,
    pub review_text: String,
    pub status: ReviewStatus,
    pub featured: bool,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewReview {
    pub professional_id: Uuid,
    pub professional_username: String,
    pub reviewer_name: String,
    pub reviewer_email: Option<String>,
    pub rating: i32,
    pub review_text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewPatch {
    pub reviewer_name: Option<String>,
    pub reviewer_email: Option<String>,
    pub rating: Option<i32>,
    pub review_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewFilter {
    pub professional_id: Option<Uuid>,
    pub professional_username: Option<String>,
    pub status: Option<ReviewStatus>,
    pub featured: Option<bool>,
}

// ── Aggregates ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadStats {
    pub total: i64,
    pub new: i64,
    pub active: i64,
    pub closed_won: i64,
    pub closed_lost: i64,
}

impl LeadStats {
    /// Fold per-status counts into the dashboard rollup.
    pub fn from_counts(counts: &[(LeadStatus, i64)]) -> Self {
        counts
            .iter()
            .fold(Self::default(), |mut stats, &(status, count)| {
                stats.total += count;
                match status {
                    LeadStatus::New => stats.new += count,
                    LeadStatus::ClosedWon => stats.closed_won += count,
                    LeadStatus::ClosedLost => stats.closed_lost += count,
                    s if s.is_active() => stats.active += count,
                    _ => {}
                }
                stats
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean of approved ratings; 0.0 when there are none.
    pub average: f64,
    pub count: i64,
}

/// Per-status counts with every status present, zero-filled.
pub fn zero_filled<S: Copy + PartialEq>(all: &[S], counts: &[(S, i64)]) -> Vec<(S, i64)> {
    all.iter()
        .map(|s| {
            let n = counts
                .iter()
                .filter(|(status, _)| status == s)
                .map(|(_, n)| *n)
                .sum();
            (*s, n)
        })
        .collect()
}

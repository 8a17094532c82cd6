//! WorkflowService: the entity repository, transition gates and stat reader.
//!
//! Takes port traits via `Arc<dyn PortTrait>` so that the same logic works
//! against Postgres or the in-memory store. All methods take `&ActorContext`
//! explicitly and check the permission table before touching storage.

mod gate;
mod leads;
mod posts;
mod reviews;
mod stats;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::warn;

use crate::error::PortalError;
use crate::media::{MediaError, MediaHost};
use crate::memory::InMemoryStore;
use crate::ports::{LeadStore, PostStore, Result, ReviewStore};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[derive(Clone)]
pub struct WorkflowService {
    posts: Arc<dyn PostStore>,
    leads: Arc<dyn LeadStore>,
    reviews: Arc<dyn ReviewStore>,
    media: Option<Arc<dyn MediaHost>>,
}

impl WorkflowService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        leads: Arc<dyn LeadStore>,
        reviews: Arc<dyn ReviewStore>,
    ) -> Self {
        Self {
            posts,
            leads,
            reviews,
            media: None,
        }
    }

    /// Service over a fresh in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store.clone(), store)
    }

    pub fn with_media(mut self, media: Arc<dyn MediaHost>) -> Self {
        self.media = Some(media);
        self
    }

    fn media(&self) -> Result<&Arc<dyn MediaHost>> {
        self.media
            .as_ref()
            .ok_or_else(|| MediaError::NotConfigured.into())
    }

    /// Best-effort remote delete. A lost remote file must never keep the
    /// owning row from changing, so failures are logged and dropped.
    async fn discard_media(&self, media_id: &str) {
        let Some(media) = self.media.as_ref() else {
            warn!(media_id, "no media host configured, remote file left in place");
            return;
        };
        if let Err(e) = media.delete(media_id).await {
            warn!(media_id, error = %e, "failed to delete remote media");
        }
    }
}

// ── Field validation ──────────────────────────────────────────

pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortalError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trim, mapping blank to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_email(email: Option<String>) -> Result<Option<String>> {
    match email {
        Some(e) if !EMAIL_RE.is_match(&e) => Err(PortalError::Validation(format!(
            "'{e}' is not a valid email address"
        ))),
        other => Ok(other),
    }
}

pub(crate) fn validate_rating(rating: i32) -> Result<i32> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(PortalError::Validation(format!(
            "rating must be between 1 and 5, got {rating}"
        )))
    }
}

/// Trimmed, non-empty, first occurrence wins.
pub(crate) fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

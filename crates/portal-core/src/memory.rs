//! In-memory implementation of the storage ports for testing and development.

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::context::ActorContext;
use crate::error::PortalError;
use crate::ports::{LeadStore, PostStore, Result, ReviewStore};
use crate::types::*;

/// All five tables behind one lock each. Rows are kept in insertion order;
/// listing walks them newest-inserted first before the stable sort so that
/// equal timestamps still come back newest first.
#[derive(Default)]
pub struct InMemoryStore {
    posts: RwLock<Vec<Post>>,
    leads: RwLock<Vec<Lead>>,
    notes: RwLock<Vec<LeadNote>>,
    tasks: RwLock<Vec<LeadTask>>,
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(rows: &[T], created: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().cloned().collect();
    out.sort_by_key(|r| std::cmp::Reverse(created(r)));
    out
}

fn slug_taken(posts: &[Post], slug: &str, except: Uuid) -> bool {
    posts.iter().any(|p| p.slug == slug && p.post_id != except)
}

fn slug_conflict(slug: &str) -> PortalError {
    PortalError::Conflict(format!("slug '{slug}' already exists"))
}

fn replace<T: Clone>(rows: &mut [T], row: &T, matches: impl Fn(&T) -> bool, what: &str, id: Uuid) -> Result<T> {
    let slot = rows
        .iter_mut()
        .find(|r| matches(r))
        .ok_or_else(|| PortalError::not_found(what, id))?;
    *slot = row.clone();
    Ok(row.clone())
}

fn count_by<S: Copy + PartialEq>(statuses: impl Iterator<Item = S>) -> Vec<(S, i64)> {
    let mut counts: Vec<(S, i64)> = Vec::new();
    for status in statuses {
        match counts.iter_mut().find(|(s, _)| *s == status) {
            Some((_, n)) => *n += 1,
            None => counts.push((status, 1)),
        }
    }
    counts
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn insert_post(&self, _ctx: &ActorContext, post: &Post) -> Result<Post> {
        let mut posts = self.posts.write().await;
        if slug_taken(&posts, &post.slug, post.post_id) {
            return Err(slug_conflict(&post.slug));
        }
        posts.push(post.clone());
        Ok(post.clone())
    }

    async fn get_post(&self, _ctx: &ActorContext, post_id: Uuid) -> Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.post_id == post_id).cloned())
    }

    async fn get_post_by_slug(&self, _ctx: &ActorContext, slug: &str) -> Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list_posts(&self, _ctx: &ActorContext, filter: &PostFilter) -> Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let matching: Vec<Post> = posts
            .iter()
            .filter(|p| filter.author_id.is_none_or(|a| p.author_id == a))
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| {
                filter
                    .tag
                    .as_ref()
                    .is_none_or(|t| p.tags.iter().any(|pt| pt == t))
            })
            .cloned()
            .collect();
        Ok(newest_first(&matching, |p| p.created_at))
    }

    async fn save_post(&self, _ctx: &ActorContext, post: &Post) -> Result<Post> {
        let mut posts = self.posts.write().await;
        if slug_taken(&posts, &post.slug, post.post_id) {
            return Err(slug_conflict(&post.slug));
        }
        replace(&mut posts, post, |p| p.post_id == post.post_id, "post", post.post_id)
    }

    async fn delete_post(&self, _ctx: &ActorContext, post_id: Uuid) -> Result<bool> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.post_id != post_id);
        Ok(posts.len() != before)
    }

    async fn count_posts_by_status(
        &self,
        _ctx: &ActorContext,
        author_id: Option<Uuid>,
    ) -> Result<Vec<(PostStatus, i64)>> {
        let posts = self.posts.read().await;
        Ok(count_by(
            posts
                .iter()
                .filter(|p| author_id.is_none_or(|a| p.author_id == a))
                .map(|p| p.status),
        ))
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn insert_lead(&self, _ctx: &ActorContext, lead: &Lead) -> Result<Lead> {
        self.leads.write().await.push(lead.clone());
        Ok(lead.clone())
    }

    async fn get_lead(&self, _ctx: &ActorContext, lead_id: Uuid) -> Result<Option<Lead>> {
        let leads = self.leads.read().await;
        Ok(leads.iter().find(|l| l.lead_id == lead_id).cloned())
    }

    async fn list_leads(
        &self,
        _ctx: &ActorContext,
        owner_id: Uuid,
        filter: &LeadFilter,
    ) -> Result<Vec<Lead>> {
        let leads = self.leads.read().await;
        let matching: Vec<Lead> = leads
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .filter(|l| filter.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |l| l.created_at))
    }

    async fn save_lead(&self, _ctx: &ActorContext, lead: &Lead) -> Result<Lead> {
        let mut leads = self.leads.write().await;
        replace(&mut leads, lead, |l| l.lead_id == lead.lead_id, "lead", lead.lead_id)
    }

    async fn delete_lead(&self, _ctx: &ActorContext, lead_id: Uuid) -> Result<bool> {
        let mut leads = self.leads.write().await;
        let before = leads.len();
        leads.retain(|l| l.lead_id != lead_id);
        let removed = leads.len() != before;
        drop(leads);

        if removed {
            self.notes.write().await.retain(|n| n.lead_id != lead_id);
            self.tasks.write().await.retain(|t| t.lead_id != lead_id);
        }
        Ok(removed)
    }

    async fn count_leads_by_status(
        &self,
        _ctx: &ActorContext,
        owner_id: Uuid,
    ) -> Result<Vec<(LeadStatus, i64)>> {
        let leads = self.leads.read().await;
        Ok(count_by(
            leads
                .iter()
                .filter(|l| l.owner_id == owner_id)
                .map(|l| l.status),
        ))
    }

    async fn insert_note(&self, _ctx: &ActorContext, note: &LeadNote) -> Result<LeadNote> {
        self.notes.write().await.push(note.clone());
        Ok(note.clone())
    }

    async fn list_notes(&self, _ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadNote>> {
        let notes = self.notes.read().await;
        let matching: Vec<LeadNote> = notes.iter().filter(|n| n.lead_id == lead_id).cloned().collect();
        Ok(newest_first(&matching, |n| n.created_at))
    }

    async fn insert_task(&self, _ctx: &ActorContext, task: &LeadTask) -> Result<LeadTask> {
        self.tasks.write().await.push(task.clone());
        Ok(task.clone())
    }

    async fn get_task(&self, _ctx: &ActorContext, task_id: Uuid) -> Result<Option<LeadTask>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.task_id == task_id).cloned())
    }

    async fn list_tasks(&self, _ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadTask>> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<LeadTask> = tasks.iter().filter(|t| t.lead_id == lead_id).cloned().collect();
        matching.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.created_at.cmp(&b.created_at)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.created_at.cmp(&b.created_at),
        });
        Ok(matching)
    }

    async fn save_task(&self, _ctx: &ActorContext, task: &LeadTask) -> Result<LeadTask> {
        let mut tasks = self.tasks.write().await;
        replace(&mut tasks, task, |t| t.task_id == task.task_id, "lead task", task.task_id)
    }

    async fn delete_task(&self, _ctx: &ActorContext, task_id: Uuid) -> Result<bool> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.task_id != task_id);
        Ok(tasks.len() != before)
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, _ctx: &ActorContext, review: &Review) -> Result<Review> {
        self.reviews.write().await.push(review.clone());
        Ok(review.clone())
    }

    async fn get_review(&self, _ctx: &ActorContext, review_id: Uuid) -> Result<Option<Review>> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().find(|r| r.review_id == review_id).cloned())
    }

    async fn list_reviews(&self, _ctx: &ActorContext, filter: &ReviewFilter) -> Result<Vec<Review>> {
        let reviews = self.reviews.read().await;
        let matching: Vec<Review> = reviews
            .iter()
            .filter(|r| filter.professional_id.is_none_or(|p| r.professional_id == p))
            .filter(|r| {
                filter
                    .professional_username
                    .as_ref()
                    .is_none_or(|u| &r.professional_username == u)
            })
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .filter(|r| filter.featured.is_none_or(|f| r.featured == f))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |r| r.submitted_at))
    }

    async fn save_review(&self, _ctx: &ActorContext, review: &Review) -> Result<Review> {
        let mut reviews = self.reviews.write().await;
        replace(
            &mut reviews,
            review,
            |r| r.review_id == review.review_id,
            "review",
            review.review_id,
        )
    }

    async fn delete_review(&self, _ctx: &ActorContext, review_id: Uuid) -> Result<bool> {
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|r| r.review_id != review_id);
        Ok(reviews.len() != before)
    }

    async fn rating_summary(&self, _ctx: &ActorContext, professional_id: Uuid) -> Result<RatingSummary> {
        let reviews = self.reviews.read().await;
        let ratings: Vec<i32> = reviews
            .iter()
            .filter(|r| r.professional_id == professional_id && r.status == ReviewStatus::Approved)
            .map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            return Ok(RatingSummary::default());
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let count = ratings.len() as i64;
        Ok(RatingSummary {
            average: sum as f64 / count as f64,
            count,
        })
    }

    async fn count_reviews_by_status(
        &self,
        _ctx: &ActorContext,
        professional_id: Option<Uuid>,
    ) -> Result<Vec<(ReviewStatus, i64)>> {
        let reviews = self.reviews.read().await;
        Ok(count_by(
            reviews
                .iter()
                .filter(|r| professional_id.is_none_or(|p| r.professional_id == p))
                .map(|r| r.status),
        ))
    }
}

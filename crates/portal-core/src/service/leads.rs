use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{optional_text, require_text, validate_email, WorkflowService};
use crate::context::ActorContext;
use crate::error::PortalError;
use crate::permissions::{authorize, EntityKind, Operation};
use crate::ports::Result;
use crate::types::{
    Lead, LeadDetail, LeadFilter, LeadNote, LeadPatch, LeadStatus, LeadTask, LeadTaskPatch,
    NewLead, NewLeadTask,
};

impl WorkflowService {
    /// The creating actor becomes the permanent owner.
    pub async fn create_lead(&self, ctx: &ActorContext, new: NewLead) -> Result<Lead> {
        let owner_id = ctx.require_actor()?;
        authorize(ctx, EntityKind::Lead, Operation::Create, Some(owner_id))?;

        let now = Utc::now();
        let lead = Lead {
            lead_id: Uuid::new_v4(),
            owner_id,
            full_name: require_text("full name", &new.full_name)?,
            email: validate_email(optional_text(new.email.as_deref()))?,
            phone: optional_text(new.phone.as_deref()),
            status: new.status.unwrap_or(LeadStatus::New),
            lead_source: new.lead_source.unwrap_or_default(),
            notes: optional_text(new.notes.as_deref()),
            created_at: now,
            updated_at: now,
        };

        let stored = self.leads.insert_lead(ctx, &lead).await?;
        info!(lead_id = %stored.lead_id, actor = %ctx.label(), "created lead");
        Ok(stored)
    }

    async fn load_lead(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Lead> {
        self.leads
            .get_lead(ctx, lead_id)
            .await?
            .ok_or_else(|| PortalError::not_found("lead", lead_id))
    }

    /// Load the lead and check `operation` on it (or on one of its children).
    async fn owned_lead(
        &self,
        ctx: &ActorContext,
        lead_id: Uuid,
        entity: EntityKind,
        operation: Operation,
    ) -> Result<Lead> {
        let lead = self.load_lead(ctx, lead_id).await?;
        authorize(ctx, entity, operation, Some(lead.owner_id))?;
        Ok(lead)
    }

    pub async fn get_lead(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Lead> {
        debug!(%lead_id, actor = %ctx.label(), "get lead");
        self.owned_lead(ctx, lead_id, EntityKind::Lead, Operation::ReadAnyStatus)
            .await
    }

    /// The lead with its notes and tasks in one read.
    pub async fn get_lead_detail(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<LeadDetail> {
        let lead = self.get_lead(ctx, lead_id).await?;
        let notes = self.leads.list_notes(ctx, lead_id).await?;
        let tasks = self.leads.list_tasks(ctx, lead_id).await?;
        Ok(LeadDetail { lead, notes, tasks })
    }

    /// The calling professional's own leads, newest first.
    pub async fn list_leads(&self, ctx: &ActorContext, filter: &LeadFilter) -> Result<Vec<Lead>> {
        let owner_id = ctx.require_actor()?;
        authorize(ctx, EntityKind::Lead, Operation::ReadAnyStatus, Some(owner_id))?;
        self.leads.list_leads(ctx, owner_id, filter).await
    }

    /// Any status may follow any other; the owner never changes.
    pub async fn update_lead(&self, ctx: &ActorContext, lead_id: Uuid, patch: LeadPatch) -> Result<Lead> {
        let mut lead = self
            .owned_lead(ctx, lead_id, EntityKind::Lead, Operation::Update)
            .await?;

        if let Some(name) = patch.full_name.as_deref() {
            lead.full_name = require_text("full name", name)?;
        }
        if let Some(email) = patch.email.as_deref() {
            lead.email = validate_email(optional_text(Some(email)))?;
        }
        if let Some(phone) = patch.phone.as_deref() {
            lead.phone = optional_text(Some(phone));
        }
        if let Some(notes) = patch.notes.as_deref() {
            lead.notes = optional_text(Some(notes));
        }
        if let Some(source) = patch.lead_source {
            lead.lead_source = source;
        }
        let from = lead.status;
        if let Some(status) = patch.status {
            lead.status = status;
        }
        lead.updated_at = Utc::now();

        let saved = self.leads.save_lead(ctx, &lead).await?;
        info!(
            %lead_id,
            from = from.as_str(),
            to = saved.status.as_str(),
            actor = %ctx.label(),
            "updated lead"
        );
        Ok(saved)
    }

    /// Hard delete by the owner; notes and tasks go with it.
    pub async fn delete_lead(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<()> {
        self.owned_lead(ctx, lead_id, EntityKind::Lead, Operation::Delete)
            .await?;
        if !self.leads.delete_lead(ctx, lead_id).await? {
            return Err(PortalError::not_found("lead", lead_id));
        }
        info!(%lead_id, actor = %ctx.label(), "deleted lead");
        Ok(())
    }

    // ── Notes ──────────────────────────────────────────────────

    /// Notes are append-only; there is no update or delete.
    pub async fn add_lead_note(&self, ctx: &ActorContext, lead_id: Uuid, content: &str) -> Result<LeadNote> {
        let lead = self
            .owned_lead(ctx, lead_id, EntityKind::LeadNote, Operation::Create)
            .await?;
        let author_id = ctx.require_actor()?;

        let note = LeadNote {
            note_id: Uuid::new_v4(),
            lead_id: lead.lead_id,
            author_id,
            content: require_text("note", content)?,
            created_at: Utc::now(),
        };
        let stored = self.leads.insert_note(ctx, &note).await?;
        info!(%lead_id, note_id = %stored.note_id, "added lead note");
        Ok(stored)
    }

    pub async fn list_lead_notes(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadNote>> {
        self.owned_lead(ctx, lead_id, EntityKind::LeadNote, Operation::ReadAnyStatus)
            .await?;
        self.leads.list_notes(ctx, lead_id).await
    }

    // ── Tasks ──────────────────────────────────────────────────

    pub async fn add_lead_task(&self, ctx: &ActorContext, lead_id: Uuid, new: NewLeadTask) -> Result<LeadTask> {
        let lead = self
            .owned_lead(ctx, lead_id, EntityKind::LeadTask, Operation::Create)
            .await?;

        let now = Utc::now();
        let task = LeadTask {
            task_id: Uuid::new_v4(),
            lead_id: lead.lead_id,
            owner_id: lead.owner_id,
            title: require_text("task title", &new.title)?,
            description: optional_text(new.description.as_deref()),
            due_date: new.due_date,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let stored = self.leads.insert_task(ctx, &task).await?;
        info!(%lead_id, task_id = %stored.task_id, "added lead task");
        Ok(stored)
    }

    /// Due date ascending, undated tasks last.
    pub async fn list_lead_tasks(&self, ctx: &ActorContext, lead_id: Uuid) -> Result<Vec<LeadTask>> {
        self.owned_lead(ctx, lead_id, EntityKind::LeadTask, Operation::ReadAnyStatus)
            .await?;
        self.leads.list_tasks(ctx, lead_id).await
    }

    async fn owned_task(&self, ctx: &ActorContext, task_id: Uuid, operation: Operation) -> Result<LeadTask> {
        let task = self
            .leads
            .get_task(ctx, task_id)
            .await?
            .ok_or_else(|| PortalError::not_found("lead task", task_id))?;
        authorize(ctx, EntityKind::LeadTask, operation, Some(task.owner_id))?;
        Ok(task)
    }

    pub async fn update_lead_task(&self, ctx: &ActorContext, task_id: Uuid, patch: LeadTaskPatch) -> Result<LeadTask> {
        let mut task = self.owned_task(ctx, task_id, Operation::Update).await?;
        let now = Utc::now();

        if let Some(title) = patch.title.as_deref() {
            task.title = require_text("task title", title)?;
        }
        if let Some(description) = patch.description.as_deref() {
            task.description = optional_text(Some(description));
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            if completed != task.completed {
                task.completed = completed;
                task.completed_at = completed.then_some(now);
            }
        }
        task.updated_at = now;

        let saved = self.leads.save_task(ctx, &task).await?;
        info!(%task_id, completed = saved.completed, "updated lead task");
        Ok(saved)
    }

    pub async fn set_lead_task_completed(&self, ctx: &ActorContext, task_id: Uuid, completed: bool) -> Result<LeadTask> {
        let patch = LeadTaskPatch {
            completed: Some(completed),
            ..LeadTaskPatch::default()
        };
        self.update_lead_task(ctx, task_id, patch).await
    }

    pub async fn delete_lead_task(&self, ctx: &ActorContext, task_id: Uuid) -> Result<()> {
        self.owned_task(ctx, task_id, Operation::Delete).await?;
        if !self.leads.delete_task(ctx, task_id).await? {
            return Err(PortalError::not_found("lead task", task_id));
        }
        info!(%task_id, "deleted lead task");
        Ok(())
    }
}

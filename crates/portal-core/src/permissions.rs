//! Static permission table keyed by (entity kind, operation, ownership).
//!
//! Checked by the service before every repository call. The Postgres row
//! security policies encode the same table on the database side.

use tracing::warn;
use uuid::Uuid;

use crate::context::{ActorContext, Role};
use crate::error::PortalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Post,
    Lead,
    LeadNote,
    LeadTask,
    Review,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Lead => "lead",
            Self::LeadNote => "lead_note",
            Self::LeadTask => "lead_task",
            Self::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    /// Read rows that are not publicly visible (unpublished posts,
    /// unapproved reviews, anything private).
    ReadAnyStatus,
    Update,
    Delete,
    Submit,
    Approve,
    Reject,
    Publish,
    Unpublish,
    Feature,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::ReadAnyStatus => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Feature => "feature",
        }
    }
}

/// How the actor relates to the row (or, for children, to the parent row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Owner,
    Other,
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Any,
    OwnerOnly,
}

struct Rule {
    entity: EntityKind,
    operation: Operation,
    role: Role,
    scope: Scope,
}

const fn rule(entity: EntityKind, operation: Operation, role: Role, scope: Scope) -> Rule {
    Rule {
        entity,
        operation,
        role,
        scope,
    }
}

use EntityKind as E;
use Operation as Op;
use Role as R;
use Scope as S;

const RULES: &[Rule] = &[
    // Posts: authors edit their own, admins run the editorial gates.
    rule(E::Post, Op::Create, R::Professional, S::OwnerOnly),
    rule(E::Post, Op::Create, R::Admin, S::OwnerOnly),
    rule(E::Post, Op::ReadAnyStatus, R::Professional, S::OwnerOnly),
    rule(E::Post, Op::ReadAnyStatus, R::Admin, S::Any),
    rule(E::Post, Op::Update, R::Professional, S::OwnerOnly),
    rule(E::Post, Op::Update, R::Admin, S::Any),
    rule(E::Post, Op::Submit, R::Professional, S::OwnerOnly),
    rule(E::Post, Op::Submit, R::Admin, S::Any),
    rule(E::Post, Op::Delete, R::Admin, S::Any),
    rule(E::Post, Op::Approve, R::Admin, S::Any),
    rule(E::Post, Op::Reject, R::Admin, S::Any),
    rule(E::Post, Op::Publish, R::Admin, S::Any),
    rule(E::Post, Op::Unpublish, R::Admin, S::Any),
    // Leads and their children belong to the owning professional alone.
    rule(E::Lead, Op::Create, R::Professional, S::OwnerOnly),
    rule(E::Lead, Op::Create, R::Admin, S::OwnerOnly),
    rule(E::Lead, Op::ReadAnyStatus, R::Professional, S::OwnerOnly),
    rule(E::Lead, Op::ReadAnyStatus, R::Admin, S::OwnerOnly),
    rule(E::Lead, Op::Update, R::Professional, S::OwnerOnly),
    rule(E::Lead, Op::Update, R::Admin, S::OwnerOnly),
    rule(E::Lead, Op::Delete, R::Professional, S::OwnerOnly),
    rule(E::Lead, Op::Delete, R::Admin, S::OwnerOnly),
    rule(E::LeadNote, Op::Create, R::Professional, S::OwnerOnly),
    rule(E::LeadNote, Op::Create, R::Admin, S::OwnerOnly),
    rule(E::LeadNote, Op::ReadAnyStatus, R::Professional, S::OwnerOnly),
    rule(E::LeadNote, Op::ReadAnyStatus, R::Admin, S::OwnerOnly),
    rule(E::LeadTask, Op::Create, R::Professional, S::OwnerOnly),
    rule(E::LeadTask, Op::Create, R::Admin, S::OwnerOnly),
    rule(E::LeadTask, Op::ReadAnyStatus, R::Professional, S::OwnerOnly),
    rule(E::LeadTask, Op::ReadAnyStatus, R::Admin, S::OwnerOnly),
    rule(E::LeadTask, Op::Update, R::Professional, S::OwnerOnly),
    rule(E::LeadTask, Op::Update, R::Admin, S::OwnerOnly),
    rule(E::LeadTask, Op::Delete, R::Professional, S::OwnerOnly),
    rule(E::LeadTask, Op::Delete, R::Admin, S::OwnerOnly),
    // Reviews: anyone may submit, the reviewed professional may see their
    // own queue, moderation is admin-only.
    rule(E::Review, Op::Create, R::Anonymous, S::Any),
    rule(E::Review, Op::Create, R::Professional, S::Any),
    rule(E::Review, Op::Create, R::Admin, S::Any),
    rule(E::Review, Op::ReadAnyStatus, R::Professional, S::OwnerOnly),
    rule(E::Review, Op::ReadAnyStatus, R::Admin, S::Any),
    rule(E::Review, Op::Update, R::Admin, S::Any),
    rule(E::Review, Op::Delete, R::Admin, S::Any),
    rule(E::Review, Op::Approve, R::Admin, S::Any),
    rule(E::Review, Op::Reject, R::Admin, S::Any),
    rule(E::Review, Op::Feature, R::Admin, S::Any),
];

/// Pure table lookup.
pub fn is_permitted(entity: EntityKind, operation: Operation, role: Role, relation: Relation) -> bool {
    RULES.iter().any(|r| {
        r.entity == entity
            && r.operation == operation
            && r.role == role
            && match r.scope {
                Scope::Any => true,
                Scope::OwnerOnly => relation == Relation::Owner,
            }
    })
}

pub fn relation(ctx: &ActorContext, owner_id: Option<Uuid>) -> Relation {
    match owner_id {
        Some(owner) if ctx.owns(owner) => Relation::Owner,
        _ => Relation::Other,
    }
}

/// Check `ctx` against the table for a row owned by `owner_id`.
pub fn authorize(
    ctx: &ActorContext,
    entity: EntityKind,
    operation: Operation,
    owner_id: Option<Uuid>,
) -> Result<(), PortalError> {
    let rel = relation(ctx, owner_id);
    if is_permitted(entity, operation, ctx.role, rel) {
        return Ok(());
    }
    warn!(
        actor = %ctx.label(),
        entity = entity.as_str(),
        operation = operation.as_str(),
        "permission denied"
    );
    Err(PortalError::Forbidden(format!(
        "{} may not {} this {}",
        ctx.role,
        operation.as_str(),
        entity.as_str()
    )))
}

/// Non-failing variant used for visibility decisions.
pub fn can(ctx: &ActorContext, entity: EntityKind, operation: Operation, owner_id: Option<Uuid>) -> bool {
    is_permitted(entity, operation, ctx.role, relation(ctx, owner_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Role as R;
    use super::{EntityKind as E, Operation as Op};

    #[test]
    fn post_gates_are_admin_only() {
        for op in [Op::Approve, Op::Reject, Op::Publish, Op::Unpublish, Op::Delete] {
            assert!(is_permitted(E::Post, op, R::Admin, Relation::Other));
            assert!(!is_permitted(E::Post, op, R::Professional, Relation::Owner));
            assert!(!is_permitted(E::Post, op, R::Anonymous, Relation::Other));
        }
    }

    #[test]
    fn authors_edit_only_their_own_posts() {
        assert!(is_permitted(E::Post, Op::Update, R::Professional, Relation::Owner));
        assert!(!is_permitted(E::Post, Op::Update, R::Professional, Relation::Other));
    }

    #[test]
    fn leads_are_owner_only_even_for_admins() {
        for op in [Op::ReadAnyStatus, Op::Update, Op::Delete] {
            assert!(is_permitted(E::Lead, op, R::Professional, Relation::Owner));
            assert!(!is_permitted(E::Lead, op, R::Admin, Relation::Other));
        }
    }

    #[test]
    fn lead_notes_are_append_only() {
        assert!(is_permitted(E::LeadNote, Op::Create, R::Professional, Relation::Owner));
        assert!(!is_permitted(E::LeadNote, Op::Update, R::Professional, Relation::Owner));
        assert!(!is_permitted(E::LeadNote, Op::Delete, R::Admin, Relation::Owner));
    }

    #[test]
    fn anyone_may_submit_a_review() {
        for role in [R::Anonymous, R::Professional, R::Admin] {
            assert!(is_permitted(E::Review, Op::Create, role, Relation::Other));
        }
        assert!(!is_permitted(E::Review, Op::Approve, R::Professional, Relation::Owner));
    }

    #[test]
    fn authorize_reports_forbidden() {
        let ctx = ActorContext::professional(Uuid::new_v4());
        let err = authorize(&ctx, E::Post, Op::Publish, ctx.actor_id).unwrap_err();
        assert!(matches!(err, PortalError::Forbidden(_)));
        assert_eq!(err.to_string(), "forbidden: professional may not publish this post");
    }

    #[test]
    fn anonymous_context_never_owns() {
        let owner = Uuid::new_v4();
        assert_eq!(relation(&ActorContext::anonymous(), Some(owner)), Relation::Other);
        assert_eq!(relation(&ActorContext::professional(owner), Some(owner)), Relation::Owner);
        assert_eq!(relation(&ActorContext::professional(owner), None), Relation::Other);
    }
}

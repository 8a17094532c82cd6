//! Acting identity for a single request.
//!
//! There is no implicit or thread-local identity anywhere in the codebase:
//! every repository and gate call takes an `&ActorContext` built by the
//! caller for that request. Storage adapters stamp it into their own
//! session (see `portal_postgres::stamp`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PortalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Anonymous,
    Professional,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Professional => "professional",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "anonymous" | "anon" => Some(Self::Anonymous),
            "professional" => Some(Self::Professional),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: Option<Uuid>,
    pub role: Role,
}

impl ActorContext {
    /// Context for an authenticated actor.
    pub fn new(actor_id: Uuid, role: Role) -> Self {
        Self {
            actor_id: Some(actor_id),
            role,
        }
    }

    /// Context used when the caller never set one: public access rules only.
    pub fn anonymous() -> Self {
        Self {
            actor_id: None,
            role: Role::Anonymous,
        }
    }

    pub fn professional(actor_id: Uuid) -> Self {
        Self::new(actor_id, Role::Professional)
    }

    pub fn admin(actor_id: Uuid) -> Self {
        Self::new(actor_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_anonymous(&self) -> bool {
        self.actor_id.is_none() || self.role == Role::Anonymous
    }

    /// True when this actor is the given owner.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.actor_id == Some(owner_id)
    }

    /// Actor id for operations that stamp ownership.
    pub fn require_actor(&self) -> Result<Uuid, PortalError> {
        match self.actor_id {
            Some(id) if self.role != Role::Anonymous => Ok(id),
            _ => Err(PortalError::Forbidden(
                "operation requires an authenticated actor".into(),
            )),
        }
    }

    /// Label for logs.
    pub fn label(&self) -> String {
        match self.actor_id {
            Some(id) => format!("{}:{}", self.role, id),
            None => self.role.to_string(),
        }
    }
}

impl Default for ActorContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

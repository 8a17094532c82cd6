use thiserror::Error;

/// Error kinds surfaced by the repository and transition gates.
///
/// Every kind is distinguishable so the UI layer can render a different
/// message for each; storage and transport failures that fit none of the
/// named kinds land in `Internal`.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PortalError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Forbidden(_) => 403,
            Self::Conflict(_) => 409,
            Self::Validation(_) => 400,
            Self::ExternalService(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_covers_every_kind() {
        assert_eq!(PortalError::NotFound("x".into()).http_status(), 404);
        assert_eq!(PortalError::Forbidden("x".into()).http_status(), 403);
        assert_eq!(PortalError::Conflict("x".into()).http_status(), 409);
        assert_eq!(PortalError::Validation("x".into()).http_status(), 400);
        assert_eq!(PortalError::ExternalService("x".into()).http_status(), 502);
        assert_eq!(
            PortalError::Internal(anyhow::anyhow!("boom")).http_status(),
            500
        );
    }

    #[test]
    fn display_not_found_helper() {
        let e = PortalError::not_found("post", "abc");
        assert_eq!(e.to_string(), "not found: post abc");
    }

    #[test]
    fn display_conflict() {
        let e = PortalError::Conflict("slug 'hello' already exists".into());
        assert_eq!(e.to_string(), "conflict: slug 'hello' already exists");
    }

    #[test]
    fn display_internal() {
        let e = PortalError::Internal(anyhow::anyhow!("pool closed"));
        assert_eq!(e.to_string(), "internal: pool closed");
    }
}

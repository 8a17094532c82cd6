//! Per-transaction actor context and driver error mapping.
//!
//! The context is written with `set_config(.., true)`, so it lives exactly as
//! long as the transaction and never leaks to the next pooled connection.

use anyhow::anyhow;
use sqlx::{PgPool, Postgres, Transaction};

use portal_core::context::ActorContext;
use portal_core::error::PortalError;
use portal_core::ports::Result;

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Open a transaction with `app.actor_id` and `app.actor_role` set for the
/// row-security functions in the schema.
pub async fn begin_stamped<'a>(pool: &'a PgPool, ctx: &ActorContext) -> Result<Transaction<'a, Postgres>> {
    let mut tx = pool.begin().await.map_err(|e| anyhow!(e))?;
    let actor_id = ctx.actor_id.map(|id| id.to_string()).unwrap_or_default();

    sqlx::query("SELECT set_config('app.actor_id', $1, true), set_config('app.actor_role', $2, true)")
        .bind(actor_id)
        .bind(ctx.role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

    Ok(tx)
}

pub async fn commit(tx: Transaction<'_, Postgres>) -> Result<()> {
    tx.commit().await.map_err(|e| anyhow!(e))?;
    Ok(())
}

/// Map constraint failures onto the domain taxonomy; everything else is internal.
pub fn db_error(e: sqlx::Error) -> PortalError {
    if let sqlx::Error::Database(db) = &e {
        let constraint = db.constraint().unwrap_or("constraint").to_string();
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return PortalError::Conflict(match constraint.as_str() {
                    "posts_slug_key" => "slug already exists".to_string(),
                    other => format!("duplicate value violates {other}"),
                })
            }
            Some(CHECK_VIOLATION) => {
                return PortalError::Validation(format!("value violates {constraint}"))
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return PortalError::NotFound(format!("parent row for {constraint}"))
            }
            _ => {}
        }
    }
    PortalError::Internal(anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_internal() {
        let err = db_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, PortalError::Internal(_)));
        assert_eq!(err.http_status(), 500);
    }
}

//! PostgreSQL adapter for the advisory portal workflow core.

use std::sync::Arc;

use portal_core::WorkflowService;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

pub mod sqlx_types;
pub mod stamp;
pub mod store;

pub use store::{PgLeadStore, PgPostStore, PgReviewStore};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Service wired to all three Postgres stores over one pool.
pub fn workflow_service(pool: PgPool) -> WorkflowService {
    WorkflowService::new(
        Arc::new(PgPostStore::new(pool.clone())),
        Arc::new(PgLeadStore::new(pool.clone())),
        Arc::new(PgReviewStore::new(pool)),
    )
}

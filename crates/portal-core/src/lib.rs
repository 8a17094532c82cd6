//! Workflow core for the advisory portal: posts, leads and reviews moving
//! through named statuses behind a permission-checked repository.
//!
//! Pure domain types, port traits and gate logic. Storage adapters live in
//! `portal_postgres`; this crate never touches sqlx.

pub mod context;
pub mod derive;
pub mod error;
pub mod media;
pub mod memory;
pub mod permissions;
pub mod ports;
pub mod service;
pub mod types;

pub use context::{ActorContext, Role};
pub use error::PortalError;
pub use service::WorkflowService;

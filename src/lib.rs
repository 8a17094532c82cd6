//! Advisory portal workflow layer.
//!
//! Re-exports the workflow core and adds the process-level pieces: config,
//! the Postgres connection manager, the HTTP media host and tracing setup.

pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod media;
pub mod telemetry;

pub use portal_core::{context, derive, error, permissions, types};
pub use portal_core::{ActorContext, PortalError, Role, WorkflowService};

use std::sync::Arc;

use config::PortalConfig;
use media::HttpMediaHost;

/// Attach the configured media host, if any, to `service`.
pub fn with_configured_media(
    service: WorkflowService,
    config: &PortalConfig,
) -> Result<WorkflowService, PortalError> {
    match config.media.as_ref() {
        Some(media) => Ok(service.with_media(Arc::new(HttpMediaHost::new(media)?))),
        None => Ok(service),
    }
}

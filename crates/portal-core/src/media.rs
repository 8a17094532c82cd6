//! Media host port.
//!
//! The host itself is a third-party service; this module only fixes the
//! contract the repository consumes. `advisory_portal::media` has the HTTP
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PortalError;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media host unreachable: {0}")]
    Unreachable(String),

    #[error("media host rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("media not found: {0}")]
    NotFound(String),

    #[error("invalid media response: {0}")]
    InvalidResponse(String),

    #[error("media host not configured")]
    NotConfigured,
}

impl From<MediaError> for PortalError {
    fn from(e: MediaError) -> Self {
        PortalError::ExternalService(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub folder: Option<String>,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub id: String,
    pub url: String,
    pub download_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub file_size: Option<u64>,
    pub file_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<String>,
    pub quality: Option<u8>,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: MediaFile, options: UploadOptions) -> Result<UploadedMedia, MediaError>;

    async fn delete(&self, media_id: &str) -> Result<(), MediaError>;

    /// Delivery URL for a resized/cropped variant. No network round trip.
    fn transform_url(&self, media_id: &str, options: &TransformOptions) -> Result<String, MediaError>;
}

//! HTTP client for the media host.
//!
//! Uploads are multipart `POST {base}/files`, deletes are
//! `DELETE {base}/files/{id}`, and delivery URLs are built locally as
//! `{base}/files/{id}/content?w=&h=&c=&q=`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use url::Url;

use portal_core::media::{MediaError, MediaFile, MediaHost, TransformOptions, UploadOptions, UploadedMedia};

use crate::config::MediaConfig;

pub struct HttpMediaHost {
    http: Client,
    base: Url,
    api_key: String,
    default_folder: String,
}

impl HttpMediaHost {
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MediaError::Unreachable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base: with_trailing_slash(config.api_url.clone()),
            api_key: config.api_key.clone(),
            default_folder: config.folder.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, MediaError> {
        self.base
            .join(path)
            .map_err(|e| MediaError::InvalidResponse(format!("bad media path '{path}': {e}")))
    }

    fn folder_for(&self, requested: Option<&str>) -> String {
        match requested {
            Some(sub) => format!("{}/{}", self.default_folder, sub.trim_matches('/')),
            None => self.default_folder.clone(),
        }
    }
}

/// `Url::join` drops the last path segment unless the base ends in '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn rejected(response: reqwest::Response) -> MediaError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    MediaError::Rejected {
        status,
        message: body.chars().take(200).collect(),
    }
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(&self, file: MediaFile, options: UploadOptions) -> Result<UploadedMedia, MediaError> {
        let url = self.endpoint("files")?;
        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| MediaError::Rejected {
                status: 0,
                message: format!("invalid content type '{}': {e}", file.content_type),
            })?;

        let mut form = Form::new()
            .part("file", part)
            .text("fileName", file.file_name.clone())
            .text("folder", self.folder_for(options.folder.as_deref()))
            .text("isPrivateFile", options.private.to_string());
        if !options.tags.is_empty() {
            form = form.text("tags", options.tags.join(","));
        }
        if let Some(title) = options.title {
            form = form.text("title", title);
        }
        if let Some(description) = options.description {
            form = form.text("description", description);
        }

        debug!(file_name = %file.file_name, size, "uploading media");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let uploaded: UploadedMedia = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;
        info!(media_id = %uploaded.id, file_name = %file.file_name, "uploaded media");
        Ok(uploaded)
    }

    async fn delete(&self, media_id: &str) -> Result<(), MediaError> {
        let url = self.endpoint(&format!("files/{media_id}"))?;
        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| MediaError::Unreachable(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {
                info!(media_id, "deleted media");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(MediaError::NotFound(media_id.to_string())),
            _ => Err(rejected(response).await),
        }
    }

    fn transform_url(&self, media_id: &str, options: &TransformOptions) -> Result<String, MediaError> {
        let mut url = self.endpoint(&format!("files/{media_id}/content"))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(w) = options.width {
                query.append_pair("w", &w.to_string());
            }
            if let Some(h) = options.height {
                query.append_pair("h", &h.to_string());
            }
            if let Some(crop) = options.crop.as_deref() {
                query.append_pair("c", crop);
            }
            if let Some(q) = options.quality {
                query.append_pair("q", &q.to_string());
            }
        }
        // An empty query_pairs_mut() still leaves a bare '?'.
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url.to_string())
    }
}

//! Environment-driven configuration.
//!
//! `.env` is loaded first (if present) so local runs and the admin binary see
//! the same variables as a deployed process.

use std::time::Duration;

#[cfg(feature = "database")]
use crate::database::DatabaseConfig;

pub const DEFAULT_MEDIA_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MEDIA_FOLDER: &str = "advisory-portal";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is set but empty")]
    Empty { var: &'static str },

    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Media host settings. Absent `MEDIA_API_URL` means no host.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    pub api_url: url::Url,
    pub api_key: String,
    pub timeout: Duration,
    pub folder: String,
}

impl MediaConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = lookup("MEDIA_API_URL") else {
            return Ok(None);
        };
        if raw_url.trim().is_empty() {
            return Err(ConfigError::Empty { var: "MEDIA_API_URL" });
        }
        let api_url = url::Url::parse(raw_url.trim()).map_err(|_| ConfigError::Invalid {
            var: "MEDIA_API_URL",
            expected: "an absolute URL",
            value: raw_url.clone(),
        })?;

        let api_key = lookup("MEDIA_API_KEY").unwrap_or_default();

        let timeout = match lookup("MEDIA_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "MEDIA_TIMEOUT_SECS",
                expected: "a whole number of seconds",
                value: raw.clone(),
            })?,
            None => DEFAULT_MEDIA_TIMEOUT_SECS,
        };

        let folder = lookup("MEDIA_FOLDER")
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_MEDIA_FOLDER.to_string());

        Ok(Some(Self {
            api_url,
            api_key,
            timeout: Duration::from_secs(timeout),
            folder,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    #[cfg(feature = "database")]
    pub database: DatabaseConfig,
    pub media: Option<MediaConfig>,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(Self {
            #[cfg(feature = "database")]
            database: DatabaseConfig::default(),
            media: MediaConfig::from_env()?,
        })
    }
}

// ABOUTME: Configuration for the job poller, loaded from an optional TOML file
// ABOUTME: Command-line flags override file values before validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::PollerError;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the media service, without the `/API` suffix.
    pub vidispine_url: Option<String>,
    pub project_service_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Values present in `overrides` replace the ones loaded from file.
    pub fn merge(mut self, overrides: Config) -> Self {
        if overrides.vidispine_url.is_some() {
            self.vidispine_url = overrides.vidispine_url;
        }
        if overrides.project_service_url.is_some() {
            self.project_service_url = overrides.project_service_url;
        }
        if overrides.request_timeout_secs.is_some() {
            self.request_timeout_secs = overrides.request_timeout_secs;
        }
        self
    }

    pub fn vidispine_url(&self) -> Result<&str, PollerError> {
        match self.vidispine_url.as_deref() {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(url),
            Some(url) => Err(PollerError::Config(format!(
                "vidispine_url must be an http(s) URL, got '{}'",
                url
            ))),
            None => Err(PollerError::Config(
                "vidispine_url is not set; pass --vidispine-url or add it to the config file"
                    .to_string(),
            )),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

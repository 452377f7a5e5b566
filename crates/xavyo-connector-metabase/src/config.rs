//! Metabase connector configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::{MetabaseError, MetabaseResult};

/// Largest page Metabase will serve for user listings.
pub(crate) const MAX_PAGE_SIZE: u32 = 1000;

/// Connection settings for a Metabase instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetabaseConfig {
    /// Instance URL, e.g. `https://metabase.example.com`.
    pub base_url: String,

    /// Users fetched per page when the host does not ask for a size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for 502/503/504 responses. Rate-limited calls are never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_page_size() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl MetabaseConfig {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> MetabaseConfigBuilder {
        MetabaseConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `MetabaseError::Config` naming the offending setting.
    pub fn validate(&self) -> MetabaseResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| MetabaseError::Config(format!("base_url is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MetabaseError::Config(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(MetabaseError::Config(format!(
                "page_size must be in 1..={MAX_PAGE_SIZE}"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(MetabaseError::Config("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Base URL with a trailing slash so relative API paths join under it.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse.
    pub fn api_base(&self) -> MetabaseResult<Url> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Builder for [`MetabaseConfig`].
#[derive(Debug, Default)]
pub struct MetabaseConfigBuilder {
    base_url: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

impl MetabaseConfigBuilder {
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is missing or any setting is invalid.
    pub fn build(self) -> MetabaseResult<MetabaseConfig> {
        let config = MetabaseConfig {
            base_url: self
                .base_url
                .ok_or_else(|| MetabaseError::Config("base_url is required".to_string()))?,
            page_size: self.page_size.unwrap_or_else(default_page_size),
            timeout_secs: self.timeout_secs.unwrap_or_else(default_timeout_secs),
            max_retries: self.max_retries.unwrap_or_else(default_max_retries),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Credentials for the Metabase API.
#[derive(Debug)]
pub struct MetabaseCredentials {
    /// API key sent in the `x-api-key` header.
    pub api_key: SecretString,
}

impl MetabaseCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
        }
    }
}

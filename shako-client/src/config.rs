use anyhow::{bail, Result};

/// Default base URL of the public API.
pub const DEFAULT_API_URL: &str = "https://v2.api.noroff.dev";

/// Connection settings for [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Resolve configuration from the environment.
    ///
    /// `SHAKO_API_URL` overrides the default base URL; `SHAKO_API_KEY`
    /// is required, since the service rejects unkeyed requests. The
    /// caller is expected to have loaded any `.env` file beforehand.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("SHAKO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = match std::env::var("SHAKO_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!("SHAKO_API_KEY is not set; create an API key and export it or add it to .env"),
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

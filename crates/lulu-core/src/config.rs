//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend base URL, request timeout, where the auth token is kept and the
//! last username used to log in.
//!
//! Configuration is stored at `~/.config/lulu/config.json`. The backend URL
//! can be overridden with the `LULU_BACKEND_URL` environment variable, which
//! is read once when the client is built.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "lulu";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_ENV: &str = "LULU_BACKEND_URL";

/// HTTP request timeout in seconds.
/// The backend is a small CRUD API; 30s fails fast enough for form submits.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the bearer token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; the token lives for the process only
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub token_storage: TokenStorage,
    pub last_username: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_storage: TokenStorage::default(),
            last_username: None,
        }
    }
}

/// Resolved settings for building an `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without trailing slash, e.g. `https://alpaca-lulu.ru`
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve the client settings, reading `LULU_BACKEND_URL` once.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let from_env = std::env::var(BACKEND_URL_ENV).ok();
        let base_url = resolve_backend_url(from_env.as_deref(), self.backend_url.as_deref())?;
        Ok(ClientConfig {
            base_url,
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        })
    }
}

/// Pick the backend URL: the environment wins over the config file.
pub fn resolve_backend_url(from_env: Option<&str>, from_file: Option<&str>) -> Result<String> {
    let raw = from_env
        .filter(|s| !s.trim().is_empty())
        .or(from_file.filter(|s| !s.trim().is_empty()))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No backend URL configured. Set {} or backend_url in the config file",
                BACKEND_URL_ENV
            )
        })?;
    normalize_base_url(raw)
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).with_context(|| format!("Invalid backend URL: {}", trimmed))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Backend URL must use http or https: {}", trimmed);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file() {
        let url = resolve_backend_url(Some("https://api.example.com"), Some("http://localhost:8001"))
            .unwrap();
        assert_eq!(url, "https://api.example.com");
    }

    #[test]
    fn test_falls_back_to_file_when_env_blank() {
        let url = resolve_backend_url(Some("  "), Some("http://localhost:8001/")).unwrap();
        assert_eq!(url, "http://localhost:8001");
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let err = resolve_backend_url(None, None).unwrap_err();
        assert!(err.to_string().contains(BACKEND_URL_ENV));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(resolve_backend_url(Some("ftp://farm.example"), None).is_err());
        assert!(resolve_backend_url(Some("not a url"), None).is_err());
    }

    #[test]
    fn test_config_defaults_when_fields_missing() {
        let config: Config = serde_json::from_str(r#"{"backend_url": "http://x"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.token_storage, TokenStorage::File);
        assert!(config.last_username.is_none());
    }

    #[test]
    fn test_token_storage_serialization() {
        let json = serde_json::to_string(&TokenStorage::Keyring).unwrap();
        assert_eq!(json, "\"keyring\"");
    }
}

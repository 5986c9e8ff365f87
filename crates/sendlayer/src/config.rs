//! Client configuration
//!
//! Supports loading the API key from (in order of priority):
//! 1. Runtime environment variables
//! 2. JSON file in the SendLayer config directory

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Credentials filename in the SendLayer config directory
const CREDENTIALS_FILE: &str = "credentials.json";

const API_KEY_VAR: &str = "SENDLAYER_API_KEY";
const BASE_URL_VAR: &str = "SENDLAYER_BASE_URL";

/// Immutable configuration shared by every call a client makes
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Upper bound for downloading a remote attachment
    pub attachment_timeout: Duration,
}

/// On-disk credential file format
#[derive(Deserialize)]
struct CredentialFile {
    api_key: String,
    base_url: Option<String>,
    attachment_timeout_ms: Option<u64>,
}

impl ClientConfig {
    /// Default SendLayer API base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://console.sendlayer.com/api/v1/";

    /// Default timeout for remote attachment downloads
    pub const DEFAULT_ATTACHMENT_TIMEOUT: Duration = Duration::from_millis(30_000);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            attachment_timeout: Self::DEFAULT_ATTACHMENT_TIMEOUT,
        }
    }

    /// Load configuration using the following priority:
    /// 1. Runtime environment variables (`SENDLAYER_API_KEY`, `SENDLAYER_BASE_URL`)
    /// 2. JSON file (~/.config/sendlayer/credentials.json)
    pub fn load() -> Result<Self> {
        if let Ok(config) = Self::from_env() {
            return Ok(config);
        }

        if config::config_exists(CREDENTIALS_FILE) {
            let creds: CredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Ok(Self::from_credential_file(creds));
        }

        anyhow::bail!(
            "No SendLayer API key found: set {} or create {}",
            API_KEY_VAR,
            Self::default_credentials_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| CREDENTIALS_FILE.to_string())
        )
    }

    /// Load configuration from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: CredentialFile = config::load_json_file(path)?;
        Ok(Self::from_credential_file(creds))
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: CredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Ok(Self::from_credential_file(creds))
    }

    fn from_credential_file(creds: CredentialFile) -> Self {
        let mut config = Self::new(creds.api_key);
        if let Some(base_url) = creds.base_url {
            config.base_url = base_url;
        }
        if let Some(ms) = creds.attachment_timeout_ms {
            config.attachment_timeout = Duration::from_millis(ms);
        }
        config
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .with_context(|| format!("{} environment variable not set", API_KEY_VAR))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Get the default credentials file path (~/.config/sendlayer/credentials.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }

    /// Check if an API key is available (env var or config file)
    pub fn is_available() -> bool {
        std::env::var(API_KEY_VAR).is_ok() || config::config_exists(CREDENTIALS_FILE)
    }
}

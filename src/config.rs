//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::ticket::AgentId;
use crate::{AppError, Result};

/// Keychain service name used for the API credential.
pub const KEYRING_SERVICE: &str = "ticket-inbox";

/// Environment variable consulted when the keychain has no API token.
pub const API_TOKEN_ENV: &str = "TICKET_INBOX_API_TOKEN";

/// Synchronization tuning knobs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Debounce delay before a repartition pass runs.
    #[serde(default = "default_repartition_delay_ms")]
    pub repartition_delay_ms: u64,
    /// Capacity of the bounded real-time event channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    /// Per-request timeout for the ticket API.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Longest accepted line on the real-time event feed.
    #[serde(default = "default_max_event_line_bytes")]
    pub max_event_line_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repartition_delay_ms: default_repartition_delay_ms(),
            event_channel_capacity: default_event_channel_capacity(),
            request_timeout_seconds: default_request_timeout_seconds(),
            max_event_line_bytes: default_max_event_line_bytes(),
        }
    }
}

fn default_repartition_delay_ms() -> u64 {
    100
}

fn default_event_channel_capacity() -> usize {
    256
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_max_event_line_bytes() -> usize {
    1_048_576
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Base URL of the ticket REST API (no trailing slash required).
    pub api_base_url: String,
    /// Agent this engine instance acts for.
    pub agent_id: AgentId,
    /// Chatbot the agent's organization routes tickets through.
    #[serde(default)]
    pub chatbot_id: Option<String>,
    /// Organization the agent belongs to.
    #[serde(default)]
    pub organization_id: Option<i64>,
    /// Synchronization settings.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Bearer token for the ticket API (populated at runtime).
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the API token from the OS keychain with env-var fallback.
    ///
    /// A missing token is not an error; the client then calls the API
    /// without an `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain lookup task panics.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.api_token = load_credential("api_token", API_TOKEN_ENV).await?;
        Ok(())
    }

    /// Debounce delay before a repartition pass.
    #[must_use]
    pub fn repartition_delay(&self) -> Duration {
        Duration::from_millis(self.sync.repartition_delay_ms)
    }

    /// Timeout applied to every ticket API request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.request_timeout_seconds)
    }

    fn validate(&mut self) -> Result<()> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(AppError::Config("api_base_url must not be empty".into()));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_base_url must be an http(s) url: {trimmed}"
            )));
        }
        self.api_base_url = trimmed.to_owned();

        if self.sync.event_channel_capacity == 0 {
            return Err(AppError::Config(
                "event_channel_capacity must be greater than zero".into(),
            ));
        }

        if self.sync.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "request_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.sync.max_event_line_bytes == 0 {
            return Err(AppError::Config(
                "max_event_line_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            debug!(key = keyring_key, ?err, "keychain lookup failed, trying env var");
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
        _ => {
            warn!(
                key = keyring_key,
                env = env_key,
                "no api token configured; calling the ticket api anonymously"
            );
            Ok(None)
        }
    }
}

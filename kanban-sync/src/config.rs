//! Session configuration loaded with figment.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. `kanban-sync.toml`, `kanban-sync.yaml`, `kanban-sync.json` in the given directory
//! 3. Environment variables prefixed with `KANBAN_SYNC_`

use crate::error::{Result, SyncError};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace};

/// File name stem searched for in the config directory
pub const CONFIG_FILE_STEM: &str = "kanban-sync";

/// Prefix for environment overrides, e.g. `KANBAN_SYNC_REMOTE_TIMEOUT_MS`
pub const ENV_PREFIX: &str = "KANBAN_SYNC_";

/// Settings for a board session and the gateways it talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Deadline for every remote call. A call that misses it counts as
    /// unavailable and its move is rolled back.
    pub remote_timeout_ms: u64,
    /// Capacity of the session command channel
    pub command_buffer: usize,
    /// Root of the REST API
    pub api_base_url: String,
    /// Token sent as `Authorization: Token <token>`
    pub api_token: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_timeout_ms: 10_000,
            command_buffer: 64,
            api_base_url: "http://localhost:8000".to_string(),
            api_token: None,
        }
    }
}

impl SyncConfig {
    /// Load from the current directory and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load from config files in `dir` and the environment
    pub fn load_from(dir: &Path) -> Result<Self> {
        debug!(dir = %dir.display(), "loading sync configuration");

        let config: Self = Self::figment(dir).extract()?;
        config.validate()?;

        trace!(?config, "sync configuration loaded");
        Ok(config)
    }

    fn figment(dir: &Path) -> Figment {
        let file = |ext: &str| dir.join(format!("{}.{}", CONFIG_FILE_STEM, ext));
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(file("toml")))
            .merge(Yaml::file(file("yaml")))
            .merge(Json::file(file("json")))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.remote_timeout_ms == 0 {
            return Err(SyncError::invalid_value(
                "remote_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.command_buffer == 0 {
            return Err(SyncError::invalid_value(
                "command_buffer",
                "must be greater than zero",
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(SyncError::invalid_value("api_base_url", "must not be empty"));
        }
        Ok(())
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    /// Set the per-call deadline. Durations past `u64::MAX` milliseconds saturate.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

//! Runtime configuration, read from environment variables.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/todos/";

/// What a failed toggle does to its optimistic flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleFailurePolicy {
    /// Leave the flipped status in place.
    #[default]
    KeepOptimistic,
    /// Restore the status the entity had before the toggle.
    RollBack,
}

/// Settings for the client and controller.
///
/// Recognised variables: `API_URL`, `REQUEST_TIMEOUT_SECS`,
/// `TOGGLE_ROLLBACK`, `FENCE_STALE_RESPONSES`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub toggle_rollback: bool,
    #[serde(default)]
    pub fence_stale_responses: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: None,
            toggle_rollback: false,
            fence_stale_responses: false,
        }
    }
}

impl SyncConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    pub fn from_environment(environment: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;

        let config: SyncConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that `api_url` is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidApiUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme `{other}`"),
            }),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn toggle_failure_policy(&self) -> ToggleFailurePolicy {
        if self.toggle_rollback {
            ToggleFailurePolicy::RollBack
        } else {
            ToggleFailurePolicy::KeepOptimistic
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

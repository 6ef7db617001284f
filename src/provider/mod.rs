pub mod registry;

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::api::client::HttpClient;
use crate::api::OxideApi;

// ─── Provider Configuration ─────────────────────────────────────────────────

/// Environment fallbacks for the API root URL, in precedence order.
const HOST_ENV_VARS: [&str; 2] = ["OXIDE_HOST", "OXIDE_TEST_HOST"];

/// Environment fallbacks for the bearer credential, in precedence order.
const TOKEN_ENV_VARS: [&str; 2] = ["OXIDE_TOKEN", "OXIDE_TEST_TOKEN"];

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("host must not be empty; set the host option or OXIDE_HOST")]
    MissingHost,

    #[error("host \"{0}\" must use an http or https scheme")]
    InvalidHostScheme(String),

    #[error("token must not be empty; set the token option or OXIDE_TOKEN")]
    MissingToken,

    #[error("failed to build API client: {0}")]
    Client(String),
}

/// User-supplied provider options; unset fields fall back to the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// URL of the root of the target server.
    pub host: Option<String>,
    /// Bearer credential; sensitive.
    pub token: Option<String>,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            host: first_env(&HOST_ENV_VARS),
            token: first_env(&TOKEN_ENV_VARS),
        }
    }

    /// Validate and fill from the environment. There is no production
    /// default for either option.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let host = self
            .host
            .clone()
            .filter(|h| !h.is_empty())
            .or_else(|| first_env(&HOST_ENV_VARS))
            .ok_or(ConfigError::MissingHost)?;
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(ConfigError::InvalidHostScheme(host));
        }

        let token = self
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| first_env(&TOKEN_ENV_VARS))
            .ok_or(ConfigError::MissingToken)?;

        Ok(ResolvedConfig { host, token })
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: String,
    pub token: String,
}

// ─── Provider Bootstrap ─────────────────────────────────────────────────────

/// Owns the process-wide API client, lazily constructed once per provider
/// configuration.
#[derive(Default)]
pub struct Provider {
    client: OnceLock<Arc<dyn OxideApi>>,
}

impl Provider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build (or reuse) the typed client for this configuration.
    pub fn client(&self, config: &ProviderConfig) -> Result<Arc<dyn OxideApi>, ConfigError> {
        if let Some(client) = self.client.get() {
            return Ok(client.clone());
        }
        let resolved = config.resolve()?;
        info!(host = %resolved.host, "configuring Oxide API client");
        let http = HttpClient::new(&resolved.host, &resolved.token)
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        let client: Arc<dyn OxideApi> = Arc::new(http);
        Ok(self.client.get_or_init(|| client).clone())
    }
}

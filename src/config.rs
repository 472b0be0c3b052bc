//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (e.g. a `--config <path>` CLI flag)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//!
//! With no file present the built-in defaults apply. Environment variables
//! then override file values:
//!
//! | Variable | Effect |
//! |---|---|
//! | `HUGINN_PROVIDER` | provider used when none is named |
//! | `HUGINN_BASE_URL` | base URL of the selected provider |
//! | `HUGINN_MODEL` | default model of the selected provider |
//! | `HUGINN_TIMEOUT_SECS` | per-attempt timeout |
//! | `HUGINN_MAX_RETRIES` | attempts per call |
//! | `HUGINN_API_KEY` | API key, taking precedence over provider variables |
//!
//! API keys are never read from the config file; each provider names the
//! environment variable that holds its key (`OPENAI_API_KEY` etc.).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::client::LlmClientBuilder;
use crate::providers::{AuthStyle, ProviderProfile, RequestShape, ResponsePath, RetryConfig};
use crate::{HuginnError, LlmClient, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Provider used when none is named explicitly (default: "openai").
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default)]
    pub client: ClientConfig,
    /// Per-provider overrides and custom provider definitions.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            client: ClientConfig::default(),
            providers: BTreeMap::new(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

/// Transport settings shared by every provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Per-attempt timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Attempts per call, including the first (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before the first retry in milliseconds (default: 1000).
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    /// Backoff ceiling in seconds (default: 30).
    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,
    /// Optional bound on a whole call, retries included.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_secs: default_backoff_max(),
            deadline_secs: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_backoff_max() -> u64 {
    30
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        let config = RetryConfig::new()
            .max_attempts(self.max_retries)
            .initial_delay(Duration::from_millis(self.backoff_base_ms))
            .max_delay(Duration::from_secs(self.backoff_max_secs));
        match self.deadline_secs {
            Some(secs) => config.deadline(Duration::from_secs(secs)),
            None => config,
        }
    }
}

/// Settings for one provider.
///
/// For built-in presets (`openai`, `anthropic`, `openrouter`, `ollama`) every
/// field is optional. Other names define custom providers and need at least
/// `base_url` and `default_model`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub auth: Option<AuthStyle>,
    #[serde(default)]
    pub request_shape: Option<RequestShape>,
    #[serde(default)]
    pub response_path: Option<ResponsePath>,
    /// Static headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Provider name → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(&str, &str)] = &[
    ("openai", "OPENAI_API_KEY"),
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("openrouter", "OPENROUTER_API_KEY"),
];

impl Config {
    /// Load configuration from the standard locations, falling back to the
    /// defaults when no file exists. Environment overrides are not applied;
    /// see [`with_env_overrides`](Self::with_env_overrides).
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            HuginnError::Configuration(msg) => {
                HuginnError::Configuration(format!("{msg} (in {path:?})"))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config: {e}"))
        })
    }

    /// Resolve the config file path, `None` when no candidate exists.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply `HUGINN_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `HUGINN_*` overrides from `env`.
    pub fn with_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(provider) = env("HUGINN_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(secs) = env("HUGINN_TIMEOUT_SECS") {
            self.client.timeout_secs = parse_env("HUGINN_TIMEOUT_SECS", &secs)?;
        }
        if let Some(n) = env("HUGINN_MAX_RETRIES") {
            self.client.max_retries = parse_env("HUGINN_MAX_RETRIES", &n)?;
        }

        let base_url = env("HUGINN_BASE_URL");
        let model = env("HUGINN_MODEL");
        if base_url.is_some() || model.is_some() {
            let entry = self
                .providers
                .entry(self.default_provider.clone())
                .or_default();
            if base_url.is_some() {
                entry.base_url = base_url;
            }
            if model.is_some() {
                entry.default_model = model;
            }
        }
        Ok(self)
    }

    /// API key for `provider`: `HUGINN_API_KEY`, then the provider's
    /// configured `api_key_env`, then the well-known variable for presets.
    pub fn api_key(&self, provider: &str, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        let configured = self
            .providers
            .get(provider)
            .and_then(|p| p.api_key_env.as_deref());
        let well_known = PROVIDER_ENV_VARS
            .iter()
            .find(|(name, _)| *name == provider)
            .map(|(_, var)| *var);

        std::iter::once("HUGINN_API_KEY")
            .chain(configured)
            .chain(well_known)
            .find_map(|var| env(var).filter(|v| !v.trim().is_empty()))
    }

    /// Build the [`ProviderProfile`] for `provider`, resolving its key from
    /// `env`.
    pub fn provider_profile(
        &self,
        provider: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderProfile> {
        let key = self.api_key(provider, &env);
        let overrides = self.providers.get(provider);

        let mut profile = match ProviderProfile::preset(provider, key.clone()) {
            Some(profile) => profile,
            None => {
                let custom = overrides.ok_or_else(|| {
                    HuginnError::Configuration(format!("unknown provider '{provider}'"))
                })?;
                let (Some(base_url), Some(model)) = (&custom.base_url, &custom.default_model)
                else {
                    return Err(HuginnError::Configuration(format!(
                        "custom provider '{provider}' needs base_url and default_model"
                    )));
                };
                let profile = ProviderProfile::custom(provider, base_url, model);
                match key {
                    Some(key) => profile.with_api_key(key),
                    None => profile,
                }
            }
        };

        if let Some(o) = overrides {
            if let Some(url) = &o.base_url {
                profile = profile.with_base_url(url);
            }
            if let Some(model) = &o.default_model {
                profile = profile.with_default_model(model);
            }
            if let Some(endpoint) = &o.endpoint {
                profile = profile.with_endpoint(endpoint);
            }
            if let Some(auth) = &o.auth {
                profile = profile.with_auth(auth.clone());
            }
            if let Some(shape) = o.request_shape {
                profile = profile.with_request_shape(shape);
            }
            if let Some(path) = &o.response_path {
                profile = profile.with_response_path(path.clone());
            }
            for (name, value) in &o.headers {
                profile = profile.with_header(name, value);
            }
        }
        Ok(profile)
    }

    /// A client builder for `provider` (or the default provider) with the
    /// configured timeout and retry policy.
    pub fn client_builder(
        &self,
        provider: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<LlmClientBuilder> {
        let name = provider.unwrap_or(self.default_provider.as_str());
        let profile = self.provider_profile(name, env)?;
        Ok(LlmClient::builder(profile)
            .timeout(self.client.timeout())
            .retry(self.client.retry_config()))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| HuginnError::Configuration(format!("invalid {name}={value:?}: {e}")))
}

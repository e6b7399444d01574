//! Configuration loading from perplexity.toml, `.env` and the environment.

use perplexity::{ClientConfig, DEFAULT_BASE_URL, redact};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const API_KEY_VAR: &str = "PERPLEXITY_API_KEY";
pub const BASE_URL_VAR: &str = "PERPLEXITY_BASE_URL";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API connection settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// API connection configuration.
#[derive(Default, Deserialize)]
pub struct ApiConfig {
    /// Perplexity API key (pplx-...). `PERPLEXITY_API_KEY` takes precedence.
    pub api_key: Option<String>,

    /// API root. `PERPLEXITY_BASE_URL` takes precedence.
    pub base_url: Option<String>,

    /// Overall request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key.as_deref().map(redact))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the client settings, preferring variables from `env`.
    ///
    /// Empty values count as unset. Fails when no API key is found anywhere.
    pub fn client_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig, ConfigError> {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        let non_empty = |v: &Option<String>| v.clone().filter(|v| !v.trim().is_empty());

        let api_key = lookup(API_KEY_VAR)
            .or_else(|| non_empty(&self.api.api_key))
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = lookup(BASE_URL_VAR)
            .or_else(|| non_empty(&self.api.base_url))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut config = ClientConfig::new(api_key.trim()).with_base_url(base_url);
        if let Some(secs) = self.api.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Load `.env` from the working directory, then from next to the executable.
///
/// Parent directories are not searched. Variables already set in the
/// environment are never overridden.
pub fn load_dotenv() {
    let cwd = std::env::current_dir().ok();
    let exe = std::env::current_exe().ok();

    for path in dotenv_paths(cwd.as_deref(), exe.as_deref()) {
        if !path.is_file() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => debug!(path = %path.display(), "loaded .env"),
            Err(e) => debug!(path = %path.display(), "ignoring .env: {e}"),
        }
    }
}

/// Candidate `.env` files in load order.
fn dotenv_paths(cwd: Option<&Path>, exe: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(cwd) = cwd {
        paths.push(cwd.join(".env"));
    }
    if let Some(dir) = exe.and_then(Path::parent) {
        let path = dir.join(".env");
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("PERPLEXITY_API_KEY environment variable required (or set api.api_key in the config file)")]
    MissingApiKey,
}

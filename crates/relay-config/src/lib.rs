//! Runtime configuration for the relay.
//!
//! This crate defines:
//!
//! - [`RelayConfig`] — Upstream URL, model, timeouts, bind address, CORS
//! - [`Profile`] — The two built-in deployments (`open` and `local`)
//! - [`CorsPolicy`] and [`WelcomePage`] — Transport-level switches
//!
//! Configuration is resolved in three layers: profile defaults, an optional
//! JSON file, then environment variables.
//!
//! # Environment
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `RELAY_PROFILE` | `open` (default) or `local` |
//! | `RELAY_CONFIG` | Path to a JSON file with any subset of the fields |
//! | `OLLAMA_URL` | Upstream base URL, e.g. `http://127.0.0.1:11434` |
//! | `OLLAMA_MODEL` | Model name passed to `/api/generate` |
//! | `RELAY_BIND` | Listen address |
//! | `RELAY_TIMEOUT_SECS` | Idle timeout for upstream reads |
//! | `RELAY_CORS` | `any` or `none` |
//!
//! # Example
//!
//! ```rust
//! use relay_config::{CorsPolicy, Profile, RelayConfig};
//!
//! let config = RelayConfig::for_profile(Profile::Local);
//! assert_eq!(config.model, "qwen2.5-coder:7b");
//! assert_eq!(config.cors, CorsPolicy::Disabled);
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default Ollama address.
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:11434";
/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Errors that can occur when loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON configuration.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment variable held an unusable value.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },

    /// The resolved configuration is not usable.
    #[error("Invalid config: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    fn invalid_env(key: &str, value: &str) -> Self {
        Self::InvalidEnv { key: key.to_string(), value: value.to_string() }
    }
}

/// Built-in deployment profiles.
///
/// | Profile | CORS | Model | `GET /` |
/// |---------|------|-------|---------|
/// | `Open` | any origin | `gemma3:1b` | status text |
/// | `Local` | disabled | `qwen2.5-coder:7b` | HTML chat page |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// API-only relay reachable from any browser origin.
    #[default]
    Open,
    /// Same-origin relay that serves its own chat page.
    Local,
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::invalid_env("RELAY_PROFILE", s)),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Local => "local",
        };
        write!(f, "{}", s)
    }
}

/// Cross-origin policy for the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorsPolicy {
    /// Allow any origin, method, and header.
    #[serde(rename = "any")]
    AllowAny,
    /// No CORS headers; browsers enforce same-origin.
    #[serde(rename = "none")]
    Disabled,
}

impl FromStr for CorsPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "all" | "*" => Ok(Self::AllowAny),
            "none" | "off" => Ok(Self::Disabled),
            _ => Err(ConfigError::invalid_env("RELAY_CORS", s)),
        }
    }
}

/// What `GET /` serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WelcomePage {
    /// Plain status line.
    Text,
    /// Bundled browser chat page.
    Html,
}

/// Fully resolved relay configuration.
///
/// Passed by value into the aggregator and server at construction, so
/// several configurations (e.g. one per test upstream) can coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub profile: Profile,
    /// Base URL of the Ollama server, without the `/api/...` path.
    pub upstream_url: String,
    /// Model sent with every generation request.
    pub model: String,
    pub bind_addr: String,
    /// Idle timeout, in milliseconds, while waiting for the response head or the next chunk.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub cors: CorsPolicy,
    pub welcome: WelcomePage,
}

/// Partial configuration as read from a JSON file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    upstream_url: Option<String>,
    model: Option<String>,
    bind_addr: Option<String>,
    request_timeout_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    cors: Option<CorsPolicy>,
    welcome: Option<WelcomePage>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

impl RelayConfig {
    /// Returns the defaults for a built-in profile.
    pub fn for_profile(profile: Profile) -> Self {
        let (model, cors, welcome) = match profile {
            Profile::Open => ("gemma3:1b", CorsPolicy::AllowAny, WelcomePage::Text),
            Profile::Local => ("qwen2.5-coder:7b", CorsPolicy::Disabled, WelcomePage::Html),
        };

        Self {
            profile,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            model: model.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            cors,
            welcome,
        }
    }

    /// Returns a copy pointed at a different upstream.
    pub fn with_upstream(mut self, upstream_url: impl Into<String>) -> Self {
        self.upstream_url = upstream_url.into();
        self
    }

    /// Returns a copy with a different idle timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration using `lookup` in place of the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = match lookup("RELAY_PROFILE") {
            Some(raw) => raw.parse()?,
            None => Profile::default(),
        };
        let mut config = Self::for_profile(profile);

        if let Some(path) = lookup("RELAY_CONFIG") {
            config.apply_file(path)?;
        }

        if let Some(url) = lookup("OLLAMA_URL") {
            config.upstream_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            config.model = model;
        }
        if let Some(bind) = lookup("RELAY_BIND") {
            config.bind_addr = bind;
        }
        if let Some(raw) = lookup("RELAY_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env("RELAY_TIMEOUT_SECS", &raw))?;
            config.request_timeout_ms = secs.saturating_mul(1000);
        }
        if let Some(raw) = lookup("RELAY_CORS") {
            config.cors = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Overlays fields from a JSON file onto this configuration.
    pub fn apply_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        self.apply_json(&content)
    }

    /// Overlays fields from a JSON string onto this configuration.
    pub fn apply_json(&mut self, json: &str) -> Result<(), ConfigError> {
        let file: ConfigFile = serde_json::from_str(json)?;

        if let Some(v) = file.upstream_url {
            self.upstream_url = v;
        }
        if let Some(v) = file.model {
            self.model = v;
        }
        if let Some(v) = file.bind_addr {
            self.bind_addr = v;
        }
        if let Some(v) = file.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = file.connect_timeout_ms {
            self.connect_timeout_ms = v;
        }
        if let Some(v) = file.cors {
            self.cors = v;
        }
        if let Some(v) = file.welcome {
            self.welcome = v;
        }
        Ok(())
    }

    /// Checks that the configuration can drive a relay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Validation("model must not be empty".into()));
        }
        if !(self.upstream_url.starts_with("http://") || self.upstream_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "upstream_url must be an http(s) URL, got '{}'",
                self.upstream_url
            )));
        }
        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ConfigError::Validation("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    /// Full URL of the generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.upstream_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

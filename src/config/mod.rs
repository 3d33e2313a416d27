//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the `restapi` binary)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::session::{RedirectPolicy, Verify, DEFAULT_USER_AGENT};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Version discovery configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ApiError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| ApiError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`<config dir>/restapi/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("restapi").join("config.toml"))
    }

    /// Load configuration: the given file (or the default file when it
    /// exists), then environment overrides on top
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::from_file(default)?,
                _ => Self::default(),
            },
        };
        Ok(base.apply_env())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Apply environment variable overrides.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env(mut self) -> Self {
        // Session settings
        if let Ok(agent) = std::env::var("RESTAPI_USER_AGENT") {
            self.session.user_agent = if agent.is_empty() { None } else { Some(agent) };
        }
        if let Ok(redirect) = std::env::var("RESTAPI_REDIRECT") {
            if let Ok(redirect) = redirect.parse() {
                self.session.redirect = redirect;
            }
        }
        if let Ok(cacert) = std::env::var("RESTAPI_CACERT") {
            self.session.verify = Verify::CaBundle(PathBuf::from(cacert));
        }
        if let Ok(insecure) = std::env::var("RESTAPI_INSECURE") {
            if let Some(true) = parse_flag(&insecure) {
                self.session.verify = Verify::Disabled;
            }
        }
        if let Ok(timeout) = std::env::var("RESTAPI_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                self.session.timeout_secs = Some(timeout);
            }
        }

        // Discovery settings
        if let Ok(strict) = std::env::var("RESTAPI_STRICT") {
            if let Some(strict) = parse_flag(&strict) {
                self.discovery.strict = strict;
            }
        }
        if let Ok(workaround) = std::env::var("RESTAPI_WORKAROUND_URL_BUG") {
            if let Some(workaround) = parse_flag(&workaround) {
                self.discovery.workaround_url_bug = workaround;
            }
        }

        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// HTTP session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default User-Agent header (`None` = send no header)
    pub user_agent: Option<String>,

    /// Redirect policy: hop budget, or `true`/`false` for forever/never
    pub redirect: RedirectPolicy,

    /// Certificate verification: `true`/`false` or a CA bundle path
    pub verify: Verify,

    /// Request timeout in seconds (`None` = no timeout)
    pub timeout_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            redirect: RedirectPolicy::default(),
            verify: Verify::Enabled,
            timeout_secs: None,
        }
    }
}

impl SessionConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Version discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Disable URL munging (deprecated version suffix stripping)
    pub strict: bool,

    /// Rewrite self links that report a placeholder host
    pub workaround_url_bug: bool,

    /// Hosts servers report when left on their default bind address
    pub placeholder_hosts: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            strict: true,
            workaround_url_bug: true,
            placeholder_hosts: vec!["localhost".to_string()],
        }
    }
}

//! Per-request options and the session-wide policies they can override.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use super::DEFAULT_REDIRECT_LIMIT;
use crate::error::Result;

/// How many redirect hops a request may follow.
///
/// Configuration files and environment variables accept either an integer
/// (hop budget) or a boolean (`true` = follow forever, `false` = never).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RedirectSetting", into = "RedirectSetting")]
pub enum RedirectPolicy {
    /// Return the first redirect response as-is
    Never,
    /// Follow at most this many hops
    Limit(u32),
    /// Follow until a non-redirect response arrives
    Unlimited,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self::Limit(DEFAULT_REDIRECT_LIMIT)
    }
}

impl RedirectPolicy {
    /// Spend one hop of the budget.
    ///
    /// Returns `false` once the budget is exhausted, in which case the
    /// current redirect response must be returned unresolved.
    pub fn take_hop(&mut self) -> bool {
        match self {
            Self::Never => false,
            Self::Unlimited => true,
            Self::Limit(0) => false,
            Self::Limit(remaining) => {
                *remaining -= 1;
                true
            }
        }
    }
}

impl From<bool> for RedirectPolicy {
    fn from(follow: bool) -> Self {
        if follow {
            Self::Unlimited
        } else {
            Self::Never
        }
    }
}

impl From<u32> for RedirectPolicy {
    fn from(limit: u32) -> Self {
        Self::Limit(limit)
    }
}

impl std::str::FromStr for RedirectPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "forever" => Ok(Self::Unlimited),
            "false" | "no" | "never" => Ok(Self::Never),
            other => other
                .parse::<u32>()
                .map(Self::Limit)
                .map_err(|_| format!("Invalid redirect policy: {}", s)),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RedirectSetting {
    Flag(bool),
    Limit(u32),
}

impl From<RedirectSetting> for RedirectPolicy {
    fn from(setting: RedirectSetting) -> Self {
        match setting {
            RedirectSetting::Flag(follow) => follow.into(),
            RedirectSetting::Limit(limit) => limit.into(),
        }
    }
}

impl From<RedirectPolicy> for RedirectSetting {
    fn from(policy: RedirectPolicy) -> Self {
        match policy {
            RedirectPolicy::Never => Self::Flag(false),
            RedirectPolicy::Unlimited => Self::Flag(true),
            RedirectPolicy::Limit(limit) => Self::Limit(limit),
        }
    }
}

/// TLS certificate verification policy.
///
/// Accepts a boolean or a CA bundle path in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "VerifySetting", into = "VerifySetting")]
pub enum Verify {
    /// Verify against the system roots
    #[default]
    Enabled,
    /// Accept any certificate
    Disabled,
    /// Verify against the roots in this PEM bundle only
    CaBundle(PathBuf),
}

impl Verify {
    /// Whether certificate verification is switched off.
    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Whether the built-in root certificates are trusted.
    ///
    /// A CA bundle replaces them rather than extending them.
    pub fn trusts_built_in_roots(&self) -> bool {
        !matches!(self, Self::CaBundle(_))
    }
}

impl From<bool> for Verify {
    fn from(verify: bool) -> Self {
        if verify {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum VerifySetting {
    Flag(bool),
    Bundle(PathBuf),
}

impl From<VerifySetting> for Verify {
    fn from(setting: VerifySetting) -> Self {
        match setting {
            VerifySetting::Flag(verify) => verify.into(),
            VerifySetting::Bundle(path) => Self::CaBundle(path),
        }
    }
}

impl From<Verify> for VerifySetting {
    fn from(verify: Verify) -> Self {
        match verify {
            Verify::Enabled => Self::Flag(true),
            Verify::Disabled => Self::Flag(false),
            Verify::CaBundle(path) => Self::Bundle(path),
        }
    }
}

/// Options for a single [`Session::request`](super::Session::request) call.
///
/// Every field starts empty for each call; nothing is shared between
/// requests.
///
/// # Example
/// ```
/// use restapi::session::{RequestOptions, RedirectPolicy};
/// use serde_json::json;
///
/// let options = RequestOptions::new()
///     .json(json!({"hello": "world"}))
///     .param("limit", "10")
///     .redirect(RedirectPolicy::Never);
/// assert!(options.json.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Structured payload, serialized to JSON text. Wins over `data`.
    pub json: Option<serde_json::Value>,
    /// Raw body, used verbatim when no `json` payload is given
    pub data: Option<Bytes>,
    /// Caller-supplied headers
    pub headers: HeaderMap,
    /// Query parameters appended to the URL
    pub params: Vec<(String, String)>,
    /// User-Agent override, beats anything in `headers`
    pub user_agent: Option<String>,
    /// Redirect policy override
    pub redirect: Option<RedirectPolicy>,
    /// Certificate verification override
    pub verify: Option<Verify>,
    /// Per-request timeout handed to the HTTP client
    pub timeout: Option<Duration>,
    /// Leave the response body unread
    pub stream: bool,
}

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a structured JSON payload
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.json = Some(value);
        self
    }

    /// Set a raw body
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Add a header.
    ///
    /// Fails if the name or value cannot be encoded as an HTTP header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Replace all caller-supplied headers
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Append a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Override the User-Agent header
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the redirect policy
    pub fn redirect(mut self, policy: impl Into<RedirectPolicy>) -> Self {
        self.redirect = Some(policy.into());
        self
    }

    /// Override certificate verification
    pub fn verify(mut self, verify: impl Into<Verify>) -> Self {
        self.verify = Some(verify.into());
        self
    }

    /// Set a request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep the response body as an unread stream
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

//! Logged, redirect-aware HTTP session.
//!
//! [`Session`] wraps a blocking [`HttpClient`] and adds the behavior every
//! versioned REST API call needs:
//!
//! - JSON-encode a structured payload and force `Content-Type:
//!   application/json` (wins over any raw body)
//! - User-Agent precedence: per-call override > caller header > session
//!   default > no header
//! - Redirects are followed by the session itself, keeping the method and
//!   body on every hop
//! - Every request/response is logged at debug level as a `curl` command line
//!   and a status/header dump
//!
//! ## Redirect Handling
//!
//! | Policy              | Behavior                                    |
//! |---------------------|---------------------------------------------|
//! | `Limit(n)`          | Follow up to `n` hops, then return the last |
//! | `Never`             | Return the first response as-is             |
//! | `Unlimited`         | Follow until a non-redirect response        |
//!
//! Followed statuses: 301, 302, 303, 305, 307. A redirect without a
//! `Location` header is logged as a warning and returned unresolved. The
//! final response's [`history`](Response::history) lists the redirect
//! responses oldest first.
//!
//! # Usage
//!
//! ```rust,ignore
//! use restapi::config::SessionConfig;
//! use restapi::session::{RequestOptions, Session};
//! use serde_json::json;
//!
//! let session = Session::new(&SessionConfig::default())?;
//! let resp = session.post(
//!     "https://identity.example.com:5000/v3/auth/tokens",
//!     RequestOptions::new().json(json!({"auth": {}})),
//! )?;
//! println!("{} after {} redirects", resp.status(), resp.history().len());
//! ```

mod client;
mod log;
mod options;
mod response;

pub use client::{HttpClient, PreparedRequest, ReqwestClient};
pub use log::{render_curl, SessionLog};
pub use options::{RedirectPolicy, RequestOptions, Verify};
pub use response::{Response, ResponseBody};

#[cfg(test)]
pub(crate) use client::testing;

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use http::Method;
use url::Url;

use crate::auth::{AuthPlugin, NoAuth};
use crate::config::SessionConfig;
use crate::error::Result;

/// Default User-Agent header value
pub const DEFAULT_USER_AGENT: &str = concat!("restapi-rs/", env!("CARGO_PKG_VERSION"));

/// Default redirect hop budget
pub const DEFAULT_REDIRECT_LIMIT: u32 = 30;

/// Statuses the session follows as redirects
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 305, 307];

/// HTTP session for versioned REST APIs.
///
/// Holds no per-request state; one instance can serve any number of
/// sequential calls. It does no internal locking, so sharing it across
/// threads needs external synchronization.
pub struct Session {
    client: Arc<dyn HttpClient>,
    auth: Arc<dyn AuthPlugin>,
    user_agent: Option<String>,
    redirect: RedirectPolicy,
    verify: Verify,
    log: SessionLog,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_agent", &self.user_agent)
            .field("redirect", &self.redirect)
            .field("verify", &self.verify)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session backed by a blocking `reqwest` client
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = ReqwestClient::new(config.verify.clone(), config.timeout())?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a session on top of a custom HTTP client
    pub fn with_client(config: &SessionConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            auth: Arc::new(NoAuth),
            user_agent: config.user_agent.clone(),
            redirect: config.redirect,
            verify: config.verify.clone(),
            log: SessionLog::new(config.user_agent.as_deref()),
        }
    }

    /// Decorate every request with this auth plugin
    pub fn with_auth(mut self, auth: impl AuthPlugin + 'static) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    /// Default User-Agent
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Default redirect policy
    pub fn redirect_policy(&self) -> RedirectPolicy {
        self.redirect
    }

    /// Default certificate verification
    pub fn verify(&self) -> &Verify {
        &self.verify
    }

    /// Send a request, following redirects according to the effective policy.
    ///
    /// Non-2xx responses are returned, not raised.
    pub fn request(&self, method: Method, url: &str, options: RequestOptions) -> Result<Response> {
        let RequestOptions {
            json,
            data,
            mut headers,
            params,
            user_agent,
            redirect,
            verify,
            timeout,
            stream,
        } = options;

        let body = match json {
            Some(value) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(Bytes::from(serde_json::to_vec(&value)?))
            }
            None => data,
        };

        if let Some(agent) = user_agent {
            headers.insert(USER_AGENT, HeaderValue::from_str(&agent)?);
        } else if let Some(agent) = &self.user_agent {
            if !headers.contains_key(USER_AGENT) {
                headers.insert(USER_AGENT, HeaderValue::from_str(agent)?);
            }
        }

        self.auth.authorize(&mut headers)?;

        let mut url = Url::parse(url)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }

        let request = PreparedRequest {
            method,
            url,
            headers,
            body,
            verify: verify.unwrap_or_else(|| self.verify.clone()),
            timeout,
            stream,
        };

        self.send(request, redirect.unwrap_or(self.redirect))
    }

    fn send(&self, mut request: PreparedRequest, mut budget: RedirectPolicy) -> Result<Response> {
        let mut history = Vec::new();

        loop {
            self.log.request(&request);
            let mut response = self.client.send(&request)?;
            self.log.response(&response);

            if !response.is_redirect() || !budget.take_hop() {
                response.set_history(history);
                return Ok(response);
            }

            let next = match response.location() {
                None => {
                    self.log.redirect_unresolved(&response, "new location was not provided");
                    None
                }
                Some(location) => match request.url.join(location) {
                    Ok(next) => Some(next),
                    Err(e) => {
                        self.log
                            .redirect_unresolved(&response, &format!("invalid location: {e}"));
                        None
                    }
                },
            };

            match next {
                Some(next) => {
                    tracing::debug!("Following {} redirect to {}", response.status(), next);
                    request.url = next;
                    history.push(response);
                }
                None => {
                    response.set_history(history);
                    return Ok(response);
                }
            }
        }
    }

    /// Send a GET request
    pub fn get(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::GET, url, options)
    }

    /// Send a HEAD request
    pub fn head(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::HEAD, url, options)
    }

    /// Send a POST request
    pub fn post(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::POST, url, options)
    }

    /// Send a PUT request
    pub fn put(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::PUT, url, options)
    }

    /// Send a PATCH request
    pub fn patch(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::PATCH, url, options)
    }

    /// Send a DELETE request
    pub fn delete(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::DELETE, url, options)
    }

    /// Send an OPTIONS request
    pub fn options(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::OPTIONS, url, options)
    }
}

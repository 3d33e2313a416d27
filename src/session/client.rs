//! The HTTP primitive underneath [`Session`](super::Session).
//!
//! [`HttpClient`] sends exactly one request and never follows redirects;
//! redirect handling, header composition and logging all live in the
//! session. [`ReqwestClient`] is the default implementation.

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

use super::options::Verify;
use super::response::Response;
use crate::error::{ApiError, Result};

/// A fully composed request, ready to hand to an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL, query parameters included
    pub url: Url,
    /// Final header set
    pub headers: HeaderMap,
    /// Encoded body
    pub body: Option<Bytes>,
    /// Certificate verification for this request
    pub verify: Verify,
    /// Per-request timeout
    pub timeout: Option<Duration>,
    /// Leave the response body unread
    pub stream: bool,
}

/// Sends a single HTTP request.
///
/// Implementations must not follow redirects themselves.
pub trait HttpClient: Send + Sync {
    /// Send the request and return the raw response.
    ///
    /// An unreachable host must be reported as
    /// [`ApiError::Connection`]; version discovery relies on that to tell
    /// connectivity failures apart from everything else.
    fn send(&self, request: &PreparedRequest) -> Result<Response>;
}

/// Blocking `reqwest` client with automatic redirects disabled.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    verify: Verify,
    timeout: Option<Duration>,
}

impl ReqwestClient {
    /// Build a client for the given verification policy and default timeout
    pub fn new(verify: Verify, timeout: Option<Duration>) -> Result<Self> {
        let client = Self::build(&verify, timeout)?;
        Ok(Self {
            client,
            verify,
            timeout,
        })
    }

    fn build(verify: &Verify, timeout: Option<Duration>) -> Result<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .tls_built_in_root_certs(verify.trusts_built_in_roots());

        match verify {
            Verify::Enabled => {}
            Verify::Disabled => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            Verify::CaBundle(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    ApiError::Config(format!("Failed to read CA bundle {}: {e}", path.display()))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem)?;
                builder = builder.add_root_certificate(cert);
            }
        }

        Ok(builder.build()?)
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &PreparedRequest) -> Result<Response> {
        // TLS settings are fixed per reqwest client
        let client = if request.verify == self.verify {
            Cow::Borrowed(&self.client)
        } else {
            Cow::Owned(Self::build(&request.verify, self.timeout)?)
        };

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.to_vec());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send()?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();

        let response = Response::new(status, url).with_headers(headers);
        if request.stream {
            Ok(response.with_reader(resp))
        } else {
            Ok(response.with_body(resp.bytes()?))
        }
    }
}


#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub(crate) struct ScriptedClient {
        replies: Mutex<VecDeque<Result<Response>>>,
        requests: Mutex<Vec<PreparedRequest>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(replies: Vec<Result<Response>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn requests(&self) -> Vec<PreparedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpClient for ScriptedClient {
        fn send(&self, request: &PreparedRequest) -> Result<Response> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted reply left");
            reply.map(|resp| resp.with_url(request.url.clone()))
        }
    }
}

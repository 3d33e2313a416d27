//! Debug logging of requests and responses.
//!
//! Requests are rendered as an equivalent `curl` command line so they can be
//! replayed by hand.

use std::borrow::Cow;

use tracing::Span;

use super::client::PreparedRequest;
use super::response::Response;

/// Request/response logger owned by a [`Session`](super::Session).
///
/// Created once with the session. Every event is emitted under the
/// session's `restapi_session` span.
#[derive(Debug, Clone)]
pub struct SessionLog {
    span: Span,
}

impl SessionLog {
    /// Create a logger whose span records the session's user agent
    pub fn new(user_agent: Option<&str>) -> Self {
        Self {
            span: tracing::debug_span!("restapi_session", user_agent = user_agent.unwrap_or("-")),
        }
    }

    /// Log a request just before dispatch
    pub fn request(&self, request: &PreparedRequest) {
        tracing::debug!(parent: &self.span, "REQ: {}", render_curl(request));
        if let Some(body) = &request.body {
            tracing::debug!(parent: &self.span, "REQ BODY: {:?}", String::from_utf8_lossy(body));
        }
    }

    /// Log a response as received.
    ///
    /// The body is only logged when it is already in memory; a streamed body
    /// is never read just for diagnostics.
    pub fn response(&self, response: &Response) {
        tracing::debug!(
            parent: &self.span,
            "RESP: [{}] {:?}",
            response.status().as_u16(),
            response.headers()
        );
        if let Some(text) = response.body_text() {
            tracing::debug!(parent: &self.span, "RESP BODY: {}", text);
            tracing::debug!(
                parent: &self.span,
                "encoding: {}",
                response.encoding().as_deref().unwrap_or("None")
            );
        }
    }

    /// Log a redirect that could not be followed
    pub fn redirect_unresolved(&self, response: &Response, reason: &str) {
        tracing::warn!(
            parent: &self.span,
            status = response.status().as_u16(),
            "Failed to redirect request to {}: {}",
            response.url(),
            reason
        );
    }
}

/// Placeholder printed instead of a sensitive header value
const REDACTED: &str = "***";

/// Render a request as a `curl` command line.
///
/// Header values marked sensitive (auth tokens) are masked.
pub fn render_curl(request: &PreparedRequest) -> String {
    let mut parts = vec![
        "curl -i".to_string(),
        format!("-X '{}'", request.method),
        format!("'{}'", request.url),
    ];

    if request.verify.is_insecure() {
        parts.push("--insecure".to_string());
    }

    for (name, value) in &request.headers {
        let shown = if value.is_sensitive() {
            Cow::Borrowed(REDACTED)
        } else {
            String::from_utf8_lossy(value.as_bytes())
        };
        parts.push(format!("-H '{}: {}'", name, shown));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use http::header::{HeaderValue, USER_AGENT};
    use http::Method;
    use url::Url;

    use super::*;
    use crate::auth::{AuthPlugin, TokenAuth};
    use crate::session::Verify;

    fn request(verify: Verify) -> PreparedRequest {
        let mut headers = http::HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("test_rapi"));
        PreparedRequest {
            method: Method::POST,
            url: Url::parse("http://127.0.0.1:5000/v2.0/tokens?marker=a").unwrap(),
            headers,
            body: None,
            verify,
            timeout: None,
            stream: false,
        }
    }

    #[test]
    fn test_render_curl() {
        let line = render_curl(&request(Verify::Enabled));
        assert_eq!(
            line,
            "curl -i -X 'POST' 'http://127.0.0.1:5000/v2.0/tokens?marker=a' -H 'user-agent: test_rapi'"
        );
    }

    #[test]
    fn test_render_curl_insecure() {
        let line = render_curl(&request(Verify::Disabled));
        assert!(line.contains("--insecure"));

        let line = render_curl(&request(Verify::CaBundle("/etc/ca.pem".into())));
        assert!(!line.contains("--insecure"));
    }

    #[test]
    fn test_render_curl_masks_token() {
        let mut req = request(Verify::Enabled);
        TokenAuth::new("SUPERSECRET").authorize(&mut req.headers).unwrap();

        let line = render_curl(&req);
        assert!(line.contains("-H 'x-auth-token: ***'"));
        assert!(!line.contains("SUPERSECRET"));
        assert!(line.contains("-H 'user-agent: test_rapi'"));
    }
}

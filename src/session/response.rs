//! HTTP responses as returned by [`Session`](super::Session).

use std::borrow::Cow;
use std::fmt;
use std::io::Read;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use super::REDIRECT_STATUSES;
use crate::error::{ApiError, Result};

/// Response body, either already in memory or still on the wire.
pub enum ResponseBody {
    /// Body fully read into memory
    Buffered(Bytes),
    /// Body not read yet
    Streaming(Box<dyn Read + Send>),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            Self::Streaming(_) => write!(f, "Streaming"),
        }
    }
}

/// An HTTP response plus the redirect responses that led to it.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: ResponseBody,
    history: Vec<Response>,
}

impl Response {
    /// Create a response with no headers and an empty buffered body
    pub fn new(status: StatusCode, url: Url) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url,
            body: ResponseBody::Buffered(Bytes::new()),
            history: Vec::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace all headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set a buffered body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = ResponseBody::Buffered(body.into());
        self
    }

    /// Set an unread body
    pub fn with_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = ResponseBody::Streaming(Box::new(reader));
        self
    }

    /// Set the URL this response was received from
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub(crate) fn set_history(&mut self, history: Vec<Response>) {
        self.history = history;
    }

    /// Status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// URL this response was received from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Redirect responses that preceded this one, oldest first
    pub fn history(&self) -> &[Response] {
        &self.history
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check whether the status is one this crate follows as a redirect
    pub fn is_redirect(&self) -> bool {
        REDIRECT_STATUSES.contains(&self.status.as_u16())
    }

    /// Value of the `Location` header, if present and printable
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Charset declared by the `Content-Type` header
    pub fn encoding(&self) -> Option<String> {
        let content_type = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.trim().split_once('=')?;
            if key.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches('"').to_string())
            } else {
                None
            }
        })
    }

    /// Whether the body has already been read into memory
    pub fn is_buffered(&self) -> bool {
        matches!(self.body, ResponseBody::Buffered(_))
    }

    /// Buffered body bytes; `None` for a streamed body
    pub fn body(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Buffered(bytes) => Some(bytes),
            ResponseBody::Streaming(_) => None,
        }
    }

    /// Buffered body as text; `None` for a streamed body
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        self.body().map(|bytes| String::from_utf8_lossy(bytes))
    }

    /// Consume the response and return the full body, reading it if needed
    pub fn bytes(self) -> Result<Bytes> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Consume the response and return the body as text
    pub fn text(self) -> Result<String> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Consume the response and decode the body as JSON
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes()?;
        serde_json::from_slice(&bytes).map_err(ApiError::from)
    }

    /// Consume the response and return a reader over the body
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        match self.body {
            ResponseBody::Buffered(bytes) => Box::new(std::io::Cursor::new(bytes)),
            ResponseBody::Streaming(reader) => reader,
        }
    }
}

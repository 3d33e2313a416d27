//! Shared helpers for the end-to-end tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use restapi::session::{HttpClient, PreparedRequest, Response, Session};
use restapi::{ApiError, Result, SessionConfig};
use serde_json::Value;
use url::Url;

/// HTTP client that replays canned replies and records what it was sent
#[derive(Default)]
pub struct FakeClient {
    replies: Mutex<VecDeque<Result<Response>>>,
    sent: Mutex<Vec<PreparedRequest>>,
}

impl FakeClient {
    pub fn new(replies: Vec<Result<Response>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<PreparedRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.sent().iter().map(|r| r.url.to_string()).collect()
    }
}

impl HttpClient for FakeClient {
    fn send(&self, request: &PreparedRequest) -> Result<Response> {
        self.sent.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no reply scripted for request");
        reply.map(|resp| resp.with_url(request.url.clone()))
    }
}

fn placeholder_url() -> Url {
    Url::parse("http://placeholder.invalid/").unwrap()
}

/// Response with a JSON body
pub fn json_reply(status: u16, body: &Value) -> Result<Response> {
    Ok(Response::new(StatusCode::from_u16(status).unwrap(), placeholder_url())
        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .with_body(body.to_string()))
}

/// Response with a plain text body
pub fn text_reply(status: u16, body: &'static str) -> Result<Response> {
    Ok(Response::new(StatusCode::from_u16(status).unwrap(), placeholder_url()).with_body(body))
}

/// Redirect response pointing at `location`
pub fn redirect_reply(status: u16, location: &'static str) -> Result<Response> {
    Ok(Response::new(StatusCode::from_u16(status).unwrap(), placeholder_url())
        .with_header(LOCATION, HeaderValue::from_static(location)))
}

/// Transport failure, as a real client reports an unreachable host
pub fn refused(url: &str) -> Result<Response> {
    Err(ApiError::Connection {
        url: url.to_string(),
        message: "Connection refused".to_string(),
    })
}

/// Session over a [`FakeClient`] scripted with `replies`
pub fn fake_session(config: &SessionConfig, replies: Vec<Result<Response>>) -> (Session, Arc<FakeClient>) {
    let client = Arc::new(FakeClient::new(replies));
    (Session::with_client(config, client.clone()), client)
}

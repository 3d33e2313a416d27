//! Request authentication hooks.
//!
//! Acquiring and refreshing tokens is someone else's job. A [`Session`]
//! only asks its [`AuthPlugin`] to decorate each outgoing request.
//!
//! [`Session`]: crate::Session

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{ApiError, Result};

/// Header carrying an identity token
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Decorates outgoing requests with credentials.
///
/// Closures of the form `Fn(&mut HeaderMap) -> Result<()>` are plugins too.
pub trait AuthPlugin: Send + Sync {
    /// Add credentials to the request headers
    fn authorize(&self, headers: &mut HeaderMap) -> Result<()>;
}

impl<F> AuthPlugin for F
where
    F: Fn(&mut HeaderMap) -> Result<()> + Send + Sync,
{
    fn authorize(&self, headers: &mut HeaderMap) -> Result<()> {
        self(headers)
    }
}

/// Sends requests without credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthPlugin for NoAuth {
    fn authorize(&self, _headers: &mut HeaderMap) -> Result<()> {
        Ok(())
    }
}

/// Sends a pre-acquired token in the `X-Auth-Token` header
#[derive(Clone)]
pub struct TokenAuth {
    token: String,
}

impl TokenAuth {
    /// Wrap an already issued token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth").field("token", &"***").finish()
    }
}

impl AuthPlugin for TokenAuth {
    fn authorize(&self, headers: &mut HeaderMap) -> Result<()> {
        let mut value = HeaderValue::from_str(&self.token)
            .map_err(|e| ApiError::Auth(format!("Token is not a valid header value: {e}")))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), value);
        Ok(())
    }
}

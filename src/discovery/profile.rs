//! Per-service discovery quirks.
//!
//! Most services answer discovery the same way. The few that don't are
//! handled by a [`ServiceProfile`] carrying two hooks:
//!
//! - [`UrlCorrection`]: rewrite the discovery URL before probing
//! - [`ShapeAdapter`]: reshape the `versions` value before it is decoded
//!
//! [`ServiceProfile::identity`] bundles the identity service's legacy
//! behavior: old auth URLs that end in `/v2.0`, and a version list nested
//! under `{"versions": {"values": [...]}}`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

/// Version suffix old identity auth URLs carry
pub const DEPRECATED_IDENTITY_SUFFIX: &str = "v2.0";

/// Rewrites the discovery URL before it is probed.
pub trait UrlCorrection: Send + Sync {
    /// Return the URL to probe. `strict` disables any munging.
    fn correct(&self, api_url: &Url, strict: bool) -> Url;
}

/// Reshapes the raw `versions` value into a flat list.
pub trait ShapeAdapter: Send + Sync {
    /// Return the adjusted value
    fn adapt(&self, versions: Value) -> Value;
}

/// Probe the URL exactly as given
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrection;

impl UrlCorrection for NoCorrection {
    fn correct(&self, api_url: &Url, _strict: bool) -> Url {
        api_url.clone()
    }
}

/// Drop a deprecated version segment from the end of the path when not strict
#[derive(Debug, Clone)]
pub struct StripDeprecatedSuffix {
    suffix: String,
}

impl StripDeprecatedSuffix {
    /// Strip `suffix` when it is the last path segment
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl UrlCorrection for StripDeprecatedSuffix {
    fn correct(&self, api_url: &Url, strict: bool) -> Url {
        if strict {
            return api_url.clone();
        }

        let path = api_url.path().trim_end_matches('/');
        match path.rsplit_once('/') {
            Some((parent, last)) if last == self.suffix => {
                let mut corrected = api_url.clone();
                corrected.set_path(parent);
                corrected
            }
            _ => api_url.clone(),
        }
    }
}

/// Use the `versions` value untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatVersions;

impl ShapeAdapter for FlatVersions {
    fn adapt(&self, versions: Value) -> Value {
        versions
    }
}

/// Unwrap `{"values": [...]}` into the list it holds
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwrapValues;

impl ShapeAdapter for UnwrapValues {
    fn adapt(&self, versions: Value) -> Value {
        match versions {
            Value::Object(mut wrapper) if wrapper.contains_key("values") => {
                wrapper.remove("values").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}

/// Discovery behavior for one API family.
#[derive(Clone)]
pub struct ServiceProfile {
    api_name: String,
    url_correction: Arc<dyn UrlCorrection>,
    shape: Arc<dyn ShapeAdapter>,
}

impl fmt::Debug for ServiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProfile")
            .field("api_name", &self.api_name)
            .finish_non_exhaustive()
    }
}

impl Default for ServiceProfile {
    fn default() -> Self {
        Self::generic("base")
    }
}

impl ServiceProfile {
    /// Profile with no quirks
    pub fn generic(api_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            url_correction: Arc::new(NoCorrection),
            shape: Arc::new(FlatVersions),
        }
    }

    /// Identity service profile
    pub fn identity() -> Self {
        Self::generic("identity")
            .with_url_correction(StripDeprecatedSuffix::new(DEPRECATED_IDENTITY_SUFFIX))
            .with_shape_adapter(UnwrapValues)
    }

    /// Replace the URL correction hook
    pub fn with_url_correction(mut self, correction: impl UrlCorrection + 'static) -> Self {
        self.url_correction = Arc::new(correction);
        self
    }

    /// Replace the response shape adapter
    pub fn with_shape_adapter(mut self, adapter: impl ShapeAdapter + 'static) -> Self {
        self.shape = Arc::new(adapter);
        self
    }

    /// API family name given to every descriptor
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// URL to probe for `api_url`
    pub fn probe_url(&self, api_url: &Url, strict: bool) -> Url {
        self.url_correction.correct(api_url, strict)
    }

    /// Reshape a raw `versions` value
    pub fn adapt(&self, versions: Value) -> Value {
        self.shape.adapt(versions)
    }
}

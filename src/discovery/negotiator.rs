//! Version discovery and matching.

use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;

use super::profile::ServiceProfile;
use super::version::{ApiVersion, VersionEntry};
use crate::config::{DiscoveryConfig, SessionConfig};
use crate::error::{ApiError, Result};
use crate::session::{RequestOptions, Session};

/// A compatible (server, client) version pair.
///
/// Negotiation either yields both halves or nothing; there is no partial
/// match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMatch {
    /// Matched server version
    pub server: ApiVersion,
    /// Matched client version
    pub client: ApiVersion,
}

/// Parameters for one negotiation round trip.
///
/// # Example
/// ```rust,ignore
/// use restapi::discovery::{Negotiation, ServiceProfile};
///
/// let negotiator = Negotiation::new("http://keystone:5000/v2.0")
///     .clients(["2.0", "3"])
///     .strict(false)
///     .profile(ServiceProfile::identity())
///     .run(&session)?;
///
/// match negotiator.matched() {
///     Some(m) => println!("server {} / client {}", m.server.id, m.client.id),
///     None => println!("no compatible version"),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Negotiation {
    api_url: String,
    clients: Vec<String>,
    requested_version: Option<String>,
    strict: bool,
    workaround_url_bug: bool,
    placeholder_hosts: Vec<String>,
    profile: ServiceProfile,
    session_config: SessionConfig,
}

impl Negotiation {
    /// Negotiate against the discovery document at `api_url`
    pub fn new(api_url: impl Into<String>) -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            api_url: api_url.into(),
            clients: Vec::new(),
            requested_version: None,
            strict: defaults.strict,
            workaround_url_bug: defaults.workaround_url_bug,
            placeholder_hosts: defaults.placeholder_hosts,
            profile: ServiceProfile::default(),
            session_config: SessionConfig::default(),
        }
    }

    /// Versions the client supports
    pub fn clients<I, S>(mut self, clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clients = clients.into_iter().map(Into::into).collect();
        self
    }

    /// Only consider this client version
    pub fn requested_version(mut self, version: impl Into<String>) -> Self {
        self.requested_version = Some(version.into());
        self
    }

    /// Disallow URL munging
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Rewrite self links that report a placeholder host
    pub fn workaround_url_bug(mut self, workaround: bool) -> Self {
        self.workaround_url_bug = workaround;
        self
    }

    /// Hosts treated as placeholders by the URL workaround
    pub fn placeholder_hosts(mut self, hosts: Vec<String>) -> Self {
        self.placeholder_hosts = hosts;
        self
    }

    /// Apply `strict`, `workaround_url_bug` and `placeholder_hosts` from config
    pub fn discovery_config(self, config: &DiscoveryConfig) -> Self {
        self.strict(config.strict)
            .workaround_url_bug(config.workaround_url_bug)
            .placeholder_hosts(config.placeholder_hosts.clone())
    }

    /// Service-specific quirks
    pub fn profile(mut self, profile: ServiceProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Configuration for the session built by [`run_default`](Self::run_default)
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Run discovery and matching over `session`
    pub fn run(self, session: &Session) -> Result<VersionNegotiator> {
        VersionNegotiator::new(session, self)
    }

    /// Run discovery and matching over a freshly built session
    pub fn run_default(self) -> Result<VersionNegotiator> {
        let session = Session::new(&self.session_config)?;
        self.run(&session)
    }

    /// Client-side descriptors: just the requested version if one was
    /// given, otherwise one per supported version
    pub fn client_versions(&self) -> Vec<ApiVersion> {
        let name = self.profile.api_name();
        match &self.requested_version {
            Some(requested) => vec![ApiVersion::client(name, requested)],
            None => self
                .clients
                .iter()
                .map(|id| ApiVersion::client(name, id))
                .collect(),
        }
    }

    /// The URL actually probed, after the profile's URL correction
    pub fn probe_url(&self) -> Result<Url> {
        let api_url = Url::parse(&self.api_url)?;
        Ok(self.profile.probe_url(&api_url, self.strict))
    }

    /// Fetch the discovery document and flatten it into raw version entries.
    ///
    /// An unreachable server yields an empty list. A body that is not JSON,
    /// or whose version list cannot be decoded, is an error.
    pub fn query_server(&self, session: &Session) -> Result<Vec<VersionEntry>> {
        let probe = self.probe_url()?;
        tracing::debug!(api = self.profile.api_name(), url = %probe, "Querying API versions");

        let document = match session.get(probe.as_str(), RequestOptions::new()) {
            Ok(resp) => resp.json::<Value>()?,
            Err(e) if e.is_connection() => {
                tracing::debug!("Version discovery could not reach {}: {}", probe, e);
                Value::Object(Default::default())
            }
            Err(e) => return Err(e),
        };

        extract_versions(document, &self.profile)
    }

    /// Server-side descriptors, with self links corrected when enabled
    pub fn query_server_versions(&self, session: &Session) -> Result<Vec<ApiVersion>> {
        let probe = self.probe_url()?;
        let entries = self.query_server(session)?;

        let versions: Vec<ApiVersion> = entries
            .into_iter()
            .map(|entry| {
                let url = entry.self_link().map(|link| {
                    if self.workaround_url_bug {
                        correct_self_link(&link.href, &probe, &self.placeholder_hosts)
                    } else {
                        link.href.clone()
                    }
                });
                ApiVersion::server(self.profile.api_name(), entry, url)
            })
            .collect();

        tracing::debug!(
            api = self.profile.api_name(),
            count = versions.len(),
            "Server versions found"
        );
        Ok(versions)
    }
}

/// Pull the version list out of a discovery document.
///
/// Accepts `{"version": {...}}` and `{"versions": [...]}`; the profile's
/// shape adapter gets a chance to flatten anything else under `versions`.
/// A document with neither key is treated as advertising nothing.
fn extract_versions(document: Value, profile: &ServiceProfile) -> Result<Vec<VersionEntry>> {
    let mut document = match document {
        Value::Object(map) => map,
        _ => return Ok(Vec::new()),
    };

    let versions = if let Some(single) = document.remove("version") {
        Value::Array(vec![single])
    } else if let Some(versions) = document.remove("versions") {
        profile.adapt(versions)
    } else {
        return Ok(Vec::new());
    };

    if !versions.is_array() {
        return Err(ApiError::Discovery(format!(
            "expected a list of versions, got {}",
            json_kind(&versions)
        )));
    }

    Ok(serde_json::from_value(versions)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Replace a self link's scheme, host and port with those of the URL that
/// was actually queried, when the link reports a placeholder host.
///
/// Path, query and fragment of the link are kept. Links that do not parse
/// or name a real host are returned unchanged.
pub fn correct_self_link(href: &str, queried: &Url, placeholder_hosts: &[String]) -> String {
    let link = match Url::parse(href) {
        Ok(link) => link,
        Err(_) => return href.to_string(),
    };

    let is_placeholder = link
        .host_str()
        .is_some_and(|host| placeholder_hosts.iter().any(|p| p.eq_ignore_ascii_case(host)));
    if !is_placeholder {
        return href.to_string();
    }

    let mut corrected = queried.clone();
    corrected.set_path(link.path());
    corrected.set_query(link.query());
    corrected.set_fragment(link.fragment());
    corrected.to_string()
}

/// Pick the highest compatible version pair.
///
/// Client versions are tried highest first, each against the server
/// versions highest first. A pair matches when the major components are
/// equal and the client minor is not above the server minor. When two
/// descriptors on the same side share a key, the later one is kept.
pub fn match_versions(server: &[ApiVersion], client: &[ApiVersion]) -> Option<VersionMatch> {
    let servers: BTreeMap<String, &ApiVersion> = server.iter().map(|s| (s.key(), s)).collect();
    let clients: BTreeMap<String, &ApiVersion> = client.iter().map(|c| (c.key(), c)).collect();

    for cver in clients.values().rev() {
        for sver in servers.values().rev() {
            if cver.major() == sver.major() && cver.minor() <= sver.minor() {
                return Some(VersionMatch {
                    server: (*sver).clone(),
                    client: (*cver).clone(),
                });
            }
        }
    }

    None
}

/// Outcome of one discovery-and-match round trip.
///
/// Built by [`VersionNegotiator::new`] (or [`Negotiation::run`]), which
/// performs the whole exchange synchronously. No compatible pair is a
/// normal outcome: check [`matched`](Self::matched).
#[derive(Debug, Clone)]
pub struct VersionNegotiator {
    probe_url: Url,
    server_versions: Vec<ApiVersion>,
    client_versions: Vec<ApiVersion>,
    matched: Option<VersionMatch>,
}

impl VersionNegotiator {
    /// Query the server and match its versions against the client's
    pub fn new(session: &Session, negotiation: Negotiation) -> Result<Self> {
        let probe_url = negotiation.probe_url()?;
        let client_versions = negotiation.client_versions();
        let server_versions = negotiation.query_server_versions(session)?;
        let matched = match_versions(&server_versions, &client_versions);

        match &matched {
            Some(m) => tracing::info!(
                api = negotiation.profile.api_name(),
                server = %m.server.id,
                client = %m.client.id,
                "Negotiated API version"
            ),
            None => tracing::info!(
                api = negotiation.profile.api_name(),
                url = %probe_url,
                "No compatible API version"
            ),
        }

        Ok(Self {
            probe_url,
            server_versions,
            client_versions,
            matched,
        })
    }

    /// URL that was probed
    pub fn probe_url(&self) -> &Url {
        &self.probe_url
    }

    /// Every version the server advertised
    pub fn server_versions(&self) -> &[ApiVersion] {
        &self.server_versions
    }

    /// Every version the client offered
    pub fn client_versions(&self) -> &[ApiVersion] {
        &self.client_versions
    }

    /// The negotiated pair, if any
    pub fn matched(&self) -> Option<&VersionMatch> {
        self.matched.as_ref()
    }

    /// Matched server version
    pub fn server_version(&self) -> Option<&ApiVersion> {
        self.matched.as_ref().map(|m| &m.server)
    }

    /// Matched client version
    pub fn client_version(&self) -> Option<&ApiVersion> {
        self.matched.as_ref().map(|m| &m.client)
    }

    /// Consume the negotiator and return the negotiated pair
    pub fn into_match(self) -> Option<VersionMatch> {
        self.matched
    }
}

//! Comparable API version descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of numeric components a version key uses by default
/// (major/minor/patch)
pub const DEFAULT_VERSION_LENGTH: usize = 3;

/// A link advertised in a version entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL
    pub href: String,
    /// Relation, `self` for the canonical version URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Media type of the target
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// One entry of a discovery document, as the server sent it.
///
/// Fields other than `id`, `status` and `links` (`updated`,
/// `media-types`, ...) are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Version string, e.g. `v2.0`
    pub id: String,
    /// Server-reported status, e.g. `stable`
    #[serde(default)]
    pub status: Option<String>,
    /// Advertised links
    #[serde(default)]
    pub links: Vec<Link>,
    /// Everything else
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionEntry {
    /// The canonical version link (last link with `rel == "self"`)
    pub fn self_link(&self) -> Option<&Link> {
        self.links.iter().rfind(|link| link.rel.as_deref() == Some("self"))
    }
}

/// Normalized, comparable representation of one API version.
///
/// The version string is kept with any leading `v` removed. Comparisons
/// go through [`key`](Self::key), a fixed-width string whose lexicographic
/// order is the numeric version order.
///
/// # Example
/// ```
/// use restapi::discovery::ApiVersion;
///
/// let version = ApiVersion::client("identity", "v2.0");
/// assert_eq!(version.id, "2.0");
/// assert_eq!(version.version_list(), vec![2, 0, 0]);
/// assert_eq!(version.key(), "002000000");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiVersion {
    /// API family, e.g. `identity` or `compute`
    pub name: String,
    /// Version string without the leading `v`
    pub id: String,
    /// Server status; `None` for client-side versions
    pub status: Option<String>,
    /// Version-specific endpoint
    pub url: Option<String>,
    /// Links as advertised by the server
    pub links: Vec<Link>,
    /// Additional server-supplied fields
    pub extra: Map<String, Value>,
    #[serde(skip)]
    length: usize,
}

impl ApiVersion {
    /// Describe a version the client supports
    pub fn client(name: impl Into<String>, id: &str) -> Self {
        Self {
            name: name.into(),
            id: normalize(id),
            status: None,
            url: None,
            links: Vec::new(),
            extra: Map::new(),
            length: DEFAULT_VERSION_LENGTH,
        }
    }

    /// Describe a version the server advertised
    pub fn server(name: impl Into<String>, entry: VersionEntry, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            id: normalize(&entry.id),
            status: entry.status,
            url,
            links: entry.links,
            extra: entry.extra,
            length: DEFAULT_VERSION_LENGTH,
        }
    }

    /// Use `length` numeric components for comparisons
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Number of numeric components used for comparisons
    pub fn length(&self) -> usize {
        self.length
    }

    /// The version as exactly [`length`](Self::length) integers.
    ///
    /// Everything except digits and `.` is dropped before splitting on
    /// `.`; missing components are zero-filled, extra ones truncated.
    /// Empty components count as zero; components too large for a `u64`
    /// saturate at `u64::MAX`.
    pub fn version_list(&self) -> Vec<u64> {
        let cleaned: String = self
            .id
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        // Only digits remain, so a failed parse is an overflow
        let mut list: Vec<u64> = cleaned
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    0
                } else {
                    part.parse().unwrap_or(u64::MAX)
                }
            })
            .collect();
        list.resize(self.length, 0);
        list
    }

    /// Sortable key: each component zero-padded to three digits
    pub fn key(&self) -> String {
        self.version_list()
            .iter()
            .map(|v| format!("{v:03}"))
            .collect()
    }

    /// Major component
    pub fn major(&self) -> u64 {
        self.version_list().first().copied().unwrap_or(0)
    }

    /// Minor component
    pub fn minor(&self) -> u64 {
        self.version_list().get(1).copied().unwrap_or(0)
    }
}

fn normalize(id: &str) -> String {
    id.trim_start_matches('v').to_string()
}

impl PartialEq for ApiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.status == other.status
    }
}

impl Eq for ApiVersion {}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<ApiVersion {} {} {}>",
            self.name,
            self.id,
            self.status.as_deref().unwrap_or("None")
        )
    }
}

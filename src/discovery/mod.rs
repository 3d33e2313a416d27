//! API version discovery and negotiation.
//!
//! A versioned service publishes the versions it supports at its root URL,
//! either as a single `{"version": {...}}` object or a
//! `{"versions": [...]}` list. Negotiation fetches that document, turns each
//! entry into an [`ApiVersion`], and picks the highest pair compatible with
//! the versions the client supports.
//!
//! ## Matching
//!
//! Versions compare through a fixed-width key (`"2.0"` -> `002000000`).
//! Client versions are tried highest first against server versions highest
//! first; a pair matches when the majors are equal and the client minor is
//! not above the server minor.
//!
//! | Client       | Server         | Result            |
//! |--------------|----------------|-------------------|
//! | `2.0`, `3`   | `2.0`, `3.0`   | server 3.0 / 3    |
//! | `3`          | `2.0`          | no match          |
//! | `2.1`        | `2.0`          | no match          |
//!
//! No match is not an error: [`VersionNegotiator::matched`] is `None`.
//! A server that cannot be reached advertises nothing and likewise ends in
//! no match.
//!
//! ## Self Links
//!
//! Servers left on their default bind address advertise self links with a
//! placeholder host (`localhost`). With `workaround_url_bug` enabled those
//! links get the scheme, host and port of the URL that was queried.

mod negotiator;
mod profile;
mod version;

pub use negotiator::{
    correct_self_link, match_versions, Negotiation, VersionMatch, VersionNegotiator,
};
pub use profile::{
    FlatVersions, NoCorrection, ServiceProfile, ShapeAdapter, StripDeprecatedSuffix,
    UnwrapValues, UrlCorrection, DEPRECATED_IDENTITY_SUFFIX,
};
pub use version::{ApiVersion, Link, VersionEntry, DEFAULT_VERSION_LENGTH};

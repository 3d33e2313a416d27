//! # restapi - Versioned REST API Client Core
//!
//! Blocking HTTP session and API version negotiation for families of
//! versioned REST services.
//!
//! ## Features
//!
//! - **Logged session**: every request rendered as a `curl` command line at debug level
//! - **Manual redirects**: hop budget, method and body kept across hops, full history
//! - **Version discovery**: single-version and version-list documents, nested lists
//! - **Negotiation**: highest compatible (server, client) pair by major/minor rules
//! - **Pluggable auth**: token header or any request-decorating hook
//!
//! ## Architecture
//!
//! ```text
//!  caller
//!    |
//!    |  Negotiation::new(url).clients([...]).run(&session)
//!    v
//!  VersionNegotiator ---- GET <discovery url> ----> Session ----> HttpClient
//!    |                                                |
//!    |  ApiVersion (server) x ApiVersion (client)     |  redirects, logging,
//!    v                                                |  auth, User-Agent
//!  Option<VersionMatch>                               v
//!                                                   server
//! ```
//!
//! ## Quick Start
//!
//! ### Plain Requests
//!
//! ```rust,ignore
//! use restapi::{RequestOptions, Session, SessionConfig};
//!
//! let session = Session::new(&SessionConfig::default())?;
//! let resp = session.get("https://compute.example.com/v2/flavors", RequestOptions::new())?;
//! println!("{}: {}", resp.status(), resp.text()?);
//! ```
//!
//! ### Version Negotiation
//!
//! ```rust,ignore
//! use restapi::{Negotiation, ServiceProfile};
//!
//! let negotiator = Negotiation::new("https://identity.example.com:5000/v2.0")
//!     .clients(["2.0", "3"])
//!     .strict(false)
//!     .profile(ServiceProfile::identity())
//!     .run_default()?;
//!
//! if let Some(server) = negotiator.server_version() {
//!     println!("Using {} at {:?}", server, server.url);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`session`]: HTTP session, request options and responses
//! - [`discovery`]: Version descriptors, service profiles and negotiation
//! - [`auth`]: Request decoration hooks
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod session;

// Re-exports for convenience
pub use auth::{AuthPlugin, NoAuth, TokenAuth};
pub use config::{Config, DiscoveryConfig, SessionConfig};
pub use discovery::{
    match_versions, ApiVersion, Negotiation, ServiceProfile, VersionMatch, VersionNegotiator,
};
pub use error::{ApiError, Result};
pub use session::{HttpClient, RedirectPolicy, RequestOptions, Response, Session, Verify};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

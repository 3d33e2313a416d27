//! End-to-end version discovery tests.
//!
//! Each test scripts the discovery document a server would return and
//! checks which URL was probed and which (server, client) pair was chosen.

mod common;

use common::{fake_session, json_reply, refused, text_reply};
use proptest::prelude::*;
use restapi::discovery::{match_versions, ApiVersion, Negotiation, ServiceProfile};
use restapi::{ApiError, SessionConfig, VersionNegotiator};
use serde_json::{json, Value};

const CLIENT_VERSIONS: [&str; 3] = ["2.0", "2.1", "3"];

fn fapi_v2() -> Value {
    json!({
        "status": "stable",
        "updated": "2013-03-06T00:00:00Z",
        "media-types": [
            {"base": "application/json", "type": "application/vnd.openstack.identity-v2.0+json"},
            {"base": "application/xml", "type": "application/vnd.openstack.identity-v2.0+xml"}
        ],
        "id": "v2.0",
        "links": [
            {"href": "http://10.130.50.11:5000/v2.0/", "rel": "self"},
            {"href": "http://docs.openstack.org/api/openstack-identity-service/2.0/content/",
             "type": "text/html", "rel": "describedby"}
        ]
    })
}

fn fapi_v3() -> Value {
    json!({
        "status": "stable",
        "updated": "2013-03-06T00:00:00Z",
        "media-types": [
            {"base": "application/json", "type": "application/vnd.openstack.identity-v3+json"}
        ],
        "id": "v3.0",
        "links": [{"href": "http://10.130.50.11:35357/v3/", "rel": "self"}]
    })
}

fn fapi_all() -> Value {
    json!({"versions": [fapi_v2(), fapi_v3()]})
}

/// Run one negotiation against a scripted document; returns the negotiator
/// and the URL that was probed
fn check_versions(
    url: &str,
    status: u16,
    document: &Value,
    negotiation: impl FnOnce(Negotiation) -> Negotiation,
) -> (VersionNegotiator, String) {
    let (session, client) = fake_session(&SessionConfig::default(), vec![json_reply(status, document)]);
    let negotiation = negotiation(Negotiation::new(url).clients(CLIENT_VERSIONS));
    let negotiator = negotiation.run(&session).unwrap();

    let urls = client.urls();
    assert_eq!(urls.len(), 1, "discovery must issue exactly one GET");
    (negotiator, urls[0].clone())
}

fn ids(negotiator: &VersionNegotiator) -> Option<(String, String)> {
    negotiator
        .matched()
        .map(|m| (m.server.id.clone(), m.client.id.clone()))
}

fn pair(server: &str, client: &str) -> Option<(String, String)> {
    Some((server.to_string(), client.to_string()))
}

#[test]
fn test_root_url_lists_all_versions() {
    let (n, probed) = check_versions("http://keystone:5000", 300, &fapi_all(), |n| n);
    assert_eq!(probed, "http://keystone:5000/");
    assert_eq!(ids(&n), pair("3.0", "3"));
    assert_eq!(n.server_versions().len(), 2);

    let (n, _) = check_versions("http://keystone:5000", 300, &fapi_all(), |n| n.requested_version("2"));
    assert_eq!(ids(&n), pair("2.0", "2"));

    let (n, _) = check_versions("http://keystone:5000", 300, &fapi_all(), |n| n.requested_version("3"));
    assert_eq!(ids(&n), pair("3.0", "3"));
}

#[test]
fn test_strict_v2_url_probed_as_given() {
    for profile in [ServiceProfile::default(), ServiceProfile::identity()] {
        let doc = json!({"version": fapi_v2()});

        let (n, probed) = check_versions("http://keystone:5000/v2.0", 200, &doc, |n| {
            n.profile(profile.clone()).strict(true)
        });
        assert_eq!(probed, "http://keystone:5000/v2.0");
        assert_eq!(ids(&n), pair("2.0", "2.0"));

        let (n, _) = check_versions("http://keystone:5000/v2.0", 200, &doc, |n| {
            n.profile(profile.clone()).requested_version("2")
        });
        assert_eq!(ids(&n), pair("2.0", "2"));

        let (n, _) = check_versions("http://keystone:5000/v2.0", 200, &doc, |n| {
            n.profile(profile.clone()).requested_version("3")
        });
        assert!(n.matched().is_none());
        assert!(n.server_version().is_none());
        assert!(n.client_version().is_none());
    }
}

#[test]
fn test_identity_not_strict_strips_v2_suffix() {
    let doc = json!({"version": fapi_v2()});

    let (n, probed) = check_versions("http://keystone:5000/v2.0", 200, &doc, |n| {
        n.profile(ServiceProfile::identity()).strict(false)
    });
    assert_eq!(probed, "http://keystone:5000/");
    assert_eq!(ids(&n), pair("2.0", "2.0"));

    let (n, _) = check_versions("http://keystone:5000/v2.0", 200, &doc, |n| {
        n.profile(ServiceProfile::identity())
            .strict(false)
            .requested_version("3")
    });
    assert!(n.matched().is_none());
}

#[test]
fn test_generic_not_strict_keeps_url() {
    let doc = json!({"version": fapi_v2()});
    let (n, probed) = check_versions("http://keystone:5000/v2.0", 200, &doc, |n| n.strict(false));
    assert_eq!(probed, "http://keystone:5000/v2.0");
    assert_eq!(ids(&n), pair("2.0", "2.0"));
}

#[test]
fn test_v3_url() {
    let doc = json!({"version": fapi_v3()});

    let (n, probed) = check_versions("http://keystone:5000/v3", 200, &doc, |n| n);
    assert_eq!(probed, "http://keystone:5000/v3");
    assert_eq!(ids(&n), pair("3.0", "3"));

    let (n, _) = check_versions("http://keystone:5000/v3", 200, &doc, |n| n.requested_version("2"));
    assert!(n.matched().is_none());

    let (n, _) = check_versions("http://keystone:5000/v3", 200, &doc, |n| n.requested_version("3"));
    assert_eq!(ids(&n), pair("3.0", "3"));
    assert_eq!(
        n.server_version().unwrap().url.as_deref(),
        Some("http://10.130.50.11:35357/v3/")
    );
}

#[test]
fn test_identity_nested_values() {
    let doc = json!({"versions": {"values": [fapi_v3()]}});

    let (n, _) = check_versions("http://keystone:5000", 300, &doc, |n| {
        n.profile(ServiceProfile::identity())
    });
    assert_eq!(ids(&n), pair("3.0", "3"));

    let server = n.server_version().unwrap();
    assert_eq!(server.name, "identity");
    assert_eq!(server.status.as_deref(), Some("stable"));
    assert_eq!(server.extra["updated"], "2013-03-06T00:00:00Z");
}

#[test]
fn test_nested_values_rejected_without_identity_profile() {
    let doc = json!({"versions": {"values": [fapi_v3()]}});
    let (session, _) = fake_session(&SessionConfig::default(), vec![json_reply(300, &doc)]);

    let err = Negotiation::new("http://keystone:5000")
        .clients(CLIENT_VERSIONS)
        .run(&session)
        .unwrap_err();
    assert!(matches!(err, ApiError::Discovery(_)));
}

#[test]
fn test_localhost_self_link_rewritten() {
    let doc = json!({
        "version": {
            "id": "v3.0",
            "status": "stable",
            "links": [{"href": "http://localhost:5000/v3/", "rel": "self"}]
        }
    });

    let (n, _) = check_versions("https://id.example.com:5000/", 300, &doc, |n| n);
    assert_eq!(
        n.server_version().unwrap().url.as_deref(),
        Some("https://id.example.com:5000/v3/")
    );

    let (n, _) = check_versions("https://id.example.com:5000/", 300, &doc, |n| {
        n.workaround_url_bug(false)
    });
    assert_eq!(
        n.server_version().unwrap().url.as_deref(),
        Some("http://localhost:5000/v3/")
    );
}

#[test]
fn test_custom_placeholder_hosts() {
    let doc = json!({
        "version": {
            "id": "v3.0",
            "links": [{"href": "http://0.0.0.0:5000/v3/", "rel": "self"}]
        }
    });

    let (n, _) = check_versions("https://id.example.com/", 300, &doc, |n| {
        n.placeholder_hosts(vec!["localhost".to_string(), "0.0.0.0".to_string()])
    });
    assert_eq!(
        n.server_version().unwrap().url.as_deref(),
        Some("https://id.example.com/v3/")
    );
}

#[test]
fn test_connection_failure_means_no_match() {
    let (session, client) = fake_session(&SessionConfig::default(), vec![refused("http://keystone:5000/")]);

    let n = Negotiation::new("http://keystone:5000")
        .clients(CLIENT_VERSIONS)
        .run(&session)
        .unwrap();

    assert_eq!(client.sent().len(), 1);
    assert!(n.server_versions().is_empty());
    assert!(n.matched().is_none());
}

#[test]
fn test_malformed_document_is_an_error() {
    let (session, _) = fake_session(&SessionConfig::default(), vec![text_reply(200, "<html>oops</html>")]);
    let err = Negotiation::new("http://keystone:5000")
        .clients(CLIENT_VERSIONS)
        .run(&session)
        .unwrap_err();
    assert!(matches!(err, ApiError::Json(_)));

    let (session, _) = fake_session(
        &SessionConfig::default(),
        vec![json_reply(300, &json!({"versions": "v3.0"}))],
    );
    let err = Negotiation::new("http://keystone:5000")
        .clients(CLIENT_VERSIONS)
        .run(&session)
        .unwrap_err();
    assert!(matches!(err, ApiError::Discovery(_)));
}

#[test]
fn test_document_without_versions_is_empty() {
    let (n, _) = check_versions("http://keystone:5000", 404, &json!({"error": "not found"}), |n| n);
    assert!(n.server_versions().is_empty());
    assert!(n.matched().is_none());
}

#[test]
fn test_discovery_config_applied() {
    let config = restapi::DiscoveryConfig {
        strict: false,
        workaround_url_bug: false,
        placeholder_hosts: Vec::new(),
    };
    let doc = json!({"version": fapi_v2()});

    let (_, probed) = check_versions("http://keystone:5000/v2.0", 200, &doc, |n| {
        n.profile(ServiceProfile::identity()).discovery_config(&config)
    });
    assert_eq!(probed, "http://keystone:5000/");
}

#[test]
fn test_highest_compatible_pair() {
    let server: Vec<ApiVersion> = ["2.0", "3.0"].iter().map(|id| ApiVersion::client("x", id)).collect();
    let client: Vec<ApiVersion> = ["2.0", "3"].iter().map(|id| ApiVersion::client("x", id)).collect();
    let m = match_versions(&server, &client).unwrap();
    assert_eq!((m.server.id.as_str(), m.client.id.as_str()), ("3.0", "3"));

    let server = vec![ApiVersion::client("x", "2.0")];
    let client = vec![ApiVersion::client("x", "3")];
    assert!(match_versions(&server, &client).is_none());
}

proptest! {
    #[test]
    fn prop_key_order_matches_numeric_order(
        a in proptest::collection::vec(0u64..1000, 1..=3),
        b in proptest::collection::vec(0u64..1000, 1..=3),
    ) {
        let render = |v: &[u64]| v.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
        let va = ApiVersion::client("x", &render(&a));
        let vb = ApiVersion::client("x", &render(&b));
        prop_assert_eq!(va.key().cmp(&vb.key()), va.version_list().cmp(&vb.version_list()));
    }

    #[test]
    fn prop_match_is_all_or_nothing_and_compatible(
        servers in proptest::collection::vec((0u64..5, 0u64..5), 0..5),
        clients in proptest::collection::vec((0u64..5, 0u64..5), 0..5),
    ) {
        let build = |v: &[(u64, u64)]| -> Vec<ApiVersion> {
            v.iter().map(|(ma, mi)| ApiVersion::client("x", &format!("{ma}.{mi}"))).collect()
        };
        let server = build(&servers);
        let client = build(&clients);

        match match_versions(&server, &client) {
            Some(m) => {
                prop_assert_eq!(m.server.major(), m.client.major());
                prop_assert!(m.client.minor() <= m.server.minor());
                // No higher client version could have matched
                for c in &client {
                    if c.key() > m.client.key() {
                        prop_assert!(!server.iter().any(|s| s.major() == c.major() && c.minor() <= s.minor()));
                    }
                }
            }
            None => {
                for c in &client {
                    prop_assert!(!server.iter().any(|s| s.major() == c.major() && c.minor() <= s.minor()));
                }
            }
        }
    }
}

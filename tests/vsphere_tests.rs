//! vCenter REST adapter against a local routed server.

mod support;

use std::time::Duration;

use release_tagger::adapter::outbound::vsphere::{ConnectOptions, VsphereClient, SESSION_HEADER};
use release_tagger::domain::{
    Cardinality, CategoryId, CategorySpec, EntityRef, HostId, Tag, TagAssignment, TagCategory,
    TagId,
};
use release_tagger::error::Error;
use release_tagger::port::{InventoryProvider, Session, TagService};

use support::http::{route, MockServer};

const HOSTS: &str = r#"[
    {"host": "host-1", "name": "esx01.lab.local", "connection_state": "CONNECTED"},
    {"host": "host-2", "name": "esx02.lab.local", "connection_state": "DISCONNECTED"}
]"#;

const FORBIDDEN: &str = r#"{"error_type":"UNAUTHORIZED","messages":[{"id":"vapi.authz","default_message":"Permission denied"}]}"#;

fn client(server: &MockServer) -> VsphereClient {
    VsphereClient::new(&ConnectOptions {
        url: server.url().parse().unwrap(),
        insecure: false,
        timeout: Some(Duration::from_secs(5)),
    })
    .unwrap()
}

fn release_category() -> TagCategory {
    TagCategory {
        id: CategoryId::new("cat-1"),
        name: "tc_esxi_release_names".into(),
        description: String::new(),
        cardinality: Cardinality::Single,
    }
}

fn release_tag() -> Tag {
    Tag {
        id: TagId::new("tag-b"),
        name: "7.0_U3".into(),
        category_id: CategoryId::new("cat-1"),
        description: String::new(),
    }
}

// ==================== Session ====================

#[tokio::test]
async fn login_token_is_sent_on_later_requests() {
    let server = MockServer::start(vec![
        route("POST", "/api/session", 201, r#""tok-123""#),
        route("GET", "/api/session", 200, r#"{"user":"tagger@vsphere.local"}"#),
    ])
    .await;
    let client = client(&server);

    assert!(client.login("tagger@vsphere.local", "secret").await.unwrap());
    assert!(client.is_active().await.unwrap());

    let requests = server.requests();
    assert!(requests[0]
        .header("authorization")
        .is_some_and(|v| v.starts_with("Basic ")));
    assert_eq!(requests[1].header(SESSION_HEADER), Some("tok-123"));
}

#[tokio::test]
async fn rejected_token_makes_the_session_inactive() {
    let server = MockServer::start(vec![
        route("POST", "/api/session", 201, r#""tok-123""#),
        route("GET", "/api/session", 401, ""),
    ])
    .await;
    let client = client(&server);

    client.login("tagger", "secret").await.unwrap();

    assert!(!client.is_active().await.unwrap());
}

#[tokio::test]
async fn rejected_credentials_leave_no_session() {
    let server = MockServer::start(vec![route("POST", "/api/session", 401, "")]).await;
    let client = client(&server);

    assert!(!client.login("tagger", "wrong").await.unwrap());
    assert!(!client.is_active().await.unwrap());
    assert_eq!(server.targets(), vec!["POST /api/session"]);
}

#[tokio::test]
async fn session_server_error_is_a_connection_error() {
    let server = MockServer::start(vec![route("POST", "/api/session", 503, "")]).await;

    let err = client(&server).login("tagger", "secret").await.unwrap_err();

    assert!(matches!(err, Error::Connection(ref msg) if msg.contains("503")));
}

// ==================== Inventory ====================

#[tokio::test]
async fn hosts_are_listed_with_their_build() {
    let server = MockServer::start(vec![
        route("GET", "/api/vcenter/host?clusters=domain-c8", 200, HOSTS),
        route(
            "GET",
            "/api/esx/settings/hosts/host-1/software",
            200,
            r#"{"base_image": {"version": "7.0.3-0.105.22348816"}}"#,
        ),
    ])
    .await;

    let hosts = client(&server)
        .list_hosts(Some(&EntityRef::cluster("domain-c8")))
        .await
        .unwrap();

    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0].id(), &HostId::from("host-1"));
    assert_eq!(hosts[0].name(), "esx01.lab.local");
    assert_eq!(hosts[0].build(), Some("22348816"));
    assert!(hosts[1].is_disconnected());
    // No software lookup for the disconnected host.
    assert!(!server
        .targets()
        .iter()
        .any(|t| t.contains("hosts/host-2/software")));
}

#[tokio::test]
async fn each_scope_kind_uses_its_filter() {
    let scopes = [
        (EntityRef::cluster("domain-c8"), "clusters=domain-c8"),
        (EntityRef::datacenter("datacenter-3"), "datacenters=datacenter-3"),
        (EntityRef::folder("group-h4"), "folders=group-h4"),
    ];
    for (scope, filter) in scopes {
        let server = MockServer::start(vec![route("GET", "/api/vcenter/host", 200, "[]")]).await;

        let hosts = client(&server).list_hosts(Some(&scope)).await.unwrap();

        assert!(hosts.is_empty());
        assert_eq!(
            server.targets(),
            vec![format!("GET /api/vcenter/host?{filter}")]
        );
    }

    let server = MockServer::start(vec![route("GET", "/api/vcenter/host", 200, "[]")]).await;
    client(&server).list_hosts(None).await.unwrap();
    assert_eq!(server.targets(), vec!["GET /api/vcenter/host"]);
}

#[tokio::test]
async fn failed_software_lookup_marks_the_build_unreadable() {
    let server = MockServer::start(vec![
        route("GET", "/api/vcenter/host", 200, HOSTS),
        route(
            "GET",
            "/api/esx/settings/hosts/host-1/software",
            503,
            r#"{"error_type":"SERVICE_UNAVAILABLE","messages":[]}"#,
        ),
    ])
    .await;

    let hosts = client(&server).list_hosts(None).await.unwrap();

    assert_eq!(hosts[0].build(), None);
    let unreadable = hosts[0].build_error().unwrap();
    assert_eq!(unreadable.status, Some(503));
    assert!(unreadable.reason.contains("SERVICE_UNAVAILABLE"));
}

#[tokio::test]
async fn host_without_an_image_has_an_unreadable_build() {
    let server = MockServer::start(vec![
        route("GET", "/api/vcenter/host", 200, HOSTS),
        route(
            "GET",
            "/api/esx/settings/hosts/host-1/software",
            200,
            r#"{"base_image": null}"#,
        ),
    ])
    .await;

    let hosts = client(&server).list_hosts(None).await.unwrap();

    let unreadable = hosts[0].build_error().unwrap();
    assert_eq!(unreadable.status, None);
}

#[tokio::test]
async fn inventory_failure_carries_the_status() {
    let server = MockServer::start(vec![route("GET", "/api/vcenter/host", 500, "")]).await;

    let err = client(&server).list_hosts(None).await.unwrap_err();

    assert!(matches!(err, Error::Inventory { status: Some(500), .. }));
}

// ==================== Tagging ====================

#[tokio::test]
async fn category_is_found_by_name_or_created() {
    let server = MockServer::start(vec![
        route("GET", "/api/cis/tagging/category", 200, r#"["cat-7"]"#),
        route(
            "GET",
            "/api/cis/tagging/category/cat-7",
            200,
            r#"{"id":"cat-7","name":"owners","description":"","cardinality":"MULTIPLE"}"#,
        ),
        route("POST", "/api/cis/tagging/category", 201, r#""cat-8""#),
    ])
    .await;
    let client = client(&server);

    assert!(client
        .get_category("tc_esxi_release_names")
        .await
        .unwrap()
        .is_none());
    let owners = client.get_category("owners").await.unwrap().unwrap();
    assert_eq!(owners.cardinality, Cardinality::Multiple);

    let spec = CategorySpec::single_host("tc_esxi_release_names", "release names");
    let created = client.create_category(&spec).await.unwrap();
    assert_eq!(created.id, CategoryId::new("cat-8"));

    let post = server
        .requests()
        .into_iter()
        .find(|r| r.method == "POST")
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&post.body).unwrap();
    assert_eq!(body["cardinality"], "SINGLE");
    assert_eq!(body["associable_types"], serde_json::json!(["HostSystem"]));
}

#[tokio::test]
async fn assignment_lookup_keeps_only_the_requested_category() {
    let server = MockServer::start(vec![
        route(
            "POST",
            "/api/cis/tagging/tag-association?action=list-attached-tags",
            200,
            r#"["tag-a", "tag-b"]"#,
        ),
        route(
            "GET",
            "/api/cis/tagging/tag/tag-a",
            200,
            r#"{"id":"tag-a","name":"owner-ops","category_id":"cat-7"}"#,
        ),
        route(
            "GET",
            "/api/cis/tagging/tag/tag-b",
            200,
            r#"{"id":"tag-b","name":"7.0_U3","category_id":"cat-1"}"#,
        ),
    ])
    .await;
    let client = client(&server);
    let host = HostId::from("host-1");

    let assignment = client
        .get_assignment(&release_category(), &host)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.tag.name, "7.0_U3");
    assert_eq!(assignment.host, host);

    let other = TagCategory {
        id: CategoryId::new("cat-9"),
        ..release_category()
    };
    assert!(client.get_assignment(&other, &host).await.unwrap().is_none());

    let lookup = &server.requests()[0];
    let body: serde_json::Value = serde_json::from_str(&lookup.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"object_id": {"type": "HostSystem", "id": "host-1"}})
    );
    // Tags are fetched once and served from the cache afterwards.
    let fetches = server
        .targets()
        .iter()
        .filter(|t| t.starts_with("GET /api/cis/tagging/tag/"))
        .count();
    assert_eq!(fetches, 2);
}

#[tokio::test]
async fn attach_and_detach_post_to_the_tag_association() {
    let server = MockServer::start(vec![
        route(
            "POST",
            "/api/cis/tagging/tag-association/tag-b?action=attach",
            204,
            "",
        ),
        route(
            "POST",
            "/api/cis/tagging/tag-association/tag-b?action=detach",
            204,
            "",
        ),
    ])
    .await;
    let client = client(&server);
    let host = HostId::from("host-1");

    let assignment = client.create_assignment(&release_tag(), &host).await.unwrap();
    client.remove_assignment(&assignment).await.unwrap();

    assert_eq!(
        server.targets(),
        vec![
            "POST /api/cis/tagging/tag-association/tag-b?action=attach",
            "POST /api/cis/tagging/tag-association/tag-b?action=detach",
        ]
    );
}

#[tokio::test]
async fn refused_attach_is_a_tag_service_error_with_status() {
    let server = MockServer::start(vec![route(
        "POST",
        "/api/cis/tagging/tag-association/tag-b?action=attach",
        403,
        FORBIDDEN,
    )])
    .await;

    let err = client(&server)
        .create_assignment(&release_tag(), &HostId::from("host-1"))
        .await
        .unwrap_err();

    match err {
        Error::TagService {
            operation,
            status,
            message,
        } => {
            assert_eq!(operation, "attach");
            assert_eq!(status, Some(403));
            assert_eq!(message, "UNAUTHORIZED: Permission denied");
        }
        other => panic!("expected tag service error, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_detach_carries_the_status() {
    let server = MockServer::start(vec![route(
        "POST",
        "/api/cis/tagging/tag-association/tag-b?action=detach",
        403,
        FORBIDDEN,
    )])
    .await;
    let assignment = TagAssignment {
        tag: release_tag(),
        host: HostId::from("host-1"),
    };

    let err = client(&server).remove_assignment(&assignment).await.unwrap_err();

    assert!(matches!(
        err,
        Error::TagService {
            operation: "detach",
            status: Some(403),
            ..
        }
    ));
}

use release_tagger::application::{ReconcileRequest, Reconciler};
use release_tagger::domain::ConnectionState;
use release_tagger::testkit::catalog::StaticCatalog;
use release_tagger::testkit::fleet::MemoryFleet;
use release_tagger::testkit;

/// Catalog with two releases, one of them reachable from two builds.
pub fn catalog() -> StaticCatalog {
    StaticCatalog::from_pairs(&[
        ("B100", "7.0 U3"),
        ("B101", "7.0 U3"),
        ("B200", "8.0 U1"),
    ])
}

/// A connected fleet with one connected host per `(id, build)` pair.
pub fn fleet(hosts: &[(&str, &str)]) -> MemoryFleet {
    let fleet = MemoryFleet::new();
    for (id, build) in hosts {
        fleet.add_host(id, build, ConnectionState::Connected);
    }
    fleet
}

pub fn reconciler(fleet: &MemoryFleet, catalog: &StaticCatalog) -> Reconciler {
    testkit::reconciler(fleet, catalog)
}

pub fn request() -> ReconcileRequest {
    ReconcileRequest {
        catalog: Some("https://mirror.lab.local/builds.json".into()),
        ..ReconcileRequest::default()
    }
}

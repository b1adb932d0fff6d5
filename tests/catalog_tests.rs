//! Catalog loading from disk and over HTTP.

mod support;

use std::io::Write;

use release_tagger::adapter::outbound::catalog::{CatalogLoader, FetchOptions};
use release_tagger::domain::Location;
use release_tagger::error::CatalogError;
use release_tagger::port::CatalogSource;

use support::http::serve_once;

const DOCUMENT: &str = r#"{
    "22348816": {"Version": "7.0 U3o", "Release Date": "2023-09-28", "Build": "22348816"},
    "22380479": {"Version": "8.0 U2", "Release Date": "2023-09-21"}
}"#;

fn loader() -> CatalogLoader {
    CatalogLoader::new(FetchOptions::default()).unwrap()
}

#[tokio::test]
async fn existing_file_is_loaded_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DOCUMENT.as_bytes()).unwrap();

    let location = Location::classify(file.path().to_str().unwrap()).unwrap();
    assert!(!location.is_remote());

    let catalog = loader().load(&location).await.unwrap();
    assert_eq!(catalog.len(), 2);

    let entry = catalog.get("22348816").unwrap();
    assert_eq!(entry.version(), "7.0 U3o");
    assert_eq!(entry.tag_label(), "7.0_U3o");
    assert_eq!(entry.extra()["Release Date"], "2023-09-28");
}

#[tokio::test]
async fn entry_without_version_fails_the_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"B100": {"Version": "7.0 U3"}, "B200": {"Release": "8.0"}}"#)
        .unwrap();

    let err = loader()
        .load(&Location::LocalPath(file.path().to_path_buf()))
        .await
        .unwrap_err();

    match err {
        CatalogError::Parse { reason, .. } => assert!(reason.contains("B200")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_filesystem_path_is_not_fetched() {
    let location = Location::classify("/srv/mirror/does-not-exist.json").unwrap();
    assert!(!location.is_remote());

    let err = loader().load(&location).await.unwrap_err();
    assert!(matches!(err, CatalogError::Read { .. }));
}

#[tokio::test]
async fn remote_catalog_is_fetched() {
    let base = serve_once(200, DOCUMENT).await;
    let location = Location::classify(&format!("{base}/builds.json")).unwrap();
    assert!(location.is_remote());

    let catalog = loader().load(&location).await.unwrap();
    assert_eq!(catalog.get("22380479").unwrap().version(), "8.0 U2");
}

#[tokio::test]
async fn location_without_scheme_is_fetched_over_http() {
    let base = serve_once(200, DOCUMENT).await;
    let raw = format!("{}/builds.json", base.trim_start_matches("http://"));
    let location = Location::classify(&raw).unwrap();
    assert!(location.is_remote());

    let catalog = loader().load(&location).await.unwrap();
    assert_eq!(catalog.len(), 2);
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let base = serve_once(404, r#"{"message": "not found"}"#).await;
    let location = Location::classify(&format!("{base}/builds.json")).unwrap();

    let err = loader().load(&location).await.unwrap_err();

    assert!(matches!(err, CatalogError::Status { status: 404, .. }));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn remote_body_that_is_not_an_object_is_rejected() {
    let base = serve_once(200, r#"["22348816"]"#).await;
    let location = Location::classify(&format!("{base}/builds.json")).unwrap();

    let err = loader().load(&location).await.unwrap_err();
    assert!(matches!(err, CatalogError::Parse { .. }));
}

#[test]
fn unsupported_scheme_is_rejected() {
    let err = Location::classify("ftp://mirror.lab.local/builds.json").unwrap_err();
    assert!(matches!(err, CatalogError::InvalidLocation(_)));
}

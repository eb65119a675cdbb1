//! End-to-end update against a mocked package service

mod helper;

use std::sync::{Arc, Mutex};

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

use helper::{TarEntry, tar_gz};
use package_client::artifact::hex_digest;
use package_client::update::{ReleaseInstaller, UpdateOutcome};
use package_client::{PackageServiceRegistry, UpdateController, UpdateError};

const PACKAGE_ID: u64 = 7;
const CREDENTIAL: &str = "secret";

async fn mock_release(server: &mut ServerGuard, version: &str, file_hash: &str) -> Mock {
    let detail = json!({
        "download_url": format!("{}/release.tar.gz", server.url()),
        "file_hash": file_hash,
        "exe_name": "tool",
        "compatible": "1.0.0",
    });
    let body = json!({
        "meta_status": 1,
        "meta_message": "success",
        "version": version,
        "content": detail.to_string(),
        "update_secs": 600,
        "minimum_allow_version": "1.0.0",
    });

    server
        .mock("GET", format!("/api/version/{PACKAGE_ID}").as_str())
        .match_query(Matcher::UrlEncoded("token".into(), CREDENTIAL.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn controller(
    server: &ServerGuard,
    installer: ReleaseInstaller,
    messages: Arc<Mutex<Vec<String>>>,
) -> UpdateController {
    UpdateController::builder(PACKAGE_ID, "1.0.0")
        .credential(CREDENTIAL)
        .on_log(move |message| messages.lock().unwrap().push(message.to_string()))
        .build(
            Arc::new(PackageServiceRegistry::new(&server.url())),
            Arc::new(installer),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn update_downloads_verifies_and_extracts_release() {
    let archive = tar_gz(&[
        TarEntry::Dir("tool-1.1.0/"),
        TarEntry::File("tool-1.1.0/bin/tool", b"#!/bin/sh\necho 1.1.0\n", 0o755),
        TarEntry::File("tool-1.1.0/README", b"readme", 0o644),
    ]);
    let file_hash = hex_digest(&archive);

    let mut server = mockito::Server::new_async().await;
    mock_release(&mut server, "1.1.0", &file_hash).await;
    let download = server
        .mock("GET", "/release.tar.gz")
        .with_status(200)
        .with_body(&archive)
        .expect(1)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let install_dir = temp_dir.path().join("install");
    let staging_dir = temp_dir.path().join("staging");
    let installer = ReleaseInstaller::new(&install_dir)
        .unwrap()
        .with_staging_dir(&staging_dir)
        .strip_top_level(true);

    let messages = Arc::new(Mutex::new(Vec::new()));
    let controller = controller(&server, installer, messages.clone()).await;

    let outcome = controller.update().await.unwrap();

    download.assert_async().await;
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            from: "1.0.0".to_string(),
            to: "1.1.0".to_string(),
        }
    );
    assert_eq!(controller.current_version(), "1.1.0");
    assert_eq!(
        std::fs::read(install_dir.join("bin/tool")).unwrap(),
        b"#!/bin/sh\necho 1.1.0\n"
    );
    assert_eq!(std::fs::read(install_dir.join("README")).unwrap(), b"readme");
    assert!(!staging_dir.join(format!("{file_hash}.tar.gz")).exists());
    assert!(
        messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m == "installed version 1.1.0")
    );

    let outcome = controller.update().await.unwrap();
    assert_eq!(outcome, UpdateOutcome::UpToDate);
}

#[tokio::test]
async fn update_keeps_version_when_archive_digest_mismatches() {
    let archive = tar_gz(&[TarEntry::File("bin/tool", b"tampered", 0o755)]);
    let published_hash = hex_digest(b"the archive that was published");

    let mut server = mockito::Server::new_async().await;
    mock_release(&mut server, "1.1.0", &published_hash).await;
    server
        .mock("GET", "/release.tar.gz")
        .with_status(200)
        .with_body(&archive)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let install_dir = temp_dir.path().join("install");
    let installer = ReleaseInstaller::new(&install_dir)
        .unwrap()
        .with_staging_dir(temp_dir.path().join("staging"));

    let controller = controller(&server, installer, Arc::new(Mutex::new(Vec::new()))).await;

    let err = controller.update().await.unwrap_err();

    assert!(matches!(err, UpdateError::Handler(_)));
    assert!(err.to_string().contains("digest mismatch"), "{err}");
    assert_eq!(controller.current_version(), "1.0.0");
    assert!(!install_dir.join("bin/tool").exists());
}

#[tokio::test]
async fn update_rejects_payload_without_valid_hash() {
    let mut server = mockito::Server::new_async().await;
    mock_release(&mut server, "1.1.0", "not-a-hash").await;

    let temp_dir = TempDir::new().unwrap();
    let installer = ReleaseInstaller::new(temp_dir.path().join("install"))
        .unwrap()
        .with_staging_dir(temp_dir.path().join("staging"));

    let controller = controller(&server, installer, Arc::new(Mutex::new(Vec::new()))).await;

    let err = controller.update().await.unwrap_err();

    assert!(err.to_string().contains("invalid file_hash"), "{err}");
    assert_eq!(controller.current_version(), "1.0.0");
}

#[tokio::test]
async fn build_fails_for_unknown_package() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", format!("/api/version/{PACKAGE_ID}").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"meta_status": 0, "meta_message": "no such package"}"#)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let installer = ReleaseInstaller::new(temp_dir.path()).unwrap();

    let result = UpdateController::builder(PACKAGE_ID, "1.0.0")
        .credential(CREDENTIAL)
        .build(
            Arc::new(PackageServiceRegistry::new(&server.url())),
            Arc::new(installer),
        )
        .await;

    assert!(matches!(result, Err(UpdateError::Registry(_))));
}

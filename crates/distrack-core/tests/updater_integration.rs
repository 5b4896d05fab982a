//! Update checker tests against a mocked release server.

use distrack_core::{
    status_channel, HttpUpdateChecker, RunMode, UpdateError, UpdateInfo, UpdateStatus, Updater,
};
use sha2::{Digest, Sha256};
use std::io::Write;
use tempfile::TempDir;

fn manifest(server_url: &str, version: &str, sha256: Option<&str>) -> String {
    let mut body = serde_json::json!({
        "version": version,
        "url": format!("{server_url}/download/distrack-setup.bin"),
        "notes": "Bug fixes",
        "releaseDate": "2026-01-15",
    });
    if let Some(sum) = sha256 {
        body["sha256"] = serde_json::Value::String(sum.to_string());
    }
    body.to_string()
}

fn updater(server_url: &str, mode: RunMode) -> Updater<HttpUpdateChecker> {
    let checker = HttpUpdateChecker::new(&format!("{server_url}/latest.json")).unwrap();
    Updater::new(Some(checker), mode, "1.0.0").unwrap()
}

#[tokio::test]
async fn dev_mode_skips_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/latest.json")
        .expect(0)
        .create_async()
        .await;

    let result = updater(&server.url(), RunMode::Development).check().await;
    assert!(!result.ok);
    assert_eq!(result.reason.as_deref(), Some("dev"));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({ "ok": false, "reason": "dev" })
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn newer_release_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let body = manifest(&server.url(), "1.3.0", None);
    let mock = server
        .mock("GET", "/latest.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let (tx, mut rx) = status_channel();
    let updater = updater(&server.url(), RunMode::Production).with_status_sender(tx);
    let result = updater.check().await;

    assert!(result.ok);
    let info = result.info.unwrap();
    assert_eq!(info.version, "1.3.0");
    assert_eq!(info.release_date.as_deref(), Some("2026-01-15"));
    assert!(updater.is_newer(&info).unwrap());
    assert_eq!(rx.recv().await.unwrap(), UpdateStatus::Checking);
    assert!(matches!(rx.recv().await.unwrap(), UpdateStatus::Available { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn older_release_is_not_available() {
    let mut server = mockito::Server::new_async().await;
    let body = manifest(&server.url(), "0.9.0", None);
    server
        .mock("GET", "/latest.json")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let (tx, mut rx) = status_channel();
    let result = updater(&server.url(), RunMode::Production)
        .with_status_sender(tx)
        .check()
        .await;

    assert!(result.ok);
    assert_eq!(rx.recv().await.unwrap(), UpdateStatus::Checking);
    assert_eq!(rx.recv().await.unwrap(), UpdateStatus::NotAvailable);
}

#[tokio::test]
async fn server_error_becomes_error_result() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/latest.json")
        .with_status(503)
        .create_async()
        .await;

    let (tx, mut rx) = status_channel();
    let result = updater(&server.url(), RunMode::Production)
        .with_status_sender(tx)
        .check()
        .await;

    assert!(!result.ok);
    assert!(result.error.unwrap().contains("503"));
    assert_eq!(rx.recv().await.unwrap(), UpdateStatus::Checking);
    assert!(matches!(rx.recv().await.unwrap(), UpdateStatus::Error { .. }));
}

#[tokio::test]
async fn malformed_manifest_becomes_error_result() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/latest.json")
        .with_status(200)
        .with_body("{\"version\": 3}")
        .create_async()
        .await;

    let result = updater(&server.url(), RunMode::Production).check().await;
    assert!(!result.ok);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn download_reports_progress_and_verifies_checksum() {
    let mut server = mockito::Server::new_async().await;
    let payload = vec![7_u8; 64 * 1024];
    let digest = hex::encode(Sha256::digest(&payload));
    server
        .mock("GET", "/download/distrack-setup.bin")
        .with_status(200)
        .with_body(payload.clone())
        .create_async()
        .await;

    let info: UpdateInfo =
        serde_json::from_str(&manifest(&server.url(), "1.3.0", Some(&digest))).unwrap();
    let dir = TempDir::new().unwrap();
    let (tx, mut rx) = status_channel();
    let updater = updater(&server.url(), RunMode::Production).with_status_sender(tx);

    let path = updater.download(&info, dir.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "distrack-setup.bin");
    assert_eq!(std::fs::read(&path).unwrap(), payload);

    drop(updater);
    let mut last_transferred = 0;
    let mut saw_downloaded = false;
    while let Some(status) = rx.recv().await {
        match status {
            UpdateStatus::Downloading { transferred, .. } => {
                assert!(transferred >= last_transferred);
                last_transferred = transferred;
            }
            UpdateStatus::Downloaded { info: done } => {
                assert_eq!(done.version, "1.3.0");
                saw_downloaded = true;
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }
    assert_eq!(last_transferred, payload.len() as u64);
    assert!(saw_downloaded);
}

#[tokio::test]
async fn checksum_mismatch_removes_file() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/download/distrack-setup.bin")
        .with_status(200)
        .with_body("tampered")
        .create_async()
        .await;

    let info: UpdateInfo =
        serde_json::from_str(&manifest(&server.url(), "1.3.0", Some(&"0".repeat(64)))).unwrap();
    let dir = TempDir::new().unwrap();
    let (tx, mut rx) = status_channel();
    let updater = updater(&server.url(), RunMode::Production).with_status_sender(tx);

    let err = updater.download(&info, dir.path()).await.unwrap_err();
    assert!(matches!(err, UpdateError::Checksum { .. }));
    assert!(!dir.path().join("distrack-setup.bin").exists());

    drop(updater);
    let mut last = None;
    while let Some(status) = rx.recv().await {
        last = Some(status);
    }
    assert!(matches!(last, Some(UpdateStatus::Error { .. })));
}

#[tokio::test]
async fn interrupted_download_leaves_no_partial_file() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/download/distrack-setup.bin")
        .with_status(200)
        .with_chunked_body(|w| {
            w.write_all(&[1_u8; 4096])?;
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "connection dropped",
            ))
        })
        .create_async()
        .await;

    let info: UpdateInfo =
        serde_json::from_str(&manifest(&server.url(), "1.3.0", None)).unwrap();
    let dir = TempDir::new().unwrap();
    let updater = updater(&server.url(), RunMode::Production);

    assert!(updater.download(&info, dir.path()).await.is_err());
    assert!(!dir.path().join("distrack-setup.bin").exists());
}

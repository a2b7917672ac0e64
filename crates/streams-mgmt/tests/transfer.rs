//! Artifact uploads and downloads against a local HTTP server.

mod support;

use std::io::Write;

use streams_mgmt::transfer::{ArtifactTransfer, TransferDirection, TransportConfig};
use streams_mgmt::CliError;
use support::{payload, status_snapshot, ArtifactServer};
use tempfile::NamedTempFile;

fn plain_http() -> ArtifactTransfer {
    ArtifactTransfer::new(TransportConfig {
        allow_plain_http: true,
        ..TransportConfig::default()
    })
    .expect("client")
}

fn bundle(len: usize) -> (NamedTempFile, Vec<u8>) {
    let bytes = payload(len);
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(&bytes).expect("failed to write temp file");
    file.flush().expect("flush");
    (file, bytes)
}

#[tokio::test]
async fn upload_sends_exact_length_and_content_type() {
    let server = ArtifactServer::start(200, Vec::new()).await;
    let (file, bytes) = bundle(130 * 1024);
    let target = format!("{}/upload/app.sab", server.base_url());

    let descriptor = plain_http().upload(file.path(), &target).await.expect("upload");
    assert_eq!(descriptor.direction, TransferDirection::Upload);
    assert_eq!(descriptor.content_length, 133_120);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/upload/app.sab");
    assert_eq!(request.headers.get("content-length").map(String::as_str), Some("133120"));
    assert_eq!(
        request.headers.get("content-type").map(String::as_str),
        Some("application/x-jar")
    );
    assert!(!request.headers.contains_key("transfer-encoding"));
    assert_eq!(request.body, bytes);
    server.shutdown();
}

#[tokio::test]
async fn small_block_size_still_sends_whole_file() {
    let server = ArtifactServer::start(200, Vec::new()).await;
    let (file, bytes) = bundle(10_000);
    let transfer = ArtifactTransfer::new(TransportConfig {
        allow_plain_http: true,
        block_size: 1024,
        ..TransportConfig::default()
    })
    .expect("client");

    transfer
        .upload(file.path(), &format!("{}/upload/small.sab", server.base_url()))
        .await
        .expect("upload");
    assert_eq!(server.requests()[0].body, bytes);
    server.shutdown();
}

#[tokio::test]
async fn upload_rejected_status_is_error() {
    let server = ArtifactServer::start(500, Vec::new()).await;
    let (file, _) = bundle(16);

    let err = plain_http()
        .upload(file.path(), &format!("{}/upload/app.sab", server.base_url()))
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Transfer(_)));
    assert_eq!(err.to_string(), "Unexpected response code pushing bundle file:  500");
    server.shutdown();
}

#[tokio::test]
async fn created_is_not_accepted_for_upload() {
    let server = ArtifactServer::start(201, Vec::new()).await;
    let (file, _) = bundle(16);

    let err = plain_http()
        .upload(file.path(), &format!("{}/upload/app.sab", server.base_url()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unexpected response code pushing bundle file:  201");
    server.shutdown();
}

#[tokio::test]
async fn download_copies_body() {
    let archive = payload(200 * 1024);
    let server = ArtifactServer::start(200, archive.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("logs.tgz");

    let descriptor = plain_http()
        .download(&format!("{}/logs/domain.tgz", server.base_url()), &target)
        .await
        .expect("download");
    assert_eq!(descriptor.direction, TransferDirection::Download);
    assert_eq!(descriptor.content_length, archive.len() as u64);
    assert_eq!(std::fs::read(&target).expect("read"), archive);
    server.shutdown();
}

#[tokio::test]
async fn download_missing_resource_is_error() {
    let server = ArtifactServer::start(200, Vec::new()).await;
    let dir = tempfile::tempdir().expect("tempdir");

    let err = plain_http()
        .download(&format!("{}/elsewhere", server.base_url()), &dir.path().join("x"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unexpected response code retrieving file:  404");
    server.shutdown();
}

#[tokio::test]
async fn fetch_text_returns_body_verbatim() {
    let server = ArtifactServer::start(200, Vec::new()).await;

    let text = plain_http()
        .fetch_text(&format!("{}/snapshot/7", server.base_url()))
        .await
        .expect("fetch");
    assert_eq!(text, status_snapshot("7"));
    server.shutdown();
}

const CERT_HOST: &str = "artifacts.streams.invalid";

fn strict_tls() -> ArtifactTransfer {
    ArtifactTransfer::new(TransportConfig {
        accept_invalid_certs: false,
        accept_invalid_hostnames: false,
        ..TransportConfig::default()
    })
    .expect("client")
}

#[tokio::test]
async fn default_policy_trusts_self_signed_mismatched_host() {
    let archive = payload(4096);
    let server = ArtifactServer::start_tls(200, archive.clone(), CERT_HOST).await;
    assert!(server.base_url().starts_with("https://127.0.0.1:"));
    let transfer = ArtifactTransfer::new(TransportConfig::default()).expect("client");

    let (file, bytes) = bundle(20_000);
    let pushed = transfer
        .upload(file.path(), &format!("{}/upload/app.sab", server.base_url()))
        .await
        .expect("upload");
    assert_eq!(pushed.content_length, 20_000);

    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("logs.tgz");
    transfer
        .download(&format!("{}/logs/domain.tgz", server.base_url()), &target)
        .await
        .expect("download");
    assert_eq!(std::fs::read(&target).expect("read"), archive);

    let text = transfer
        .fetch_text(&format!("{}/snapshot/3", server.base_url()))
        .await
        .expect("fetch");
    assert_eq!(text, status_snapshot("3"));

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].body, bytes);
    server.shutdown();
}

#[tokio::test]
async fn strict_policy_refuses_self_signed_certificate() {
    let server = ArtifactServer::start_tls(200, payload(64), CERT_HOST).await;
    let transfer = strict_tls();
    let (file, _) = bundle(16);
    let dir = tempfile::tempdir().expect("tempdir");

    let err = transfer
        .upload(file.path(), &format!("{}/upload/app.sab", server.base_url()))
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Http(_)), "upload: {err:?}");

    let err = transfer
        .download(&format!("{}/logs/domain.tgz", server.base_url()), &dir.path().join("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Http(_)), "download: {err:?}");
    assert!(!dir.path().join("x").exists());

    let err = transfer
        .fetch_text(&format!("{}/snapshot/3", server.base_url()))
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Http(_)), "fetch: {err:?}");

    assert!(server.requests().is_empty());
    server.shutdown();
}

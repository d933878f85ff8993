//! Integration tests for the B2 upload protocol.

use bookmark_archiver::config::Config;
use bookmark_archiver::storage::{payload_sha1, B2Client, StorageError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(api_url: &str) -> Config {
    Config {
        b2_api_url: api_url.to_string(),
        ..Config::for_testing()
    }
}

/// Mount the three protocol stages on a mock server.
async fn mount_happy_path(server: &MockServer, download_url: &str) {
    Mock::given(method("GET"))
        .and(path("/b2api/v2/b2_authorize_account"))
        .and(header(
            "Authorization",
            "Basic dGVzdC1rZXktaWQ6dGVzdC1hcHAta2V5",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "apiUrl": server.uri(),
            "authorizationToken": "account-token",
            "downloadUrl": download_url,
            "recommendedPartSize": 100_000_000,
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_get_upload_url"))
        .and(header("Authorization", "account-token"))
        .and(body_json(serde_json::json!({ "bucketId": "test-bucket-id" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "bucketId": "test-bucket-id",
            "uploadUrl": format!("{}/upload-target", server.uri()),
            "authorizationToken": "upload-token",
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_happy_path_returns_public_url() {
    let server = MockServer::start().await;
    mount_happy_path(&server, "https://files.example").await;

    let payload = b"hello world";
    Mock::given(method("POST"))
        .and(path("/upload-target"))
        .and(header("Authorization", "upload-token"))
        .and(header("X-Bz-File-Name", "Bookmarks/Articles/Hello.md"))
        .and(header("Content-Type", "text/markdown"))
        .and(header("X-Bz-Content-Sha1", payload_sha1(payload).as_str()))
        .and(header("X-Bz-Info-Author", "bookmark-archiver"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileName": "Bookmarks/Articles/Hello.md",
            "contentLength": payload.len(),
            "contentSha1": payload_sha1(payload),
        })))
        .mount(&server)
        .await;

    let client = B2Client::new(&test_config(&server.uri())).unwrap();
    let archived = client
        .upload(payload, "Bookmarks/Articles/Hello.md", "text/markdown")
        .await
        .unwrap();

    assert_eq!(
        archived.public_url,
        "https://files.example/file/test-bucket/Bookmarks/Articles/Hello.md"
    );
    assert_eq!(archived.content_sha1, payload_sha1(payload));
    assert_eq!(archived.content_length, payload.len() as u64);
}

#[tokio::test]
async fn test_empty_content_type_defaults_to_auto() {
    let server = MockServer::start().await;
    mount_happy_path(&server, "https://files.example").await;

    Mock::given(method("POST"))
        .and(path("/upload-target"))
        .and(header("Content-Type", "b2/x-auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileName": "Bookmarks/Podcasts/Ep1.mp3",
        })))
        .mount(&server)
        .await;

    let client = B2Client::new(&test_config(&server.uri())).unwrap();
    let archived = client
        .upload(b"audio", "Bookmarks/Podcasts/Ep1.mp3", "")
        .await
        .unwrap();

    assert!(archived.public_url.ends_with("/file/test-bucket/Bookmarks/Podcasts/Ep1.mp3"));
}

#[tokio::test]
async fn test_authorize_failure_carries_service_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b2api/v2/b2_authorize_account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": 401,
            "code": "unauthorized",
            "message": "The applicationKeyId and/or the applicationKey are wrong.",
        })))
        .mount(&server)
        .await;

    let client = B2Client::new(&test_config(&server.uri())).unwrap();
    let err = client
        .upload(b"data", "Bookmarks/Comics/x.png", "image/png")
        .await
        .unwrap_err();

    // The decoded code/message must surface, not a generic transport error.
    let text = err.to_string();
    assert!(text.contains("authorize_account"), "got: {text}");
    assert!(text.contains("unauthorized"), "got: {text}");
    assert!(text.contains("applicationKey"), "got: {text}");

    match err {
        StorageError::Service { stage, status, .. } => {
            assert_eq!(stage, "authorize_account");
            assert_eq!(status, 401);
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_error_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b2api/v2/b2_authorize_account"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = B2Client::new(&test_config(&server.uri())).unwrap();
    let err = client
        .upload(b"data", "Bookmarks/Comics/x.png", "image/png")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorageError::Decode {
            stage: "authorize_account",
            ..
        }
    ));
}

#[tokio::test]
async fn test_upload_url_failure_carries_stage() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b2api/v2/b2_authorize_account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "apiUrl": server.uri(),
            "authorizationToken": "account-token",
            "downloadUrl": "https://files.example",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_get_upload_url"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "status": 503,
            "code": "service_unavailable",
            "message": "no upload targets available",
        })))
        .mount(&server)
        .await;

    let client = B2Client::new(&test_config(&server.uri())).unwrap();
    let err = client
        .upload(b"data", "Bookmarks/Comics/x.png", "image/png")
        .await
        .unwrap_err();

    match err {
        StorageError::Service { stage, code, .. } => {
            assert_eq!(stage, "get_upload_url");
            assert_eq!(code, "service_unavailable");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_checksum_rejection_is_fatal() {
    let server = MockServer::start().await;
    mount_happy_path(&server, "https://files.example").await;

    Mock::given(method("POST"))
        .and(path("/upload-target"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "status": 400,
            "code": "bad_request",
            "message": "Sha1 did not match data received",
        })))
        .mount(&server)
        .await;

    let client = B2Client::new(&test_config(&server.uri())).unwrap();
    let err = client
        .upload(b"data", "Bookmarks/Comics/x.png", "image/png")
        .await
        .unwrap_err();

    match err {
        StorageError::Service { stage, message, .. } => {
            assert_eq!(stage, "upload_file");
            assert!(message.contains("Sha1"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

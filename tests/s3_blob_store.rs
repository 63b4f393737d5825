use std::time::Duration;

use knote::blob::{BlobError, BlobStore, S3BlobStore, S3Config};
use pretty_assertions::assert_eq;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_bytes, header, header_exists, method, path},
};

const BUCKET: &str = "image-storage";

fn store(server: &MockServer, access_key: &str) -> S3BlobStore {
    S3BlobStore::new(S3Config {
        endpoint: server.uri(),
        region: "us-east-1".to_string(),
        access_key: access_key.to_string(),
        secret_key: "secret".to_string(),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn ensure_bucket_creates_missing_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/image-storage"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/image-storage"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    store(&server, "minio").ensure_bucket(BUCKET).await.unwrap();
}

#[tokio::test]
async fn ensure_bucket_leaves_existing_bucket_alone() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/image-storage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    store(&server, "minio").ensure_bucket(BUCKET).await.unwrap();
}

#[tokio::test]
async fn ensure_bucket_tolerates_concurrent_creation() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/image-storage"))
        .respond_with(ResponseTemplate::new(409).set_body_string(
            "<Error><Code>BucketAlreadyOwnedByYou</Code></Error>",
        ))
        .mount(&server)
        .await;

    store(&server, "minio").ensure_bucket(BUCKET).await.unwrap();
}

#[tokio::test]
async fn ensure_bucket_reports_denied_access() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = store(&server, "minio")
        .ensure_bucket(BUCKET)
        .await
        .unwrap_err();
    assert!(matches!(err, BlobError::Status { status: 403, .. }));
}

#[tokio::test]
async fn put_object_sends_signed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/image-storage/01TEST.png"))
        .and(header("content-type", "application/octet-stream"))
        .and(header_exists("x-amz-date"))
        .and(header_exists("x-amz-content-sha256"))
        .and(body_bytes(b"pixels".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    store(&server, "minio")
        .put_object(BUCKET, "01TEST.png", b"pixels".to_vec())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=minio/"));
    assert!(auth.contains("/us-east-1/s3/aws4_request"));
    assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
}

#[tokio::test]
async fn get_object_returns_stored_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image-storage/01TEST.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pixels".to_vec()))
        .mount(&server)
        .await;

    let bytes = store(&server, "minio")
        .get_object(BUCKET, "01TEST.png")
        .await
        .unwrap();
    assert_eq!(bytes, b"pixels".to_vec());
}

#[tokio::test]
async fn get_object_maps_missing_key_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image-storage/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("<Error><Code>NoSuchKey</Code></Error>"),
        )
        .mount(&server)
        .await;

    let err = store(&server, "minio")
        .get_object(BUCKET, "missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn put_object_into_missing_bucket_is_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("<Error><Code>NoSuchBucket</Code></Error>"),
        )
        .mount(&server)
        .await;

    let err = store(&server, "minio")
        .put_object(BUCKET, "a.png", b"a".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, BlobError::NoSuchBucket { .. }));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn empty_access_key_sends_anonymous_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    store(&server, "")
        .get_object(BUCKET, "public.png")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(requests[0].headers.get("x-amz-date").is_none());
}

#[tokio::test]
async fn dot_segment_keys_are_refused_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<ListBucketResult>listing</ListBucketResult>"),
        )
        .mount(&server)
        .await;
    let store = store(&server, "minio");

    for name in [".", "..", "a/../../other/x"] {
        let err = store.get_object(BUCKET, name).await.unwrap_err();
        assert!(err.is_not_found(), "{name}: {err}");
    }
    let err = store
        .put_object(BUCKET, "..", b"x".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, BlobError::InvalidName { .. }));

    assert!(server.received_requests().await.unwrap().is_empty());
}

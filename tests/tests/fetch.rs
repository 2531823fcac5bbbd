//! Fetcher tests against an in-process fake source API.
//!
//! No Docker required.

use axum::http::StatusCode;
use engine_core::{Error, FetchErrorCode};
use integration_tests::{fake_api::FakeApi, fixtures};
use source_client::{health::check_connection, EnrichmentSource, HttpSource, SourceConfig};

#[tokio::test]
async fn test_fetch_sends_bearer_and_query() {
    let api = FakeApi::start("secret-token").await;
    api.respond_json(
        StatusCode::OK,
        fixtures::envelope(vec![fixtures::processing("e1", 150)], 2, 50, true),
    );

    let source = HttpSource::new(api.source_config()).unwrap();
    let page = source.fetch(2, 50).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page.data[0]["id_enriquecimento"], "e1");
    assert!(page.has_next());
    assert_eq!(page.meta.as_ref().unwrap().page, Some(2));

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer secret-token")
    );
    assert_eq!(requests[0].query.get("page").map(String::as_str), Some("2"));
    assert_eq!(requests[0].query.get("limit").map(String::as_str), Some("50"));
}

#[tokio::test]
async fn test_missing_data_is_empty_page() {
    let api = FakeApi::start("t").await;
    api.respond_json(StatusCode::OK, serde_json::json!({ "meta": { "page": 1 } }));
    api.respond_json(StatusCode::OK, serde_json::json!({ "data": null }));

    let source = HttpSource::new(api.source_config()).unwrap();
    assert!(source.fetch(1, 100).await.unwrap().is_empty());
    assert!(source.fetch(1, 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_is_retryable_status_error() {
    let api = FakeApi::start("t").await;
    api.respond_raw(StatusCode::INTERNAL_SERVER_ERROR, "boom");

    let source = HttpSource::new(api.source_config()).unwrap();
    let err = source.fetch(1, 100).await.unwrap_err();

    assert_eq!(err.error_code(), Some(FetchErrorCode::HttpStatus.code()));
    assert!(matches!(err, Error::Fetch { status: Some(500), .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let api = FakeApi::start("t").await;
    api.respond_json(
        StatusCode::TOO_MANY_REQUESTS,
        serde_json::json!({ "error": "rate limited" }),
    );

    let source = HttpSource::new(api.source_config()).unwrap();
    let err = source.fetch(1, 100).await.unwrap_err();
    assert!(matches!(err, Error::Fetch { status: Some(429), .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_wrong_token_is_not_retryable() {
    let api = FakeApi::start("expected").await;
    let mut config = api.source_config();
    config.api_key = "wrong".into();

    let source = HttpSource::new(config).unwrap();
    let err = source.fetch(1, 100).await.unwrap_err();
    assert!(matches!(err, Error::Fetch { status: Some(401), .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_garbage_body_is_decode_error() {
    let api = FakeApi::start("t").await;
    api.respond_raw(StatusCode::OK, "<html>not json</html>");

    let source = HttpSource::new(api.source_config()).unwrap();
    let err = source.fetch(1, 100).await.unwrap_err();

    assert_eq!(err.error_code(), Some(FetchErrorCode::Decode.code()));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let source = HttpSource::new(SourceConfig {
        api_url: format!("http://127.0.0.1:{}", port),
        api_key: "t".into(),
        request_timeout_secs: 2,
    })
    .unwrap();

    let err = source.fetch(1, 100).await.unwrap_err();
    assert_eq!(err.error_code(), Some(FetchErrorCode::Transport.code()));
    assert!(err.is_retryable());
    assert!(!check_connection(&source).await);
}

#[tokio::test]
async fn test_health_check_uses_single_record_fetch() {
    let api = FakeApi::start("t").await;
    let source = HttpSource::new(api.source_config()).unwrap();

    assert!(check_connection(&source).await);
    let requests = api.requests();
    assert_eq!(requests[0].query.get("limit").map(String::as_str), Some("1"));
}

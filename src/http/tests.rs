//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().no_rate_limit().build()).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("retail-prices/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(5))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .rate_limit(RateLimiterConfig::new(10, 2))
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(10, 2)));
}

#[tokio::test]
async fn test_get_text_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/retail/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Items": []}"#))
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/retail/prices", mock_server.uri());
    let body = client().get_text(&url).await.unwrap();

    assert_eq!(body, r#"{"Items": []}"#);
}

#[tokio::test]
async fn test_query_params_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .and(query_param("$skip", "200"))
        .and(query_param("api-version", "2021-10-01-preview"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!(
        "{}/prices?api-version=2021-10-01-preview&$skip=200",
        mock_server.uri()
    );
    let response = client().get(&url).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_default_headers_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secure"))
        .and(header("Ocp-Apim-Subscription-Key", "secret123"))
        .and(header("Accept-Language", "en-US"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .header("Ocp-Apim-Subscription-Key", "secret123")
        .header("Accept-Language", "en-US")
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let url = format!("{}/secure", mock_server.uri());
    let response = client.get(&url).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_404_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let err = client().get(&url).await.unwrap_err();

    match err {
        Error::FatalFetch {
            status, message, ..
        } => {
            assert_eq!(status, Some(404));
            assert!(message.contains("Not found"));
        }
        other => panic!("Expected FatalFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_500_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let err = client().get(&url).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(
        err,
        Error::TransientFetch {
            status: Some(503),
            retry_after: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_429_carries_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_string("Rate limited"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/limited", mock_server.uri());
    let err = client().get(&url).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow", mock_server.uri());
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_millis(50))
        .no_rate_limit()
        .build();
    let err = HttpClient::with_config(config)
        .unwrap()
        .get(&url)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/prices");
    let err = client().get(&url).await.unwrap_err();

    assert!(err.is_retryable(), "got {err:?}");
}

#[tokio::test]
async fn test_rate_limited_client_serves_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();
    let client = HttpClient::with_config(config).unwrap();
    assert!(client.has_rate_limiter());

    let url = format!("{}/data", mock_server.uri());
    for _ in 0..3 {
        let response = client.get(&url).await.unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::new().unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(debug_str.contains("has_rate_limiter"));
}

//! Retry-engine integration tests over a mock HTTP server

use std::time::{Duration, Instant};

use surefetch::{Client, Error, RetryPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_interval: Duration::from_millis(20),
        respect_retry_after: false,
        ..RetryPolicy::default()
    }
}

#[tokio::test]
async fn two_failures_then_success() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new();
    let response = client
        .get(format!("{}/flaky", server.uri()))
        .retry(fast_retry(3))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text(), "recovered");
    assert_eq!(response.retries_taken(), 2);
}

#[tokio::test]
async fn persistent_failure_exhausts_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let client = Client::new();
    let err = client
        .get(format!("{}/down", server.uri()))
        .retry(fast_retry(3))
        .send()
        .await
        .unwrap_err();

    match err {
        Error::Status { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(&body[..], b"unavailable");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn retry_after_header_respected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let policy = RetryPolicy {
        max_attempts: 3,
        base_interval: Duration::from_millis(20),
        respect_retry_after: true,
        ..RetryPolicy::default()
    };

    let client = Client::new();
    let start = Instant::now();
    let response = client
        .get(format!("{}/limited", server.uri()))
        .retry(policy)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    // The 1s header hint must win over the 20ms computed backoff.
    assert!(
        start.elapsed() >= Duration::from_millis(950),
        "waited only {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn non_retryable_status_fails_after_one_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new();
    let err = client
        .get(format!("{}/missing", server.uri()))
        .retry(fast_retry(5))
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn disabled_retry_is_a_single_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new();
    let err = client
        .get(format!("{}/down", server.uri()))
        .no_retry()
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn post_not_retried_under_idempotent_only() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let policy = RetryPolicy {
        idempotent_only: true,
        ..fast_retry(3)
    };

    let client = Client::new();
    let err = client
        .post(format!("{}/submit", server.uri()))
        .retry(policy)
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
}

use super::{account_quota_request, config_for, disable_body, ok_account_quota_body, ok_signer_body, send, sign_body, Call};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use combiner_service::api::{build_router, ApiState};
use combiner_service::service::flow::CombinerFlow;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

#[derive(Clone)]
struct MockSigner {
    status: StatusCode,
    body: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<HeaderMap>>>,
}

async fn mock_endpoint(State(signer): State<MockSigner>, headers: HeaderMap) -> impl IntoResponse {
    if let Ok(mut seen) = signer.seen.lock() {
        seen.push(headers);
    }
    tokio::time::sleep(signer.delay).await;
    (signer.status, Json(signer.body.clone()))
}

/// Serves every signer path on an ephemeral loopback port and returns its base URL.
async fn spawn_signer(status: StatusCode, body: Value, delay: Duration) -> (String, Arc<Mutex<Vec<HeaderMap>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let signer = MockSigner { status, body, delay, seen: seen.clone() };
    let app = Router::new()
        .route("/domain/disable", post(mock_endpoint))
        .route("/domain/quotaStatus", post(mock_endpoint))
        .route("/domain/sign", post(mock_endpoint))
        .route("/quotaStatus", post(mock_endpoint))
        .with_state(signer);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), seen)
}

fn router_for(urls: &[String], threshold: usize) -> Router {
    let config = config_for(urls, threshold);
    let flow = CombinerFlow::new(&config).expect("flow");
    build_router(Arc::new(ApiState::new(&flow, &config.server)))
}

#[tokio::test]
async fn combines_over_real_http_and_forwards_headers() {
    let mut urls = Vec::new();
    let mut seen = Vec::new();
    for _ in 0..3 {
        let (url, headers) = spawn_signer(StatusCode::OK, ok_signer_body(), Duration::ZERO).await;
        urls.push(url);
        seen.push(headers);
    }
    let router = router_for(&urls, 3);

    let reply = send(&router, Call::post("/domain/sign", &sign_body()).header("keyVersion", "4").header("x-request-id", "http-req-1")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["signatures"].as_array().map(Vec::len), Some(3));

    for headers in seen {
        let headers = headers.lock().expect("lock");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].get("keyversion").and_then(|v| v.to_str().ok()), Some("4"));
        assert_eq!(headers[0].get("x-request-id").and_then(|v| v.to_str().ok()), Some("http-req-1"));
    }
}

#[tokio::test]
async fn forwards_account_authorization_to_signers() {
    let (url, seen) = spawn_signer(StatusCode::OK, ok_account_quota_body(), Duration::ZERO).await;
    let router = router_for(&[url], 1);
    let (body, authorization) = account_quota_request();

    let reply = send(&router, Call::post("/quotaStatus", &body).header("Authorization", &authorization)).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);

    let headers = seen.lock().expect("lock");
    assert_eq!(headers[0].get("authorization").and_then(|v| v.to_str().ok()), Some(authorization.as_str()));
}

#[tokio::test]
async fn oversized_signer_body_is_rejected() {
    let (url, _) = spawn_signer(StatusCode::OK, ok_signer_body(), Duration::ZERO).await;
    let mut config = config_for(&[url], 1);
    config.signers.max_response_bytes = 16;
    let flow = CombinerFlow::new(&config).expect("flow");
    let router = build_router(Arc::new(ApiState::new(&flow, &config.server)));

    let reply = send(&router, Call::post("/domain/disable", &disable_body())).await;
    assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply.json["error"], "THRESHOLD_DISABLE_DOMAIN_FAILURE");
}

#[tokio::test]
async fn slow_signer_does_not_hold_up_the_response() {
    let (fast_a, _) = spawn_signer(StatusCode::OK, ok_signer_body(), Duration::ZERO).await;
    let (fast_b, _) = spawn_signer(StatusCode::OK, ok_signer_body(), Duration::from_millis(20)).await;
    let (slow, _) = spawn_signer(StatusCode::OK, ok_signer_body(), Duration::from_secs(3)).await;
    let router = router_for(&[fast_a, fast_b, slow], 2);

    let started = Instant::now();
    let reply = send(&router, Call::post("/domain/disable", &disable_body())).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
}

#[tokio::test]
async fn unreachable_signers_fail_with_bad_gateway() {
    // Bind and drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let dead = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);
    let (failing, _) =
        spawn_signer(StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({ "success": false }), Duration::ZERO).await;
    let router = router_for(&[dead.clone(), dead.clone(), dead, failing], 2);

    let reply = send(&router, Call::post("/domain/disable", &disable_body())).await;
    assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply.json["error"], "THRESHOLD_DISABLE_DOMAIN_FAILURE");
}

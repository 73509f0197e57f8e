use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use combiner_core::foundation::CorrelationId;
use log::{debug, log, Level};
use std::net::SocketAddr;
use std::time::Instant;

const REDACTED_HEADERS: &[&str] = &["authorization", "x-api-key", "cookie"];
const MAX_HEADER_VALUE_LEN: usize = 128;
const OPERATIONAL_PATHS: &[&str] = &["/health", "/ready", "/metrics"];

fn sanitize_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "<redacted>".to_string()
            } else {
                match value.to_str() {
                    Ok(text) if text.len() > MAX_HEADER_VALUE_LEN => format!("{}...", &text[..MAX_HEADER_VALUE_LEN]),
                    Ok(text) => text.to_string(),
                    Err(_) => "<non-utf8>".to_string(),
                }
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// One summary line per request; level follows the status class.
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client_ip = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip().to_string()).unwrap_or_default();
    let correlation_id = req.extensions().get::<CorrelationId>().map(|id| id.to_string()).unwrap_or_default();
    let request_body_size = content_length(req.headers());
    debug!(
        target: "http",
        "request headers correlation_id={} method={} path={} headers={:?}",
        correlation_id,
        method,
        path,
        sanitize_headers(req.headers())
    );
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let level = if OPERATIONAL_PATHS.contains(&path.as_str()) {
        Level::Trace
    } else if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Debug
    };
    log!(
        target: "http",
        level,
        "request done correlation_id={} client_ip={} method={} path={} status={} duration_ms={} request_body_size={} response_body_size={}",
        correlation_id,
        client_ip,
        method,
        path,
        status.as_u16(),
        start.elapsed().as_millis(),
        request_body_size,
        content_length(response.headers())
    );
    response
}

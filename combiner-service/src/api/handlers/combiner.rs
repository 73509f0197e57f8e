use crate::api::state::ApiState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use combiner_core::application::{Combiner, CombinerService};
use combiner_core::domain::InboundRequest;
use combiner_core::foundation::CorrelationId;
use log::debug;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub async fn handle_disable_domain(
    State(state): State<Arc<ApiState>>,
    correlation: Option<Extension<CorrelationId>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    combine(&state.disable, correlation, &headers, &body).await
}

pub async fn handle_domain_quota_status(
    State(state): State<Arc<ApiState>>,
    correlation: Option<Extension<CorrelationId>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    combine(&state.quota_status, correlation, &headers, &body).await
}

pub async fn handle_domain_sign(
    State(state): State<Arc<ApiState>>,
    correlation: Option<Extension<CorrelationId>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    combine(&state.sign, correlation, &headers, &body).await
}

pub async fn handle_account_quota_status(
    State(state): State<Arc<ApiState>>,
    correlation: Option<Extension<CorrelationId>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    combine(&state.account_quota, correlation, &headers, &body).await
}

async fn combine<S: CombinerService>(
    combiner: &Combiner<S>,
    correlation: Option<Extension<CorrelationId>>,
    headers: &HeaderMap,
    body: &Bytes,
) -> Response {
    let correlation_id = correlation.map(|Extension(id)| id).unwrap_or_else(|| CorrelationId::new(Uuid::new_v4().to_string()));
    // Unparseable JSON becomes Null and fails kind validation like any other malformed body.
    let body = serde_json::from_slice::<Value>(body).unwrap_or_else(|err| {
        debug!("request body is not json correlation_id={} error={}", correlation_id, err);
        Value::Null
    });
    let mut inbound = InboundRequest::new(body, correlation_id);
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            inbound = inbound.with_header(name.as_str(), value);
        }
    }

    let output = combiner.handle(inbound).await;
    let status = StatusCode::from_u16(output.response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(output.response.body)).into_response()
}

use crate::api::middleware::auth::authorize_admin;
use crate::api::state::ApiState;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use combiner_core::application::CombinerService;
use combiner_core::foundation::CombinerEndpoint;
use log::{debug, trace};
use serde_json::json;
use std::sync::Arc;

pub async fn handle_health(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    trace!("health check: ok");
    Json(json!({ "status": "healthy", "version": state.disable.service().version() }))
}

/// Ready while every enabled endpoint still has `t` signers with a closed breaker.
pub async fn handle_ready(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if let Err(err) = authorize_admin(&headers, state.admin_token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }

    let open = state.breakers.open_nodes();
    let endpoints = [
        (CombinerEndpoint::DisableDomain, state.disable.is_enabled(), state.disable.threshold()),
        (CombinerEndpoint::DomainQuotaStatus, state.quota_status.is_enabled(), state.quota_status.threshold()),
        (CombinerEndpoint::DomainSign, state.sign.is_enabled(), state.sign.threshold()),
        (CombinerEndpoint::AccountQuotaStatus, state.account_quota.is_enabled(), state.account_quota.threshold()),
    ];
    let mut report = serde_json::Map::new();
    let mut ready = true;
    for (endpoint, enabled, threshold) in endpoints {
        let available = threshold.total.saturating_sub(open.len());
        let endpoint_ready = !enabled || available >= threshold.required;
        ready &= endpoint_ready;
        report.insert(
            endpoint.as_str().to_string(),
            json!({ "enabled": enabled, "ready": endpoint_ready, "required": threshold.required, "available": available }),
        );
    }

    if ready {
        trace!("ready check: ok open_signers={}", open.len());
    } else {
        debug!("ready check: degraded open_signers={:?}", open);
    }
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = json!({
        "status": if ready { "ready" } else { "degraded" },
        "open_signers": open,
        "endpoints": report,
    });
    (status, Json(body)).into_response()
}

pub async fn handle_metrics(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if let Err(err) = authorize_admin(&headers, state.admin_token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }

    match state.metrics.encode() {
        Ok(body) => {
            let mut response = body.into_response();
            response.headers_mut().insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));
            response
        }
        Err(err) => {
            debug!("metrics encode failed error={}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics_error: {}", err)).into_response()
        }
    }
}

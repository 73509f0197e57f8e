use super::handlers::combiner::{handle_account_quota_status, handle_disable_domain, handle_domain_quota_status, handle_domain_sign};
use super::handlers::health::{handle_health, handle_metrics, handle_ready};
use super::middleware::correlation::correlation_middleware;
use super::middleware::logging::logging_middleware;
use super::middleware::rate_limit::rate_limit_middleware;
use super::state::ApiState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use combiner_core::foundation::{CombinerEndpoint, CombinerError};
use log::{error, info};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run_http_server<F>(addr: SocketAddr, state: Arc<ApiState>, shutdown: F) -> Result<(), CombinerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("binding http server addr={}", addr);
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server ready and accepting connections addr={}", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).with_graceful_shutdown(shutdown).await.map_err(
        |err| {
            error!("HTTP server terminated unexpectedly addr={} error={}", addr, err);
            CombinerError::Message(err.to_string())
        },
    )
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    let combiner_routes = Router::new()
        .route(CombinerEndpoint::DisableDomain.path(), post(handle_disable_domain))
        .route(CombinerEndpoint::DomainQuotaStatus.path(), post(handle_domain_quota_status))
        .route(CombinerEndpoint::DomainSign.path(), post(handle_domain_sign))
        .route(CombinerEndpoint::AccountQuotaStatus.path(), post(handle_account_quota_status))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware));

    Router::new()
        .merge(combiner_routes)
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(DefaultBodyLimit::max(state.body_limit_bytes))
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(axum::middleware::from_fn(correlation_middleware))
        .with_state(state)
}

use combiner_core::foundation::CombinerError;
use combiner_core::infrastructure::config::AppConfig;
use combiner_core::infrastructure::logging::init_logger;
use combiner_service::service::metrics::Metrics;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const STATUS_REPORT_INTERVAL_SECS: u64 = 300;

pub fn init_logging(filters: &str, log_dir: Option<&Path>) -> Result<(), CombinerError> {
    let log_dir = log_dir.map(|dir| dir.to_string_lossy().into_owned());
    init_logger(log_dir.as_deref(), filters)
}

pub fn load_app_config(path: Option<&Path>) -> Result<Arc<AppConfig>, CombinerError> {
    combiner_core::infrastructure::config::load_app_config(path).map(Arc::new)
}

pub fn log_startup_banner(config: &AppConfig) {
    info!(
        "threshold-combiner config version={} addr={} signers={} timeout_ms={} request_deadline_ms={} max_response_bytes={} rate_limit_rps={:?} admin_token_set={}",
        config.service.version(),
        config.server.addr,
        config.signers.nodes.len(),
        config.signers.timeout_ms,
        config.signers.request_deadline_ms,
        config.signers.max_response_bytes,
        config.server.rate_limit_rps,
        config.server.admin_token.is_some()
    );
    for node in &config.signers.nodes {
        info!("signer configured url={}", node.url);
    }
    for (name, endpoint) in [
        ("disable_domain", &config.endpoints.disable_domain),
        ("domain_quota_status", &config.endpoints.domain_quota_status),
        ("domain_sign", &config.endpoints.domain_sign),
        ("account_quota_status", &config.endpoints.account_quota_status),
    ] {
        if endpoint.enabled {
            info!("endpoint enabled endpoint={} threshold={}", name, endpoint.threshold);
        } else {
            warn!("endpoint disabled endpoint={}", name);
        }
    }
}

pub fn spawn_status_reporter(metrics: Arc<Metrics>) {
    tokio::spawn(async move {
        info!("status reporter started interval_seconds={}", STATUS_REPORT_INTERVAL_SECS);
        let mut interval = tokio::time::interval(Duration::from_secs(STATUS_REPORT_INTERVAL_SECS));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let snapshot = metrics.snapshot();
            info!(
                "periodic status report uptime_minutes={} requests_ok={} requests_failed={} requests_rejected={} signer_successes={} signer_failures={} early_cancellations={}",
                snapshot.uptime.as_secs() / 60,
                snapshot.requests_ok,
                snapshot.requests_failed,
                snapshot.requests_rejected,
                snapshot.signer_successes,
                snapshot.signer_failures,
                snapshot.early_cancellations
            );
        }
    });
}

pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => warn!("failed to listen for shutdown signal error={}", err),
    }
}

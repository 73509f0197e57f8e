use combiner_core::application::{CombinerObserver, RequestOutcome};
use combiner_core::domain::SessionReport;
use combiner_core::foundation::{CombinerEndpoint, CombinerError};
use log::debug;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub requests_ok: u64,
    pub requests_failed: u64,
    pub requests_rejected: u64,
    pub signer_successes: u64,
    pub signer_failures: u64,
    pub early_cancellations: u64,
}

/// Prometheus counters for the combiner, fed through [`CombinerObserver`].
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    signer_responses_total: IntCounterVec,
    early_cancellations_total: IntCounterVec,
    started_at: Instant,
    requests_ok: AtomicU64,
    requests_failed: AtomicU64,
    requests_rejected: AtomicU64,
    signer_successes: AtomicU64,
    signer_failures: AtomicU64,
    early_cancellations: AtomicU64,
}

fn metric_error(err: prometheus::Error) -> CombinerError {
    CombinerError::Message(format!("metrics: {}", err))
}

impl Metrics {
    pub fn new() -> Result<Self, CombinerError> {
        debug!("initializing prometheus metrics");
        let registry = Registry::new();
        let requests_total = IntCounterVec::new(
            Opts::new("combiner_requests_total", "Client requests by endpoint and outcome"),
            &["endpoint", "outcome"],
        )
        .map_err(metric_error)?;
        let signer_responses_total = IntCounterVec::new(
            Opts::new("signer_responses_total", "Recorded signer results by endpoint and outcome"),
            &["endpoint", "outcome"],
        )
        .map_err(metric_error)?;
        let early_cancellations_total = IntCounterVec::new(
            Opts::new("combiner_early_cancellations_total", "Sessions cancelled with signer calls still in flight"),
            &["endpoint"],
        )
        .map_err(metric_error)?;

        registry.register(Box::new(requests_total.clone())).map_err(metric_error)?;
        registry.register(Box::new(signer_responses_total.clone())).map_err(metric_error)?;
        registry.register(Box::new(early_cancellations_total.clone())).map_err(metric_error)?;

        debug!("prometheus metrics registered metric_count=3");
        Ok(Self {
            registry,
            requests_total,
            signer_responses_total,
            early_cancellations_total,
            started_at: Instant::now(),
            requests_ok: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            signer_successes: AtomicU64::new(0),
            signer_failures: AtomicU64::new(0),
            early_cancellations: AtomicU64::new(0),
        })
    }

    pub fn inc_request(&self, endpoint: CombinerEndpoint, outcome: RequestOutcome) {
        self.requests_total.with_label_values(&[endpoint.as_str(), outcome.as_str()]).inc();
        let counter = match outcome {
            RequestOutcome::Success => &self.requests_ok,
            RequestOutcome::ThresholdFailure | RequestOutcome::InternalError => &self.requests_failed,
            _ => &self.requests_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_signer_responses(&self, endpoint: CombinerEndpoint, outcome: &str, count: u64) {
        if count == 0 {
            return;
        }
        self.signer_responses_total.with_label_values(&[endpoint.as_str(), outcome]).inc_by(count);
        if outcome == "success" {
            self.signer_successes.fetch_add(count, Ordering::Relaxed);
        } else {
            self.signer_failures.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn inc_early_cancellation(&self, endpoint: CombinerEndpoint) {
        self.early_cancellations_total.with_label_values(&[endpoint.as_str()]).inc();
        self.early_cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started_at.elapsed(),
            requests_ok: self.requests_ok.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            signer_successes: self.signer_successes.load(Ordering::Relaxed),
            signer_failures: self.signer_failures.load(Ordering::Relaxed),
            early_cancellations: self.early_cancellations.load(Ordering::Relaxed),
        }
    }

    pub fn encode(&self) -> Result<String, CombinerError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer).map_err(metric_error)?;
        String::from_utf8(buffer).map_err(|err| CombinerError::Message(err.to_string()))
    }
}

impl CombinerObserver for Metrics {
    fn on_rejected(&self, endpoint: CombinerEndpoint, outcome: RequestOutcome) {
        self.inc_request(endpoint, outcome);
    }

    fn on_completed(&self, report: &SessionReport, outcome: RequestOutcome) {
        self.inc_request(report.endpoint, outcome);
        self.inc_signer_responses(report.endpoint, "success", report.successes as u64);
        for classification in &report.failure_classifications {
            self.inc_signer_responses(report.endpoint, classification.as_str(), 1);
        }
        if report.cancelled_early() {
            self.inc_early_cancellation(report.endpoint);
        }
    }
}

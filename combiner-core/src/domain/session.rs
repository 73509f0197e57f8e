//! Per-request aggregation state shared between the dispatcher and the combiner.

use crate::domain::aggregation::{aggregate_failures, AggregatedError, ErrorClassification, SignerFailure};
use crate::domain::request::RequestEnvelope;
use crate::foundation::{CombinerEndpoint, CombinerError, CorrelationId, SessionId, ThresholdConfig};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// One signer reply that passed the kind-specific success check.
#[derive(Clone, Debug, PartialEq)]
pub struct SignerResponse {
    pub url: String,
    pub status: u16,
    pub body: Value,
}

/// Client-facing response produced by the combiner.
#[derive(Clone, Debug, PartialEq)]
pub struct CombinerResponse {
    pub status: u16,
    pub body: Value,
}

impl CombinerResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }
}

/// Why a session stopped accepting signer results before every call settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    ThresholdReached,
    ThresholdUnreachable,
    DeadlineExceeded,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::ThresholdReached => "threshold_reached",
            CancelReason::ThresholdUnreachable => "threshold_unreachable",
            CancelReason::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped logger; every line carries the endpoint, session and correlation ids.
#[derive(Clone, Debug)]
pub struct SessionLogger {
    prefix: String,
}

impl SessionLogger {
    pub fn new(endpoint: CombinerEndpoint, session_id: &SessionId, correlation_id: &CorrelationId) -> Self {
        Self { prefix: format!("endpoint={} session_id={} correlation_id={}", endpoint, session_id, correlation_id) }
    }

    /// Full line as written to the log backend.
    pub fn line(&self, message: impl fmt::Display) -> String {
        format!("{} {}", self.prefix, message)
    }

    pub fn debug(&self, message: impl fmt::Display) {
        debug!("{}", self.line(message));
    }

    pub fn info(&self, message: impl fmt::Display) {
        info!("{}", self.line(message));
    }

    pub fn warn(&self, message: impl fmt::Display) {
        warn!("{}", self.line(message));
    }

    pub fn error(&self, message: impl fmt::Display) {
        error!("{}", self.line(message));
    }
}

/// Exactly-once handle to the client-facing response.
#[derive(Debug)]
pub struct ResponseSink {
    tx: Mutex<Option<oneshot::Sender<CombinerResponse>>>,
}

impl ResponseSink {
    pub fn channel() -> (Self, oneshot::Receiver<CombinerResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Mutex::new(Some(tx)) }, rx)
    }

    /// Returns `Ok(false)` when the receiver is already gone (client disconnected).
    pub fn write(&self, session_id: &SessionId, response: CombinerResponse) -> Result<bool, CombinerError> {
        let tx = self.tx.lock().take();
        match tx {
            Some(tx) => Ok(tx.send(response).is_ok()),
            None => Err(CombinerError::ResponseAlreadyWritten { session_id: session_id.to_string() }),
        }
    }

    pub fn is_written(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Snapshot of a session used for logging and metrics once it is done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    pub endpoint: CombinerEndpoint,
    pub session_id: SessionId,
    pub required: usize,
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    /// Classification of each recorded failure, in arrival order.
    pub failure_classifications: Vec<ErrorClassification>,
    pub outstanding: usize,
    pub cancel_reason: Option<CancelReason>,
}

impl SessionReport {
    pub fn threshold_met(&self) -> bool {
        self.successes >= self.required
    }

    /// Cancelled while signer calls were still in flight.
    pub fn cancelled_early(&self) -> bool {
        self.cancel_reason.is_some() && self.outstanding > 0
    }
}

#[derive(Debug, Default)]
struct SessionState {
    responses: Vec<SignerResponse>,
    failures: Vec<SignerFailure>,
    outstanding: usize,
    closed: bool,
    cancel_reason: Option<CancelReason>,
}

/// Mutable state of one client request, generic over the typed request kind.
///
/// All mutation goes through the methods below, serialized by one mutex. The
/// cancellation token is only fired while that mutex is held, so once a
/// `record_*` call observes it no further result is accepted.
#[derive(Debug)]
pub struct Session<R> {
    envelope: RequestEnvelope<R>,
    endpoint: CombinerEndpoint,
    threshold: ThresholdConfig,
    state: Mutex<SessionState>,
    token: CancellationToken,
    sink: ResponseSink,
    logger: SessionLogger,
}

impl<R> Session<R> {
    pub fn new(
        endpoint: CombinerEndpoint,
        envelope: RequestEnvelope<R>,
        threshold: ThresholdConfig,
        sink: ResponseSink,
    ) -> Self {
        let logger = SessionLogger::new(endpoint, &envelope.session_id, &envelope.correlation_id);
        let state = SessionState { outstanding: threshold.total, ..SessionState::default() };
        Self { envelope, endpoint, threshold, state: Mutex::new(state), token: CancellationToken::new(), sink, logger }
    }

    pub fn envelope(&self) -> &RequestEnvelope<R> {
        &self.envelope
    }

    pub fn endpoint(&self) -> CombinerEndpoint {
        self.endpoint
    }

    pub fn session_id(&self) -> &SessionId {
        &self.envelope.session_id
    }

    pub fn threshold(&self) -> ThresholdConfig {
        self.threshold
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    /// Token observed by every in-flight signer call.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Appends a successful reply; cancels outstanding calls once `t` are collected.
    pub fn record_success(&self, response: SignerResponse) -> bool {
        let mut state = self.state.lock();
        if state.closed || self.token.is_cancelled() {
            drop(state);
            self.logger.debug(format!("late signer success ignored url={} status={}", response.url, response.status));
            return false;
        }
        state.outstanding = state.outstanding.saturating_sub(1);
        state.responses.push(response);
        if state.responses.len() >= self.threshold.required {
            state.cancel_reason.get_or_insert(CancelReason::ThresholdReached);
            self.token.cancel();
        }
        true
    }

    /// Appends a failed call; cancels early when the threshold can no longer be reached.
    pub fn record_failure(&self, failure: SignerFailure) -> bool {
        let mut state = self.state.lock();
        if state.closed || self.token.is_cancelled() {
            drop(state);
            self.logger.debug(format!(
                "late signer failure ignored url={} status={} classification={}",
                failure.url, failure.status, failure.classification
            ));
            return false;
        }
        state.outstanding = state.outstanding.saturating_sub(1);
        state.failures.push(failure);
        if state.responses.len() + state.outstanding < self.threshold.required {
            state.cancel_reason.get_or_insert(CancelReason::ThresholdUnreachable);
            self.token.cancel();
        }
        true
    }

    /// Stops accepting results. `reason` is kept only if nothing cancelled the session before.
    pub fn close(&self, reason: Option<CancelReason>) {
        let mut state = self.state.lock();
        state.closed = true;
        if !self.token.is_cancelled() {
            if let Some(reason) = reason {
                state.cancel_reason = Some(reason);
            }
        }
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn responses(&self) -> Vec<SignerResponse> {
        self.state.lock().responses.clone()
    }

    pub fn failures(&self) -> Vec<SignerFailure> {
        self.state.lock().failures.clone()
    }

    pub fn success_count(&self) -> usize {
        self.state.lock().responses.len()
    }

    pub fn threshold_met(&self) -> bool {
        self.success_count() >= self.threshold.required
    }

    pub fn aggregated_error(&self) -> AggregatedError {
        aggregate_failures(&self.state.lock().failures)
    }

    /// Most frequent failure status; 500 when nothing failed.
    pub fn majority_error_status(&self) -> u16 {
        self.aggregated_error().status
    }

    /// Writes the client response. A second write is an internal error and never overwrites.
    pub fn write(&self, response: CombinerResponse) -> Result<(), CombinerError> {
        let status = response.status;
        match self.sink.write(self.session_id(), response) {
            Ok(true) => {
                self.logger.debug(format!("response written status={}", status));
                Ok(())
            }
            Ok(false) => {
                self.logger.warn(format!("client went away before response status={} was delivered", status));
                Ok(())
            }
            Err(err) => {
                let report = self.report();
                self.logger.error(format!(
                    "{} attempted_status={} successes={} failures={} outstanding={} cancel_reason={:?}",
                    err, status, report.successes, report.failures, report.outstanding, report.cancel_reason
                ));
                Err(err)
            }
        }
    }

    pub fn is_written(&self) -> bool {
        self.sink.is_written()
    }

    pub fn report(&self) -> SessionReport {
        let state = self.state.lock();
        SessionReport {
            endpoint: self.endpoint,
            session_id: self.envelope.session_id.clone(),
            required: self.threshold.required,
            total: self.threshold.total,
            successes: state.responses.len(),
            failures: state.failures.len(),
            failure_classifications: state.failures.iter().map(|f| f.classification).collect(),
            outstanding: state.outstanding,
            cancel_reason: state.cancel_reason,
        }
    }
}

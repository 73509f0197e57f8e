//! Generic combining engine shared by every request kind.

use crate::application::lifecycle::{CombinerObserver, NoopObserver, RequestOutcome};
use crate::domain::{
    AggregatedError, CancelReason, CombinerPhase, CombinerResponse, ErrorType, FailureResponse, InboundRequest, PhaseTracker,
    RequestEnvelope, Session, SessionLogger, SessionReport, SignerFailure, SignerResponse,
};
use crate::foundation::{
    CombinerEndpoint, CombinerError, SessionId, SignerEndpoint, ThresholdConfig, AUTHORIZATION_HEADER, KEY_VERSION_HEADER,
};
use crate::infrastructure::signer::SignerDispatcher;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Kind-specific hooks plugged into [`Combiner`].
#[async_trait]
pub trait CombinerService: Send + Sync + 'static {
    type Request: Send + Sync + 'static;

    fn endpoint(&self) -> CombinerEndpoint;

    fn signer_endpoint(&self) -> SignerEndpoint {
        self.endpoint().signer_endpoint()
    }

    /// Version string reported in response bodies.
    fn version(&self) -> &str;

    /// Structural check of the raw body producing the typed request.
    fn validate(&self, inbound: &InboundRequest) -> Result<Self::Request, CombinerError>;

    /// Client-supplied session id, if the request kind carries one.
    fn session_id(&self, _request: &Self::Request) -> Option<String> {
        None
    }

    async fn authenticate(&self, envelope: &RequestEnvelope<Self::Request>) -> Result<(), CombinerError>;

    /// Kinds that do not use the `keyVersion` header keep the default.
    fn req_key_header_check(&self, _envelope: &RequestEnvelope<Self::Request>) -> Result<(), CombinerError> {
        Ok(())
    }

    /// Decides whether a parsed 2xx signer body counts as a success.
    fn handle_response_ok(&self, logger: &SessionLogger, url: &str, status: u16, body: Value) -> Result<SignerResponse, SignerFailure>;

    fn send_success_response(&self, session: &Session<Self::Request>) -> Result<(), CombinerError>;

    fn send_failure_response(&self, session: &Session<Self::Request>, error: AggregatedError) -> Result<(), CombinerError>;

    fn error_response(&self, error: ErrorType, status: u16) -> CombinerResponse {
        let body = serde_json::to_value(FailureResponse::new(error, self.version())).unwrap_or(Value::Null);
        CombinerResponse::new(status, body)
    }

    /// Success once `t` replies are in, otherwise the aggregated failure.
    fn combine(&self, session: &Session<Self::Request>) -> Result<(), CombinerError> {
        if session.threshold_met() {
            match self.send_success_response(session) {
                Ok(()) => return Ok(()),
                Err(err) if session.is_written() => return Err(err),
                Err(err) => {
                    session.logger().error(format!("building success response failed: {}", err));
                    return session.write(self.error_response(ErrorType::InternalError, 500));
                }
            }
        }
        self.send_failure_response(session, session.aggregated_error())
    }
}

/// Result of one request: the response to send plus the session snapshot, if one existed.
#[derive(Debug, Clone)]
pub struct CombinerOutput {
    pub response: CombinerResponse,
    pub outcome: RequestOutcome,
    pub report: Option<SessionReport>,
}

pub struct Combiner<S: CombinerService> {
    service: S,
    dispatcher: SignerDispatcher,
    threshold: ThresholdConfig,
    request_deadline: Duration,
    enabled: bool,
    observer: Arc<dyn CombinerObserver>,
}

impl<S: CombinerService> Combiner<S> {
    pub fn new(service: S, dispatcher: SignerDispatcher, required: usize, request_deadline: Duration) -> Result<Self, CombinerError> {
        let threshold = ThresholdConfig::new(required, dispatcher.nodes().len())?;
        Ok(Self { service, dispatcher, threshold, request_deadline, enabled: true, observer: Arc::new(NoopObserver) })
    }

    pub fn with_observer(mut self, observer: Arc<dyn CombinerObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn threshold(&self) -> ThresholdConfig {
        self.threshold
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Runs one client request to completion. Always yields exactly one response.
    pub async fn handle(&self, inbound: InboundRequest) -> CombinerOutput {
        let endpoint = self.service.endpoint();
        let logger = SessionLogger::new(endpoint, &SessionId::new("-"), &inbound.correlation_id);
        match self.run(inbound, &logger).await {
            Ok(output) => output,
            Err(err) => {
                logger.error(format!("combiner failed code={:?} error={}", err.code(), err));
                self.reject(RequestOutcome::InternalError, ErrorType::InternalError, 500)
            }
        }
    }

    async fn run(&self, inbound: InboundRequest, logger: &SessionLogger) -> Result<CombinerOutput, CombinerError> {
        let started = Instant::now();
        let mut phase = PhaseTracker::new();

        if !self.enabled {
            logger.debug("endpoint disabled");
            return Ok(self.reject(RequestOutcome::Unavailable, ErrorType::ApiUnavailable, 503));
        }

        phase.advance(CombinerPhase::Validating)?;
        let request = match self.service.validate(&inbound) {
            Ok(request) => request,
            Err(err) => {
                logger.info(format!("request rejected phase={} error={}", phase.phase(), err));
                phase.advance(CombinerPhase::Responded)?;
                return Ok(self.reject(RequestOutcome::InvalidInput, ErrorType::InvalidInput, 400));
            }
        };

        let session_id = self
            .service
            .session_id(&request)
            .filter(|id| !id.trim().is_empty())
            .map(SessionId::new)
            .unwrap_or_else(|| SessionId::new(inbound.correlation_id.as_str()));
        let key_version = inbound.header(KEY_VERSION_HEADER).map(str::to_string);
        let authorization = inbound.header(AUTHORIZATION_HEADER).map(str::to_string);
        let envelope = RequestEnvelope {
            request,
            body: inbound.body,
            session_id,
            key_version,
            authorization,
            correlation_id: inbound.correlation_id,
        };

        phase.advance(CombinerPhase::Authenticating)?;
        if let Err(err) = self.service.authenticate(&envelope).await {
            logger.info(format!("request rejected phase={} session_id={} error={}", phase.phase(), envelope.session_id, err));
            phase.advance(CombinerPhase::Responded)?;
            return Ok(self.reject(RequestOutcome::Unauthenticated, ErrorType::UnauthenticatedUser, 401));
        }
        if let Err(err) = self.service.req_key_header_check(&envelope) {
            logger.info(format!("request rejected phase={} session_id={} error={}", phase.phase(), envelope.session_id, err));
            phase.advance(CombinerPhase::Responded)?;
            return Ok(self.reject(RequestOutcome::InvalidKeyVersion, ErrorType::InvalidKeyVersion, 400));
        }

        phase.advance(CombinerPhase::Dispatching)?;
        let (sink, mut rx) = crate::domain::ResponseSink::channel();
        let session = Session::new(self.service.endpoint(), envelope, self.threshold, sink);
        let deadline_hit = {
            let dispatch = self.dispatcher.dispatch(&session, self.service.signer_endpoint(), |logger, url, status, body| {
                self.service.handle_response_ok(logger, url, status, body)
            });
            phase.advance(CombinerPhase::Awaiting)?;
            tokio::select! {
                _ = session.cancellation_token().cancelled() => false,
                _ = dispatch => false,
                _ = tokio::time::sleep(self.request_deadline) => true,
            }
        };
        if deadline_hit {
            session.logger().warn(format!("request deadline exceeded deadline_ms={}", self.request_deadline.as_millis()));
        }
        session.close(deadline_hit.then_some(CancelReason::DeadlineExceeded));

        phase.advance(CombinerPhase::Combining)?;
        if let Err(err) = self.service.combine(&session) {
            session.logger().error(format!("combine failed error={}", err));
        }
        phase.advance(CombinerPhase::Responded)?;

        let report = session.report();
        let response = rx.try_recv().map_err(|_| CombinerError::Message(format!("no response written for session {}", report.session_id)))?;
        let outcome = if response.status == 200 {
            RequestOutcome::Success
        } else if report.threshold_met() {
            RequestOutcome::InternalError
        } else {
            RequestOutcome::ThresholdFailure
        };
        session.logger().info(format!(
            "request complete outcome={} status={} successes={} failures={} required={} total={} cancel_reason={} elapsed_ms={}",
            outcome,
            response.status,
            report.successes,
            report.failures,
            report.required,
            report.total,
            report.cancel_reason.map(|r| r.as_str()).unwrap_or("none"),
            started.elapsed().as_millis()
        ));
        self.observer.on_completed(&report, outcome);
        Ok(CombinerOutput { response, outcome, report: Some(report) })
    }

    fn reject(&self, outcome: RequestOutcome, error: ErrorType, status: u16) -> CombinerOutput {
        self.observer.on_rejected(self.service.endpoint(), outcome);
        CombinerOutput { response: self.service.error_response(error, status), outcome, report: None }
    }
}

use crate::application::combiner::CombinerService;
use crate::application::services::{
    application_failure, authenticate_signed, invalid_response, parse_signed_request, reply_domain_state,
};
use crate::domain::validation::RequestVerifier;
use crate::domain::{
    threshold_domain_state, AggregatedError, CombinerResponse, DomainQuotaStatusRequest, DomainQuotaStatusResponse, ErrorType,
    InboundRequest, RequestEnvelope, Session, SessionLogger, SignerFailure, SignerQuotaStatusBody, SignerResponse,
};
use crate::foundation::{CombinerEndpoint, CombinerError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// `POST /domain/quotaStatus`: reports the quota state at least `t` signers agree on.
pub struct DomainQuotaStatusService {
    verifier: Arc<dyn RequestVerifier>,
    version: String,
}

impl DomainQuotaStatusService {
    pub fn new(verifier: Arc<dyn RequestVerifier>, version: impl Into<String>) -> Self {
        Self { verifier, version: version.into() }
    }
}

#[async_trait]
impl CombinerService for DomainQuotaStatusService {
    type Request = DomainQuotaStatusRequest;

    fn endpoint(&self) -> CombinerEndpoint {
        CombinerEndpoint::DomainQuotaStatus
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn validate(&self, inbound: &InboundRequest) -> Result<Self::Request, CombinerError> {
        parse_signed_request(inbound)
    }

    fn session_id(&self, request: &Self::Request) -> Option<String> {
        request.session_id.clone()
    }

    async fn authenticate(&self, envelope: &RequestEnvelope<Self::Request>) -> Result<(), CombinerError> {
        authenticate_signed(self.verifier.as_ref(), &envelope.request)
    }

    fn handle_response_ok(&self, logger: &SessionLogger, url: &str, status: u16, body: Value) -> Result<SignerResponse, SignerFailure> {
        let reply: SignerQuotaStatusBody = serde_json::from_value(body.clone()).map_err(|_| invalid_response(url))?;
        if !reply.success {
            logger.warn(format!(
                "signer reported quota status failure url={} error={}",
                url, reply.error.as_deref().unwrap_or("unspecified")
            ));
            return Err(application_failure(url));
        }
        if reply.status.is_none() {
            return Err(invalid_response(url));
        }
        Ok(SignerResponse { url: url.to_string(), status, body })
    }

    fn send_success_response(&self, session: &Session<Self::Request>) -> Result<(), CombinerError> {
        let states: Vec<_> = session.responses().iter().filter_map(reply_domain_state).collect();
        let threshold = session.threshold();
        let status = threshold_domain_state(&states, threshold.required, threshold.total);
        let body = serde_json::to_value(DomainQuotaStatusResponse { success: true, version: self.version.clone(), status })?;
        session.write(CombinerResponse::ok(body))
    }

    fn send_failure_response(&self, session: &Session<Self::Request>, error: AggregatedError) -> Result<(), CombinerError> {
        session.write(self.error_response(ErrorType::ThresholdDomainQuotaStatusFailure, error.status))
    }
}

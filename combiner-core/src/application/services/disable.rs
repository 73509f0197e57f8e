use crate::application::combiner::CombinerService;
use crate::application::services::{application_failure, authenticate_signed, invalid_response, parse_signed_request};
use crate::domain::validation::RequestVerifier;
use crate::domain::{
    AggregatedError, CombinerResponse, DisableDomainRequest, DisableDomainResponse, ErrorType, InboundRequest, RequestEnvelope, Session,
    SessionLogger, SignerAck, SignerFailure, SignerResponse,
};
use crate::foundation::{CombinerEndpoint, CombinerError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// `POST /domain/disable`: permanently disables a domain on at least `t` signers.
pub struct DomainDisableService {
    verifier: Arc<dyn RequestVerifier>,
    version: String,
}

impl DomainDisableService {
    pub fn new(verifier: Arc<dyn RequestVerifier>, version: impl Into<String>) -> Self {
        Self { verifier, version: version.into() }
    }
}

#[async_trait]
impl CombinerService for DomainDisableService {
    type Request = DisableDomainRequest;

    fn endpoint(&self) -> CombinerEndpoint {
        CombinerEndpoint::DisableDomain
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
        let ack: SignerAck = serde_json::from_value(body.clone()).map_err(|_| invalid_response(url))?;
        if !ack.success {
            logger.warn(format!(
                "signer reported disable failure url={} error={}",
                url, ack.error.as_deref().unwrap_or("unspecified")
            ));
            return Err(application_failure(url));
        }
        Ok(SignerResponse { url: url.to_string(), status, body })
    }

    fn send_success_response(&self, session: &Session<Self::Request>) -> Result<(), CombinerError> {
        let body = serde_json::to_value(DisableDomainResponse { success: true, version: self.version.clone() })?;
        session.write(CombinerResponse::ok(body))
    }

    fn send_failure_response(&self, session: &Session<Self::Request>, error: AggregatedError) -> Result<(), CombinerError> {
        session.write(self.error_response(ErrorType::ThresholdDisableDomainFailure, error.status))
    }
}

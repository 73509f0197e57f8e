use crate::application::combiner::CombinerService;
use crate::application::services::{
    application_failure, authenticate_signed, invalid_response, parse_signed_request, reply_domain_state,
};
use crate::domain::validation::RequestVerifier;
use crate::domain::{
    threshold_domain_state, AggregatedError, CombinerResponse, DomainSignRequest, DomainSignResponse, ErrorType, InboundRequest,
    RequestEnvelope, Session, SessionLogger, SignatureShare, SignerFailure, SignerResponse, SignerSignBody,
};
use crate::foundation::{CombinerEndpoint, CombinerError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const QUOTA_EXCEEDED_STATUS: u16 = 429;

/// `POST /domain/sign`: collects `t` signature shares for a blinded message.
///
/// Shares are forwarded as returned by the signers; combining them is up to the client.
pub struct DomainSignService {
    verifier: Arc<dyn RequestVerifier>,
    version: String,
}

impl DomainSignService {
    pub fn new(verifier: Arc<dyn RequestVerifier>, version: impl Into<String>) -> Self {
        Self { verifier, version: version.into() }
    }
}

#[async_trait]
impl CombinerService for DomainSignService {
    type Request = DomainSignRequest;

    fn endpoint(&self) -> CombinerEndpoint {
        CombinerEndpoint::DomainSign
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

    fn req_key_header_check(&self, envelope: &RequestEnvelope<Self::Request>) -> Result<(), CombinerError> {
        match envelope.parsed_key_version()? {
            Some(_) => Ok(()),
            None => Err(CombinerError::InvalidKeyVersion("keyVersion header is required".to_string())),
        }
    }

    fn handle_response_ok(&self, logger: &SessionLogger, url: &str, status: u16, body: Value) -> Result<SignerResponse, SignerFailure> {
        let reply: SignerSignBody = serde_json::from_value(body.clone()).map_err(|_| invalid_response(url))?;
        if !reply.success {
            logger.warn(format!(
                "signer refused to sign url={} error={}",
                url, reply.error.as_deref().unwrap_or("unspecified")
            ));
            return Err(application_failure(url));
        }
        match (reply.signature.as_deref(), reply.status) {
            (Some(signature), Some(_)) if !signature.trim().is_empty() => Ok(SignerResponse { url: url.to_string(), status, body }),
            _ => Err(invalid_response(url)),
        }
    }

    fn send_success_response(&self, session: &Session<Self::Request>) -> Result<(), CombinerError> {
        let threshold = session.threshold();
        let responses = session.responses();
        let signatures = responses
            .iter()
            .take(threshold.required)
            .filter_map(|response| {
                let signature = response.body.get("signature")?.as_str()?;
                Some(SignatureShare { signer: response.url.clone(), signature: signature.to_string() })
            })
            .collect::<Vec<_>>();
        if signatures.len() < threshold.required {
            return Err(CombinerError::ThresholdNotMet { required: threshold.required, received: signatures.len() });
        }
        let states: Vec<_> = responses.iter().filter_map(reply_domain_state).collect();
        let status = threshold_domain_state(&states, threshold.required, threshold.total);
        let body = serde_json::to_value(DomainSignResponse { success: true, version: self.version.clone(), signatures, status })?;
        session.write(CombinerResponse::ok(body))
    }

    fn send_failure_response(&self, session: &Session<Self::Request>, error: AggregatedError) -> Result<(), CombinerError> {
        let error_type =
            if error.status == QUOTA_EXCEEDED_STATUS { ErrorType::ExceededQuota } else { ErrorType::ThresholdDomainSignFailure };
        session.write(self.error_response(error_type, error.status))
    }
}

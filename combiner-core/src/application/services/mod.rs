//! Concrete request kinds served by the combiner.

pub mod account;
pub mod disable;
pub mod quota;
pub mod sign;

pub use account::AccountQuotaStatusService;
pub use disable::DomainDisableService;
pub use quota::DomainQuotaStatusService;
pub use sign::DomainSignService;

use crate::domain::validation::{validate_signed_request, RequestVerifier, SignedDomainRequest};
use crate::domain::{DomainState, ErrorClassification, InboundRequest, SignerFailure, SignerResponse};
use crate::foundation::{CombinerError, APPLICATION_FAILURE_STATUS, BAD_GATEWAY_STATUS};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserializes and structurally validates a signed domain request body.
pub(crate) fn parse_signed_request<T>(inbound: &InboundRequest) -> Result<T, CombinerError>
where
    T: DeserializeOwned + SignedDomainRequest,
{
    let request: T = serde_json::from_value(inbound.body.clone()).map_err(|err| CombinerError::InvalidRequest(err.to_string()))?;
    validate_signed_request(&request)?;
    Ok(request)
}

pub(crate) fn authenticate_signed(verifier: &dyn RequestVerifier, request: &dyn SignedDomainRequest) -> Result<(), CombinerError> {
    let report = verifier.verify(request)?;
    if report.valid {
        return Ok(());
    }
    Err(CombinerError::Unauthenticated(report.failure_reason.unwrap_or_else(|| "signature rejected".to_string())))
}

pub(crate) fn invalid_response(url: &str) -> SignerFailure {
    SignerFailure { url: url.to_string(), status: BAD_GATEWAY_STATUS, classification: ErrorClassification::InvalidResponse }
}

pub(crate) fn application_failure(url: &str) -> SignerFailure {
    SignerFailure { url: url.to_string(), status: APPLICATION_FAILURE_STATUS, classification: ErrorClassification::ApplicationError }
}

/// `DomainState` carried in a stored signer reply under `status`.
pub(crate) fn reply_domain_state(response: &SignerResponse) -> Option<DomainState> {
    response.body.get("status").cloned().and_then(|status: Value| serde_json::from_value(status).ok())
}

//! Structural checks and signature authentication for domain and account requests.

pub mod account;
pub mod verifier;

use crate::domain::model::{
    DisableDomainRequest, Domain, DomainQuotaStatusRequest, DomainSignRequest, SignedRequestOptions, SEQUENTIAL_DELAY_DOMAIN_NAME,
    SEQUENTIAL_DELAY_DOMAIN_VERSION,
};
use crate::foundation::{decode_hex_fixed, CombinerError};
use serde::Serialize;
use sha3::{Digest, Keccak256};

pub use account::{
    account_request_digest, authenticate_account, sign_account_request, AccountAuth, AccountRegistry, StaticAccountRegistry,
};
pub use verifier::{
    address_from_public_key, recover_public_key, sign_digest, sign_request, NoopVerifier, RequestVerifier, Secp256k1Verifier,
    VerificationReport,
};

/// Domain separator mixed into every signed request digest.
pub const SIGNED_REQUEST_PREFIX: &[u8] = b"\x19Threshold Combiner Signed Request:\n";

/// Fields of a request covered by its signature, serialized in declaration order.
#[derive(Debug, Serialize)]
pub struct SigningPayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub domain: &'a Domain,
    pub nonce: u64,
    #[serde(rename = "blindedMessage", skip_serializing_if = "Option::is_none")]
    pub blinded_message: Option<&'a str>,
}

/// Requests authorised by a signature from the domain's owner address.
pub trait SignedDomainRequest {
    fn request_type(&self) -> &'static str;
    fn domain(&self) -> &Domain;
    fn options(&self) -> &SignedRequestOptions;
    fn session_id(&self) -> Option<&str>;

    fn blinded_message(&self) -> Option<&str> {
        None
    }

    fn signing_payload(&self) -> SigningPayload<'_> {
        SigningPayload {
            kind: self.request_type(),
            domain: self.domain(),
            nonce: self.options().nonce,
            blinded_message: self.blinded_message(),
        }
    }
}

impl SignedDomainRequest for DisableDomainRequest {
    fn request_type(&self) -> &'static str {
        "DisableDomainRequest"
    }
    fn domain(&self) -> &Domain {
        &self.domain
    }
    fn options(&self) -> &SignedRequestOptions {
        &self.options
    }
    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

impl SignedDomainRequest for DomainQuotaStatusRequest {
    fn request_type(&self) -> &'static str {
        "DomainQuotaStatusRequest"
    }
    fn domain(&self) -> &Domain {
        &self.domain
    }
    fn options(&self) -> &SignedRequestOptions {
        &self.options
    }
    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

impl SignedDomainRequest for DomainSignRequest {
    fn request_type(&self) -> &'static str {
        "DomainRestrictedSignatureRequest"
    }
    fn domain(&self) -> &Domain {
        &self.domain
    }
    fn options(&self) -> &SignedRequestOptions {
        &self.options
    }
    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
    fn blinded_message(&self) -> Option<&str> {
        Some(&self.blinded_message)
    }
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Digest the requester signs: keccak256(prefix || json(payload)).
pub fn signing_digest(request: &dyn SignedDomainRequest) -> Result<[u8; 32], CombinerError> {
    let json = serde_json::to_vec(&request.signing_payload())?;
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_REQUEST_PREFIX);
    hasher.update(&json);
    Ok(hasher.finalize().into())
}

/// Parses a 20-byte hex account address.
pub fn parse_address(value: &str) -> Result<[u8; 20], CombinerError> {
    decode_hex_fixed::<20>(value).map_err(|err| CombinerError::InvalidRequest(format!("invalid domain address '{value}': {err}")))
}

/// Checks a sequential delay domain descriptor.
pub fn validate_domain(domain: &Domain) -> Result<(), CombinerError> {
    if domain.name != SEQUENTIAL_DELAY_DOMAIN_NAME {
        return Err(CombinerError::InvalidRequest(format!("unsupported domain name '{}'", domain.name)));
    }
    if domain.version != SEQUENTIAL_DELAY_DOMAIN_VERSION {
        return Err(CombinerError::InvalidRequest(format!("unsupported domain version '{}'", domain.version)));
    }
    if domain.stages.is_empty() {
        return Err(CombinerError::InvalidRequest("domain must define at least one stage".to_string()));
    }
    for (idx, stage) in domain.stages.iter().enumerate() {
        if stage.batch_size == Some(0) {
            return Err(CombinerError::InvalidRequest(format!("stage {idx}: batchSize must be positive")));
        }
        if stage.repetitions == Some(0) {
            return Err(CombinerError::InvalidRequest(format!("stage {idx}: repetitions must be positive")));
        }
    }
    match domain.address.as_deref() {
        Some(address) => parse_address(address).map(|_| ()),
        None => Err(CombinerError::InvalidRequest("domain address is required".to_string())),
    }
}

/// Checks fields shared by every signed domain request.
pub fn validate_signed_request(request: &dyn SignedDomainRequest) -> Result<(), CombinerError> {
    validate_domain(request.domain())?;
    if request.options().signature.trim().is_empty() {
        return Err(CombinerError::InvalidRequest("options.signature is required".to_string()));
    }
    if let Some(blinded) = request.blinded_message() {
        if !is_base64(blinded) {
            return Err(CombinerError::InvalidRequest("blindedMessage must be non-empty base64".to_string()));
        }
    }
    Ok(())
}

fn is_base64(value: &str) -> bool {
    if value.is_empty() || value.len() % 4 != 0 {
        return false;
    }
    let body = value.trim_end_matches('=');
    value.len() - body.len() <= 2 && body.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

use serde::{Deserialize, Serialize};

/// Name of the only supported rate-limiting domain.
pub const SEQUENTIAL_DELAY_DOMAIN_NAME: &str = "ODIS Sequential Delay Domain";
pub const SEQUENTIAL_DELAY_DOMAIN_VERSION: &str = "1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialDelayStage {
    pub delay: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_timer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u64>,
}

/// Rate-limiting domain descriptor owned by `address`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub stages: Vec<SequentialDelayStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

/// Quota state as reported by one signer for one domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainState {
    pub timer: u64,
    pub counter: u64,
    pub disabled: bool,
    pub now: u64,
}

impl DomainState {
    pub fn disabled_at(now: u64) -> Self {
        Self { timer: 0, counter: 0, disabled: true, now }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignedRequestOptions {
    /// 65-byte recoverable secp256k1 signature, hex encoded.
    pub signature: String,
    pub nonce: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisableDomainRequestType {
    DisableDomainRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainQuotaStatusRequestType {
    DomainQuotaStatusRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainSignRequestType {
    DomainRestrictedSignatureRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisableDomainRequest {
    #[serde(rename = "type")]
    pub kind: DisableDomainRequestType,
    pub domain: Domain,
    pub options: SignedRequestOptions,
    #[serde(rename = "sessionID", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainQuotaStatusRequest {
    #[serde(rename = "type")]
    pub kind: DomainQuotaStatusRequestType,
    pub domain: Domain,
    pub options: SignedRequestOptions,
    #[serde(rename = "sessionID", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainSignRequest {
    #[serde(rename = "type")]
    pub kind: DomainSignRequestType,
    pub domain: Domain,
    pub options: SignedRequestOptions,
    /// Base64 blinded message; opaque to the combiner.
    #[serde(rename = "blindedMessage")]
    pub blinded_message: String,
    #[serde(rename = "sessionID", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Key an account request's `Authorization` signature is checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationMethod {
    /// The account's own wallet key; the recovered address must be the account.
    #[default]
    WalletKey,
    /// The data encryption key the account registered.
    EncryptionKey,
}

/// Quota query for an account, authenticated by the `Authorization` header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountQuotaStatusRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(rename = "authenticationMethod", default, skip_serializing_if = "Option::is_none")]
    pub authentication_method: Option<AuthenticationMethod>,
    #[serde(rename = "sessionID", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Query allowance of one account as reported by one signer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuota {
    pub performed_query_count: u64,
    pub total_quota: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// Minimal shape every signer reply must have.
#[derive(Clone, Debug, Deserialize)]
pub struct SignerAck {
    pub success: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SignerQuotaStatusBody {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<DomainState>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SignerSignBody {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub status: Option<DomainState>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerAccountQuotaBody {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub performed_query_count: Option<u64>,
    #[serde(default)]
    pub total_quota: Option<u64>,
    #[serde(default)]
    pub block_number: Option<u64>,
}

/// Client-visible error identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    InvalidInput,
    UnauthenticatedUser,
    InvalidKeyVersion,
    ThresholdDisableDomainFailure,
    ThresholdDomainQuotaStatusFailure,
    ThresholdDomainSignFailure,
    ThresholdAccountQuotaStatusFailure,
    ExceededQuota,
    ApiUnavailable,
    InternalError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub version: String,
    pub error: ErrorType,
}

impl FailureResponse {
    pub fn new(error: ErrorType, version: impl Into<String>) -> Self {
        Self { success: false, version: version.into(), error }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisableDomainResponse {
    pub success: bool,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainQuotaStatusResponse {
    pub success: bool,
    pub version: String,
    pub status: DomainState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureShare {
    pub signer: String,
    pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSignResponse {
    pub success: bool,
    pub version: String,
    pub signatures: Vec<SignatureShare>,
    pub status: DomainState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountQuotaStatusResponse {
    pub success: bool,
    pub version: String,
    #[serde(flatten)]
    pub quota: AccountQuota,
}

use crate::foundation::{
    CombinerEndpoint, SignerNode, DEFAULT_BODY_LIMIT_BYTES, DEFAULT_MAX_SIGNER_BODY_BYTES, DEFAULT_REQUEST_DEADLINE_MS,
    DEFAULT_SIGNER_TIMEOUT_MS, VERSION,
};
use crate::infrastructure::signer::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8081";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub signers: SignersConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
}

/// Client-facing HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
    /// Sustained requests per second per client IP. Unset disables rate limiting.
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,
    /// Extra requests tolerated per window above `rate_limit_rps`.
    #[serde(default)]
    pub rate_limit_burst: Option<u32>,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    /// Bearer token guarding `/ready` and `/metrics`. Unset leaves them open.
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_server_addr() -> String {
    DEFAULT_SERVER_ADDR.to_string()
}

const fn default_body_limit_bytes() -> usize {
    DEFAULT_BODY_LIMIT_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            rate_limit_rps: None,
            rate_limit_burst: None,
            body_limit_bytes: default_body_limit_bytes(),
            admin_token: None,
        }
    }
}

/// Backend signer set shared by every endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignersConfig {
    #[serde(default)]
    pub nodes: Vec<SignerNode>,
    /// Per-call timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Upper bound on one client request, independent of individual calls.
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,
    /// Signer replies with a larger body are treated as invalid.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_SIGNER_TIMEOUT_MS
}

const fn default_request_deadline_ms() -> u64 {
    DEFAULT_REQUEST_DEADLINE_MS
}

const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_SIGNER_BODY_BYTES
}

impl Default for SignersConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            timeout_ms: default_timeout_ms(),
            request_deadline_ms: default_request_deadline_ms(),
            max_response_bytes: default_max_response_bytes(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl SignersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Successful signer replies required (`t`).
    #[serde(default = "default_threshold")]
    pub threshold: usize,
}

const fn default_enabled() -> bool {
    true
}

const fn default_threshold() -> usize {
    1
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), threshold: default_threshold() }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default)]
    pub disable_domain: EndpointConfig,
    #[serde(default)]
    pub domain_quota_status: EndpointConfig,
    #[serde(default)]
    pub domain_sign: EndpointConfig,
    #[serde(default)]
    pub account_quota_status: EndpointConfig,
}

impl EndpointsConfig {
    pub fn get(&self, endpoint: CombinerEndpoint) -> &EndpointConfig {
        match endpoint {
            CombinerEndpoint::DisableDomain => &self.disable_domain,
            CombinerEndpoint::DomainQuotaStatus => &self.domain_quota_status,
            CombinerEndpoint::DomainSign => &self.domain_sign,
            CombinerEndpoint::AccountQuotaStatus => &self.account_quota_status,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Overrides the version string reported in response bodies.
    #[serde(default)]
    pub version: Option<String>,
}

impl ServiceConfig {
    pub fn version(&self) -> &str {
        self.version.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(VERSION)
    }
}

/// Account attributes served by the static registry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Account address to hex secp256k1 data encryption key.
    #[serde(default)]
    pub data_encryption_keys: HashMap<String, String>,
}

use crate::foundation::CombinerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

macro_rules! define_id_type {
    (string $name:ident) => {
        #[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id_type!(string SessionId);
define_id_type!(string CorrelationId);

/// One configured backend signer node. The set is fixed for the life of the process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignerNode {
    pub url: String,
}

impl SignerNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Full URL for a signer-side endpoint path.
    pub fn endpoint_url(&self, endpoint: SignerEndpoint) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), endpoint.path())
    }
}

/// Required success count `required` out of `total` configured nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub required: usize,
    pub total: usize,
}

impl ThresholdConfig {
    /// Rejects `t == 0`, `n == 0` and `t > n`; none of these has usable threshold semantics.
    pub fn new(required: usize, total: usize) -> Result<Self, CombinerError> {
        if total == 0 {
            return Err(CombinerError::ConfigError("no signer nodes configured".to_string()));
        }
        if required == 0 {
            return Err(CombinerError::ConfigError("threshold must be at least 1".to_string()));
        }
        if required > total {
            return Err(CombinerError::ConfigError(format!("threshold {required} exceeds signer count {total}")));
        }
        Ok(Self { required, total })
    }
}

/// Client-facing endpoints, one per request kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinerEndpoint {
    DisableDomain,
    DomainQuotaStatus,
    DomainSign,
    AccountQuotaStatus,
}

impl CombinerEndpoint {
    pub const ALL: [CombinerEndpoint; 4] = [
        CombinerEndpoint::DisableDomain,
        CombinerEndpoint::DomainQuotaStatus,
        CombinerEndpoint::DomainSign,
        CombinerEndpoint::AccountQuotaStatus,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            CombinerEndpoint::DisableDomain => "/domain/disable",
            CombinerEndpoint::DomainQuotaStatus => "/domain/quotaStatus",
            CombinerEndpoint::DomainSign => "/domain/sign",
            CombinerEndpoint::AccountQuotaStatus => "/quotaStatus",
        }
    }

    pub fn signer_endpoint(&self) -> SignerEndpoint {
        match self {
            CombinerEndpoint::DisableDomain => SignerEndpoint::DisableDomain,
            CombinerEndpoint::DomainQuotaStatus => SignerEndpoint::DomainQuotaStatus,
            CombinerEndpoint::DomainSign => SignerEndpoint::DomainSign,
            CombinerEndpoint::AccountQuotaStatus => SignerEndpoint::AccountQuotaStatus,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CombinerEndpoint::DisableDomain => "disable_domain",
            CombinerEndpoint::DomainQuotaStatus => "domain_quota_status",
            CombinerEndpoint::DomainSign => "domain_sign",
            CombinerEndpoint::AccountQuotaStatus => "account_quota_status",
        }
    }
}

impl fmt::Display for CombinerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signer-side endpoint paths the combiner forwards to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignerEndpoint {
    DisableDomain,
    DomainQuotaStatus,
    DomainSign,
    AccountQuotaStatus,
}

impl SignerEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            SignerEndpoint::DisableDomain => "/domain/disable",
            SignerEndpoint::DomainQuotaStatus => "/domain/quotaStatus",
            SignerEndpoint::DomainSign => "/domain/sign",
            SignerEndpoint::AccountQuotaStatus => "/quotaStatus",
        }
    }
}

/// Parsed value of the `keyVersion` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyVersion(pub u32);

impl FromStr for KeyVersion {
    type Err = CombinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CombinerError::InvalidKeyVersion(format!("expected a non-negative integer, got '{trimmed}'")));
        }
        trimmed.parse::<u32>().map(KeyVersion).map_err(|err| CombinerError::InvalidKeyVersion(err.to_string()))
    }
}

impl fmt::Display for KeyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

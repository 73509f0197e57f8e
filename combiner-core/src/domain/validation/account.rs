use crate::domain::model::AuthenticationMethod;
use crate::domain::validation::verifier::{address_from_public_key, recover_public_key, sign_digest};
use crate::domain::validation::{parse_address, SIGNED_REQUEST_PREFIX};
use crate::foundation::{decode_hex_prefixed, CombinerError};
use async_trait::async_trait;
use secp256k1::{PublicKey, SecretKey};
use serde_json::Value;
use sha3::{Digest, Keccak256};
use std::collections::HashMap;

/// Per-account attributes held outside the combiner, such as an on-chain accounts registry.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Hex secp256k1 public key the account registered for data encryption. `None` when unregistered.
    async fn data_encryption_key(&self, account: &str) -> Result<Option<String>, CombinerError>;
}

/// Registry backed by a fixed table keyed by lower-case account address.
#[derive(Debug, Default, Clone)]
pub struct StaticAccountRegistry {
    keys: HashMap<String, String>,
}

impl StaticAccountRegistry {
    pub fn new<I, K, V>(keys: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self { keys: keys.into_iter().map(|(account, key)| (account.as_ref().to_ascii_lowercase(), key.into())).collect() }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl AccountRegistry for StaticAccountRegistry {
    async fn data_encryption_key(&self, account: &str) -> Result<Option<String>, CombinerError> {
        Ok(self.keys.get(&account.to_ascii_lowercase()).cloned())
    }
}

/// Outcome of a successful account authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAuth {
    Verified,
    /// The registry could not be consulted; the request is let through.
    RegistryUnavailable(String),
}

/// Digest behind the `Authorization` header: keccak256(prefix || json(body)).
pub fn account_request_digest(body: &Value) -> Result<[u8; 32], CombinerError> {
    let json = serde_json::to_vec(body)?;
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_REQUEST_PREFIX);
    hasher.update(&json);
    Ok(hasher.finalize().into())
}

/// Produces the `Authorization` header value for an account request body.
pub fn sign_account_request(secret: &SecretKey, body: &Value) -> Result<String, CombinerError> {
    Ok(sign_digest(secret, &account_request_digest(body)?))
}

/// Checks the `Authorization` signature over `body` against the key `method` selects.
///
/// `Err` is always `Unauthenticated`. A failing registry lookup is not a rejection.
pub async fn authenticate_account(
    authorization: Option<&str>,
    account: Option<&str>,
    method: AuthenticationMethod,
    body: &Value,
    registry: &dyn AccountRegistry,
) -> Result<AccountAuth, CombinerError> {
    let Some(signature) = authorization.map(str::trim).filter(|value| !value.is_empty()) else {
        return Err(unauthenticated("missing authorization header"));
    };
    let Some(account) = account.map(str::trim).filter(|value| !value.is_empty()) else {
        return Err(unauthenticated("missing account"));
    };

    match method {
        AuthenticationMethod::WalletKey => {
            let expected = parse_address(account).map_err(|err| unauthenticated(err.to_string()))?;
            let recovered = recover(body, signature)?;
            if address_from_public_key(&recovered) != expected {
                return Err(unauthenticated("signer does not match account"));
            }
            Ok(AccountAuth::Verified)
        }
        AuthenticationMethod::EncryptionKey => {
            let registered = match registry.data_encryption_key(account).await {
                Ok(key) => key,
                Err(err) => return Ok(AccountAuth::RegistryUnavailable(err.to_string())),
            };
            let Some(registered) = registered.filter(|key| !key.trim().is_empty()) else {
                return Err(unauthenticated("no data encryption key registered"));
            };
            let registered = parse_public_key(&registered)?;
            if recover(body, signature)? != registered {
                return Err(unauthenticated("signer does not match registered encryption key"));
            }
            Ok(AccountAuth::Verified)
        }
    }
}

fn recover(body: &Value, signature: &str) -> Result<PublicKey, CombinerError> {
    let digest = account_request_digest(body)?;
    recover_public_key(&digest, signature).map_err(|err| unauthenticated(err.to_string()))
}

fn parse_public_key(value: &str) -> Result<PublicKey, CombinerError> {
    decode_hex_prefixed(value)
        .and_then(|bytes| PublicKey::from_slice(&bytes).map_err(CombinerError::from))
        .map_err(|err| unauthenticated(format!("registered encryption key is invalid: {err}")))
}

fn unauthenticated(reason: impl Into<String>) -> CombinerError {
    CombinerError::Unauthenticated(reason.into())
}

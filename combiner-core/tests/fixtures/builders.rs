#![allow(dead_code)]

use crate::fixtures::{OWNER_SECRET, TEST_BLINDED_MESSAGE};
use combiner_core::domain::validation::{address_from_public_key, sign_account_request, sign_request};
use combiner_core::domain::{
    DisableDomainRequest, DisableDomainRequestType, Domain, DomainQuotaStatusRequest, DomainQuotaStatusRequestType, DomainSignRequest,
    DomainSignRequestType, InboundRequest, SequentialDelayStage, SignedRequestOptions, SEQUENTIAL_DELAY_DOMAIN_NAME,
};
use combiner_core::foundation::{CorrelationId, AUTHORIZATION_HEADER, KEY_VERSION_HEADER};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde_json::{json, Value};

pub fn secret(bytes: [u8; 32]) -> SecretKey {
    SecretKey::from_slice(&bytes).expect("secret key")
}

pub fn owner_secret() -> SecretKey {
    secret(OWNER_SECRET)
}

pub fn address_of(secret: &SecretKey) -> String {
    let public = PublicKey::from_secret_key(&Secp256k1::new(), secret);
    format!("0x{}", hex::encode(address_from_public_key(&public)))
}

pub fn domain_owned_by(secret: &SecretKey) -> Domain {
    Domain {
        name: SEQUENTIAL_DELAY_DOMAIN_NAME.to_string(),
        version: "1".to_string(),
        stages: vec![SequentialDelayStage { delay: 0, reset_timer: Some(true), batch_size: Some(2), repetitions: None }],
        address: Some(address_of(secret)),
        salt: None,
    }
}

/// Builds signed request bodies for every request kind.
pub struct DomainRequestBuilder {
    owner: SecretKey,
    signer: SecretKey,
    nonce: u64,
    session_id: Option<String>,
    blinded_message: String,
}

impl Default for DomainRequestBuilder {
    fn default() -> Self {
        Self {
            owner: owner_secret(),
            signer: owner_secret(),
            nonce: 1,
            session_id: Some("test-session".to_string()),
            blinded_message: TEST_BLINDED_MESSAGE.to_string(),
        }
    }
}

impl DomainRequestBuilder {
    /// Signs with `signer` while the domain stays owned by the default owner.
    pub fn signed_by(mut self, signer: SecretKey) -> Self {
        self.signer = signer;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn session_id(mut self, session_id: Option<&str>) -> Self {
        self.session_id = session_id.map(str::to_string);
        self
    }

    pub fn disable(&self) -> DisableDomainRequest {
        let mut request = DisableDomainRequest {
            kind: DisableDomainRequestType::DisableDomainRequest,
            domain: domain_owned_by(&self.owner),
            options: SignedRequestOptions { signature: String::new(), nonce: self.nonce },
            session_id: self.session_id.clone(),
        };
        request.options.signature = sign_request(&self.signer, &request).expect("sign");
        request
    }

    pub fn quota_status(&self) -> DomainQuotaStatusRequest {
        let mut request = DomainQuotaStatusRequest {
            kind: DomainQuotaStatusRequestType::DomainQuotaStatusRequest,
            domain: domain_owned_by(&self.owner),
            options: SignedRequestOptions { signature: String::new(), nonce: self.nonce },
            session_id: self.session_id.clone(),
        };
        request.options.signature = sign_request(&self.signer, &request).expect("sign");
        request
    }

    pub fn sign(&self) -> DomainSignRequest {
        let mut request = DomainSignRequest {
            kind: DomainSignRequestType::DomainRestrictedSignatureRequest,
            domain: domain_owned_by(&self.owner),
            options: SignedRequestOptions { signature: String::new(), nonce: self.nonce },
            blinded_message: self.blinded_message.clone(),
            session_id: self.session_id.clone(),
        };
        request.options.signature = sign_request(&self.signer, &request).expect("sign");
        request
    }
}

pub fn inbound<T: serde::Serialize>(request: &T) -> InboundRequest {
    inbound_json(serde_json::to_value(request).expect("json"))
}

pub fn inbound_json(body: Value) -> InboundRequest {
    InboundRequest::new(body, CorrelationId::new("corr-test"))
}

pub fn with_key_version(inbound: InboundRequest, key_version: &str) -> InboundRequest {
    inbound.with_header(KEY_VERSION_HEADER, key_version)
}

pub fn account_quota_body(account: &str, method: Option<&str>) -> Value {
    let mut body = json!({ "account": account, "sessionID": "account-session" });
    if let Some(method) = method {
        body["authenticationMethod"] = json!(method);
    }
    body
}

/// Attaches an `Authorization` signature over `body` made with `signer`.
pub fn account_inbound(body: Value, signer: &SecretKey) -> InboundRequest {
    let signature = sign_account_request(signer, &body).expect("sign");
    inbound_json(body).with_header(AUTHORIZATION_HEADER, signature)
}

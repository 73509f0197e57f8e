mod http_signers_test;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use combiner_core::domain::validation::{address_from_public_key, sign_account_request, sign_request};
use combiner_core::domain::{
    DisableDomainRequest, DisableDomainRequestType, Domain, DomainQuotaStatusRequest, DomainQuotaStatusRequestType, DomainSignRequest,
    DomainSignRequestType, Secp256k1Verifier, SequentialDelayStage, SignedRequestOptions, SEQUENTIAL_DELAY_DOMAIN_NAME,
};
use combiner_core::foundation::{encode_hex_prefixed, CombinerError, SignerNode};
use combiner_core::infrastructure::config::{AppConfig, EndpointConfig};
use combiner_core::infrastructure::signer::{SignerCall, SignerClient, SignerReply};
use combiner_service::api::{build_router, ApiState};
use combiner_service::service::flow::CombinerFlow;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEST_VERSION: &str = "api-test";
pub const BLINDED_MESSAGE: &str = "AAECAwQFBgcICQ==";

pub fn client_addr(last: u8) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, last], 40_000))
}

fn owner() -> SecretKey {
    SecretKey::from_slice(&[0x42; 32]).expect("secret key")
}

fn domain() -> Domain {
    let public = PublicKey::from_secret_key(&Secp256k1::new(), &owner());
    Domain {
        name: SEQUENTIAL_DELAY_DOMAIN_NAME.to_string(),
        version: "1".to_string(),
        stages: vec![SequentialDelayStage { delay: 0, reset_timer: None, batch_size: None, repetitions: None }],
        address: Some(encode_hex_prefixed(&address_from_public_key(&public))),
        salt: None,
    }
}

fn options() -> SignedRequestOptions {
    SignedRequestOptions { signature: String::new(), nonce: 7 }
}

pub fn disable_body() -> Value {
    let mut request = DisableDomainRequest {
        kind: DisableDomainRequestType::DisableDomainRequest,
        domain: domain(),
        options: options(),
        session_id: None,
    };
    request.options.signature = sign_request(&owner(), &request).expect("sign");
    serde_json::to_value(request).expect("json")
}

pub fn quota_status_body() -> Value {
    let mut request = DomainQuotaStatusRequest {
        kind: DomainQuotaStatusRequestType::DomainQuotaStatusRequest,
        domain: domain(),
        options: options(),
        session_id: Some("quota-session".to_string()),
    };
    request.options.signature = sign_request(&owner(), &request).expect("sign");
    serde_json::to_value(request).expect("json")
}

pub fn sign_body() -> Value {
    let mut request = DomainSignRequest {
        kind: DomainSignRequestType::DomainRestrictedSignatureRequest,
        domain: domain(),
        options: options(),
        blinded_message: BLINDED_MESSAGE.to_string(),
        session_id: Some("sign-session".to_string()),
    };
    request.options.signature = sign_request(&owner(), &request).expect("sign");
    serde_json::to_value(request).expect("json")
}

/// Account quota body plus its `Authorization` header value, signed with the owner's wallet key.
pub fn account_quota_request() -> (Value, String) {
    let public = PublicKey::from_secret_key(&Secp256k1::new(), &owner());
    let body = json!({ "account": encode_hex_prefixed(&address_from_public_key(&public)), "sessionID": "account-session" });
    let authorization = sign_account_request(&owner(), &body).expect("sign");
    (body, authorization)
}

pub fn ok_account_quota_body() -> Value {
    json!({ "success": true, "version": "signer", "performedQueryCount": 1, "totalQuota": 10, "blockNumber": 500 })
}

/// Config with `urls` as signers and every endpoint at threshold `t`.
pub fn config_for(urls: &[String], threshold: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.signers.nodes = urls.iter().cloned().map(SignerNode::new).collect();
    config.signers.timeout_ms = 2_000;
    config.signers.request_deadline_ms = 4_000;
    let endpoint = EndpointConfig { enabled: true, threshold };
    config.endpoints.disable_domain = endpoint;
    config.endpoints.domain_quota_status = endpoint;
    config.endpoints.domain_sign = endpoint;
    config.endpoints.account_quota_status = endpoint;
    config.service.version = Some(TEST_VERSION.to_string());
    config
}

/// Every signer answers with the same canned reply.
pub struct CannedSignerClient {
    status: u16,
    body: Value,
    calls: AtomicUsize,
}

impl CannedSignerClient {
    pub fn new(status: u16, body: Value) -> Arc<Self> {
        Arc::new(Self { status, body, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignerClient for CannedSignerClient {
    async fn post(&self, _call: &SignerCall) -> Result<SignerReply, CombinerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SignerReply { status: self.status, body: self.body.to_string() })
    }
}

pub fn canned_urls(count: usize) -> Vec<String> {
    (1..=count).map(|idx| format!("http://canned-{idx}.test")).collect()
}

pub fn router_with(config: &AppConfig, client: Arc<dyn SignerClient>) -> Router {
    let flow = CombinerFlow::with_client(config, client, Arc::new(Secp256k1Verifier)).expect("flow");
    build_router(Arc::new(ApiState::new(&flow, &config.server)))
}

pub fn ok_signer_body() -> Value {
    json!({
        "success": true,
        "version": "signer",
        "signature": "c2hhcmU=",
        "status": { "timer": 5, "counter": 2, "disabled": false, "now": 10 }
    })
}

pub struct Call<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: Option<String>,
    pub client: SocketAddr,
}

impl<'a> Call<'a> {
    pub fn post(uri: &'a str, body: &Value) -> Self {
        Self { method: "POST", uri, headers: Vec::new(), body: Some(body.to_string()), client: client_addr(1) }
    }

    pub fn get(uri: &'a str) -> Self {
        Self { method: "GET", uri, headers: Vec::new(), body: None, client: client_addr(1) }
    }

    pub fn header(mut self, name: &'a str, value: &'a str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn from_addr(mut self, client: SocketAddr) -> Self {
        self.client = client;
        self
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub text: String,
    pub json: Value,
}

pub async fn send(router: &Router, call: Call<'_>) -> Reply {
    use tower::ServiceExt;

    let mut builder = Request::builder().method(call.method).uri(call.uri).header("content-type", "application/json");
    for (name, value) in &call.headers {
        builder = builder.header(*name, *value);
    }
    let body = call.body.map(Body::from).unwrap_or_else(Body::empty);
    let mut request = builder.body(body).expect("request");
    request.extensions_mut().insert(ConnectInfo(call.client));

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let request_id = response.headers().get("x-request-id").and_then(|v| v.to_str().ok()).map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply { status, request_id, text, json }
}

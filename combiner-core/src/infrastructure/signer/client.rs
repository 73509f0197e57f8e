use crate::foundation::{
    CombinerError, CorrelationId, AUTHORIZATION_HEADER, DEFAULT_MAX_SIGNER_BODY_BYTES, KEY_VERSION_HEADER, REQUEST_ID_HEADER,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// One outbound signer request.
#[derive(Clone, Debug)]
pub struct SignerCall {
    pub url: String,
    pub body: Arc<Value>,
    pub key_version: Option<String>,
    /// Client `Authorization` header, forwarded for account-authenticated kinds.
    pub authorization: Option<String>,
    pub correlation_id: CorrelationId,
}

/// Raw signer reply; the body is parsed by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerReply {
    pub status: u16,
    pub body: String,
}

impl SignerReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound transport to signer nodes.
///
/// Any HTTP status is a reply. `Err` means no usable reply arrived; an oversized body is
/// reported as `UpstreamInvalidResponse`, anything else as a transport error.
#[async_trait]
pub trait SignerClient: Send + Sync {
    async fn post(&self, call: &SignerCall) -> Result<SignerReply, CombinerError>;
}

/// reqwest-backed signer transport. Per-call timeouts are enforced by the dispatcher.
#[derive(Clone, Debug)]
pub struct HttpSignerClient {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpSignerClient {
    pub fn new(connect_timeout: Duration) -> Result<Self, CombinerError> {
        let client = reqwest::Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client, max_body_bytes: DEFAULT_MAX_SIGNER_BODY_BYTES }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Reads the body chunk by chunk, giving up as soon as it exceeds `max_body_bytes`.
    async fn read_body(&self, url: &str, mut response: reqwest::Response) -> Result<String, CombinerError> {
        if let Some(declared) = response.content_length() {
            check_body_len(url, declared, self.max_body_bytes)?;
        }
        let mut body = Vec::new();
        while let Some(chunk) =
            response.chunk().await.map_err(|err| CombinerError::transport(format!("read body {}", url), err.to_string()))?
        {
            check_body_len(url, (body.len() + chunk.len()) as u64, self.max_body_bytes)?;
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn check_body_len(url: &str, len: u64, max: usize) -> Result<(), CombinerError> {
    if len > max as u64 {
        return Err(CombinerError::UpstreamInvalidResponse {
            url: url.to_string(),
            details: format!("response body exceeds {max} bytes"),
        });
    }
    Ok(())
}

#[async_trait]
impl SignerClient for HttpSignerClient {
    async fn post(&self, call: &SignerCall) -> Result<SignerReply, CombinerError> {
        let mut request = self.client.post(&call.url).header(REQUEST_ID_HEADER, call.correlation_id.as_str()).json(call.body.as_ref());
        if let Some(key_version) = call.key_version.as_deref() {
            request = request.header(KEY_VERSION_HEADER, key_version);
        }
        if let Some(authorization) = call.authorization.as_deref() {
            request = request.header(AUTHORIZATION_HEADER, authorization);
        }
        let response = request.send().await.map_err(|err| CombinerError::transport(format!("POST {}", call.url), err.to_string()))?;
        let status = response.status().as_u16();
        let body = self.read_body(&call.url, response).await?;
        Ok(SignerReply { status, body })
    }
}

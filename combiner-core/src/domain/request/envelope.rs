use crate::foundation::{CombinerError, CorrelationId, KeyVersion, SessionId};
use serde_json::Value;

/// Raw client call as handed over by the HTTP layer.
#[derive(Clone, Debug)]
pub struct InboundRequest {
    pub headers: Vec<(String, String)>,
    pub body: Value,
    pub correlation_id: CorrelationId,
}

impl InboundRequest {
    pub fn new(body: Value, correlation_id: CorrelationId) -> Self {
        Self { headers: Vec::new(), body, correlation_id }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup; the first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

/// Validated request of one kind plus the metadata every kind shares.
#[derive(Clone, Debug)]
pub struct RequestEnvelope<R> {
    pub request: R,
    /// Body forwarded verbatim to every signer.
    pub body: Value,
    pub session_id: SessionId,
    /// Raw `keyVersion` header, if the client sent one.
    pub key_version: Option<String>,
    /// Raw `Authorization` header, if the client sent one.
    pub authorization: Option<String>,
    pub correlation_id: CorrelationId,
}

impl<R> RequestEnvelope<R> {
    pub fn parsed_key_version(&self) -> Result<Option<KeyVersion>, CombinerError> {
        self.key_version.as_deref().map(str::parse).transpose()
    }
}

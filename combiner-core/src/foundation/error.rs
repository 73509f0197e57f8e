use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    Unauthenticated,
    InvalidKeyVersion,
    UpstreamTimeout,
    UpstreamInvalidResponse,
    UpstreamApplicationError,
    ThresholdNotMet,
    ResponseAlreadyWritten,
    InvalidStateTransition,
    ConfigError,
    TransportError,
    SerializationError,
    EncodingError,
    CryptoError,
    Message,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum CombinerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request authentication failed: {0}")]
    Unauthenticated(String),

    #[error("invalid key version header: {0}")]
    InvalidKeyVersion(String),

    #[error("signer {url} timed out after {timeout_ms}ms")]
    UpstreamTimeout { url: String, timeout_ms: u64 },

    #[error("signer {url} returned an invalid response: {details}")]
    UpstreamInvalidResponse { url: String, details: String },

    #[error("signer {url} reported an application error (status {status}): {details}")]
    UpstreamApplicationError { url: String, status: u16, details: String },

    #[error("threshold not met: required {required}, received {received}")]
    ThresholdNotMet { required: usize, received: usize },

    #[error("response already written for session {session_id}")]
    ResponseAlreadyWritten { session_id: String },

    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("transport error during {operation}: {details}")]
    TransportError { operation: String, details: String },

    #[error("serialization error ({format}): {details}")]
    SerializationError { format: String, details: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("crypto error during {operation}: {details}")]
    CryptoError { operation: String, details: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, CombinerError>;

impl CombinerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CombinerError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            CombinerError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            CombinerError::InvalidKeyVersion(_) => ErrorCode::InvalidKeyVersion,
            CombinerError::UpstreamTimeout { .. } => ErrorCode::UpstreamTimeout,
            CombinerError::UpstreamInvalidResponse { .. } => ErrorCode::UpstreamInvalidResponse,
            CombinerError::UpstreamApplicationError { .. } => ErrorCode::UpstreamApplicationError,
            CombinerError::ThresholdNotMet { .. } => ErrorCode::ThresholdNotMet,
            CombinerError::ResponseAlreadyWritten { .. } => ErrorCode::ResponseAlreadyWritten,
            CombinerError::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            CombinerError::ConfigError(_) => ErrorCode::ConfigError,
            CombinerError::TransportError { .. } => ErrorCode::TransportError,
            CombinerError::SerializationError { .. } => ErrorCode::SerializationError,
            CombinerError::EncodingError(_) => ErrorCode::EncodingError,
            CombinerError::CryptoError { .. } => ErrorCode::CryptoError,
            CombinerError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext { code: self.code(), message: self.to_string() }
    }

    /// HTTP status the error maps to when it is surfaced to a client directly.
    pub fn http_status(&self) -> u16 {
        match self {
            CombinerError::InvalidRequest(_) | CombinerError::InvalidKeyVersion(_) => 400,
            CombinerError::Unauthenticated(_) => 401,
            CombinerError::UpstreamTimeout { .. } => 504,
            CombinerError::UpstreamInvalidResponse { .. } | CombinerError::TransportError { .. } => 502,
            CombinerError::UpstreamApplicationError { status, .. } => *status,
            _ => 500,
        }
    }

    pub fn transport(operation: impl Into<String>, details: impl Into<String>) -> Self {
        CombinerError::TransportError { operation: operation.into(), details: details.into() }
    }
}

impl From<hex::FromHexError> for CombinerError {
    fn from(err: hex::FromHexError) -> Self {
        CombinerError::EncodingError(format!("hex decode error: {}", err))
    }
}

impl From<io::Error> for CombinerError {
    fn from(err: io::Error) -> Self {
        CombinerError::TransportError { operation: "io".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for CombinerError {
    fn from(err: serde_json::Error) -> Self {
        CombinerError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<reqwest::Error> for CombinerError {
    fn from(err: reqwest::Error) -> Self {
        CombinerError::TransportError { operation: "http".to_string(), details: err.to_string() }
    }
}

impl From<figment::Error> for CombinerError {
    fn from(err: figment::Error) -> Self {
        CombinerError::ConfigError(format!("config extraction failed: {err}"))
    }
}

impl From<secp256k1::Error> for CombinerError {
    fn from(err: secp256k1::Error) -> Self {
        CombinerError::CryptoError { operation: "secp256k1".to_string(), details: err.to_string() }
    }
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `CombinerError` variants at the call site to preserve context.

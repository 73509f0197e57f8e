use crate::domain::SessionReport;
use crate::foundation::CombinerEndpoint;
use std::fmt;

/// Final classification of one client request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    Success,
    ThresholdFailure,
    InvalidInput,
    Unauthenticated,
    InvalidKeyVersion,
    Unavailable,
    InternalError,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::ThresholdFailure => "threshold_failure",
            RequestOutcome::InvalidInput => "invalid_input",
            RequestOutcome::Unauthenticated => "unauthenticated",
            RequestOutcome::InvalidKeyVersion => "invalid_key_version",
            RequestOutcome::Unavailable => "unavailable",
            RequestOutcome::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hooks fired by the combiner once a request is answered.
pub trait CombinerObserver: Send + Sync {
    /// Answered before any signer was contacted.
    fn on_rejected(&self, _endpoint: CombinerEndpoint, _outcome: RequestOutcome) {}
    /// Answered after fan-out.
    fn on_completed(&self, _report: &SessionReport, _outcome: RequestOutcome) {}
}

pub struct NoopObserver;

impl CombinerObserver for NoopObserver {}

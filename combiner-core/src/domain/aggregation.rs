//! Per-node failure records and majority error selection (no logging in domain).

use crate::foundation::DEFAULT_FAILURE_STATUS;
use std::fmt;

/// Closed set of causes a single signer call can fail with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClassification {
    Timeout,
    InvalidResponse,
    ApplicationError,
    Unauthenticated,
    Transport,
}

impl ErrorClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClassification::Timeout => "timeout",
            ErrorClassification::InvalidResponse => "invalid_response",
            ErrorClassification::ApplicationError => "application_error",
            ErrorClassification::Unauthenticated => "unauthenticated",
            ErrorClassification::Transport => "transport",
        }
    }

    /// Classification for a non-2xx signer status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorClassification::Unauthenticated,
            _ => ErrorClassification::ApplicationError,
        }
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded signer failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerFailure {
    pub url: String,
    pub status: u16,
    pub classification: ErrorClassification,
}

/// Error surfaced to the client when the threshold was not met.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregatedError {
    pub status: u16,
    pub classification: Option<ErrorClassification>,
}

/// Most frequent status among `failures`; ties go to the status seen first.
///
/// Returns `None` when nothing failed.
pub fn majority_status(failures: &[SignerFailure]) -> Option<u16> {
    // (status, count) in first-seen order.
    let mut tally: Vec<(u16, usize)> = Vec::new();
    for failure in failures {
        match tally.iter_mut().find(|(status, _)| *status == failure.status) {
            Some((_, count)) => *count += 1,
            None => tally.push((failure.status, 1)),
        }
    }
    let mut best: Option<(u16, usize)> = None;
    for (status, count) in tally {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((status, count)),
        }
    }
    best.map(|(status, _)| status)
}

/// Picks the representative error: majority status, then the first classification seen with it.
pub fn aggregate_failures(failures: &[SignerFailure]) -> AggregatedError {
    match majority_status(failures) {
        Some(status) => AggregatedError {
            status,
            classification: failures.iter().find(|f| f.status == status).map(|f| f.classification),
        },
        None => AggregatedError { status: DEFAULT_FAILURE_STATUS, classification: None },
    }
}

use crate::foundation::CombinerError;
use std::fmt;

/// Lifecycle of one client request through the combiner.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CombinerPhase {
    Created,
    Validating,
    Authenticating,
    Dispatching,
    Awaiting,
    Combining,
    Responded,
}

impl CombinerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinerPhase::Created => "created",
            CombinerPhase::Validating => "validating",
            CombinerPhase::Authenticating => "authenticating",
            CombinerPhase::Dispatching => "dispatching",
            CombinerPhase::Awaiting => "awaiting",
            CombinerPhase::Combining => "combining",
            CombinerPhase::Responded => "responded",
        }
    }
}

impl fmt::Display for CombinerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Validation and authentication failures (including the key header check) jump straight to Responded.
const VALID_TRANSITIONS: &[(CombinerPhase, CombinerPhase)] = &[
    (CombinerPhase::Created, CombinerPhase::Validating),
    (CombinerPhase::Validating, CombinerPhase::Authenticating),
    (CombinerPhase::Validating, CombinerPhase::Responded),
    (CombinerPhase::Authenticating, CombinerPhase::Dispatching),
    (CombinerPhase::Authenticating, CombinerPhase::Responded),
    (CombinerPhase::Dispatching, CombinerPhase::Awaiting),
    (CombinerPhase::Awaiting, CombinerPhase::Combining),
    (CombinerPhase::Combining, CombinerPhase::Responded),
];

pub fn validate_transition(from: CombinerPhase, to: CombinerPhase) -> bool {
    VALID_TRANSITIONS.contains(&(from, to))
}

pub fn is_terminal(phase: CombinerPhase) -> bool {
    matches!(phase, CombinerPhase::Responded)
}

/// Tracks the current phase of one request and refuses illegal moves.
#[derive(Debug)]
pub struct PhaseTracker {
    phase: CombinerPhase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self { phase: CombinerPhase::Created }
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CombinerPhase {
        self.phase
    }

    pub fn advance(&mut self, to: CombinerPhase) -> Result<(), CombinerError> {
        if !validate_transition(self.phase, to) {
            return Err(CombinerError::InvalidStateTransition { from: self.phase.to_string(), to: to.to_string() });
        }
        self.phase = to;
        Ok(())
    }
}

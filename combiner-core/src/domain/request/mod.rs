pub mod envelope;
pub mod state_machine;

pub use envelope::{InboundRequest, RequestEnvelope};
pub use state_machine::{is_terminal, validate_transition, CombinerPhase, PhaseTracker};

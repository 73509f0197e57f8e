//! Domain layer: pure request/response model, session state and aggregation rules.

pub mod aggregation;
pub mod model;
pub mod quota;
pub mod request;
pub mod session;
pub mod validation;

pub use aggregation::{aggregate_failures, majority_status, AggregatedError, ErrorClassification, SignerFailure};
pub use model::*;
pub use quota::{threshold_account_quota, threshold_domain_state};
pub use request::{CombinerPhase, InboundRequest, PhaseTracker, RequestEnvelope};
pub use validation::{AccountRegistry, NoopVerifier, RequestVerifier, Secp256k1Verifier, SignedDomainRequest, StaticAccountRegistry};
pub use session::{CancelReason, CombinerResponse, ResponseSink, Session, SessionLogger, SessionReport, SignerResponse};

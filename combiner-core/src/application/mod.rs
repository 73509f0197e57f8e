//! Application layer: the combining template and the request kinds built on it.

pub mod combiner;
pub mod lifecycle;
pub mod services;

pub use combiner::{Combiner, CombinerOutput, CombinerService};
pub use lifecycle::{CombinerObserver, NoopObserver, RequestOutcome};
pub use services::{AccountQuotaStatusService, DomainDisableService, DomainQuotaStatusService, DomainSignService};

//! Outbound signer transport, per-node circuit breakers and fan-out dispatch.

pub mod circuit_breaker;
pub mod client;
pub mod dispatcher;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, SignerBreakers};
pub use client::{HttpSignerClient, SignerCall, SignerClient, SignerReply};
pub use dispatcher::{interpret_reply, SignerDispatcher};

//! System-wide constants for the threshold combiner.

/// Version string reported in every client-facing response body.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP header carrying the client-selected signer key version.
pub const KEY_VERSION_HEADER: &str = "keyVersion";

/// HTTP header carrying an account signature, forwarded to signer nodes.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// HTTP header carrying the correlation id, forwarded to signer nodes.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Default per-signer call timeout in milliseconds.
pub const DEFAULT_SIGNER_TIMEOUT_MS: u64 = 5_000;

/// Default overall request deadline in milliseconds.
///
/// Bounds the total latency of one client request independently of any single node timeout.
pub const DEFAULT_REQUEST_DEADLINE_MS: u64 = 10_000;

/// Maximum allowed overall request deadline (2 minutes).
pub const MAX_REQUEST_DEADLINE_MS: u64 = 120_000;

/// Maximum number of configured signer nodes.
pub const MAX_SIGNER_NODES: usize = 100;

/// Status reported when no failure was recorded but the threshold was still not met.
pub const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Status recorded for a signer call that exceeded its timeout.
pub const TIMEOUT_FAILURE_STATUS: u16 = 504;

/// Status recorded for transport failures and malformed signer bodies.
pub const BAD_GATEWAY_STATUS: u16 = 502;

/// Status recorded when a signer answers 2xx but reports `success: false`.
pub const APPLICATION_FAILURE_STATUS: u16 = 500;

/// Circuit breaker base backoff (seconds) before exponential growth.
pub const CIRCUIT_BREAKER_BASE_BACKOFF_SECS: u64 = 1;

/// Default upper bound on one signer response body (256 KiB).
pub const DEFAULT_MAX_SIGNER_BODY_BYTES: usize = 256 * 1024;

/// Upper bound on signer response bodies kept for logging.
pub const MAX_LOGGED_BODY_LEN: usize = 256;

/// Rate limiter window length in seconds.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 1;

/// Rate limiter cleanup interval in seconds.
pub const RATE_LIMIT_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Rate limiter idle entry TTL in seconds.
pub const RATE_LIMIT_ENTRY_TTL_SECS: u64 = 600;

/// Default request body size limit (1 MB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

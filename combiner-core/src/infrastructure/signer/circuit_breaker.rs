use crate::foundation::{SignerNode, CIRCUIT_BREAKER_BASE_BACKOFF_SECS};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const MAX_BACKOFF_SHIFT: u32 = 30;
// Jitter of +/-20% derived from wall-clock nanos.
const JITTER_BUCKETS: u64 = 41;
const JITTER_HALF_RANGE: i64 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before a node is skipped.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Longest time a node stays skipped before a trial call (seconds).
    #[serde(default = "default_open_duration_secs")]
    pub open_duration_secs: u64,
    /// Trial successes required before the node is trusted again.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_open_duration_secs() -> u64 {
    30
}

const fn default_success_threshold() -> u32 {
    1
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_duration_secs: default_open_duration_secs(),
            success_threshold: default_success_threshold(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakerState {
    Closed { failures: u32 },
    Open { until: Instant, trips: u32 },
    /// `in_trial` is set while the single trial call is in flight.
    HalfOpen { successes: u32, trips: u32, in_trial: bool },
}

/// Closed/Open/HalfOpen breaker guarding calls to one signer node.
#[derive(Debug)]
pub struct CircuitBreaker {
    url: String,
    cfg: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(url: impl Into<String>, cfg: CircuitBreakerConfig) -> Self {
        Self { url: url.into(), cfg, state: Mutex::new(BreakerState::Closed { failures: 0 }) }
    }

    /// Whether a call may go out now.
    ///
    /// Once the open period expires a single trial call goes through; other callers are
    /// refused until it reports back or is released.
    pub fn allow(&self) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();
        match *state {
            BreakerState::Closed { .. } => true,
            BreakerState::HalfOpen { in_trial: true, trips, .. } => {
                debug!("signer circuit half-open; trial in flight url={} trips={}", self.url, trips);
                false
            }
            BreakerState::HalfOpen { successes, trips, in_trial: false } => {
                *state = BreakerState::HalfOpen { successes, trips, in_trial: true };
                true
            }
            BreakerState::Open { until, trips } if now >= until => {
                info!("signer circuit half-open url={} trips={}", self.url, trips);
                *state = BreakerState::HalfOpen { successes: 0, trips, in_trial: true };
                true
            }
            BreakerState::Open { until, trips } => {
                debug!(
                    "signer circuit open; skipping call url={} open_for_ms={} trips={}",
                    self.url,
                    until.saturating_duration_since(now).as_millis(),
                    trips
                );
                false
            }
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        *state = match *state {
            BreakerState::HalfOpen { successes, trips, .. } => {
                let successes = successes.saturating_add(1);
                if successes >= self.cfg.success_threshold.max(1) {
                    info!("signer circuit closed url={} successes={}", self.url, successes);
                    BreakerState::Closed { failures: 0 }
                } else {
                    BreakerState::HalfOpen { successes, trips, in_trial: false }
                }
            }
            BreakerState::Closed { .. } => BreakerState::Closed { failures: 0 },
            open @ BreakerState::Open { .. } => open,
        };
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        *state = match *state {
            BreakerState::Closed { failures } => {
                let failures = failures.saturating_add(1);
                if failures >= self.cfg.failure_threshold.max(1) {
                    let until = self.open_until(1);
                    warn!(
                        "signer circuit opened url={} failures={} open_for_ms={}",
                        self.url,
                        failures,
                        until.saturating_duration_since(Instant::now()).as_millis()
                    );
                    BreakerState::Open { until, trips: 1 }
                } else {
                    BreakerState::Closed { failures }
                }
            }
            BreakerState::HalfOpen { trips, .. } => {
                let trips = trips.saturating_add(1);
                let until = self.open_until(trips);
                warn!(
                    "signer circuit re-opened after failed trial url={} trips={} open_for_ms={}",
                    self.url,
                    trips,
                    until.saturating_duration_since(Instant::now()).as_millis()
                );
                BreakerState::Open { until, trips }
            }
            open @ BreakerState::Open { .. } => open,
        };
    }

    /// Frees the trial slot of a call that ended without an outcome.
    pub fn release_trial(&self) {
        let mut state = self.state.lock();
        if let BreakerState::HalfOpen { successes, trips, in_trial: true } = *state {
            debug!("signer circuit trial released without outcome url={}", self.url);
            *state = BreakerState::HalfOpen { successes, trips, in_trial: false };
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock(), BreakerState::Open { until, .. } if Instant::now() < until)
    }

    /// Exponential backoff from the base, capped at `open_duration_secs`, with jitter.
    fn open_until(&self, trips: u32) -> Instant {
        let max = Duration::from_secs(self.cfg.open_duration_secs.max(1));
        let factor = 1u32.checked_shl(trips.saturating_sub(1).min(MAX_BACKOFF_SHIFT)).unwrap_or(u32::MAX);
        let backoff = Duration::from_secs(CIRCUIT_BREAKER_BASE_BACKOFF_SECS).checked_mul(factor).unwrap_or(max).min(max);

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| u64::from(d.subsec_nanos())).unwrap_or(0);
        let jitter_pct = (nanos % JITTER_BUCKETS) as i64 - JITTER_HALF_RANGE;
        let millis = (backoff.as_millis() as i64).saturating_mul(100 + jitter_pct) / 100;
        Instant::now() + Duration::from_millis(millis.max(1) as u64)
    }
}

/// One breaker per configured node, shared by every endpoint for the life of the process.
#[derive(Debug, Default, Clone)]
pub struct SignerBreakers {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
}

impl SignerBreakers {
    pub fn new(nodes: &[SignerNode], cfg: CircuitBreakerConfig) -> Self {
        let breakers = nodes.iter().map(|node| (node.url.clone(), Arc::new(CircuitBreaker::new(node.url.clone(), cfg)))).collect();
        Self { breakers }
    }

    pub fn get(&self, url: &str) -> Option<&Arc<CircuitBreaker>> {
        self.breakers.get(url)
    }

    /// Nodes currently skipped.
    pub fn open_nodes(&self) -> Vec<String> {
        let mut open: Vec<String> = self.breakers.iter().filter(|(_, b)| b.is_open()).map(|(url, _)| url.clone()).collect();
        open.sort();
        open
    }
}

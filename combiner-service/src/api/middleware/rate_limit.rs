use crate::api::state::ApiState;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use combiner_core::foundation::{RATE_LIMIT_CLEANUP_INTERVAL_SECS, RATE_LIMIT_ENTRY_TTL_SECS, RATE_LIMIT_WINDOW_SECS};
use log::{debug, error};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(RATE_LIMIT_WINDOW_SECS);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(RATE_LIMIT_CLEANUP_INTERVAL_SECS);
const ENTRY_TTL: Duration = Duration::from_secs(RATE_LIMIT_ENTRY_TTL_SECS);

/// Fixed window per client IP; `burst` extra requests may spill over each window.
#[derive(Debug)]
struct Bucket {
    window_start: Instant,
    in_window: u32,
    burst_used: u32,
    last_seen: Instant,
}

impl Bucket {
    fn new(now: Instant) -> Self {
        Self { window_start: now, in_window: 0, burst_used: 0, last_seen: now }
    }

    fn take(&mut self, now: Instant, rps: u32, burst: u32) -> bool {
        self.last_seen = now;
        if now.duration_since(self.window_start) >= WINDOW {
            self.window_start = now;
            self.in_window = 0;
            self.burst_used = 0;
        }
        if self.in_window < rps {
            self.in_window += 1;
            true
        } else if self.burst_used < burst {
            self.burst_used += 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct Buckets {
    per_ip: HashMap<IpAddr, Bucket>,
    last_cleanup: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    inner: Mutex<Buckets>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Buckets { per_ip: HashMap::new(), last_cleanup: Instant::now() }) }
    }

    pub fn allow(&self, now: Instant, client_ip: IpAddr, rps: u32, burst: u32) -> bool {
        let Ok(mut buckets) = self.inner.lock() else {
            error!("rate limiter lock poisoned; denying request client_ip={}", client_ip);
            return false;
        };
        if now.duration_since(buckets.last_cleanup) >= CLEANUP_INTERVAL {
            buckets.last_cleanup = now;
            let cutoff = now.checked_sub(ENTRY_TTL).unwrap_or(now);
            buckets.per_ip.retain(|_, bucket| bucket.last_seen >= cutoff);
        }
        buckets.per_ip.entry(client_ip).or_insert_with(|| Bucket::new(now)).take(now, rps, burst)
    }

    pub fn tracked_clients(&self) -> usize {
        self.inner.lock().map(|buckets| buckets.per_ip.len()).unwrap_or(0)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn rate_limit_middleware(State(state): State<Arc<ApiState>>, req: Request<Body>, next: Next) -> Response {
    let Some(rps) = state.rate_limit_rps else {
        return next.run(req).await;
    };
    let rps = rps.max(1);
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.rate_limiter.allow(Instant::now(), client_ip, rps, state.rate_limit_burst) {
        debug!("rate limit exceeded client_ip={} rps={} burst={}", client_ip, rps, state.rate_limit_burst);
        let body = serde_json::json!({ "success": false, "error": "RATE_LIMITED" });
        return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    }
    next.run(req).await
}

use crate::api::RateLimiter;
use crate::service::flow::CombinerFlow;
use crate::service::metrics::Metrics;
use combiner_core::application::{AccountQuotaStatusService, Combiner, DomainDisableService, DomainQuotaStatusService, DomainSignService};
use combiner_core::infrastructure::config::ServerConfig;
use combiner_core::infrastructure::signer::SignerBreakers;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub disable: Arc<Combiner<DomainDisableService>>,
    pub quota_status: Arc<Combiner<DomainQuotaStatusService>>,
    pub sign: Arc<Combiner<DomainSignService>>,
    pub account_quota: Arc<Combiner<AccountQuotaStatusService>>,
    pub breakers: SignerBreakers,
    pub metrics: Arc<Metrics>,
    pub rate_limiter: Arc<RateLimiter>,
    pub admin_token: Option<String>,
    /// `None` disables rate limiting.
    pub rate_limit_rps: Option<u32>,
    pub rate_limit_burst: u32,
    pub body_limit_bytes: usize,
}

impl ApiState {
    pub fn new(flow: &CombinerFlow, server: &ServerConfig) -> Self {
        Self {
            disable: flow.disable(),
            quota_status: flow.quota_status(),
            sign: flow.sign(),
            account_quota: flow.account_quota(),
            breakers: flow.breakers(),
            metrics: flow.metrics(),
            rate_limiter: Arc::new(RateLimiter::new()),
            admin_token: server.admin_token.clone(),
            rate_limit_rps: server.rate_limit_rps,
            rate_limit_burst: server.rate_limit_burst.unwrap_or(0),
            body_limit_bytes: server.body_limit_bytes,
        }
    }
}

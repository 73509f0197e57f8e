use crate::service::metrics::Metrics;
use combiner_core::application::{
    AccountQuotaStatusService, Combiner, CombinerService, DomainDisableService, DomainQuotaStatusService, DomainSignService,
};
use combiner_core::domain::{AccountRegistry, RequestVerifier, Secp256k1Verifier, StaticAccountRegistry};
use combiner_core::foundation::{CombinerEndpoint, CombinerError};
use combiner_core::infrastructure::config::AppConfig;
use combiner_core::infrastructure::signer::{HttpSignerClient, SignerBreakers, SignerClient, SignerDispatcher};
use log::info;
use std::sync::Arc;

/// Wires every request kind to one signer transport and one set of breakers.
pub struct CombinerFlow {
    disable: Arc<Combiner<DomainDisableService>>,
    quota_status: Arc<Combiner<DomainQuotaStatusService>>,
    sign: Arc<Combiner<DomainSignService>>,
    account_quota: Arc<Combiner<AccountQuotaStatusService>>,
    breakers: SignerBreakers,
    metrics: Arc<Metrics>,
}

impl CombinerFlow {
    pub fn new(config: &AppConfig) -> Result<Self, CombinerError> {
        let client = Arc::new(
            HttpSignerClient::new(config.signers.timeout())?.with_max_body_bytes(config.signers.max_response_bytes),
        );
        Self::with_client(config, client, Arc::new(Secp256k1Verifier))
    }

    /// Serves account keys from the `accounts` config section.
    pub fn with_client(
        config: &AppConfig,
        client: Arc<dyn SignerClient>,
        verifier: Arc<dyn RequestVerifier>,
    ) -> Result<Self, CombinerError> {
        let registry = StaticAccountRegistry::new(&config.accounts.data_encryption_keys);
        info!("account registry loaded encryption_keys={}", registry.len());
        Self::with_collaborators(config, client, verifier, Arc::new(registry))
    }

    pub fn with_collaborators(
        config: &AppConfig,
        client: Arc<dyn SignerClient>,
        verifier: Arc<dyn RequestVerifier>,
        registry: Arc<dyn AccountRegistry>,
    ) -> Result<Self, CombinerError> {
        let nodes = config.signers.nodes.clone();
        let breakers = SignerBreakers::new(&nodes, config.signers.circuit_breaker);
        let dispatcher = SignerDispatcher::new(nodes, client, breakers.clone(), config.signers.timeout());
        let metrics = Arc::new(Metrics::new()?);
        let version = config.service.version().to_string();

        let settings = |endpoint: CombinerEndpoint| -> (usize, bool) {
            let endpoint_config = config.endpoints.get(endpoint);
            let total = config.signers.nodes.len().max(1);
            // Disabled endpoints never dispatch; keep their threshold constructible.
            let threshold =
                if endpoint_config.enabled { endpoint_config.threshold } else { endpoint_config.threshold.clamp(1, total) };
            (threshold, endpoint_config.enabled)
        };

        let disable = assemble(
            DomainDisableService::new(verifier.clone(), version.clone()),
            &dispatcher,
            settings(CombinerEndpoint::DisableDomain),
            config,
            &metrics,
        )?;
        let quota_status = assemble(
            DomainQuotaStatusService::new(verifier.clone(), version.clone()),
            &dispatcher,
            settings(CombinerEndpoint::DomainQuotaStatus),
            config,
            &metrics,
        )?;
        let sign = assemble(
            DomainSignService::new(verifier, version.clone()),
            &dispatcher,
            settings(CombinerEndpoint::DomainSign),
            config,
            &metrics,
        )?;
        let account_quota = assemble(
            AccountQuotaStatusService::new(registry, version),
            &dispatcher,
            settings(CombinerEndpoint::AccountQuotaStatus),
            config,
            &metrics,
        )?;

        Ok(Self { disable, quota_status, sign, account_quota, breakers, metrics })
    }

    pub fn disable(&self) -> Arc<Combiner<DomainDisableService>> {
        self.disable.clone()
    }

    pub fn quota_status(&self) -> Arc<Combiner<DomainQuotaStatusService>> {
        self.quota_status.clone()
    }

    pub fn sign(&self) -> Arc<Combiner<DomainSignService>> {
        self.sign.clone()
    }

    pub fn account_quota(&self) -> Arc<Combiner<AccountQuotaStatusService>> {
        self.account_quota.clone()
    }

    pub fn breakers(&self) -> SignerBreakers {
        self.breakers.clone()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }
}

fn assemble<S: CombinerService>(
    service: S,
    dispatcher: &SignerDispatcher,
    (threshold, enabled): (usize, bool),
    config: &AppConfig,
    metrics: &Arc<Metrics>,
) -> Result<Arc<Combiner<S>>, CombinerError> {
    let endpoint = service.endpoint();
    let combiner = Combiner::new(service, dispatcher.clone(), threshold, config.signers.request_deadline())?
        .with_observer(metrics.clone())
        .with_enabled(enabled);
    info!(
        "combiner ready endpoint={} path={} threshold={} total={} enabled={}",
        endpoint,
        endpoint.path(),
        combiner.threshold().required,
        combiner.threshold().total,
        enabled
    );
    Ok(Arc::new(combiner))
}

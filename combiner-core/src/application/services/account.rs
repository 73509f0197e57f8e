use crate::application::combiner::CombinerService;
use crate::application::services::{application_failure, invalid_response};
use crate::domain::validation::{authenticate_account, parse_address, AccountAuth, AccountRegistry};
use crate::domain::{
    threshold_account_quota, AccountQuota, AccountQuotaStatusRequest, AccountQuotaStatusResponse, AggregatedError, CombinerResponse,
    ErrorType, InboundRequest, RequestEnvelope, Session, SessionLogger, SignerAccountQuotaBody, SignerFailure, SignerResponse,
};
use crate::foundation::{CombinerEndpoint, CombinerError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// `POST /quotaStatus`: reports the query allowance at least `t` signers grant an account.
pub struct AccountQuotaStatusService {
    registry: Arc<dyn AccountRegistry>,
    version: String,
}

impl AccountQuotaStatusService {
    pub fn new(registry: Arc<dyn AccountRegistry>, version: impl Into<String>) -> Self {
        Self { registry, version: version.into() }
    }
}

#[async_trait]
impl CombinerService for AccountQuotaStatusService {
    type Request = AccountQuotaStatusRequest;

    fn endpoint(&self) -> CombinerEndpoint {
        CombinerEndpoint::AccountQuotaStatus
    }

    fn version(&self) -> &str {
        &self.version
    }

    /// A missing account is left to authentication; a malformed one is invalid input.
    fn validate(&self, inbound: &InboundRequest) -> Result<Self::Request, CombinerError> {
        let request: AccountQuotaStatusRequest =
            serde_json::from_value(inbound.body.clone()).map_err(|err| CombinerError::InvalidRequest(err.to_string()))?;
        if let Some(account) = request.account.as_deref().filter(|account| !account.trim().is_empty()) {
            parse_address(account)?;
        }
        Ok(request)
    }

    fn session_id(&self, request: &Self::Request) -> Option<String> {
        request.session_id.clone()
    }

    async fn authenticate(&self, envelope: &RequestEnvelope<Self::Request>) -> Result<(), CombinerError> {
        let request = &envelope.request;
        let auth = authenticate_account(
            envelope.authorization.as_deref(),
            request.account.as_deref(),
            request.authentication_method.unwrap_or_default(),
            &envelope.body,
            self.registry.as_ref(),
        )
        .await?;
        if let AccountAuth::RegistryUnavailable(reason) = auth {
            SessionLogger::new(self.endpoint(), &envelope.session_id, &envelope.correlation_id)
                .warn(format!("account registry lookup failed; accepting request error={}", reason));
        }
        Ok(())
    }

    fn handle_response_ok(&self, logger: &SessionLogger, url: &str, status: u16, body: Value) -> Result<SignerResponse, SignerFailure> {
        let reply: SignerAccountQuotaBody = serde_json::from_value(body.clone()).map_err(|_| invalid_response(url))?;
        if !reply.success {
            logger.warn(format!(
                "signer reported account quota failure url={} error={}",
                url,
                reply.error.as_deref().unwrap_or("unspecified")
            ));
            return Err(application_failure(url));
        }
        if reply.performed_query_count.is_none() || reply.total_quota.is_none() {
            return Err(invalid_response(url));
        }
        Ok(SignerResponse { url: url.to_string(), status, body })
    }

    fn send_success_response(&self, session: &Session<Self::Request>) -> Result<(), CombinerError> {
        let quotas: Vec<AccountQuota> = session.responses().iter().filter_map(reply_account_quota).collect();
        let threshold = session.threshold();
        let quota = threshold_account_quota(&quotas, threshold.required)
            .ok_or(CombinerError::ThresholdNotMet { required: threshold.required, received: quotas.len() })?;
        let body = serde_json::to_value(AccountQuotaStatusResponse { success: true, version: self.version.clone(), quota })?;
        session.write(CombinerResponse::ok(body))
    }

    fn send_failure_response(&self, session: &Session<Self::Request>, error: AggregatedError) -> Result<(), CombinerError> {
        session.write(self.error_response(ErrorType::ThresholdAccountQuotaStatusFailure, error.status))
    }
}

fn reply_account_quota(response: &SignerResponse) -> Option<AccountQuota> {
    let reply: SignerAccountQuotaBody = serde_json::from_value(response.body.clone()).ok()?;
    Some(AccountQuota {
        performed_query_count: reply.performed_query_count?,
        total_quota: reply.total_quota?,
        block_number: reply.block_number,
    })
}

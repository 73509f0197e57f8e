use crate::domain::{ErrorClassification, Session, SessionLogger, SignerFailure, SignerResponse};
use crate::foundation::{
    truncate_for_log, CombinerError, SignerEndpoint, SignerNode, BAD_GATEWAY_STATUS, TIMEOUT_FAILURE_STATUS,
};
use crate::infrastructure::signer::{CircuitBreaker, SignerBreakers, SignerCall, SignerClient, SignerReply};
use futures_util::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::error::Elapsed;

/// Fans one request out to every configured signer and streams results into the session.
#[derive(Clone)]
pub struct SignerDispatcher {
    nodes: Arc<[SignerNode]>,
    client: Arc<dyn SignerClient>,
    breakers: SignerBreakers,
    timeout: Duration,
}

impl SignerDispatcher {
    pub fn new(nodes: Vec<SignerNode>, client: Arc<dyn SignerClient>, breakers: SignerBreakers, timeout: Duration) -> Self {
        Self { nodes: nodes.into(), client, breakers, timeout }
    }

    pub fn nodes(&self) -> &[SignerNode] {
        &self.nodes
    }

    pub fn breakers(&self) -> &SignerBreakers {
        &self.breakers
    }

    /// Resolves once every call has either been recorded or observed cancellation.
    ///
    /// Dropping the returned future drops all in-flight requests.
    pub async fn dispatch<R, F>(&self, session: &Session<R>, endpoint: SignerEndpoint, handle_ok: F)
    where
        R: Sync,
        F: Fn(&SessionLogger, &str, u16, Value) -> Result<SignerResponse, SignerFailure> + Sync,
    {
        let body = Arc::new(session.envelope().body.clone());
        session.logger().debug(format!("dispatching signer_path={} signers={}", endpoint.path(), self.nodes.len()));
        let calls = self.nodes.iter().map(|node| self.call_node(session, node, endpoint, Arc::clone(&body), &handle_ok));
        join_all(calls).await;
    }

    async fn call_node<R, F>(&self, session: &Session<R>, node: &SignerNode, endpoint: SignerEndpoint, body: Arc<Value>, handle_ok: &F)
    where
        R: Sync,
        F: Fn(&SessionLogger, &str, u16, Value) -> Result<SignerResponse, SignerFailure> + Sync,
    {
        let token = session.cancellation_token();
        if token.is_cancelled() {
            return;
        }
        let url = node.endpoint_url(endpoint);
        let breaker = self.breakers.get(&node.url).map(Arc::as_ref);
        if let Some(breaker) = breaker {
            if !breaker.allow() {
                session.logger().warn(format!("signer skipped; circuit open url={}", url));
                session.record_failure(SignerFailure { url, status: BAD_GATEWAY_STATUS, classification: ErrorClassification::Transport });
                return;
            }
        }
        let mut slot = TrialSlot { breaker, settled: false };

        let envelope = session.envelope();
        let call = SignerCall {
            url: url.clone(),
            body,
            key_version: envelope.key_version.clone(),
            authorization: envelope.authorization.clone(),
            correlation_id: envelope.correlation_id.clone(),
        };
        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                session.logger().debug(format!("signer call cancelled url={} elapsed_ms={}", url, started.elapsed().as_millis()));
                return;
            }
            result = tokio::time::timeout(self.timeout, self.client.post(&call)) => result,
        };
        let elapsed_ms = started.elapsed().as_millis();

        let answered_2xx = matches!(&result, Ok(Ok(reply)) if reply.is_success());
        let outcome = interpret_reply(session.logger(), &url, self.timeout, result, handle_ok);
        if let Some(breaker) = breaker {
            match &outcome {
                Err(failure) if trips_breaker(failure, answered_2xx) => breaker.record_failure(),
                _ => breaker.record_success(),
            }
        }
        slot.settled = true;
        match outcome {
            Ok(response) => {
                session.logger().debug(format!("signer ok url={} status={} elapsed_ms={}", url, response.status, elapsed_ms));
                session.record_success(response);
            }
            Err(failure) => {
                session.logger().warn(format!(
                    "signer failed url={} status={} classification={} elapsed_ms={}",
                    url, failure.status, failure.classification, elapsed_ms
                ));
                session.record_failure(failure);
            }
        }
    }
}

/// Hands a half-open trial slot back when a call is cancelled or dropped before reporting.
struct TrialSlot<'a> {
    breaker: Option<&'a CircuitBreaker>,
    settled: bool,
}

impl Drop for TrialSlot<'_> {
    fn drop(&mut self) {
        if !self.settled {
            if let Some(breaker) = self.breaker {
                breaker.release_trial();
            }
        }
    }
}

/// A node fault is no usable reply or a 5xx from the node itself. A 2xx reply the kind
/// hook rejected (`success: false`) comes from a healthy node and never counts.
fn trips_breaker(failure: &SignerFailure, answered_2xx: bool) -> bool {
    match failure.classification {
        ErrorClassification::Timeout | ErrorClassification::Transport | ErrorClassification::InvalidResponse => true,
        ErrorClassification::ApplicationError | ErrorClassification::Unauthenticated => !answered_2xx && failure.status >= 500,
    }
}

/// Maps one raw call result to a recorded outcome. Only parsed 2xx bodies reach `handle_ok`.
pub fn interpret_reply<F>(
    logger: &SessionLogger,
    url: &str,
    timeout: Duration,
    result: Result<Result<SignerReply, CombinerError>, Elapsed>,
    handle_ok: &F,
) -> Result<SignerResponse, SignerFailure>
where
    F: Fn(&SessionLogger, &str, u16, Value) -> Result<SignerResponse, SignerFailure>,
{
    let failure = |status, classification| SignerFailure { url: url.to_string(), status, classification };
    let reply = match result {
        Err(_) => {
            logger.debug(format!("signer timed out url={} timeout_ms={}", url, timeout.as_millis()));
            return Err(failure(TIMEOUT_FAILURE_STATUS, ErrorClassification::Timeout));
        }
        Ok(Err(err @ CombinerError::UpstreamInvalidResponse { .. })) => {
            logger.debug(format!("signer reply rejected url={} error={}", url, err));
            return Err(failure(BAD_GATEWAY_STATUS, ErrorClassification::InvalidResponse));
        }
        Ok(Err(err)) => {
            logger.debug(format!("signer transport error url={} error={}", url, err));
            return Err(failure(BAD_GATEWAY_STATUS, ErrorClassification::Transport));
        }
        Ok(Ok(reply)) => reply,
    };
    if !reply.is_success() {
        logger.debug(format!("signer non-2xx url={} status={} body={}", url, reply.status, truncate_for_log(&reply.body)));
        return Err(failure(reply.status, ErrorClassification::from_status(reply.status)));
    }
    match serde_json::from_str::<Value>(&reply.body) {
        Ok(body) => handle_ok(logger, url, reply.status, body),
        Err(err) => {
            logger.debug(format!("signer body is not json url={} error={} body={}", url, err, truncate_for_log(&reply.body)));
            Err(failure(BAD_GATEWAY_STATUS, ErrorClassification::InvalidResponse))
        }
    }
}

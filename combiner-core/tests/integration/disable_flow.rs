use crate::fixtures::{harness, inbound, inbound_json, secret, DomainRequestBuilder, StubSigner, STRANGER_SECRET, TEST_VERSION};
use combiner_core::application::{Combiner, DomainDisableService, RequestOutcome};
use combiner_core::domain::Secp256k1Verifier;
use serde_json::json;
use std::sync::Arc;

fn service() -> DomainDisableService {
    DomainDisableService::new(Arc::new(Secp256k1Verifier), TEST_VERSION)
}

#[tokio::test(start_paused = true)]
async fn two_of_three_success_returns_version() {
    let signers = vec![StubSigner::ok(10), StubSigner::status(15, 500), StubSigner::ok(20)];
    let h = harness(service(), signers, 2);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    assert_eq!(output.response.status, 200);
    assert_eq!(output.response.body, json!({ "success": true, "version": TEST_VERSION }));
}

#[tokio::test(start_paused = true)]
async fn threshold_failure_uses_majority_status() {
    let signers = vec![StubSigner::status(10, 500), StubSigner::ok(15), StubSigner::status(20, 500)];
    let h = harness(service(), signers, 2);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    assert_eq!(output.response.status, 500);
    assert_eq!(output.response.body["success"], false);
    assert_eq!(output.response.body["error"], "THRESHOLD_DISABLE_DOMAIN_FAILURE");
    assert_eq!(output.response.body["version"], TEST_VERSION);
}

#[tokio::test(start_paused = true)]
async fn malformed_body_never_reaches_signers() {
    let h = harness(service(), vec![StubSigner::ok(1), StubSigner::ok(1)], 1);

    let output = h.combiner.handle(inbound_json(json!({ "type": "DisableDomainRequest", "domain": 7 }))).await;
    assert_eq!(output.response.status, 400);
    assert_eq!(output.response.body["error"], "INVALID_INPUT");
    assert_eq!(output.outcome, RequestOutcome::InvalidInput);
    assert!(output.report.is_none());
    assert_eq!(h.client.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn signature_from_non_owner_is_unauthenticated() {
    let h = harness(service(), vec![StubSigner::ok(1), StubSigner::ok(1)], 1);
    let request = DomainRequestBuilder::default().signed_by(secret(STRANGER_SECRET)).disable();

    let output = h.combiner.handle(inbound(&request)).await;
    assert_eq!(output.response.status, 401);
    assert_eq!(output.response.body["error"], "UNAUTHENTICATED_USER");
    assert_eq!(h.client.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn transport_errors_surface_as_bad_gateway() {
    let signers = vec![StubSigner::transport_error(5), StubSigner::transport_error(5), StubSigner::ok(10)];
    let h = harness(service(), signers, 2);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    assert_eq!(output.response.status, 502);
}

#[tokio::test(start_paused = true)]
async fn unparseable_signer_body_is_bad_gateway() {
    let signers = vec![StubSigner::raw(5, 200, "not json"), StubSigner::raw(5, 200, "{\"version\":\"1\"}")];
    let h = harness(service(), signers, 1);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    assert_eq!(output.response.status, 502);
}

#[tokio::test(start_paused = true)]
async fn signer_calls_carry_correlation_id_and_session_fallback() {
    let h = harness(service(), vec![StubSigner::ok(1), StubSigner::ok(2)], 2);
    let request = DomainRequestBuilder::default().session_id(None).disable();

    let output = h.combiner.handle(inbound(&request)).await;
    assert_eq!(output.response.status, 200);
    assert_eq!(output.report.expect("report").session_id.as_str(), "corr-test");

    let calls = h.client.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        assert!(call.url.ends_with("/domain/disable"), "url {}", call.url);
        assert_eq!(call.correlation_id.as_str(), "corr-test");
        assert_eq!(call.body.get("type"), Some(&json!("DisableDomainRequest")));
    }
}

#[tokio::test(start_paused = true)]
async fn disabled_endpoint_answers_unavailable() {
    let h = harness(service(), vec![StubSigner::ok(1)], 1);
    let combiner: Combiner<DomainDisableService> = h.combiner.with_enabled(false);

    let output = combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    assert_eq!(output.response.status, 503);
    assert_eq!(output.response.body["error"], "API_UNAVAILABLE");
    assert_eq!(output.outcome, RequestOutcome::Unavailable);
    assert_eq!(h.client.started(), 0);
}

use crate::fixtures::{harness, inbound, DomainRequestBuilder, StubSigner, TEST_VERSION};
use combiner_core::application::DomainQuotaStatusService;
use combiner_core::domain::Secp256k1Verifier;
use serde_json::{json, Value};
use std::sync::Arc;

fn service() -> DomainQuotaStatusService {
    DomainQuotaStatusService::new(Arc::new(Secp256k1Verifier), TEST_VERSION)
}

fn quota_reply(delay_ms: u64, counter: u64, timer: u64, now: u64) -> StubSigner {
    StubSigner::json(
        delay_ms,
        200,
        json!({ "success": true, "version": "signer", "status": { "timer": timer, "counter": counter, "disabled": false, "now": now } }),
    )
}

#[tokio::test(start_paused = true)]
async fn combines_threshold_quota_state() {
    let signers = vec![quota_reply(10, 4, 100, 1_000), quota_reply(20, 2, 90, 1_001), quota_reply(30, 9, 50, 1_002)];
    let h = harness(service(), signers, 2);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().quota_status())).await;
    assert_eq!(output.response.status, 200);
    let status: &Value = &output.response.body["status"];
    // Only the first two replies count; the second least restrictive of them is the answer.
    assert_eq!(status["counter"], 4);
    assert_eq!(status["timer"], 100);
    assert_eq!(status["disabled"], false);
    assert_eq!(output.response.body["version"], TEST_VERSION);
}

#[tokio::test(start_paused = true)]
async fn reply_without_status_is_invalid() {
    let signers = vec![StubSigner::ok(10), StubSigner::ok(20)];
    let h = harness(service(), signers, 1);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().quota_status())).await;
    assert_eq!(output.response.status, 502);
    assert_eq!(output.response.body["error"], "THRESHOLD_DOMAIN_QUOTA_STATUS_FAILURE");
}

#[tokio::test(start_paused = true)]
async fn success_false_counts_as_application_error() {
    let failing = StubSigner::json(5, 200, json!({ "success": false, "error": "db down" }));
    let h = harness(service(), vec![failing.clone(), failing], 1);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().quota_status())).await;
    assert_eq!(output.response.status, 500);
}

use crate::fixtures::{harness, harness_with, inbound, DomainRequestBuilder, HarnessOptions, StubSigner, TEST_VERSION};
use combiner_core::application::{DomainDisableService, RequestOutcome};
use combiner_core::domain::{CancelReason, Secp256k1Verifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn service() -> DomainDisableService {
    DomainDisableService::new(Arc::new(Secp256k1Verifier), TEST_VERSION)
}

#[tokio::test(start_paused = true)]
async fn responds_as_soon_as_threshold_is_reached() {
    let signers = vec![StubSigner::ok(10), StubSigner::ok(20), StubSigner::ok(30), StubSigner::ok(40), StubSigner::ok(50)];
    let h = harness(service(), signers, 3);

    let started = Instant::now();
    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    let elapsed = started.elapsed();

    assert_eq!(output.response.status, 200);
    assert_eq!(output.outcome, RequestOutcome::Success);
    assert!(elapsed >= Duration::from_millis(30) && elapsed < Duration::from_millis(40), "elapsed {:?}", elapsed);
    assert_eq!(h.client.started(), 5);
    assert_eq!(h.client.completed(), 3);

    let report = output.report.expect("report");
    assert_eq!(report.successes, 3);
    assert_eq!(report.outstanding, 2);
    assert_eq!(report.cancel_reason, Some(CancelReason::ThresholdReached));
}

#[tokio::test(start_paused = true)]
async fn late_replies_do_not_change_the_response() {
    let signers = vec![StubSigner::ok(5), StubSigner::status(100, 500), StubSigner::status(200, 500)];
    let h = harness(service(), signers, 1);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    assert_eq!(output.response.status, 200);
    assert_eq!(output.report.expect("report").failures, 0);
    assert_eq!(h.client.started(), 3);
    assert_eq!(h.client.completed(), 1);

    // Well past both scripted 500s: the dropped calls never finish or reach the transport again.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.client.started(), 3);
    assert_eq!(h.client.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_threshold_fails_without_waiting_for_stragglers() {
    let signers = vec![StubSigner::status(10, 500), StubSigner::status(20, 500), StubSigner::hang()];
    let h = harness(service(), signers, 2);

    let started = Instant::now();
    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;

    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(output.response.status, 500);
    assert_eq!(output.outcome, RequestOutcome::ThresholdFailure);
    assert_eq!(output.report.expect("report").cancel_reason, Some(CancelReason::ThresholdUnreachable));
}

#[tokio::test(start_paused = true)]
async fn request_deadline_bounds_total_latency() {
    let signers = vec![StubSigner::ok(10), StubSigner::hang(), StubSigner::hang()];
    let options = HarnessOptions { timeout_ms: 10_000, request_deadline_ms: 250, ..HarnessOptions::default() };
    let h = harness_with(service(), signers, 2, options);

    let started = Instant::now();
    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;

    assert!(started.elapsed() >= Duration::from_millis(250) && started.elapsed() < Duration::from_millis(300));
    // No failure was recorded before the deadline, so the default status applies.
    assert_eq!(output.response.status, 500);
    assert_eq!(output.response.body["error"], "THRESHOLD_DISABLE_DOMAIN_FAILURE");
    let report = output.report.expect("report");
    assert_eq!(report.successes, 1);
    assert_eq!(report.cancel_reason, Some(CancelReason::DeadlineExceeded));
}

#[tokio::test(start_paused = true)]
async fn per_signer_timeout_maps_to_gateway_timeout() {
    let signers = vec![StubSigner::hang(), StubSigner::hang()];
    let options = HarnessOptions { timeout_ms: 100, request_deadline_ms: 5_000, ..HarnessOptions::default() };
    let h = harness_with(service(), signers, 1, options);

    let output = h.combiner.handle(inbound(&DomainRequestBuilder::default().disable())).await;
    assert_eq!(output.response.status, 504);
    let report = output.report.expect("report");
    assert_eq!(report.failures, 2);
    assert_eq!(report.outstanding, 0);
}

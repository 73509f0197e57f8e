use crate::fixtures::{
    account_inbound, account_quota_body, address_of, harness, inbound_json, owner_secret, secret, StubSigner, ENCRYPTION_SECRET,
    STRANGER_SECRET, TEST_VERSION,
};
use async_trait::async_trait;
use combiner_core::application::AccountQuotaStatusService;
use combiner_core::domain::{AccountRegistry, StaticAccountRegistry};
use combiner_core::foundation::CombinerError;
use secp256k1::{PublicKey, Secp256k1};
use serde_json::json;
use std::sync::Arc;

struct UnreachableRegistry;

#[async_trait]
impl AccountRegistry for UnreachableRegistry {
    async fn data_encryption_key(&self, _account: &str) -> Result<Option<String>, CombinerError> {
        Err(CombinerError::transport("registry", "connection refused"))
    }
}

fn service(registry: Arc<dyn AccountRegistry>) -> AccountQuotaStatusService {
    AccountQuotaStatusService::new(registry, TEST_VERSION)
}

fn no_keys() -> Arc<dyn AccountRegistry> {
    Arc::new(StaticAccountRegistry::default())
}

fn encryption_key_hex() -> String {
    hex::encode(PublicKey::from_secret_key(&Secp256k1::new(), &secret(ENCRYPTION_SECRET)).serialize())
}

fn quota_reply(delay_ms: u64, performed: u64, total: u64) -> StubSigner {
    StubSigner::json(
        delay_ms,
        200,
        json!({ "success": true, "version": "signer", "performedQueryCount": performed, "totalQuota": total, "blockNumber": 40 + performed }),
    )
}

#[tokio::test(start_paused = true)]
async fn combines_threshold_account_quota() {
    let signers = vec![quota_reply(10, 3, 10), quota_reply(20, 1, 30), quota_reply(30, 0, 50)];
    let h = harness(service(no_keys()), signers, 2);
    let account = address_of(&owner_secret());

    let output = h.combiner.handle(account_inbound(account_quota_body(&account, None), &owner_secret())).await;
    assert_eq!(output.response.status, 200, "{}", output.response.body);
    // Only the first two replies count.
    assert_eq!(output.response.body["performedQueryCount"], 3);
    assert_eq!(output.response.body["totalQuota"], 10);
    assert_eq!(output.response.body["blockNumber"], 43);
    assert_eq!(output.response.body["version"], TEST_VERSION);

    let calls = h.client.calls();
    assert!(calls.iter().all(|call| call.url.ends_with("/quotaStatus")));
    assert!(calls.iter().all(|call| call.authorization.is_some()));
}

#[tokio::test(start_paused = true)]
async fn missing_authorization_is_rejected_before_dispatch() {
    let h = harness(service(no_keys()), vec![quota_reply(10, 0, 10)], 1);
    let account = address_of(&owner_secret());

    let output = h.combiner.handle(inbound_json(account_quota_body(&account, None))).await;
    assert_eq!(output.response.status, 401);
    assert_eq!(output.response.body["error"], "UNAUTHENTICATED_USER");
    assert_eq!(h.client.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_account_is_unauthenticated() {
    let h = harness(service(no_keys()), vec![quota_reply(10, 0, 10)], 1);
    let body = json!({ "sessionID": "s" });

    let output = h.combiner.handle(account_inbound(body, &owner_secret())).await;
    assert_eq!(output.response.status, 401);
    assert_eq!(h.client.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_account_is_invalid_input() {
    let h = harness(service(no_keys()), vec![quota_reply(10, 0, 10)], 1);

    let output = h.combiner.handle(account_inbound(account_quota_body("0x1234", None), &owner_secret())).await;
    assert_eq!(output.response.status, 400);
    assert_eq!(output.response.body["error"], "INVALID_INPUT");
}

#[tokio::test(start_paused = true)]
async fn wallet_signature_from_another_key_is_rejected() {
    let h = harness(service(no_keys()), vec![quota_reply(10, 0, 10)], 1);
    let account = address_of(&owner_secret());

    let output = h.combiner.handle(account_inbound(account_quota_body(&account, None), &secret(STRANGER_SECRET))).await;
    assert_eq!(output.response.status, 401);
    assert_eq!(h.client.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn registered_encryption_key_authenticates() {
    let account = address_of(&owner_secret());
    let registry = Arc::new(StaticAccountRegistry::new([(account.clone(), encryption_key_hex())]));
    let h = harness(service(registry), vec![quota_reply(10, 2, 10)], 1);

    let body = account_quota_body(&account, Some("encryption_key"));
    let output = h.combiner.handle(account_inbound(body.clone(), &secret(ENCRYPTION_SECRET))).await;
    assert_eq!(output.response.status, 200, "{}", output.response.body);

    // The wallet key does not satisfy the encryption key method.
    let output = h.combiner.handle(account_inbound(body, &owner_secret())).await;
    assert_eq!(output.response.status, 401);
}

#[tokio::test(start_paused = true)]
async fn unregistered_encryption_key_is_rejected() {
    let h = harness(service(no_keys()), vec![quota_reply(10, 0, 10)], 1);
    let account = address_of(&owner_secret());

    let output =
        h.combiner.handle(account_inbound(account_quota_body(&account, Some("encryption_key")), &secret(ENCRYPTION_SECRET))).await;
    assert_eq!(output.response.status, 401);
    assert_eq!(h.client.started(), 0);
}

#[tokio::test(start_paused = true)]
async fn registry_outage_still_dispatches() {
    let h = harness(service(Arc::new(UnreachableRegistry)), vec![quota_reply(10, 1, 10)], 1);
    let account = address_of(&owner_secret());

    let output =
        h.combiner.handle(account_inbound(account_quota_body(&account, Some("encryption_key")), &secret(STRANGER_SECRET))).await;
    assert_eq!(output.response.status, 200, "{}", output.response.body);
    assert_eq!(h.client.started(), 1);
}

#[tokio::test(start_paused = true)]
async fn reply_without_quota_fields_is_invalid() {
    let h = harness(service(no_keys()), vec![StubSigner::ok(10), StubSigner::ok(20)], 1);
    let account = address_of(&owner_secret());

    let output = h.combiner.handle(account_inbound(account_quota_body(&account, None), &owner_secret())).await;
    assert_eq!(output.response.status, 502);
    assert_eq!(output.response.body["error"], "THRESHOLD_ACCOUNT_QUOTA_STATUS_FAILURE");
}

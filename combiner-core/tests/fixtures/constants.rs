#![allow(dead_code)]

pub const OWNER_SECRET: [u8; 32] = [0x11; 32];
pub const STRANGER_SECRET: [u8; 32] = [0x22; 32];
pub const ENCRYPTION_SECRET: [u8; 32] = [0x33; 32];
pub const TEST_VERSION: &str = "test-1.0.0";
pub const TEST_BLINDED_MESSAGE: &str = "AAECAwQFBgcICQ==";
pub const TEST_SIGNER_TIMEOUT_MS: u64 = 1_000;
pub const TEST_REQUEST_DEADLINE_MS: u64 = 5_000;

pub fn signer_url(index: usize) -> String {
    format!("http://signer-{index}.test")
}

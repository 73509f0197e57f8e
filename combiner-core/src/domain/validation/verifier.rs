use crate::domain::validation::{keccak256, parse_address, signing_digest, SignedDomainRequest};
use crate::foundation::{decode_hex_prefixed, encode_hex_prefixed, CombinerError};
use once_cell::sync::Lazy;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub valid: bool,
    pub recovered_address: Option<String>,
    pub failure_reason: Option<String>,
}

impl VerificationReport {
    fn rejected(reason: impl Into<String>) -> Self {
        Self { valid: false, recovered_address: None, failure_reason: Some(reason.into()) }
    }
}

/// Decides whether a signed domain request was authorised by the domain owner.
///
/// `Err` is reserved for internal failures; a bad or mismatching signature is an
/// invalid report.
pub trait RequestVerifier: Send + Sync {
    fn verify(&self, request: &dyn SignedDomainRequest) -> Result<VerificationReport, CombinerError>;
}

/// Recovers the signer of `options.signature` and compares it to `domain.address`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Verifier;

impl RequestVerifier for Secp256k1Verifier {
    fn verify(&self, request: &dyn SignedDomainRequest) -> Result<VerificationReport, CombinerError> {
        let Some(expected) = request.domain().address.as_deref() else {
            return Ok(VerificationReport::rejected("domain has no address"));
        };
        let expected = match parse_address(expected) {
            Ok(bytes) => bytes,
            Err(err) => return Ok(VerificationReport::rejected(err.to_string())),
        };
        let digest = signing_digest(request)?;
        let recovered = match recover_address(&digest, &request.options().signature) {
            Ok(address) => address,
            Err(err) => return Ok(VerificationReport::rejected(err.to_string())),
        };
        let recovered_hex = encode_hex_prefixed(&recovered);
        if recovered != expected {
            return Ok(VerificationReport {
                valid: false,
                recovered_address: Some(recovered_hex),
                failure_reason: Some("signer does not match domain address".to_string()),
            });
        }
        Ok(VerificationReport { valid: true, recovered_address: Some(recovered_hex), failure_reason: None })
    }
}

/// Accepts every request. For deployments that authenticate upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVerifier;

impl RequestVerifier for NoopVerifier {
    fn verify(&self, _request: &dyn SignedDomainRequest) -> Result<VerificationReport, CombinerError> {
        Ok(VerificationReport { valid: true, recovered_address: None, failure_reason: None })
    }
}

/// Ethereum-style address: last 20 bytes of keccak256 over the uncompressed key without its prefix.
pub fn address_from_public_key(key: &PublicKey) -> [u8; 20] {
    let uncompressed = key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn recover_address(digest: &[u8; 32], signature_hex: &str) -> Result<[u8; 20], CombinerError> {
    recover_public_key(digest, signature_hex).map(|key| address_from_public_key(&key))
}

/// Recovers the key behind a hex `r || s || v` signature over `digest`.
pub fn recover_public_key(digest: &[u8; 32], signature_hex: &str) -> Result<PublicKey, CombinerError> {
    let bytes = decode_hex_prefixed(signature_hex)?;
    if bytes.len() != 65 {
        return Err(CombinerError::CryptoError {
            operation: "parse_signature".to_string(),
            details: format!("expected 65 bytes, got {}", bytes.len()),
        });
    }
    let v = match bytes[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        other => {
            return Err(CombinerError::CryptoError {
                operation: "parse_signature".to_string(),
                details: format!("unsupported recovery byte {other}"),
            })
        }
    };
    let recovery_id = RecoveryId::from_i32(i32::from(v))?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)?;
    let message = Message::from_digest(*digest);
    Ok(SECP.recover_ecdsa(&message, &signature)?)
}

/// Produces the hex `r || s || v` signature a client attaches to `request`.
pub fn sign_request(secret: &SecretKey, request: &dyn SignedDomainRequest) -> Result<String, CombinerError> {
    Ok(sign_digest(secret, &signing_digest(request)?))
}

pub fn sign_digest(secret: &SecretKey, digest: &[u8; 32]) -> String {
    let message = Message::from_digest(*digest);
    let (recovery_id, compact) = SECP.sign_ecdsa_recoverable(&message, secret).serialize_compact();
    let mut bytes = compact.to_vec();
    bytes.push(27 + recovery_id.to_i32() as u8);
    encode_hex_prefixed(&bytes)
}

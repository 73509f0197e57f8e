use crate::foundation::{CombinerError, MAX_LOGGED_BODY_LEN};

/// Decodes hex with or without a `0x` prefix.
pub fn decode_hex_prefixed(s: &str) -> Result<Vec<u8>, CombinerError> {
    let trimmed = s.trim();
    let stripped = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    hex::decode(stripped).map_err(|e| e.into())
}

/// Lower-case hex with a `0x` prefix, as addresses and signatures are rendered.
pub fn encode_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes hex into exactly `N` bytes.
pub fn decode_hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], CombinerError> {
    let bytes = decode_hex_prefixed(s)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| CombinerError::EncodingError(format!("expected {N} bytes, got {len}")))
}

/// Shortens an upstream body for log lines, respecting char boundaries.
pub fn truncate_for_log(body: &str) -> String {
    if body.len() <= MAX_LOGGED_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_LOGGED_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

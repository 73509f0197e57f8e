use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

const API_KEY_HEADER: &str = "x-api-key";

/// Checks the admin token on operational routes. No configured token means open access.
pub fn authorize_admin(headers: &HeaderMap, expected: Option<&str>) -> Result<(), &'static str> {
    let Some(expected) = expected.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let presented = presented_tokens(headers);
    if presented.is_empty() {
        return Err("missing admin token");
    }
    if presented.iter().any(|token| token.as_bytes().ct_eq(expected.as_bytes()).into()) {
        Ok(())
    } else {
        Err("invalid admin token")
    }
}

fn presented_tokens(headers: &HeaderMap) -> Vec<&str> {
    let api_key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).and_then(|v| v.strip_prefix("Bearer "));
    api_key.into_iter().chain(bearer).map(str::trim).collect()
}

use crate::foundation::{decode_hex_fixed, decode_hex_prefixed, CombinerEndpoint, MAX_REQUEST_DEADLINE_MS, MAX_SIGNER_NODES};
use crate::infrastructure::config::types::AppConfig;
use reqwest::Url;
use secp256k1::PublicKey;
use std::collections::HashSet;
use std::net::SocketAddr;

impl AppConfig {
    /// Collects every problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!("server.addr is not a socket address: {}", self.server.addr));
        }
        if self.server.body_limit_bytes == 0 {
            errors.push("server.body_limit_bytes must be > 0".to_string());
        }
        if self.server.rate_limit_rps == Some(0) {
            errors.push("server.rate_limit_rps must be > 0 when set".to_string());
        }
        if self.server.rate_limit_burst.is_some() && self.server.rate_limit_rps.is_none() {
            errors.push("server.rate_limit_burst requires server.rate_limit_rps".to_string());
        }
        if matches!(self.server.admin_token.as_deref(), Some(token) if token.trim().is_empty()) {
            errors.push("server.admin_token must not be empty when set".to_string());
        }

        let nodes = &self.signers.nodes;
        if nodes.is_empty() {
            errors.push("signers.nodes must not be empty".to_string());
        }
        if nodes.len() > MAX_SIGNER_NODES {
            errors.push(format!("signers.nodes count ({}) exceeds {}", nodes.len(), MAX_SIGNER_NODES));
        }
        let mut seen = HashSet::new();
        for node in nodes {
            match Url::parse(&node.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => errors.push(format!("signers.nodes url must be http(s): {} (scheme {})", node.url, url.scheme())),
                Err(err) => errors.push(format!("invalid signers.nodes url {}: {}", node.url, err)),
            }
            if !seen.insert(node.url.trim_end_matches('/')) {
                errors.push(format!("duplicate signers.nodes url: {}", node.url));
            }
        }

        if self.signers.timeout_ms == 0 {
            errors.push("signers.timeout_ms must be > 0".to_string());
        }
        if self.signers.request_deadline_ms == 0 {
            errors.push("signers.request_deadline_ms must be > 0".to_string());
        }
        if self.signers.request_deadline_ms > MAX_REQUEST_DEADLINE_MS {
            errors.push(format!("signers.request_deadline_ms should not exceed {}", MAX_REQUEST_DEADLINE_MS));
        }
        if self.signers.max_response_bytes == 0 {
            errors.push("signers.max_response_bytes must be > 0".to_string());
        }
        if self.signers.circuit_breaker.failure_threshold == 0 {
            errors.push("signers.circuit_breaker.failure_threshold must be > 0".to_string());
        }

        for endpoint in CombinerEndpoint::ALL {
            let cfg = self.endpoints.get(endpoint);
            if !cfg.enabled {
                continue;
            }
            if cfg.threshold == 0 {
                errors.push(format!("endpoints.{}.threshold must be > 0", endpoint));
            }
            if !nodes.is_empty() && cfg.threshold > nodes.len() {
                errors.push(format!("endpoints.{}.threshold ({}) cannot exceed signer count ({})", endpoint, cfg.threshold, nodes.len()));
            }
        }

        for (account, key) in &self.accounts.data_encryption_keys {
            if decode_hex_fixed::<20>(account).is_err() {
                errors.push(format!("accounts.data_encryption_keys: {} is not an account address", account));
            }
            if decode_hex_prefixed(key).ok().and_then(|bytes| PublicKey::from_slice(&bytes).ok()).is_none() {
                errors.push(format!("accounts.data_encryption_keys.{} is not a secp256k1 public key", account));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Suspicious but accepted settings, logged at startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.signers.request_deadline_ms < self.signers.timeout_ms {
            warnings.push(format!(
                "signers.request_deadline_ms ({}) is shorter than signers.timeout_ms ({}); slow signers are cut off by the deadline",
                self.signers.request_deadline_ms, self.signers.timeout_ms
            ));
        }
        if CombinerEndpoint::ALL.iter().all(|endpoint| !self.endpoints.get(*endpoint).enabled) {
            warnings.push("all combiner endpoints are disabled".to_string());
        }
        warnings
    }
}

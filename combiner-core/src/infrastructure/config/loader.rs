//! Configuration loader using Figment for layered config management.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file
//! 3. Environment variables (COMBINER_* prefix)

use crate::foundation::CombinerError;
use crate::infrastructure::config::types::AppConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::{debug, info};
use std::path::Path;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "combiner-config.toml";

/// Environment variable prefix for config overrides.
///
/// Example: `COMBINER_SIGNERS__TIMEOUT_MS` -> `signers.timeout_ms`
const ENV_PREFIX: &str = "COMBINER_";

/// Load configuration from `combiner-config.toml` inside `dir`.
pub fn load_config(dir: &Path) -> Result<AppConfig, CombinerError> {
    load_config_from_file(&dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from a specific file path. A missing file falls back to defaults and env.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig, CombinerError> {
    info!("loading configuration path={}", path.display());
    let config: AppConfig = figment_for(path).extract()?;
    debug!(
        "configuration loaded server_addr={} signer_count={} timeout_ms={} request_deadline_ms={}",
        config.server.addr,
        config.signers.nodes.len(),
        config.signers.timeout_ms,
        config.signers.request_deadline_ms
    );
    Ok(config)
}

fn figment_for(path: &Path) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        debug!("configuration file missing; using defaults and env only path={}", path.display());
    }
    figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config_path"]).split("__"))
}

mod loader;
mod types;
pub mod validation;

pub use loader::{load_config, load_config_from_file, CONFIG_FILE_NAME};
pub use types::*;

use crate::foundation::{CombinerEndpoint, CombinerError, ThresholdConfig};
use log::warn;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "COMBINER_CONFIG_PATH";

/// Explicit path first, then `COMBINER_CONFIG_PATH`, then `./combiner-config.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, CombinerError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(value) = std::env::var(CONFIG_PATH_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    let cwd = std::env::current_dir().map_err(|err| CombinerError::ConfigError(format!("current_dir: {err}")))?;
    Ok(cwd.join(CONFIG_FILE_NAME))
}

/// Loads, validates and logs warnings for the process configuration.
pub fn load_app_config(explicit: Option<&Path>) -> Result<AppConfig, CombinerError> {
    let path = resolve_config_path(explicit)?;
    let config = load_config_from_file(&path)?;
    config.validate().map_err(|errors| CombinerError::ConfigError(format!("validation failed: {}", errors.join("; "))))?;
    for warning in config.warnings() {
        warn!("configuration warning: {}", warning);
    }
    Ok(config)
}

impl AppConfig {
    pub fn threshold_for(&self, endpoint: CombinerEndpoint) -> Result<ThresholdConfig, CombinerError> {
        ThresholdConfig::new(self.endpoints.get(endpoint).threshold, self.signers.nodes.len())
    }
}

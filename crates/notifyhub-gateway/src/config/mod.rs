//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use notifyhub_core::error::{NotifyError, Result};

pub use schema::{GatewayConfig, HubSection, ServerSection, ServiceSection};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| NotifyError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like `load_from_file`, but a missing file yields the defaults.
pub fn load_or_default(path: &str) -> Result<GatewayConfig> {
    if !Path::new(path).exists() {
        tracing::info!(path, "config file not found, using defaults");
        return Ok(GatewayConfig::default());
    }
    load_from_file(path)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| NotifyError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

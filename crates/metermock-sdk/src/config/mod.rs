//! Mock meter config loader (strict parsing).

pub mod schema;

use std::fs;

use metermock_core::error::{MetricError, Result};

pub use schema::{MeterSection, MockConfig};

pub fn load_from_file(path: &str) -> Result<MockConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MetricError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MockConfig> {
    let cfg: MockConfig = serde_yaml::from_str(s)
        .map_err(|e| MetricError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

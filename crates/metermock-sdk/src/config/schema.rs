use metermock_core::error::{MetricError, Result};
use serde::Deserialize;

use crate::provider::DEFAULT_METER_NAME;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockConfig {
    pub version: u32,

    #[serde(default)]
    pub meter: MeterSection,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            version: 1,
            meter: MeterSection::default(),
        }
    }
}

impl MockConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricError::UnsupportedVersion);
        }

        self.meter.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeterSection {
    #[serde(default = "default_name")]
    pub name: String,

    /// Wrap the core in `UniqueInstrumentMeterCore`.
    #[serde(default = "default_unique_instruments")]
    pub unique_instruments: bool,
}

impl Default for MeterSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            unique_instruments: default_unique_instruments(),
        }
    }
}

impl MeterSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MetricError::BadConfig(
                "meter.name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_name() -> String {
    DEFAULT_METER_NAME.into()
}
fn default_unique_instruments() -> bool {
    true
}

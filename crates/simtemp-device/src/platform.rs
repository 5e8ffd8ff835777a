//! Initial Configuration ("platform data")

use crate::error::DeviceError;
use config::{Config, Environment, File};
use sampler::{Configuration, SampleMode, DEFAULT_INTERVAL_MS, DEFAULT_THRESHOLD_MC};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Environment prefix for platform properties (`SIMTEMP_SAMPLING_MS`, ...)
const ENV_PREFIX: &str = "SIMTEMP";

/// Properties describing one sensor instance at attach time
///
/// Each property is optional. Missing ones fall back to the defaults
/// (500 ms, 42000 m°C, normal) when the descriptor is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlatformData {
    /// Sampling period in milliseconds
    #[serde(default)]
    pub sampling_ms: Option<u32>,
    /// Alert threshold in milli-degrees Celsius
    #[serde(default, rename = "threshold_mC", alias = "threshold_mc")]
    pub threshold_mc: Option<i32>,
    /// Mode name (`normal`, `noisy` or `ramp`)
    #[serde(default)]
    pub mode: Option<String>,
}

impl PlatformData {
    /// Load properties from a file (format picked by extension), then
    /// `SIMTEMP_*` environment variables
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
        Self::load(Some(path.as_ref()))
    }

    /// Load properties from `SIMTEMP_*` environment variables only
    pub fn from_env() -> Result<Self, DeviceError> {
        Self::load(None)
    }

    fn load(path: Option<&Path>) -> Result<Self, DeviceError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Resolve into a configuration, applying defaults for missing properties
    ///
    /// An unrecognised mode name falls back to normal. Range checks happen
    /// later, when the configuration store is created.
    pub fn resolve(&self) -> Configuration {
        let interval_ms = self.sampling_ms.unwrap_or_else(|| {
            warn!("Missing sampling_ms property (using default {})", DEFAULT_INTERVAL_MS);
            DEFAULT_INTERVAL_MS
        });

        let threshold_mc = self.threshold_mc.unwrap_or_else(|| {
            warn!("Missing threshold_mC property (using default {})", DEFAULT_THRESHOLD_MC);
            DEFAULT_THRESHOLD_MC
        });

        let mode = match self.mode.as_deref() {
            Some(name) => name.parse().unwrap_or_else(|_| {
                warn!("Unknown mode property {:?} (using normal)", name);
                SampleMode::Normal
            }),
            None => {
                warn!("Missing mode property (using default normal)");
                SampleMode::Normal
            }
        };

        Configuration {
            interval_ms,
            threshold_mc,
            mode,
        }
    }
}

impl From<Configuration> for PlatformData {
    fn from(config: Configuration) -> Self {
        Self {
            sampling_ms: Some(config.interval_ms),
            threshold_mc: Some(config.threshold_mc),
            mode: Some(config.mode.as_str().to_string()),
        }
    }
}

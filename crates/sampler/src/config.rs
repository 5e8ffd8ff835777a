//! Sampling Configuration and Statistics

use crate::error::ConfigError;
use parking_lot::Mutex;
use ring_buffer::flags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Shortest accepted sampling interval
pub const MIN_INTERVAL_MS: u32 = 1;
/// Longest accepted sampling interval
pub const MAX_INTERVAL_MS: u32 = 50_000;
/// Sampling interval used when none is supplied
pub const DEFAULT_INTERVAL_MS: u32 = 500;
/// Alert threshold used when none is supplied (42.000 °C)
pub const DEFAULT_THRESHOLD_MC: i32 = 42_000;

/// Check a sampling interval against [`MIN_INTERVAL_MS`, `MAX_INTERVAL_MS`]
pub fn validate_interval(interval_ms: u32) -> Result<u32, ConfigError> {
    if (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&interval_ms) {
        Ok(interval_ms)
    } else {
        Err(ConfigError::InvalidInterval(interval_ms))
    }
}

/// Simulated temperature mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// Base temperature with small noise
    #[default]
    Normal,
    /// Base temperature with large noise
    Noisy,
    /// Stepwise increasing temperature that wraps around
    Ramp,
}

impl SampleMode {
    /// All modes, in attribute order
    pub const ALL: [SampleMode; 3] = [SampleMode::Normal, SampleMode::Noisy, SampleMode::Ramp];

    /// Attribute name of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleMode::Normal => "normal",
            SampleMode::Noisy => "noisy",
            SampleMode::Ramp => "ramp",
        }
    }
}

impl FromStr for SampleMode {
    type Err = ConfigError;

    /// Exact, case-sensitive match against `normal|noisy|ramp`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

impl fmt::Display for SampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Period between samples in milliseconds, range [1, 50000]
    pub interval_ms: u32,
    /// Alert threshold in milli-degrees Celsius
    #[serde(rename = "threshold_mC")]
    pub threshold_mc: i32,
    /// Temperature generation mode
    pub mode: SampleMode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            threshold_mc: DEFAULT_THRESHOLD_MC,
            mode: SampleMode::Normal,
        }
    }
}

impl Configuration {
    /// Sampling period as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.interval_ms))
    }

    /// Validate all fields
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_interval(self.interval_ms).map(|_| ())
    }
}

/// Monotonic sample counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Samples produced
    pub update_count: u64,
    /// Samples produced above the threshold
    pub alert_count: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "updates: {}, alerts: {}", self.update_count, self.alert_count)
    }
}

#[derive(Debug)]
struct ConfigState {
    config: Configuration,
    stats: Stats,
}

/// Configuration and statistics behind the config lock
///
/// Every accessor takes the lock for a short, non-suspending critical
/// section. The lock is never held across an `.await`, and code holding it
/// never acquires the data lock.
#[derive(Debug)]
pub struct ConfigStore {
    state: Mutex<ConfigState>,
}

impl ConfigStore {
    /// Create a store from a validated configuration
    pub fn new(config: Configuration) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(ConfigState {
                config,
                stats: Stats::default(),
            }),
        })
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> Configuration {
        self.state.lock().config
    }

    /// Copy of the current counters
    pub fn stats(&self) -> Stats {
        self.state.lock().stats
    }

    /// Store a new sampling interval
    ///
    /// Only the field is written. Rescheduling an armed generator is the
    /// owner's job (cancel, write, re-arm).
    pub fn write_interval(&self, interval_ms: u32) -> Result<(), ConfigError> {
        let interval_ms = validate_interval(interval_ms)?;
        self.state.lock().config.interval_ms = interval_ms;
        debug!(interval_ms, "Sampling interval updated");
        Ok(())
    }

    /// Set the alert threshold; observed by the next tick
    pub fn set_threshold(&self, threshold_mc: i32) {
        self.state.lock().config.threshold_mc = threshold_mc;
        debug!(threshold_mc, "Threshold updated");
    }

    /// Set the sampling mode
    pub fn set_mode(&self, mode: SampleMode) {
        self.state.lock().config.mode = mode;
        debug!(%mode, "Mode updated");
    }

    /// Set the sampling mode by attribute name, leaving it unchanged on error
    pub fn set_mode_str(&self, name: &str) -> Result<SampleMode, ConfigError> {
        let mode = name.parse()?;
        self.set_mode(mode);
        Ok(mode)
    }

    /// Classify a new reading against the current threshold and account it
    ///
    /// Comparison and counter updates happen in one critical section. Returns
    /// the flags for the sample.
    pub fn record_reading(&self, temp_mc: i32) -> u32 {
        let mut state = self.state.lock();
        let crossed = temp_mc > state.config.threshold_mc;

        state.stats.update_count += 1;
        if crossed {
            state.stats.alert_count += 1;
            flags::NEW | flags::THRESHOLD_CROSSED
        } else {
            flags::NEW
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_validation() {
        assert_eq!(validate_interval(0), Err(ConfigError::InvalidInterval(0)));
        assert_eq!(validate_interval(1), Ok(1));
        assert_eq!(validate_interval(50_000), Ok(50_000));
        assert_eq!(validate_interval(50_001), Err(ConfigError::InvalidInterval(50_001)));
    }

    #[test]
    fn test_rejected_interval_keeps_previous() {
        let store = ConfigStore::new(Configuration::default()).unwrap();
        store.write_interval(250).unwrap();

        assert!(store.write_interval(0).is_err());
        assert!(store.write_interval(50_001).is_err());
        assert_eq!(store.snapshot().interval_ms, 250);
    }

    #[test]
    fn test_mode_parsing_is_exact() {
        assert_eq!("normal".parse::<SampleMode>(), Ok(SampleMode::Normal));
        assert_eq!("noisy".parse::<SampleMode>(), Ok(SampleMode::Noisy));
        assert_eq!("ramp".parse::<SampleMode>(), Ok(SampleMode::Ramp));
        assert!("Ramp".parse::<SampleMode>().is_err());
        assert!("ramp ".parse::<SampleMode>().is_err());
    }

    #[test]
    fn test_rejected_mode_keeps_previous() {
        let store = ConfigStore::new(Configuration::default()).unwrap();
        store.set_mode(SampleMode::Ramp);

        assert_eq!(
            store.set_mode_str("bogus"),
            Err(ConfigError::UnknownMode("bogus".to_string()))
        );
        assert_eq!(store.snapshot().mode, SampleMode::Ramp);
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let store = ConfigStore::new(Configuration::default()).unwrap();
        store.set_threshold(25_000);

        assert_eq!(store.record_reading(25_000), flags::NEW);
        assert_eq!(store.record_reading(25_001), flags::NEW | flags::THRESHOLD_CROSSED);
        assert_eq!(store.record_reading(-40_000), flags::NEW);

        let stats = store.stats();
        assert_eq!(stats.update_count, 3);
        assert_eq!(stats.alert_count, 1);
    }

    #[test]
    fn test_stats_survive_reconfiguration() {
        let store = ConfigStore::new(Configuration::default()).unwrap();
        store.record_reading(50_000);
        store.set_threshold(60_000);
        store.set_mode(SampleMode::Noisy);
        store.write_interval(10).unwrap();

        assert_eq!(store.stats().to_string(), "updates: 1, alerts: 1");
    }

    #[test]
    fn test_invalid_initial_configuration() {
        let config = Configuration {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(ConfigStore::new(config).is_err());
    }
}

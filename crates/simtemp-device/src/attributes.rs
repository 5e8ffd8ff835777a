//! Text Attribute Surface
//!
//! Exposes the configuration knobs and counters as named text attributes
//! with show/store semantics: values are trimmed before parsing and rendered
//! with a trailing newline.

use crate::device::DeviceContext;
use crate::error::DeviceError;
use crate::Result;
use sampler::EntropySource;
use std::fmt;
use std::str::FromStr;

/// A named device attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Sampling period in ms (read/write)
    SamplingMs,
    /// Alert threshold in m°C (read/write)
    ThresholdMc,
    /// Sampling mode name (read/write)
    Mode,
    /// Update and alert counters (read-only)
    Stats,
}

impl Attribute {
    /// All attributes, in listing order
    pub const ALL: [Attribute; 4] = [
        Attribute::SamplingMs,
        Attribute::ThresholdMc,
        Attribute::Mode,
        Attribute::Stats,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::SamplingMs => "sampling_ms",
            Attribute::ThresholdMc => "threshold_mC",
            Attribute::Mode => "mode",
            Attribute::Stats => "stats",
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, Attribute::Stats)
    }
}

impl FromStr for Attribute {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| DeviceError::InvalidArgument(format!("unknown attribute {:?}", s)))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_number<T: FromStr>(attr: Attribute, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| DeviceError::InvalidArgument(format!("{}: not a number: {:?}", attr, value)))
}

impl<E: EntropySource> DeviceContext<E> {
    /// Render an attribute value
    pub fn show(&self, attr: Attribute) -> String {
        match attr {
            Attribute::SamplingMs => format!("{}\n", self.config().interval_ms),
            Attribute::ThresholdMc => format!("{}\n", self.config().threshold_mc),
            Attribute::Mode => format!("{}\n", self.config().mode),
            Attribute::Stats => format!("{}\n", self.stats()),
        }
    }

    /// Parse and apply an attribute value
    ///
    /// Surrounding whitespace (such as a trailing newline) is ignored. On any
    /// error the attribute keeps its previous value.
    pub async fn store(&self, attr: Attribute, value: &str) -> Result<()> {
        let value = value.trim();
        match attr {
            Attribute::SamplingMs => self.set_interval(parse_number(attr, value)?).await,
            Attribute::ThresholdMc => {
                self.set_threshold(parse_number(attr, value)?);
                Ok(())
            }
            Attribute::Mode => self.set_mode_str(value).map(|_| ()),
            Attribute::Stats => Err(DeviceError::NotPermitted("stats attribute is read-only")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformData;
    use sampler::{OsEntropy, SampleMode, TemperatureModel};

    fn device() -> DeviceContext<OsEntropy> {
        DeviceContext::attach_with(&PlatformData::default(), TemperatureModel::new(OsEntropy::new()))
            .unwrap()
    }

    #[test]
    fn test_attribute_names() {
        for attr in Attribute::ALL {
            assert_eq!(attr.name().parse::<Attribute>(), Ok(attr));
        }
        assert!("threshold".parse::<Attribute>().is_err());
        assert!(!Attribute::Stats.is_writable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_defaults() {
        let device = device();
        assert_eq!(device.show(Attribute::SamplingMs), "500\n");
        assert_eq!(device.show(Attribute::ThresholdMc), "42000\n");
        assert_eq!(device.show(Attribute::Mode), "normal\n");
        assert_eq!(device.show(Attribute::Stats), "updates: 0, alerts: 0\n");
        device.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_accepts_trailing_newline() {
        let device = device();

        device.store(Attribute::SamplingMs, "250\n").await.unwrap();
        device.store(Attribute::ThresholdMc, "-1500\n").await.unwrap();
        device.store(Attribute::Mode, "ramp\n").await.unwrap();

        let config = device.config();
        assert_eq!(config.interval_ms, 250);
        assert_eq!(config.threshold_mc, -1_500);
        assert_eq!(config.mode, SampleMode::Ramp);
        device.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_rejections_leave_values() {
        let device = device();

        for (attr, value) in [
            (Attribute::SamplingMs, "0"),
            (Attribute::SamplingMs, "50001"),
            (Attribute::SamplingMs, "fast"),
            (Attribute::ThresholdMc, "12.5"),
            (Attribute::Mode, "bogus"),
            (Attribute::Mode, "Normal"),
        ] {
            assert!(
                matches!(device.store(attr, value).await, Err(DeviceError::InvalidArgument(_))),
                "{} accepted {:?}",
                attr,
                value
            );
        }
        assert!(matches!(
            device.store(Attribute::Stats, "0").await,
            Err(DeviceError::NotPermitted(_))
        ));

        assert_eq!(device.show(Attribute::SamplingMs), "500\n");
        assert_eq!(device.show(Attribute::ThresholdMc), "42000\n");
        assert_eq!(device.show(Attribute::Mode), "normal\n");
        device.shutdown().await.unwrap();
    }
}

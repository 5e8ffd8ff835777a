//! Sampler Error Types

use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Sampling interval outside [1, 50000] ms
    #[error("Sampling interval {0} ms is out of range [1, 50000]")]
    InvalidInterval(u32),

    /// Mode name not one of normal|noisy|ramp
    #[error("Unknown sampling mode: {0:?}")]
    UnknownMode(String),
}

/// Generator task errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// No async runtime is available to arm the generator on
    #[error("No tokio runtime available to arm the generator")]
    NoRuntime,

    /// The generator task terminated abnormally
    #[error("Generator task failed: {0}")]
    TickPanicked(String),
}

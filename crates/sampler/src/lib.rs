//! Periodic Temperature Sampler
//!
//! Provides the sampling configuration store (config lock domain), the
//! temperature model with its injectable entropy source, and the generator
//! task that is armed on a tokio runtime and cancelled with a join.

mod config;
mod entropy;
mod error;
mod generator;
mod model;

pub use config::{
    validate_interval, ConfigStore, Configuration, SampleMode, Stats, DEFAULT_INTERVAL_MS,
    DEFAULT_THRESHOLD_MC, MAX_INTERVAL_MS, MIN_INTERVAL_MS,
};
pub use entropy::{EntropySource, OsEntropy};
pub use error::{ConfigError, SchedulerError};
pub use generator::{arm, Generator, SamplePublisher, TaskHandle};
pub use model::{
    TemperatureModel, BASE_TEMP_MC, NOISY_NOISE_MC, NORMAL_NOISE_MC, RAMP_STEP_MC, RAMP_WRAP_MC,
};

//! Simulated Temperature Sensor Device
//!
//! A `DeviceContext` owns one sample ring, one configuration store and one
//! periodic generator. Readers open it like a character device and get
//! blocking, non-blocking and readiness-polled access to 16-byte sample
//! records. Configuration is exposed as named text attributes.
//!
//! Lock order: the scheduler slot lock may be held while the config lock is
//! taken; the config lock and the data lock are never held together.

mod attributes;
mod channel;
mod device;
mod error;
mod platform;
mod reader;
mod readiness;
mod registry;

pub use attributes::Attribute;
pub use channel::DataChannel;
pub use device::{device_name, DeviceContext, DeviceState};
pub use error::DeviceError;
pub use platform::PlatformData;
pub use reader::{OpenOptions, SensorReader};
pub use readiness::{Interest, Readiness};
pub use registry::{DeviceRegistry, MAX_DEVICES};

pub use ring_buffer::{flags, Sample, RECORD_SIZE};
pub use sampler::{Configuration, EntropySource, OsEntropy, SampleMode, Stats, TemperatureModel};

/// Result alias for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

//! Device Error Types

use ring_buffer::RecordError;
use sampler::{ConfigError, SchedulerError};
use thiserror::Error;

/// Errors surfaced to readers, configuration writers and instance owners
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Non-blocking read found no sample
    #[error("No sample available, try again")]
    WouldBlock,

    /// A wait was interrupted or the device was detached
    #[error("Operation cancelled")]
    Cancelled,

    /// Out-of-range value or unrecognised name; nothing was changed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation is never allowed on this interface
    #[error("Operation not permitted: {0}")]
    NotPermitted(&'static str),

    /// Internal invariant violated
    #[error("Device fault: {0}")]
    Fault(String),

    /// The generator could not be armed
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl From<ConfigError> for DeviceError {
    fn from(err: ConfigError) -> Self {
        DeviceError::InvalidArgument(err.to_string())
    }
}

impl From<SchedulerError> for DeviceError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::NoRuntime => DeviceError::ResourceExhausted(err.to_string()),
            SchedulerError::TickPanicked(_) => DeviceError::Fault(err.to_string()),
        }
    }
}

impl From<RecordError> for DeviceError {
    fn from(err: RecordError) -> Self {
        DeviceError::Fault(err.to_string())
    }
}

impl From<config::ConfigError> for DeviceError {
    fn from(err: config::ConfigError) -> Self {
        DeviceError::InvalidArgument(err.to_string())
    }
}

//! Ring Buffer Error Types

use thiserror::Error;

/// Errors returned by ring buffer reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// No undelivered sample is stored
    #[error("Ring buffer is empty")]
    Empty,
}

/// Errors while decoding a wire record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Record is not exactly one sample long
    #[error("Record must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}
